//! Directive rules.

use crate::context::ValidationContext;
use crate::validator::ValidationRule;
use graphweave_core::Diagnostics;

/// Directives must be defined and used where they are allowed
#[derive(Debug, Clone, Copy, Default)]
pub struct KnownDirectives;

impl ValidationRule for KnownDirectives {
    fn name(&self) -> &'static str {
        "KnownDirectives"
    }

    fn validate(&self, context: &ValidationContext<'_>, diagnostics: &mut Diagnostics) {
        for &(location, directive) in context.directives() {
            match context.schema().directive(&directive.name) {
                None => diagnostics.report(
                    format!("Unknown directive \"@{}\".", directive.name),
                    [directive.location],
                ),
                Some(definition) if !definition.locations.contains(&location) => diagnostics.report(
                    format!("Directive \"@{}\" may not be used on {}.", directive.name, location),
                    [directive.location],
                ),
                Some(_) => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::test_support::messages;

    #[test]
    fn test_unknown_directive() {
        assert_eq!(
            messages(KnownDirectives, "{ hello @cached(ttl: 5) }"),
            vec!["Unknown directive \"@cached\"."]
        );
    }

    #[test]
    fn test_misplaced_directive() {
        assert_eq!(
            messages(KnownDirectives, "query Q @skip(if: true) { hello @onQuery }"),
            vec![
                "Directive \"@skip\" may not be used on QUERY.",
                "Directive \"@onQuery\" may not be used on FIELD.",
            ]
        );
        assert!(messages(KnownDirectives, "query Q @onQuery { hello @include(if: true) }").is_empty());
    }
}
