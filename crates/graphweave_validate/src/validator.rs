//! Rule trait, rule sets, and the validation entry point.

use crate::context::ValidationContext;
use crate::nesting::check_nesting;
use crate::rules;
use graphweave_core::{Diagnostic, Diagnostics};
use graphweave_language::Document;
use graphweave_schema::Schema;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

/// One static check over a document
pub trait ValidationRule: Send + Sync {
    /// Rule name, used in logs
    fn name(&self) -> &'static str;

    /// Report every violation found in the document
    fn validate(&self, context: &ValidationContext<'_>, diagnostics: &mut Diagnostics);
}

/// Ordered collection of rules
#[derive(Clone, Default)]
pub struct RuleSet {
    rules: Vec<Arc<dyn ValidationRule>>,
}

impl RuleSet {
    /// Set with no rules; every document passes
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Standard rules in their fixed order
    #[must_use]
    pub fn specified() -> Self {
        Self::empty()
            .with(rules::UniqueOperationNames)
            .with(rules::LoneAnonymousOperation)
            .with(rules::KnownTypeNames)
            .with(rules::FragmentsOnCompositeTypes)
            .with(rules::VariablesAreInputTypes)
            .with(rules::ScalarLeafs)
            .with(rules::FieldsOnCorrectType)
            .with(rules::UniqueFragmentNames)
            .with(rules::KnownFragmentNames)
            .with(rules::NoUnusedFragments)
            .with(rules::NoFragmentCycles)
            .with(rules::UniqueVariableNames)
            .with(rules::NoUndefinedVariables)
            .with(rules::NoUnusedVariables)
            .with(rules::KnownDirectives)
            .with(rules::KnownArgumentNames)
            .with(rules::UniqueArgumentNames)
            .with(rules::ArgumentsOfCorrectType)
            .with(rules::ProvidedNonNullArguments)
            .with(rules::OverlappingFieldsCanBeMerged)
            .with(rules::UniqueInputFieldNames)
    }

    /// Append a rule
    #[must_use]
    pub fn with(mut self, rule: impl ValidationRule + 'static) -> Self {
        self.rules.push(Arc::new(rule));
        self
    }

    /// Append a depth limit; zero means unlimited and adds nothing
    #[must_use]
    pub fn with_max_depth(self, max_depth: usize) -> Self {
        if max_depth == 0 {
            self
        } else {
            self.with(rules::MaxDepth::new(max_depth))
        }
    }

    /// Number of rules
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Check for an empty set
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Rule names in order
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.rules.iter().map(|rule| rule.name())
    }
}

impl fmt::Debug for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

/// Outcome of validating one document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationResult {
    /// True when no rule reported anything
    pub is_valid: bool,
    /// Everything reported, grouped by rule in rule order
    pub diagnostics: Diagnostics,
}

impl ValidationResult {
    /// Reported diagnostics as a list
    #[must_use]
    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics.into_vec()
    }
}

/// Run every rule of the set against the document
///
/// Validation is pure: it never touches resolvers and never observes
/// cancellation. Documents nesting deeper than
/// [`MAX_NESTING`](graphweave_language::MAX_NESTING) once fragments are
/// expanded fail with a single diagnostic, whatever the rule set.
#[must_use]
pub fn validate(schema: &Schema, document: &Document, rules: &RuleSet) -> ValidationResult {
    if let Some(diagnostic) = check_nesting(document) {
        debug!(error = %diagnostic, "Document nests too deeply to validate");
        let mut diagnostics = Diagnostics::new();
        diagnostics.push(diagnostic);
        return ValidationResult {
            is_valid: false,
            diagnostics,
        };
    }

    let context = ValidationContext::new(schema, document);
    let mut diagnostics = Diagnostics::new();
    for rule in &rules.rules {
        let before = diagnostics.len();
        rule.validate(&context, &mut diagnostics);
        if diagnostics.len() > before {
            trace!(rule = rule.name(), reported = diagnostics.len() - before, "Rule reported violations");
        }
    }
    debug!(rules = rules.len(), errors = diagnostics.len(), "Validation finished");
    ValidationResult {
        is_valid: diagnostics.is_empty(),
        diagnostics,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphweave_core::Location;
    use graphweave_language::{parse, Source};
    use graphweave_schema::{FieldDefinition, ObjectType, TypeRef};

    fn schema() -> Schema {
        Schema::builder()
            .query(
                ObjectType::new("Query")
                    .field(FieldDefinition::new("hello", TypeRef::named("String")))
                    .field(FieldDefinition::new("count", TypeRef::named("Int"))),
            )
            .build()
            .unwrap()
    }

    fn run(text: &str) -> ValidationResult {
        let doc = parse(&Source::anonymous(text)).unwrap();
        validate(&schema(), &doc, &RuleSet::specified())
    }

    #[test]
    fn test_valid_document() {
        let result = run("{ hello count }");
        assert!(result.is_valid);
        assert!(result.diagnostics.is_empty());
    }

    #[test]
    fn test_unknown_field() {
        let result = run("{ hello nope }");
        assert!(!result.is_valid);
        let diagnostics = result.into_diagnostics();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].message, "Cannot query field \"nope\" on type \"Query\".");
        assert_eq!(diagnostics[0].locations, vec![Location::new(1, 9)]);
    }

    #[test]
    fn test_diagnostics_follow_rule_order() {
        let result = run("query A { nope } query A { hello }");
        let messages: Vec<_> = result.diagnostics.iter().map(|d| d.message.as_str()).collect();
        assert_eq!(
            messages,
            vec![
                "There can be only one operation named \"A\".",
                "Cannot query field \"nope\" on type \"Query\".",
            ]
        );
    }

    #[test]
    fn test_overlapping_fields_rejected() {
        let result = run("{ a: hello a: count }");
        let messages: Vec<_> = result.diagnostics.iter().map(|d| d.message.as_str()).collect();
        assert_eq!(
            messages,
            vec![
                "Fields \"a\" conflict because hello and count are different fields. \
                 Use different aliases on the fields to fetch both if this was intentional."
            ]
        );
    }

    #[test]
    fn test_empty_rule_set_accepts_anything() {
        let doc = parse(&Source::anonymous("{ nope { deeper } }")).unwrap();
        assert!(validate(&schema(), &doc, &RuleSet::empty()).is_valid);
    }

    #[test]
    fn test_deep_fragment_chain_skips_rules() {
        let mut text = String::from("{ ...F0 }");
        for i in 0..5_000 {
            text.push_str(&format!(" fragment F{} on Query {{ ...F{} }}", i, i + 1));
        }
        text.push_str(" fragment F5000 on Query { hello }");
        let doc = parse(&Source::anonymous(&text)).unwrap();
        for rules in [RuleSet::specified().with_max_depth(3), RuleSet::empty()] {
            let result = validate(&schema(), &doc, &rules);
            assert!(!result.is_valid);
            let diagnostics = result.into_diagnostics();
            assert_eq!(diagnostics.len(), 1);
            assert!(diagnostics[0].message.contains("more than the limit of 128"));
        }
    }

    #[test]
    fn test_rule_set_composition() {
        let specified = RuleSet::specified();
        assert_eq!(specified.len(), 21);
        assert_eq!(specified.names().next(), Some("UniqueOperationNames"));
        assert_eq!(specified.clone().with_max_depth(0).len(), 21);
        assert_eq!(specified.with_max_depth(3).names().last(), Some("MaxDepth"));
    }
}
