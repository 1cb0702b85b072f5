//! Rules about type names used in the document.

use crate::context::ValidationContext;
use crate::validator::ValidationRule;
use graphweave_core::{Diagnostics, Location};
use graphweave_language::{Selection, SelectionSet};
use graphweave_schema::NamedType;

fn inline_conditions<'a>(set: &'a SelectionSet, found: &mut Vec<(&'a str, Location)>) {
    for selection in &set.selections {
        match selection {
            Selection::Field(field) => {
                if let Some(sub) = &field.selection_set {
                    inline_conditions(sub, found);
                }
            }
            Selection::FragmentSpread(_) => {}
            Selection::InlineFragment(inline) => {
                if let Some(name) = &inline.type_condition {
                    found.push((name.as_str(), inline.location));
                }
                inline_conditions(&inline.selection_set, found);
            }
        }
    }
}

/// Type conditions of inline fragments, in document order
fn all_inline_conditions<'a>(context: &ValidationContext<'a>) -> Vec<(&'a str, Location)> {
    let mut found = Vec::new();
    for operation in context.document().operations() {
        inline_conditions(&operation.selection_set, &mut found);
    }
    for fragment in context.document().fragments() {
        inline_conditions(&fragment.selection_set, &mut found);
    }
    found
}

/// Every referenced type must exist in the schema
#[derive(Debug, Clone, Copy, Default)]
pub struct KnownTypeNames;

impl ValidationRule for KnownTypeNames {
    fn name(&self) -> &'static str {
        "KnownTypeNames"
    }

    fn validate(&self, context: &ValidationContext<'_>, diagnostics: &mut Diagnostics) {
        let schema = context.schema();
        let mut references: Vec<(&str, Location)> = Vec::new();
        for operation in context.document().operations() {
            for variable in &operation.variable_definitions {
                references.push((variable.var_type.base_name(), variable.location));
            }
        }
        for fragment in context.document().fragments() {
            references.push((fragment.type_condition.as_str(), fragment.location));
        }
        references.extend(all_inline_conditions(context));

        for (name, location) in references {
            if schema.get_type(name).is_none() {
                diagnostics.report(format!("Unknown type \"{}\".", name), [location]);
            }
        }
    }
}

/// Fragments may only condition on object types
#[derive(Debug, Clone, Copy, Default)]
pub struct FragmentsOnCompositeTypes;

impl ValidationRule for FragmentsOnCompositeTypes {
    fn name(&self) -> &'static str {
        "FragmentsOnCompositeTypes"
    }

    fn validate(&self, context: &ValidationContext<'_>, diagnostics: &mut Diagnostics) {
        let schema = context.schema();
        let is_leaf = |name: &str| schema.get_type(name).is_some_and(|named| !named.is_composite());

        for (name, location) in all_inline_conditions(context) {
            if is_leaf(name) {
                diagnostics.report(
                    format!("Fragment cannot condition on non composite type \"{}\".", name),
                    [location],
                );
            }
        }
        for fragment in context.document().fragments() {
            if is_leaf(&fragment.type_condition) {
                diagnostics.report(
                    format!(
                        "Fragment \"{}\" cannot condition on non composite type \"{}\".",
                        fragment.name, fragment.type_condition
                    ),
                    [fragment.location],
                );
            }
        }
    }
}

/// Variables must be declared with input types
#[derive(Debug, Clone, Copy, Default)]
pub struct VariablesAreInputTypes;

impl ValidationRule for VariablesAreInputTypes {
    fn name(&self) -> &'static str {
        "VariablesAreInputTypes"
    }

    fn validate(&self, context: &ValidationContext<'_>, diagnostics: &mut Diagnostics) {
        let schema = context.schema();
        for operation in context.document().operations() {
            for variable in &operation.variable_definitions {
                let known_output = schema
                    .get_type(variable.var_type.base_name())
                    .is_some_and(|named| !NamedType::is_input(named));
                if known_output {
                    diagnostics.report(
                        format!(
                            "Variable \"${}\" cannot be non-input type \"{}\".",
                            variable.name, variable.var_type
                        ),
                        [variable.location],
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::test_support::messages;

    #[test]
    fn test_unknown_types() {
        let reported = messages(
            KnownTypeNames,
            "query Q($a: Strin, $b: [Int!]) { user(id: $a) { ... on Usr { name } ...F } } \
             fragment F on Person { name }",
        );
        assert_eq!(
            reported,
            vec![
                "Unknown type \"Strin\".",
                "Unknown type \"Person\".",
                "Unknown type \"Usr\".",
            ]
        );
    }

    #[test]
    fn test_fragment_on_scalar() {
        let reported = messages(
            FragmentsOnCompositeTypes,
            "{ user(id: 1) { ... on String { name } ...F } } fragment F on Color { name }",
        );
        assert_eq!(
            reported,
            vec![
                "Fragment cannot condition on non composite type \"String\".",
                "Fragment \"F\" cannot condition on non composite type \"Color\".",
            ]
        );
        assert!(messages(FragmentsOnCompositeTypes, "{ ... on Query { hello } }").is_empty());
    }

    #[test]
    fn test_object_variable() {
        assert_eq!(
            messages(VariablesAreInputTypes, "query Q($u: User!, $c: Color) { hello }"),
            vec!["Variable \"$u\" cannot be non-input type \"User!\"."]
        );
    }
}
