//! Variable definition and usage rules.

use crate::context::ValidationContext;
use crate::validator::ValidationRule;
use graphweave_core::Diagnostics;
use graphweave_language::OperationDefinition;
use indexmap::{IndexMap, IndexSet};

/// Variables of one operation must have distinct names
#[derive(Debug, Clone, Copy, Default)]
pub struct UniqueVariableNames;

impl ValidationRule for UniqueVariableNames {
    fn name(&self) -> &'static str {
        "UniqueVariableNames"
    }

    fn validate(&self, context: &ValidationContext<'_>, diagnostics: &mut Diagnostics) {
        for operation in context.document().operations() {
            let mut known = IndexMap::new();
            for variable in &operation.variable_definitions {
                match known.get(variable.name.as_str()) {
                    Some(&first) => diagnostics.report(
                        format!("There can be only one variable named \"${}\".", variable.name),
                        [first, variable.location],
                    ),
                    None => {
                        known.insert(variable.name.as_str(), variable.location);
                    }
                }
            }
        }
    }
}

fn declared(operation: &OperationDefinition) -> IndexSet<&str> {
    operation
        .variable_definitions
        .iter()
        .map(|variable| variable.name.as_str())
        .collect()
}

/// Every variable used by an operation, including through fragments, must be declared by it
#[derive(Debug, Clone, Copy, Default)]
pub struct NoUndefinedVariables;

impl ValidationRule for NoUndefinedVariables {
    fn name(&self) -> &'static str {
        "NoUndefinedVariables"
    }

    fn validate(&self, context: &ValidationContext<'_>, diagnostics: &mut Diagnostics) {
        for operation in context.document().operations() {
            let defined = declared(operation);
            let mut reported = IndexSet::new();
            for (name, location) in context.recursive_variable_usages(operation) {
                if defined.contains(name) || !reported.insert(name) {
                    continue;
                }
                let message = match &operation.name {
                    Some(op_name) => {
                        format!("Variable \"${}\" is not defined by operation \"{}\".", name, op_name)
                    }
                    None => format!("Variable \"${}\" is not defined.", name),
                };
                diagnostics.report(message, [location, operation.location]);
            }
        }
    }
}

/// Every declared variable must be used by its operation or the fragments it reaches
#[derive(Debug, Clone, Copy, Default)]
pub struct NoUnusedVariables;

impl ValidationRule for NoUnusedVariables {
    fn name(&self) -> &'static str {
        "NoUnusedVariables"
    }

    fn validate(&self, context: &ValidationContext<'_>, diagnostics: &mut Diagnostics) {
        for operation in context.document().operations() {
            let used: IndexSet<&str> = context
                .recursive_variable_usages(operation)
                .into_iter()
                .map(|(name, _)| name)
                .collect();
            for variable in &operation.variable_definitions {
                if used.contains(variable.name.as_str()) {
                    continue;
                }
                let message = match &operation.name {
                    Some(op_name) => format!(
                        "Variable \"${}\" is never used in operation \"{}\".",
                        variable.name, op_name
                    ),
                    None => format!("Variable \"${}\" is never used.", variable.name),
                };
                diagnostics.report(message, [variable.location]);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::test_support::{check, messages};
    use graphweave_core::Location;

    #[test]
    fn test_duplicate_variables() {
        assert_eq!(
            messages(UniqueVariableNames, "query Q($a: Int, $a: Int, $b: Int) { hello }"),
            vec!["There can be only one variable named \"$a\"."]
        );
    }

    #[test]
    fn test_undefined_variable() {
        let reported = check(NoUndefinedVariables, "query Q {\n  user(id: $id) { name }\n}");
        assert_eq!(
            reported,
            vec![(
                "Variable \"$id\" is not defined by operation \"Q\".".to_string(),
                vec![Location::new(2, 8), Location::new(1, 1)],
            )]
        );
    }

    #[test]
    fn test_undefined_variable_through_fragment() {
        assert_eq!(
            messages(
                NoUndefinedVariables,
                "{ user(id: 1) { ...F } } fragment F on User { friends(first: $n) { name } }"
            ),
            vec!["Variable \"$n\" is not defined."]
        );
        assert!(messages(
            NoUndefinedVariables,
            "query Q($n: Int) { user(id: 1) { ...F } } fragment F on User { friends(first: $n) { name } }"
        )
        .is_empty());
    }

    #[test]
    fn test_unused_variables() {
        assert_eq!(
            messages(
                NoUnusedVariables,
                "query Q($a: ID!, $b: Int, $c: Boolean!) { user(id: $a) { name @skip(if: $c) } }"
            ),
            vec!["Variable \"$b\" is never used in operation \"Q\"."]
        );
    }
}
