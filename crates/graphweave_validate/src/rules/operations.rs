//! Operation-level rules.

use crate::context::ValidationContext;
use crate::validator::ValidationRule;
use graphweave_core::Diagnostics;
use indexmap::IndexMap;

/// Named operations must have distinct names
#[derive(Debug, Clone, Copy, Default)]
pub struct UniqueOperationNames;

impl ValidationRule for UniqueOperationNames {
    fn name(&self) -> &'static str {
        "UniqueOperationNames"
    }

    fn validate(&self, context: &ValidationContext<'_>, diagnostics: &mut Diagnostics) {
        let mut known = IndexMap::new();
        for operation in context.document().operations() {
            let Some(name) = operation.name.as_deref() else {
                continue;
            };
            match known.get(name) {
                Some(&first) => diagnostics.report(
                    format!("There can be only one operation named \"{}\".", name),
                    [first, operation.location],
                ),
                None => {
                    known.insert(name, operation.location);
                }
            }
        }
    }
}

/// An anonymous operation must be the only operation in the document
#[derive(Debug, Clone, Copy, Default)]
pub struct LoneAnonymousOperation;

impl ValidationRule for LoneAnonymousOperation {
    fn name(&self) -> &'static str {
        "LoneAnonymousOperation"
    }

    fn validate(&self, context: &ValidationContext<'_>, diagnostics: &mut Diagnostics) {
        let count = context.document().operations().count();
        if count < 2 {
            return;
        }
        for operation in context.document().operations().filter(|op| op.name.is_none()) {
            diagnostics.report(
                "This anonymous operation must be the only defined operation.",
                [operation.location],
            );
        }
    }
}
