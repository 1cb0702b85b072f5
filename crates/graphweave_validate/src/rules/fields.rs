//! Field selection rules.

use crate::context::ValidationContext;
use crate::validator::ValidationRule;
use graphweave_core::Diagnostics;

/// Name of the meta-field every object type answers
pub(crate) const TYPENAME_FIELD: &str = "__typename";

/// Leaf fields must not have a sub-selection, object fields must have one
#[derive(Debug, Clone, Copy, Default)]
pub struct ScalarLeafs;

impl ValidationRule for ScalarLeafs {
    fn name(&self) -> &'static str {
        "ScalarLeafs"
    }

    fn validate(&self, context: &ValidationContext<'_>, diagnostics: &mut Diagnostics) {
        for info in context.fields() {
            let Some(definition) = info.definition else {
                continue;
            };
            let Some(named) = context.schema().get_type(definition.field_type.base_name()) else {
                continue;
            };
            let field = info.field;
            match (&field.selection_set, named.is_leaf()) {
                (Some(set), true) => diagnostics.report(
                    format!(
                        "Field \"{}\" must not have a selection since type \"{}\" has no subfields.",
                        field.name, definition.field_type
                    ),
                    [set.location],
                ),
                (None, false) => diagnostics.report(
                    format!(
                        "Field \"{}\" of type \"{}\" must have a selection of subfields. Did you mean \"{} {{ ... }}\"?",
                        field.name, definition.field_type, field.name
                    ),
                    [field.location],
                ),
                _ => {}
            }
        }
    }
}

/// Selected fields must be defined on the type they are selected on
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldsOnCorrectType;

impl ValidationRule for FieldsOnCorrectType {
    fn name(&self) -> &'static str {
        "FieldsOnCorrectType"
    }

    fn validate(&self, context: &ValidationContext<'_>, diagnostics: &mut Diagnostics) {
        for info in context.fields() {
            let Some(parent) = info.parent_type else {
                continue;
            };
            if info.definition.is_none() && info.field.name != TYPENAME_FIELD {
                diagnostics.report(
                    format!(
                        "Cannot query field \"{}\" on type \"{}\".",
                        info.field.name, parent.name
                    ),
                    [info.field.location],
                );
            }
        }
    }
}
