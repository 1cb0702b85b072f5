//! Selection depth limit.

use crate::context::ValidationContext;
use crate::validator::ValidationRule;
use graphweave_core::Diagnostics;
use graphweave_language::{Document, Selection, SelectionSet};
use indexmap::{IndexMap, IndexSet};

/// Rejects operations whose selections nest deeper than a limit
///
/// Root fields are at depth 1. Fragments are expanded; a fragment already
/// being expanded on the current path is not entered again, and each
/// fragment's depth is computed once per operation.
#[derive(Debug, Clone, Copy)]
pub struct MaxDepth {
    limit: usize,
}

impl MaxDepth {
    /// Create a rule with the given limit
    #[must_use]
    pub const fn new(limit: usize) -> Self {
        Self { limit }
    }

    /// Configured limit
    #[must_use]
    pub const fn limit(&self) -> usize {
        self.limit
    }
}

/// Fragments on the current path, and depths of fragments already expanded
#[derive(Default)]
struct Expansion<'a> {
    expanding: IndexSet<&'a str>,
    known: IndexMap<&'a str, usize>,
}

fn depth<'a>(document: &'a Document, set: &'a SelectionSet, expansion: &mut Expansion<'a>) -> usize {
    let mut deepest = 0;
    for selection in &set.selections {
        let nested = match selection {
            Selection::Field(field) => {
                1 + field
                    .selection_set
                    .as_ref()
                    .map_or(0, |sub| depth(document, sub, expansion))
            }
            Selection::InlineFragment(inline) => depth(document, &inline.selection_set, expansion),
            Selection::FragmentSpread(spread) => {
                let name = spread.name.as_str();
                if let Some(&known) = expansion.known.get(name) {
                    known
                } else {
                    match document.fragment(name) {
                        Some(fragment) if expansion.expanding.insert(name) => {
                            let nested = depth(document, &fragment.selection_set, expansion);
                            expansion.expanding.shift_remove(name);
                            expansion.known.insert(name, nested);
                            nested
                        }
                        _ => 0,
                    }
                }
            }
        };
        deepest = deepest.max(nested);
    }
    deepest
}

impl ValidationRule for MaxDepth {
    fn name(&self) -> &'static str {
        "MaxDepth"
    }

    fn validate(&self, context: &ValidationContext<'_>, diagnostics: &mut Diagnostics) {
        let document = context.document();
        for operation in document.operations() {
            let found = depth(document, &operation.selection_set, &mut Expansion::default());
            if found <= self.limit {
                continue;
            }
            let message = match &operation.name {
                Some(name) => format!(
                    "Operation \"{}\" has depth {} which exceeds the maximum depth of {}.",
                    name, found, self.limit
                ),
                None => format!(
                    "Operation has depth {} which exceeds the maximum depth of {}.",
                    found, self.limit
                ),
            };
            diagnostics.report(message, [operation.location]);
        }
    }
}
