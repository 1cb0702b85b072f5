//! Fragment definition and spread rules.

use crate::context::ValidationContext;
use crate::validator::ValidationRule;
use graphweave_core::Diagnostics;
use graphweave_language::{FragmentDefinition, FragmentSpread};
use indexmap::{IndexMap, IndexSet};

/// Fragment names must be distinct
#[derive(Debug, Clone, Copy, Default)]
pub struct UniqueFragmentNames;

impl ValidationRule for UniqueFragmentNames {
    fn name(&self) -> &'static str {
        "UniqueFragmentNames"
    }

    fn validate(&self, context: &ValidationContext<'_>, diagnostics: &mut Diagnostics) {
        let mut known = IndexMap::new();
        for fragment in context.document().fragments() {
            match known.get(fragment.name.as_str()) {
                Some(&first) => diagnostics.report(
                    format!("There can be only one fragment named \"{}\".", fragment.name),
                    [first, fragment.location],
                ),
                None => {
                    known.insert(fragment.name.as_str(), fragment.location);
                }
            }
        }
    }
}

fn all_spreads<'a>(context: &ValidationContext<'a>) -> Vec<&'a FragmentSpread> {
    let document = context.document();
    let operations = document.operations().map(|op| &op.selection_set);
    let fragments = document.fragments().map(|fragment| &fragment.selection_set);
    operations
        .chain(fragments)
        .flat_map(ValidationContext::fragment_spreads)
        .collect()
}

/// Spread fragments must be defined
#[derive(Debug, Clone, Copy, Default)]
pub struct KnownFragmentNames;

impl ValidationRule for KnownFragmentNames {
    fn name(&self) -> &'static str {
        "KnownFragmentNames"
    }

    fn validate(&self, context: &ValidationContext<'_>, diagnostics: &mut Diagnostics) {
        for spread in all_spreads(context) {
            if context.document().fragment(&spread.name).is_none() {
                diagnostics.report(format!("Unknown fragment \"{}\".", spread.name), [spread.location]);
            }
        }
    }
}

/// Every fragment must be reachable from some operation
#[derive(Debug, Clone, Copy, Default)]
pub struct NoUnusedFragments;

impl ValidationRule for NoUnusedFragments {
    fn name(&self) -> &'static str {
        "NoUnusedFragments"
    }

    fn validate(&self, context: &ValidationContext<'_>, diagnostics: &mut Diagnostics) {
        let used: IndexSet<&str> = context
            .document()
            .operations()
            .flat_map(|operation| context.recursive_fragments(operation))
            .map(|fragment| fragment.name.as_str())
            .collect();
        for fragment in context.document().fragments() {
            if !used.contains(fragment.name.as_str()) {
                diagnostics.report(
                    format!("Fragment \"{}\" is never used.", fragment.name),
                    [fragment.location],
                );
            }
        }
    }
}

/// Fragments must not spread themselves, directly or through others
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFragmentCycles;

struct CycleSearch<'a, 'd> {
    context: &'d ValidationContext<'a>,
    visited: IndexSet<&'a str>,
    spread_path: Vec<&'a FragmentSpread>,
    path_index: IndexMap<&'a str, usize>,
}

impl<'a> CycleSearch<'a, '_> {
    fn detect(&mut self, fragment: &'a FragmentDefinition, diagnostics: &mut Diagnostics) {
        let name = fragment.name.as_str();
        if !self.visited.insert(name) {
            return;
        }
        let spreads = ValidationContext::fragment_spreads(&fragment.selection_set);
        if spreads.is_empty() {
            return;
        }

        self.path_index.insert(name, self.spread_path.len());
        for spread in spreads {
            let cycle_start = self.path_index.get(spread.name.as_str()).copied();
            self.spread_path.push(spread);
            match cycle_start {
                None => {
                    if let Some(next) = self.context.document().fragment(&spread.name) {
                        self.detect(next, diagnostics);
                    }
                }
                Some(start) => {
                    let cycle = &self.spread_path[start..];
                    let via: Vec<String> = cycle[..cycle.len() - 1]
                        .iter()
                        .map(|step| format!("\"{}\"", step.name))
                        .collect();
                    let suffix = if via.is_empty() {
                        ".".to_string()
                    } else {
                        format!(" via {}.", via.join(", "))
                    };
                    diagnostics.report(
                        format!("Cannot spread fragment \"{}\" within itself{}", spread.name, suffix),
                        cycle.iter().map(|step| step.location),
                    );
                }
            }
            self.spread_path.pop();
        }
        self.path_index.shift_remove(name);
    }
}

impl ValidationRule for NoFragmentCycles {
    fn name(&self) -> &'static str {
        "NoFragmentCycles"
    }

    fn validate(&self, context: &ValidationContext<'_>, diagnostics: &mut Diagnostics) {
        let mut search = CycleSearch {
            context,
            visited: IndexSet::new(),
            spread_path: Vec::new(),
            path_index: IndexMap::new(),
        };
        for fragment in context.document().fragments() {
            search.detect(fragment, diagnostics);
        }
    }
}
