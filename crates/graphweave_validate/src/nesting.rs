//! Nesting of selections with fragment spreads expanded.
//!
//! The parser bounds how deep one definition nests, but a chain of
//! fragments, each spreading the next, nests as deep as the chain is long.
//! Rules and the executor walk such chains recursively, so a document whose
//! expanded nesting passes [`MAX_NESTING`] is rejected before any rule runs.
//!
//! The walk over fragments uses an explicit stack and remembers each
//! fragment's height, so neither long chains nor repeated spreads of the
//! same fragment cost more than one visit.

use graphweave_core::{Diagnostic, Location};
use graphweave_language::{Document, Selection, SelectionSet, MAX_NESTING};
use indexmap::{IndexMap, IndexSet};

/// Selection set height of one definition, spreads left unexpanded
#[derive(Debug, Default)]
struct Shape<'a> {
    height: usize,
    /// Spread fragment names with the level their selections would start at
    spreads: Vec<(&'a str, usize)>,
}

impl<'a> Shape<'a> {
    fn of(set: &'a SelectionSet) -> Self {
        let mut shape = Self::default();
        shape.walk(set, 1);
        shape
    }

    fn walk(&mut self, set: &'a SelectionSet, level: usize) {
        self.height = self.height.max(level);
        for selection in &set.selections {
            match selection {
                Selection::Field(field) => {
                    if let Some(sub) = &field.selection_set {
                        self.walk(sub, level + 1);
                    }
                }
                Selection::InlineFragment(inline) => self.walk(&inline.selection_set, level + 1),
                Selection::FragmentSpread(spread) => self.spreads.push((spread.name.as_str(), level + 1)),
            }
        }
    }

    fn expanded(&self, heights: &IndexMap<&str, usize>) -> usize {
        self.spreads.iter().fold(self.height, |deepest, &(name, level)| {
            deepest.max(level - 1 + heights.get(name).copied().unwrap_or(0))
        })
    }
}

/// Expanded height of every fragment, and the longest spread chain walked
///
/// A spread back into a fragment still being expanded adds nothing; such
/// cycles are reported by their own rule.
fn fragment_heights<'a>(shapes: &IndexMap<&'a str, Shape<'a>>) -> (IndexMap<&'a str, usize>, usize) {
    let mut heights = IndexMap::new();
    let mut on_path = IndexSet::new();
    let mut longest_chain = 0;

    for &start in shapes.keys() {
        if heights.contains_key(start) {
            continue;
        }
        on_path.insert(start);
        let mut stack: Vec<(&'a str, usize)> = vec![(start, 0)];
        while let Some(top) = stack.last_mut() {
            let (name, next) = *top;
            let shape = &shapes[name];
            if let Some(&(target, _)) = shape.spreads.get(next) {
                top.1 += 1;
                if shapes.contains_key(target) && !heights.contains_key(target) && on_path.insert(target) {
                    stack.push((target, 0));
                    longest_chain = longest_chain.max(stack.len());
                }
                continue;
            }
            heights.insert(name, shape.expanded(&heights));
            on_path.shift_remove(name);
            stack.pop();
        }
    }
    (heights, longest_chain)
}

/// Report the deepest definition if it nests deeper than [`MAX_NESTING`]
#[must_use]
pub fn check_nesting(document: &Document) -> Option<Diagnostic> {
    let mut shapes = IndexMap::new();
    for fragment in document.fragments() {
        shapes
            .entry(fragment.name.as_str())
            .or_insert_with(|| Shape::of(&fragment.selection_set));
    }
    let (heights, longest_chain) = fragment_heights(&shapes);

    let definitions = document
        .operations()
        .map(|operation| (Shape::of(&operation.selection_set).expanded(&heights), operation.location))
        .chain(
            document
                .fragments()
                .map(|fragment| (heights.get(fragment.name.as_str()).copied().unwrap_or(0), fragment.location)),
        );
    let mut deepest: Option<(usize, Location)> = None;
    for (height, location) in definitions {
        if height > MAX_NESTING && deepest.is_none_or(|(found, _)| height > found) {
            deepest = Some((height, location));
        }
    }

    match deepest {
        Some((height, location)) => Some(Diagnostic::with_locations(
            format!(
                "Selections nest {} levels deep with fragments expanded, more than the limit of {}.",
                height, MAX_NESTING
            ),
            [location],
        )),
        None if longest_chain > MAX_NESTING => Some(Diagnostic::new(format!(
            "Fragment spreads chain {} fragments deep, more than the limit of {}.",
            longest_chain, MAX_NESTING
        ))),
        None => None,
    }
}
