//! Fields sharing a response key.
//!
//! Execution answers one response key with one value, so every field
//! selected under that key, directly or through fragments, must name the
//! same field with the same arguments. Sub-selections of such fields are
//! merged and checked the same way. Fields on two different object types
//! never both apply, so for them only the shapes of the returned types are
//! compared.

use crate::context::ValidationContext;
use crate::validator::ValidationRule;
use graphweave_core::{Diagnostics, Location};
use graphweave_language::{Argument, Document, Field, Selection, SelectionSet};
use graphweave_schema::{FieldDefinition, NamedType, ObjectType, Schema, TypeRef};
use indexmap::{IndexMap, IndexSet};
use std::fmt;

/// Fields selected under one response key must be mergeable
#[derive(Debug, Clone, Copy, Default)]
pub struct OverlappingFieldsCanBeMerged;

impl ValidationRule for OverlappingFieldsCanBeMerged {
    fn name(&self) -> &'static str {
        "OverlappingFieldsCanBeMerged"
    }

    fn validate(&self, context: &ValidationContext<'_>, diagnostics: &mut Diagnostics) {
        let schema = context.schema();
        let document = context.document();
        let mut merger = Merger {
            schema,
            document,
            compared: IndexMap::new(),
        };
        for operation in document.operations() {
            merger.visit(schema.root_type(operation.operation), &operation.selection_set, diagnostics);
        }
        for fragment in document.fragments() {
            merger.visit(schema.get_object(&fragment.type_condition), &fragment.selection_set, diagnostics);
        }
    }
}

/// A field as seen from the selection set it is merged into
#[derive(Clone, Copy)]
struct Candidate<'a> {
    field: &'a Field,
    parent: Option<&'a ObjectType>,
    definition: Option<&'a FieldDefinition>,
    /// Outermost fragment the field was reached through
    fragment: Option<&'a str>,
}

#[derive(Debug, Clone)]
enum Reason {
    Message(String),
    Subfields(Vec<(String, Reason)>),
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Message(text) => f.write_str(text),
            Self::Subfields(conflicts) => {
                for (i, (key, reason)) in conflicts.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" and ")?;
                    }
                    write!(f, "subfields \"{}\" conflict because {}", key, reason)?;
                }
                Ok(())
            }
        }
    }
}

#[derive(Debug, Clone)]
struct Conflict {
    reason: Reason,
    locations: Vec<Location>,
}

impl Conflict {
    fn new(reason: impl Into<String>, first: &Field, second: &Field) -> Self {
        Self {
            reason: Reason::Message(reason.into()),
            locations: vec![first.location, second.location],
        }
    }
}

type Grouped<'a> = IndexMap<&'a str, Vec<Candidate<'a>>>;

/// Field pairs already compared, with whether their parents were exclusive
type Compared = IndexMap<(*const Field, *const Field, bool), Option<Conflict>>;

struct Merger<'a> {
    schema: &'a Schema,
    document: &'a Document,
    compared: Compared,
}

impl<'a> Merger<'a> {
    fn visit(&mut self, parent: Option<&'a ObjectType>, set: &'a SelectionSet, diagnostics: &mut Diagnostics) {
        self.check_set(parent, set, diagnostics);
        self.descend(parent, set, diagnostics);
    }

    /// Visit the selection sets of fields below `set`, without following spreads
    fn descend(&mut self, parent: Option<&'a ObjectType>, set: &'a SelectionSet, diagnostics: &mut Diagnostics) {
        for selection in &set.selections {
            match selection {
                Selection::Field(field) => {
                    if let Some(sub) = &field.selection_set {
                        let child = parent
                            .and_then(|object| object.get_field(&field.name))
                            .and_then(|definition| self.schema.get_object(definition.field_type.base_name()));
                        self.visit(child, sub, diagnostics);
                    }
                }
                Selection::InlineFragment(inline) => {
                    let scope = self.scope(inline.type_condition.as_deref(), parent);
                    self.descend(scope, &inline.selection_set, diagnostics);
                }
                Selection::FragmentSpread(_) => {}
            }
        }
    }

    fn scope(&self, type_condition: Option<&str>, parent: Option<&'a ObjectType>) -> Option<&'a ObjectType> {
        match type_condition {
            Some(name) => self.schema.get_object(name),
            None => parent,
        }
    }

    fn check_set(&mut self, parent: Option<&'a ObjectType>, set: &'a SelectionSet, diagnostics: &mut Diagnostics) {
        let mut grouped = Grouped::new();
        self.gather(parent, set, None, &mut IndexSet::new(), &mut grouped);
        for (key, candidates) in &grouped {
            for (i, first) in candidates.iter().enumerate() {
                for second in &candidates[i + 1..] {
                    // Reported where that fragment is defined
                    if first.fragment.is_some() && first.fragment == second.fragment {
                        continue;
                    }
                    if let Some(conflict) = self.find_conflict(first, second, false) {
                        diagnostics.report(
                            format!(
                                "Fields \"{}\" conflict because {}. Use different aliases on the fields to fetch both if this was intentional.",
                                key, conflict.reason
                            ),
                            conflict.locations,
                        );
                    }
                }
            }
        }
    }

    /// Group the fields `set` selects by response key, expanding fragments
    fn gather(
        &self,
        parent: Option<&'a ObjectType>,
        set: &'a SelectionSet,
        fragment: Option<&'a str>,
        visited: &mut IndexSet<&'a str>,
        grouped: &mut Grouped<'a>,
    ) {
        for selection in &set.selections {
            match selection {
                Selection::Field(field) => {
                    grouped.entry(field.response_key()).or_default().push(Candidate {
                        field,
                        parent,
                        definition: parent.and_then(|object| object.get_field(&field.name)),
                        fragment,
                    });
                }
                Selection::InlineFragment(inline) => {
                    let scope = self.scope(inline.type_condition.as_deref(), parent);
                    self.gather(scope, &inline.selection_set, fragment, visited, grouped);
                }
                Selection::FragmentSpread(spread) => {
                    if !visited.insert(spread.name.as_str()) {
                        continue;
                    }
                    if let Some(definition) = self.document.fragment(&spread.name) {
                        let scope = self.schema.get_object(&definition.type_condition);
                        let origin = fragment.or(Some(definition.name.as_str()));
                        self.gather(scope, &definition.selection_set, origin, visited, grouped);
                    }
                }
            }
        }
    }

    fn find_conflict(&mut self, first: &Candidate<'a>, second: &Candidate<'a>, exclusive: bool) -> Option<Conflict> {
        let exclusive = exclusive
            || matches!((first.parent, second.parent), (Some(a), Some(b)) if a.name != b.name);
        let key = (
            std::ptr::from_ref(first.field),
            std::ptr::from_ref(second.field),
            exclusive,
        );
        if let Some(known) = self.compared.get(&key) {
            return known.clone();
        }
        let conflict = self.compare(first, second, exclusive);
        self.compared.insert(key, conflict.clone());
        conflict
    }

    fn compare(&mut self, first: &Candidate<'a>, second: &Candidate<'a>, exclusive: bool) -> Option<Conflict> {
        let (a, b) = (first.field, second.field);
        if !exclusive {
            if a.name != b.name {
                return Some(Conflict::new(format!("{} and {} are different fields", a.name, b.name), a, b));
            }
            if !same_arguments(&a.arguments, &b.arguments) {
                return Some(Conflict::new("they have differing arguments", a, b));
            }
        }
        if let (Some(first_def), Some(second_def)) = (first.definition, second.definition) {
            if self.types_conflict(&first_def.field_type, &second_def.field_type) {
                return Some(Conflict::new(
                    format!(
                        "they return conflicting types {} and {}",
                        first_def.field_type, second_def.field_type
                    ),
                    a,
                    b,
                ));
            }
        }

        let (Some(first_set), Some(second_set)) = (&a.selection_set, &b.selection_set) else {
            return None;
        };
        let mut first_fields = Grouped::new();
        self.gather(self.field_type(first), first_set, None, &mut IndexSet::new(), &mut first_fields);
        let mut second_fields = Grouped::new();
        self.gather(self.field_type(second), second_set, None, &mut IndexSet::new(), &mut second_fields);

        let mut subfields = Vec::new();
        let mut locations = vec![a.location, b.location];
        for (key, firsts) in &first_fields {
            let Some(seconds) = second_fields.get(key) else {
                continue;
            };
            // One conflict per key keeps messages from growing with every pair
            let found = firsts
                .iter()
                .flat_map(|x| seconds.iter().map(move |y| (x, y)))
                .find_map(|(x, y)| self.find_conflict(x, y, exclusive));
            if let Some(conflict) = found {
                subfields.push((key.to_string(), conflict.reason));
                locations.extend(conflict.locations);
            }
        }
        (!subfields.is_empty()).then(|| Conflict {
            reason: Reason::Subfields(subfields),
            locations,
        })
    }

    fn field_type(&self, candidate: &Candidate<'a>) -> Option<&'a ObjectType> {
        candidate
            .definition
            .and_then(|definition| self.schema.get_object(definition.field_type.base_name()))
    }

    /// Lists and non-null wrappers must line up, and leaf types must match
    fn types_conflict(&self, first: &TypeRef, second: &TypeRef) -> bool {
        match (first, second) {
            (TypeRef::List(a), TypeRef::List(b)) | (TypeRef::NonNull(a), TypeRef::NonNull(b)) => {
                self.types_conflict(a, b)
            }
            (TypeRef::List(_) | TypeRef::NonNull(_), _) | (_, TypeRef::List(_) | TypeRef::NonNull(_)) => true,
            (TypeRef::Named(a), TypeRef::Named(b)) => {
                let is_leaf = |name: &str| self.schema.get_type(name).is_some_and(NamedType::is_leaf);
                a != b && (is_leaf(a) || is_leaf(b))
            }
        }
    }
}

/// Same names with the same values, in any order
fn same_arguments(first: &[Argument], second: &[Argument]) -> bool {
    first.len() == second.len()
        && first.iter().all(|a| {
            second
                .iter()
                .any(|b| a.name == b.name && a.value.to_string() == b.value.to_string())
        })
}
