//! Field collection: flattening fragments and applying `@skip`/`@include`.

use graphweave_core::Map;
use graphweave_language::{Directive, Document, Field, Selection, SelectionSet};
use graphweave_schema::{value_from_ast, ObjectType, Schema, ScalarKind, TypeRef};
use indexmap::{IndexMap, IndexSet};

/// Fields grouped by response key, keys in first-occurrence order
pub type GroupedFields<'a> = IndexMap<&'a str, Vec<&'a Field>>;

/// Inputs needed to collect fields of one operation
#[derive(Debug, Clone, Copy)]
pub struct Collector<'a> {
    schema: &'a Schema,
    document: &'a Document,
    variables: &'a Map,
}

impl<'a> Collector<'a> {
    /// Create a collector for a document and its coerced variables
    #[must_use]
    pub const fn new(schema: &'a Schema, document: &'a Document, variables: &'a Map) -> Self {
        Self {
            schema,
            document,
            variables,
        }
    }

    /// Collect the fields a selection set selects on `object_type`
    #[must_use]
    pub fn collect(&self, object_type: &ObjectType, set: &'a SelectionSet) -> GroupedFields<'a> {
        let mut grouped = GroupedFields::new();
        self.collect_into(object_type, set, &mut IndexSet::new(), &mut grouped);
        grouped
    }

    /// Collect the merged sub-selections of several fields sharing a response key
    #[must_use]
    pub fn collect_subfields(&self, object_type: &ObjectType, fields: &[&'a Field]) -> GroupedFields<'a> {
        let mut grouped = GroupedFields::new();
        let mut visited = IndexSet::new();
        for field in fields {
            if let Some(set) = &field.selection_set {
                self.collect_into(object_type, set, &mut visited, &mut grouped);
            }
        }
        grouped
    }

    fn collect_into(
        &self,
        object_type: &ObjectType,
        set: &'a SelectionSet,
        visited: &mut IndexSet<&'a str>,
        grouped: &mut GroupedFields<'a>,
    ) {
        for selection in &set.selections {
            if !self.should_include(selection.directives()) {
                continue;
            }
            match selection {
                Selection::Field(field) => {
                    grouped.entry(field.response_key()).or_default().push(field);
                }
                Selection::InlineFragment(inline) => {
                    if applies(inline.type_condition.as_deref(), object_type) {
                        self.collect_into(object_type, &inline.selection_set, visited, grouped);
                    }
                }
                Selection::FragmentSpread(spread) => {
                    if !visited.insert(spread.name.as_str()) {
                        continue;
                    }
                    let Some(fragment) = self.document.fragment(&spread.name) else {
                        continue;
                    };
                    if applies(Some(&fragment.type_condition), object_type) {
                        self.collect_into(object_type, &fragment.selection_set, visited, grouped);
                    }
                }
            }
        }
    }

    /// Evaluate `@skip(if:)` and `@include(if:)`
    #[must_use]
    pub fn should_include(&self, directives: &[Directive]) -> bool {
        let condition = |directive: &Directive| {
            let boolean = TypeRef::non_null(TypeRef::named(ScalarKind::Boolean.name()));
            directive
                .argument("if")
                .and_then(|arg| value_from_ast(self.schema, &arg.value, &boolean, Some(self.variables)).ok())
                .and_then(|value| value.as_bool())
        };
        for directive in directives {
            match directive.name.as_str() {
                "skip" if condition(directive) == Some(true) => return false,
                "include" if condition(directive) == Some(false) => return false,
                _ => {}
            }
        }
        true
    }
}

fn applies(type_condition: Option<&str>, object_type: &ObjectType) -> bool {
    type_condition.is_none_or(|name| name == object_type.name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphweave_core::Value;
    use graphweave_language::{parse, Source};
    use graphweave_schema::FieldDefinition;

    fn schema() -> Schema {
        Schema::builder()
            .query(
                ObjectType::new("Query")
                    .field(FieldDefinition::new("a", TypeRef::named("String")))
                    .field(FieldDefinition::new("b", TypeRef::named("String")))
                    .field(FieldDefinition::new("c", TypeRef::named("String"))),
            )
            .build()
            .unwrap()
    }

    fn keys(text: &str, variables: &Map) -> Vec<String> {
        let schema = schema();
        let document = parse(&Source::anonymous(text)).unwrap();
        let operation = document.operations().next().unwrap();
        let collector = Collector::new(&schema, &document, variables);
        collector
            .collect(schema.query_type(), &operation.selection_set)
            .keys()
            .map(|key| key.to_string())
            .collect()
    }

    #[test]
    fn test_fragments_merge_in_first_occurrence_order() {
        let found = keys(
            "{ b ...F ... on Query { a c } alias: a } fragment F on Query { c b }",
            &Map::new(),
        );
        assert_eq!(found, vec!["b", "c", "a", "alias"]);
    }

    #[test]
    fn test_skip_and_include() {
        let variables: Map = [("yes".to_string(), Value::Boolean(true))].into_iter().collect();
        let found = keys(
            "query Q($yes: Boolean!) { a @skip(if: true) b @include(if: false) c @include(if: $yes) }",
            &variables,
        );
        assert_eq!(found, vec!["c"]);
    }

    #[test]
    fn test_mismatched_type_condition() {
        assert_eq!(keys("{ a ... on Other { b } }", &Map::new()), vec!["a"]);
    }

    #[test]
    fn test_duplicate_keys_grouped() {
        let schema = schema();
        let document = parse(&Source::anonymous("{ a a x: b }")).unwrap();
        let operation = document.operations().next().unwrap();
        let variables = Map::new();
        let grouped = Collector::new(&schema, &document, &variables)
            .collect(schema.query_type(), &operation.selection_set);
        assert_eq!(grouped["a"].len(), 2);
        assert_eq!(grouped.keys().copied().collect::<Vec<_>>(), vec!["a", "x"]);
    }
}
