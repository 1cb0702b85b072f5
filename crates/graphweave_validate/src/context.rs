//! Shared view of the document for validation rules.
//!
//! The context walks the document once up front and records every field
//! with the object type it was selected on, every directive with where it
//! appears, and every place arguments are supplied. Rules read these lists
//! instead of walking the tree themselves.

use graphweave_core::Location;
use graphweave_language::{
    Argument, Directive, Document, Field, FragmentDefinition, FragmentSpread, OperationDefinition,
    Selection, SelectionSet,
};
use graphweave_schema::{
    DirectiveDefinition, DirectiveLocation, FieldDefinition, InputValueDefinition, ObjectType, Schema,
};
use indexmap::{IndexMap, IndexSet};

/// A field selection and the type it was selected on
#[derive(Debug, Clone, Copy)]
pub struct FieldInfo<'a> {
    /// Field node
    pub field: &'a Field,
    /// Enclosing object type, if it is known
    pub parent_type: Option<&'a ObjectType>,
    /// Schema definition of the field, if the parent defines it
    pub definition: Option<&'a FieldDefinition>,
}

/// What a list of arguments is supplied to
#[derive(Debug, Clone, Copy)]
pub enum ArgumentTarget<'a> {
    /// A field selection
    Field(FieldInfo<'a>),
    /// A directive
    Directive {
        /// Directive node
        directive: &'a Directive,
        /// Schema definition, if the directive is known
        definition: Option<&'a DirectiveDefinition>,
    },
}

/// A place in the document where arguments are supplied
#[derive(Debug, Clone, Copy)]
pub struct ArgumentSite<'a> {
    /// Field or directive receiving the arguments
    pub target: ArgumentTarget<'a>,
    /// Arguments in source order
    pub arguments: &'a [Argument],
    /// Location of the field or directive
    pub location: Location,
}

impl<'a> ArgumentSite<'a> {
    /// Declared arguments, if the target is known
    #[must_use]
    pub fn definitions(&self) -> Option<&'a IndexMap<String, InputValueDefinition>> {
        match self.target {
            ArgumentTarget::Field(info) => info.definition.map(|def| &def.arguments),
            ArgumentTarget::Directive { definition, .. } => definition.map(|def| &def.arguments),
        }
    }
}

/// Document, schema and precomputed lookups for one validation run
#[derive(Debug)]
pub struct ValidationContext<'a> {
    schema: &'a Schema,
    document: &'a Document,
    fields: Vec<FieldInfo<'a>>,
    directives: Vec<(DirectiveLocation, &'a Directive)>,
}

impl<'a> ValidationContext<'a> {
    /// Walk the document and build the lookups
    #[must_use]
    pub fn new(schema: &'a Schema, document: &'a Document) -> Self {
        let mut context = Self {
            schema,
            document,
            fields: Vec::new(),
            directives: Vec::new(),
        };

        for operation in document.operations() {
            let location = DirectiveLocation::from(operation.operation);
            context.directives.extend(operation.directives.iter().map(|d| (location, d)));
            for variable in &operation.variable_definitions {
                context
                    .directives
                    .extend(variable.directives.iter().map(|d| (DirectiveLocation::VariableDefinition, d)));
            }
            let root = schema.root_type(operation.operation);
            context.walk(&operation.selection_set, root);
        }
        for fragment in document.fragments() {
            context
                .directives
                .extend(fragment.directives.iter().map(|d| (DirectiveLocation::FragmentDefinition, d)));
            let parent = schema.get_object(&fragment.type_condition);
            context.walk(&fragment.selection_set, parent);
        }
        context
    }

    fn walk(&mut self, set: &'a SelectionSet, parent: Option<&'a ObjectType>) {
        for selection in &set.selections {
            match selection {
                Selection::Field(field) => {
                    let definition = parent.and_then(|object| object.get_field(&field.name));
                    self.fields.push(FieldInfo {
                        field,
                        parent_type: parent,
                        definition,
                    });
                    self.directives
                        .extend(field.directives.iter().map(|d| (DirectiveLocation::Field, d)));
                    if let Some(sub) = &field.selection_set {
                        let child = definition.and_then(|def| self.schema.get_object(def.field_type.base_name()));
                        self.walk(sub, child);
                    }
                }
                Selection::FragmentSpread(spread) => {
                    self.directives
                        .extend(spread.directives.iter().map(|d| (DirectiveLocation::FragmentSpread, d)));
                }
                Selection::InlineFragment(inline) => {
                    self.directives
                        .extend(inline.directives.iter().map(|d| (DirectiveLocation::InlineFragment, d)));
                    let scope = match &inline.type_condition {
                        Some(name) => self.schema.get_object(name),
                        None => parent,
                    };
                    self.walk(&inline.selection_set, scope);
                }
            }
        }
    }

    /// Schema being validated against
    #[must_use]
    pub const fn schema(&self) -> &'a Schema {
        self.schema
    }

    /// Document being validated
    #[must_use]
    pub const fn document(&self) -> &'a Document {
        self.document
    }

    /// Every field selection, in document order
    #[must_use]
    pub fn fields(&self) -> &[FieldInfo<'a>] {
        &self.fields
    }

    /// Every directive and where it appears, in document order
    #[must_use]
    pub fn directives(&self) -> &[(DirectiveLocation, &'a Directive)] {
        &self.directives
    }

    /// Every field and directive that receives arguments, fields first
    #[must_use]
    pub fn argument_sites(&self) -> Vec<ArgumentSite<'a>> {
        let fields = self.fields.iter().map(|info| ArgumentSite {
            target: ArgumentTarget::Field(*info),
            arguments: &info.field.arguments,
            location: info.field.location,
        });
        let directives = self.directives.iter().map(|&(_, directive)| ArgumentSite {
            target: ArgumentTarget::Directive {
                directive,
                definition: self.schema.directive(&directive.name),
            },
            arguments: &directive.arguments,
            location: directive.location,
        });
        fields.chain(directives).collect()
    }

    /// Fragment spreads anywhere inside a selection set, not following fragments
    #[must_use]
    pub fn fragment_spreads(set: &'a SelectionSet) -> Vec<&'a FragmentSpread> {
        let mut spreads = Vec::new();
        collect_spreads(set, &mut spreads);
        spreads
    }

    /// Fragments reachable from an operation, each once, in discovery order
    #[must_use]
    pub fn recursive_fragments(&self, operation: &'a OperationDefinition) -> Vec<&'a FragmentDefinition> {
        let mut seen = IndexSet::new();
        let mut fragments = Vec::new();
        let mut pending = vec![&operation.selection_set];
        while let Some(set) = pending.pop() {
            for spread in Self::fragment_spreads(set) {
                if !seen.insert(spread.name.as_str()) {
                    continue;
                }
                if let Some(fragment) = self.document.fragment(&spread.name) {
                    fragments.push(fragment);
                    pending.push(&fragment.selection_set);
                }
            }
        }
        fragments
    }

    /// Variables referenced in a selection set, with the location of the argument
    #[must_use]
    pub fn variable_usages(set: &'a SelectionSet) -> Vec<(&'a str, Location)> {
        let mut usages = Vec::new();
        collect_variable_usages(set, &mut usages);
        usages
    }

    /// Variables referenced by an operation and the fragments it reaches
    #[must_use]
    pub fn recursive_variable_usages(&self, operation: &'a OperationDefinition) -> Vec<(&'a str, Location)> {
        let mut usages = Vec::new();
        for directive in &operation.directives {
            argument_variables(&directive.arguments, &mut usages);
        }
        collect_variable_usages(&operation.selection_set, &mut usages);
        for fragment in self.recursive_fragments(operation) {
            collect_variable_usages(&fragment.selection_set, &mut usages);
        }
        usages
    }
}

fn collect_spreads<'a>(set: &'a SelectionSet, spreads: &mut Vec<&'a FragmentSpread>) {
    for selection in &set.selections {
        match selection {
            Selection::Field(field) => {
                if let Some(sub) = &field.selection_set {
                    collect_spreads(sub, spreads);
                }
            }
            Selection::FragmentSpread(spread) => spreads.push(spread),
            Selection::InlineFragment(inline) => collect_spreads(&inline.selection_set, spreads),
        }
    }
}

fn collect_variable_usages<'a>(set: &'a SelectionSet, usages: &mut Vec<(&'a str, Location)>) {
    for selection in &set.selections {
        for directive in selection.directives() {
            argument_variables(&directive.arguments, usages);
        }
        match selection {
            Selection::Field(field) => {
                argument_variables(&field.arguments, usages);
                if let Some(sub) = &field.selection_set {
                    collect_variable_usages(sub, usages);
                }
            }
            Selection::FragmentSpread(_) => {}
            Selection::InlineFragment(inline) => collect_variable_usages(&inline.selection_set, usages),
        }
    }
}

fn argument_variables<'a>(arguments: &'a [Argument], usages: &mut Vec<(&'a str, Location)>) {
    for argument in arguments {
        usages.extend(argument.value.variables().into_iter().map(|name| (name, argument.location)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphweave_language::{parse, Source};
    use graphweave_schema::{FieldDefinition, TypeRef};

    fn schema() -> Schema {
        let user = ObjectType::new("User")
            .field(FieldDefinition::new("name", TypeRef::named("String")))
            .field(FieldDefinition::new("friends", TypeRef::list(TypeRef::named("User"))));
        Schema::builder()
            .query(ObjectType::new("Query").field(FieldDefinition::new("me", TypeRef::named("User"))))
            .register(user)
            .build()
            .unwrap()
    }

    fn document(text: &str) -> Document {
        parse(&Source::anonymous(text)).unwrap()
    }

    #[test]
    fn test_fields_carry_parent_types() {
        let schema = schema();
        let doc = document("{ me { name friends { ...F } } } fragment F on User { name bogus }");
        let context = ValidationContext::new(&schema, &doc);
        let seen: Vec<_> = context
            .fields()
            .iter()
            .map(|info| {
                (
                    info.field.name.as_str(),
                    info.parent_type.map(|object| object.name.as_str()),
                    info.definition.is_some(),
                )
            })
            .collect();
        assert_eq!(
            seen,
            vec![
                ("me", Some("Query"), true),
                ("name", Some("User"), true),
                ("friends", Some("User"), true),
                ("name", Some("User"), true),
                ("bogus", Some("User"), false),
            ]
        );
    }

    #[test]
    fn test_directive_locations() {
        let schema = schema();
        let doc = document("query Q($a: Boolean = true @x) @y { me @skip(if: $a) { ... @include(if: true) { name } } }");
        let context = ValidationContext::new(&schema, &doc);
        let locations: Vec<_> = context
            .directives()
            .iter()
            .map(|(location, directive)| (*location, directive.name.as_str()))
            .collect();
        assert_eq!(
            locations,
            vec![
                (DirectiveLocation::Query, "y"),
                (DirectiveLocation::VariableDefinition, "x"),
                (DirectiveLocation::Field, "skip"),
                (DirectiveLocation::InlineFragment, "include"),
            ]
        );
        assert_eq!(context.argument_sites().len(), 2 + 4);
    }

    #[test]
    fn test_recursive_fragments_and_variables() {
        let schema = schema();
        let doc = document(
            "query Q($n: String) { me { ...A } } \
             fragment A on User { friends { ...B } } \
             fragment B on User { name @include(if: $flag) ...A }",
        );
        let context = ValidationContext::new(&schema, &doc);
        let operation = doc.operations().next().unwrap();
        let names: Vec<_> = context
            .recursive_fragments(operation)
            .iter()
            .map(|fragment| fragment.name.as_str())
            .collect();
        assert_eq!(names, vec!["A", "B"]);
        let usages: Vec<_> = context
            .recursive_variable_usages(operation)
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        assert_eq!(usages, vec!["flag"]);
    }
}
