//! Schema and its builder.
//!
//! A [`Schema`] is immutable once built and is shared read-only across
//! concurrent requests, usually behind an `Arc`.

use crate::error::SchemaError;
use crate::types::{InputValueDefinition, NamedType, ObjectType, ScalarKind, TypeRef};
use graphweave_language::OperationType;
use indexmap::IndexMap;
use std::fmt;

/// Where a directive may appear in a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectiveLocation {
    /// Query operation
    Query,
    /// Mutation operation
    Mutation,
    /// Subscription operation
    Subscription,
    /// Field selection
    Field,
    /// Fragment definition
    FragmentDefinition,
    /// Fragment spread
    FragmentSpread,
    /// Inline fragment
    InlineFragment,
    /// Variable definition
    VariableDefinition,
}

impl fmt::Display for DirectiveLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Query => "QUERY",
            Self::Mutation => "MUTATION",
            Self::Subscription => "SUBSCRIPTION",
            Self::Field => "FIELD",
            Self::FragmentDefinition => "FRAGMENT_DEFINITION",
            Self::FragmentSpread => "FRAGMENT_SPREAD",
            Self::InlineFragment => "INLINE_FRAGMENT",
            Self::VariableDefinition => "VARIABLE_DEFINITION",
        };
        f.write_str(name)
    }
}

impl From<OperationType> for DirectiveLocation {
    fn from(operation: OperationType) -> Self {
        match operation {
            OperationType::Query => Self::Query,
            OperationType::Mutation => Self::Mutation,
            OperationType::Subscription => Self::Subscription,
        }
    }
}

/// A directive the schema accepts
#[derive(Debug, Clone, PartialEq)]
pub struct DirectiveDefinition {
    /// Directive name, without `@`
    pub name: String,
    /// Description
    pub description: Option<String>,
    /// Allowed locations
    pub locations: Vec<DirectiveLocation>,
    /// Arguments in declaration order
    pub arguments: IndexMap<String, InputValueDefinition>,
}

impl DirectiveDefinition {
    /// Create a directive with no arguments
    pub fn new(name: impl Into<String>, locations: impl IntoIterator<Item = DirectiveLocation>) -> Self {
        Self {
            name: name.into(),
            description: None,
            locations: locations.into_iter().collect(),
            arguments: IndexMap::new(),
        }
    }

    /// Add an argument
    #[must_use]
    pub fn argument(mut self, argument: InputValueDefinition) -> Self {
        self.arguments.insert(argument.name.clone(), argument);
        self
    }

    /// Set the description
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// `@skip(if: Boolean!)`
    #[must_use]
    pub fn skip() -> Self {
        Self::conditional(
            "skip",
            "Directs the executor to skip this field or fragment when the `if` argument is true.",
        )
    }

    /// `@include(if: Boolean!)`
    #[must_use]
    pub fn include() -> Self {
        Self::conditional(
            "include",
            "Directs the executor to include this field or fragment only when the `if` argument is true.",
        )
    }

    fn conditional(name: &str, description: &str) -> Self {
        Self::new(
            name,
            [
                DirectiveLocation::Field,
                DirectiveLocation::FragmentSpread,
                DirectiveLocation::InlineFragment,
            ],
        )
        .description(description)
        .argument(InputValueDefinition::new(
            "if",
            TypeRef::non_null(TypeRef::named(ScalarKind::Boolean.name())),
        ))
    }
}

/// A validated type system
#[derive(Debug, Clone)]
pub struct Schema {
    types: IndexMap<String, NamedType>,
    directives: IndexMap<String, DirectiveDefinition>,
    query_type: String,
    mutation_type: Option<String>,
    subscription_type: Option<String>,
}

impl Schema {
    /// Start building a schema
    #[must_use]
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::new()
    }

    /// Look up a named type
    #[must_use]
    pub fn get_type(&self, name: &str) -> Option<&NamedType> {
        self.types.get(name)
    }

    /// Look up an object type
    #[must_use]
    pub fn get_object(&self, name: &str) -> Option<&ObjectType> {
        self.types.get(name).and_then(NamedType::as_object)
    }

    /// Every named type, built-in scalars first
    pub fn types(&self) -> impl Iterator<Item = &NamedType> {
        self.types.values()
    }

    /// Query root type
    #[must_use]
    pub fn query_type(&self) -> &ObjectType {
        self.get_object(&self.query_type)
            .unwrap_or_else(|| unreachable!("query root is checked at build time"))
    }

    /// Mutation root type, if any
    #[must_use]
    pub fn mutation_type(&self) -> Option<&ObjectType> {
        self.mutation_type.as_deref().and_then(|name| self.get_object(name))
    }

    /// Subscription root type, if any
    #[must_use]
    pub fn subscription_type(&self) -> Option<&ObjectType> {
        self.subscription_type.as_deref().and_then(|name| self.get_object(name))
    }

    /// Root type for an operation kind
    #[must_use]
    pub fn root_type(&self, operation: OperationType) -> Option<&ObjectType> {
        match operation {
            OperationType::Query => Some(self.query_type()),
            OperationType::Mutation => self.mutation_type(),
            OperationType::Subscription => self.subscription_type(),
        }
    }

    /// Look up a directive
    #[must_use]
    pub fn directive(&self, name: &str) -> Option<&DirectiveDefinition> {
        self.directives.get(name)
    }

    /// Every directive
    pub fn directives(&self) -> impl Iterator<Item = &DirectiveDefinition> {
        self.directives.values()
    }

    /// Check if a type reference can describe an argument or variable
    #[must_use]
    pub fn is_input_type(&self, ty: &TypeRef) -> bool {
        self.get_type(ty.base_name()).is_some_and(NamedType::is_input)
    }
}

/// Collects types and checks them into a [`Schema`]
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    query: Option<ObjectType>,
    mutation: Option<ObjectType>,
    subscription: Option<ObjectType>,
    types: Vec<NamedType>,
    directives: Vec<DirectiveDefinition>,
}

impl SchemaBuilder {
    /// Create an empty builder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the query root type
    #[must_use]
    pub fn query(mut self, object: ObjectType) -> Self {
        self.query = Some(object);
        self
    }

    /// Set the mutation root type
    #[must_use]
    pub fn mutation(mut self, object: ObjectType) -> Self {
        self.mutation = Some(object);
        self
    }

    /// Set the subscription root type
    #[must_use]
    pub fn subscription(mut self, object: ObjectType) -> Self {
        self.subscription = Some(object);
        self
    }

    /// Register a non-root type
    #[must_use]
    pub fn register(mut self, named: impl Into<NamedType>) -> Self {
        self.types.push(named.into());
        self
    }

    /// Register a custom directive
    #[must_use]
    pub fn directive(mut self, directive: DirectiveDefinition) -> Self {
        self.directives.push(directive);
        self
    }

    /// Check and build the schema
    ///
    /// # Errors
    ///
    /// Returns the first inconsistency found
    pub fn build(self) -> Result<Schema, SchemaError> {
        let query = self.query.ok_or(SchemaError::MissingQueryType)?;
        let query_type = query.name.clone();
        let mutation_type = self.mutation.as_ref().map(|object| object.name.clone());
        let subscription_type = self.subscription.as_ref().map(|object| object.name.clone());

        let mut types: IndexMap<String, NamedType> = ScalarKind::ALL
            .into_iter()
            .map(|kind| (kind.name().to_string(), NamedType::from(kind)))
            .collect();

        let roots = [Some(query), self.mutation, self.subscription]
            .into_iter()
            .flatten()
            .map(NamedType::Object);
        for named in roots.chain(self.types) {
            check_name(named.name())?;
            if types.contains_key(named.name()) {
                return Err(SchemaError::DuplicateType {
                    name: named.name().to_string(),
                });
            }
            types.insert(named.name().to_string(), named);
        }

        for named in types.values() {
            match named {
                NamedType::Object(object) => check_object(&types, object)?,
                NamedType::Enum(enum_type) => {
                    for value in &enum_type.values {
                        check_name(value)?;
                    }
                }
                NamedType::Scalar(_) => {}
            }
        }

        let builtins = [DirectiveDefinition::skip(), DirectiveDefinition::include()];
        let mut directives: IndexMap<String, DirectiveDefinition> = builtins
            .into_iter()
            .map(|directive| (directive.name.clone(), directive))
            .collect();
        for directive in self.directives {
            check_name(&directive.name)?;
            let referrer = format!("@{}", directive.name);
            for argument in directive.arguments.values() {
                check_argument(&types, &referrer, argument)?;
            }
            directives.insert(directive.name.clone(), directive);
        }

        Ok(Schema {
            types,
            directives,
            query_type,
            mutation_type,
            subscription_type,
        })
    }
}

fn check_object(types: &IndexMap<String, NamedType>, object: &ObjectType) -> Result<(), SchemaError> {
    if object.fields.is_empty() {
        return Err(SchemaError::EmptyObject {
            name: object.name.clone(),
        });
    }
    for field in object.fields.values() {
        check_name(&field.name)?;
        let referrer = format!("{}.{}", object.name, field.name);
        let base = field.field_type.base_name();
        if !types.get(base).is_some_and(NamedType::is_output) {
            return Err(SchemaError::UnknownType {
                type_name: base.to_string(),
                referrer,
            });
        }
        for argument in field.arguments.values() {
            check_argument(types, &referrer, argument)?;
        }
    }
    Ok(())
}

fn check_argument(
    types: &IndexMap<String, NamedType>,
    referrer: &str,
    argument: &InputValueDefinition,
) -> Result<(), SchemaError> {
    check_name(&argument.name)?;
    let referrer = format!("{}({}:)", referrer, argument.name);
    let base = argument.value_type.base_name();
    match types.get(base) {
        None => Err(SchemaError::UnknownType {
            type_name: base.to_string(),
            referrer,
        }),
        Some(named) if !named.is_input() => Err(SchemaError::InvalidTypeUsage {
            type_name: base.to_string(),
            referrer,
            reason: "arguments must use scalar or enum types".to_string(),
        }),
        Some(_) => Ok(()),
    }
}

fn check_name(name: &str) -> Result<(), SchemaError> {
    let mut chars = name.chars();
    let valid = chars
        .next()
        .is_some_and(|first| first == '_' || first.is_ascii_alphabetic())
        && chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
        && !name.starts_with("__");
    if valid {
        Ok(())
    } else {
        Err(SchemaError::InvalidName {
            name: name.to_string(),
        })
    }
}
