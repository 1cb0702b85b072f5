//! Named types and type references.

use crate::resolver::{FieldError, ResolveInfo, Resolver};
use graphweave_core::Value;
use graphweave_language::Type;
use indexmap::{IndexMap, IndexSet};
use std::fmt;
use std::sync::Arc;

/// Reference to a type, possibly wrapped in list and non-null modifiers
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeRef {
    /// Named type
    Named(String),
    /// List of the inner type
    List(Box<TypeRef>),
    /// Non-null inner type
    NonNull(Box<TypeRef>),
}

impl TypeRef {
    /// Reference a named type
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    /// Wrap in a list
    #[must_use]
    pub fn list(inner: TypeRef) -> Self {
        Self::List(Box::new(inner))
    }

    /// Wrap in non-null
    #[must_use]
    pub fn non_null(inner: TypeRef) -> Self {
        Self::NonNull(Box::new(inner))
    }

    /// Innermost named type
    #[must_use]
    pub fn base_name(&self) -> &str {
        match self {
            Self::Named(name) => name,
            Self::List(inner) | Self::NonNull(inner) => inner.base_name(),
        }
    }

    /// Check for a non-null wrapper
    #[must_use]
    pub const fn is_non_null(&self) -> bool {
        matches!(self, Self::NonNull(_))
    }

    /// Strip one non-null wrapper, if present
    #[must_use]
    pub fn nullable(&self) -> &TypeRef {
        match self {
            Self::NonNull(inner) => inner,
            other => other,
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => write!(f, "{}", name),
            Self::List(inner) => write!(f, "[{}]", inner),
            Self::NonNull(inner) => write!(f, "{}!", inner),
        }
    }
}

impl From<&Type> for TypeRef {
    fn from(ty: &Type) -> Self {
        match ty {
            Type::Named(name) => Self::Named(name.clone()),
            Type::List(inner) => Self::List(Box::new(Self::from(inner.as_ref()))),
            Type::NonNull(inner) => Self::NonNull(Box::new(Self::from(inner.as_ref()))),
        }
    }
}

/// Built-in scalar kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    /// 32-bit signed integer
    Int,
    /// Double-precision float
    Float,
    /// UTF-8 string
    String,
    /// Boolean
    Boolean,
    /// Opaque identifier, serialized as a string
    Id,
}

impl ScalarKind {
    /// Every built-in scalar
    pub const ALL: [ScalarKind; 5] = [
        ScalarKind::Int,
        ScalarKind::Float,
        ScalarKind::String,
        ScalarKind::Boolean,
        ScalarKind::Id,
    ];

    /// Type name of the scalar
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Int => "Int",
            Self::Float => "Float",
            Self::String => "String",
            Self::Boolean => "Boolean",
            Self::Id => "ID",
        }
    }
}

/// A scalar type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScalarType {
    /// Built-in kind
    pub kind: ScalarKind,
}

impl ScalarType {
    /// Type name
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.kind.name()
    }
}

/// An enum type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumType {
    /// Type name
    pub name: String,
    /// Description
    pub description: Option<String>,
    /// Allowed values in declaration order
    pub values: IndexSet<String>,
}

impl EnumType {
    /// Create an enum with no values
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            values: IndexSet::new(),
        }
    }

    /// Add an allowed value
    #[must_use]
    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.values.insert(value.into());
        self
    }

    /// Set the description
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Check if a value name is allowed
    #[must_use]
    pub fn has_value(&self, value: &str) -> bool {
        self.values.contains(value)
    }
}

/// An argument definition
#[derive(Debug, Clone, PartialEq)]
pub struct InputValueDefinition {
    /// Argument name
    pub name: String,
    /// Description
    pub description: Option<String>,
    /// Declared type
    pub value_type: TypeRef,
    /// Value used when the argument is omitted
    pub default_value: Option<Value>,
}

impl InputValueDefinition {
    /// Create an argument definition
    pub fn new(name: impl Into<String>, value_type: TypeRef) -> Self {
        Self {
            name: name.into(),
            description: None,
            value_type,
            default_value: None,
        }
    }

    /// Set the default value
    #[must_use]
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    /// Set the description
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Check if the argument must be supplied by the request
    #[must_use]
    pub fn is_required(&self) -> bool {
        self.value_type.is_non_null() && self.default_value.is_none()
    }
}

/// A field on an object type
#[derive(Clone)]
pub struct FieldDefinition {
    /// Field name
    pub name: String,
    /// Description
    pub description: Option<String>,
    /// Result type
    pub field_type: TypeRef,
    /// Arguments in declaration order
    pub arguments: IndexMap<String, InputValueDefinition>,
    /// Resolver; the parent's entry of the same name is used when absent
    pub resolver: Option<Arc<dyn Resolver>>,
}

impl FieldDefinition {
    /// Create a field with no arguments and the default resolver
    pub fn new(name: impl Into<String>, field_type: TypeRef) -> Self {
        Self {
            name: name.into(),
            description: None,
            field_type,
            arguments: IndexMap::new(),
            resolver: None,
        }
    }

    /// Add an argument
    #[must_use]
    pub fn argument(mut self, argument: InputValueDefinition) -> Self {
        self.arguments.insert(argument.name.clone(), argument);
        self
    }

    /// Set the resolver
    #[must_use]
    pub fn resolve<F>(mut self, resolver: F) -> Self
    where
        F: Fn(&ResolveInfo) -> Result<Value, FieldError> + Send + Sync + 'static,
    {
        self.resolver = Some(Arc::new(resolver));
        self
    }

    /// Set a shared resolver
    #[must_use]
    pub fn resolver(mut self, resolver: Arc<dyn Resolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Set the description
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

impl fmt::Debug for FieldDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDefinition")
            .field("name", &self.name)
            .field("field_type", &self.field_type)
            .field("arguments", &self.arguments)
            .field("resolver", &self.resolver.as_ref().map(|_| "<resolver>"))
            .finish()
    }
}

/// An object type
#[derive(Debug, Clone)]
pub struct ObjectType {
    /// Type name
    pub name: String,
    /// Description
    pub description: Option<String>,
    /// Fields in declaration order
    pub fields: IndexMap<String, FieldDefinition>,
}

impl ObjectType {
    /// Create an object type with no fields
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            fields: IndexMap::new(),
        }
    }

    /// Add a field
    #[must_use]
    pub fn field(mut self, field: FieldDefinition) -> Self {
        self.fields.insert(field.name.clone(), field);
        self
    }

    /// Set the description
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Look up a field
    #[must_use]
    pub fn get_field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.get(name)
    }
}

/// Any named type in a schema
#[derive(Debug, Clone)]
pub enum NamedType {
    /// Scalar
    Scalar(ScalarType),
    /// Enum
    Enum(EnumType),
    /// Object
    Object(ObjectType),
}

impl NamedType {
    /// Type name
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Scalar(scalar) => scalar.name(),
            Self::Enum(enum_type) => &enum_type.name,
            Self::Object(object) => &object.name,
        }
    }

    /// Scalars and enums may be used for arguments and variables
    #[must_use]
    pub const fn is_input(&self) -> bool {
        matches!(self, Self::Scalar(_) | Self::Enum(_))
    }

    /// Every named type may be a field result
    #[must_use]
    pub const fn is_output(&self) -> bool {
        true
    }

    /// Scalars and enums have no sub-selection
    #[must_use]
    pub const fn is_leaf(&self) -> bool {
        matches!(self, Self::Scalar(_) | Self::Enum(_))
    }

    /// Objects require a sub-selection
    #[must_use]
    pub const fn is_composite(&self) -> bool {
        matches!(self, Self::Object(_))
    }

    /// Object type, if this is one
    #[must_use]
    pub const fn as_object(&self) -> Option<&ObjectType> {
        match self {
            Self::Object(object) => Some(object),
            _ => None,
        }
    }
}

impl From<ObjectType> for NamedType {
    fn from(object: ObjectType) -> Self {
        Self::Object(object)
    }
}

impl From<EnumType> for NamedType {
    fn from(enum_type: EnumType) -> Self {
        Self::Enum(enum_type)
    }
}

impl From<ScalarKind> for NamedType {
    fn from(kind: ScalarKind) -> Self {
        Self::Scalar(ScalarType { kind })
    }
}
