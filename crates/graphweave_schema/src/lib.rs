//! GRAPHWEAVE Schema
//!
//! The type system requests are validated and executed against: built-in
//! scalars, enums and object types, field definitions carrying resolvers,
//! and the coercion rules for input and result values.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod coerce;
pub mod error;
pub mod resolver;
pub mod schema;
pub mod types;

pub use coerce::{coerce_input_value, serialize_leaf, value_from_ast, CoercionError};
pub use error::SchemaError;
pub use resolver::{default_resolve, FieldError, ResolveInfo, Resolver};
pub use schema::{DirectiveDefinition, DirectiveLocation, Schema, SchemaBuilder};
pub use types::{
    EnumType, FieldDefinition, InputValueDefinition, NamedType, ObjectType, ScalarKind,
    ScalarType, TypeRef,
};
