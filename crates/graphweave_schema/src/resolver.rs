//! Field resolvers.

use crate::types::TypeRef;
use graphweave_core::{Interrupt, Map, PathSegment, RequestContext, Value};
use std::sync::Arc;

/// A resolver failed to produce a field value
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FieldError {
    /// Failure reported by the resolver
    #[error("{0}")]
    Message(String),

    /// The resolver observed that the request was interrupted
    #[error(transparent)]
    Interrupted(#[from] Interrupt),
}

impl FieldError {
    /// Create an error with a message
    pub fn new(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }
}

impl From<&str> for FieldError {
    fn from(message: &str) -> Self {
        Self::Message(message.to_string())
    }
}

impl From<String> for FieldError {
    fn from(message: String) -> Self {
        Self::Message(message)
    }
}

/// Everything a resolver can see about the field being resolved
#[derive(Debug, Clone)]
pub struct ResolveInfo {
    /// Field name in the schema
    pub field_name: String,
    /// Object type the field belongs to
    pub parent_type: String,
    /// Declared result type
    pub return_type: TypeRef,
    /// Response path of the field
    pub path: Vec<PathSegment>,
    /// Value produced for the parent object
    pub parent: Arc<Value>,
    /// Coerced arguments, including defaults
    pub arguments: Map,
    /// Request context
    pub context: RequestContext,
}

impl ResolveInfo {
    /// Look up a coerced argument
    #[must_use]
    pub fn argument(&self, name: &str) -> Option<&Value> {
        self.arguments.get(name)
    }

    /// Parent value
    #[must_use]
    pub fn parent(&self) -> &Value {
        &self.parent
    }

    /// Request context
    #[must_use]
    pub const fn context(&self) -> &RequestContext {
        &self.context
    }
}

/// Produces the value of one field
///
/// Resolvers are synchronous and may block. They must be shareable across
/// threads since the worker-pool scheduler calls them from its blocking pool.
pub trait Resolver: Send + Sync {
    /// Resolve the field
    ///
    /// # Errors
    ///
    /// Returns a [`FieldError`] reported at the field's path
    fn resolve(&self, info: &ResolveInfo) -> Result<Value, FieldError>;
}

impl<F> Resolver for F
where
    F: Fn(&ResolveInfo) -> Result<Value, FieldError> + Send + Sync,
{
    fn resolve(&self, info: &ResolveInfo) -> Result<Value, FieldError> {
        self(info)
    }
}

/// Resolver used for fields without one: the parent's entry named after the field
///
/// # Errors
///
/// Never fails; a non-object parent or missing entry resolves to null
pub fn default_resolve(info: &ResolveInfo) -> Result<Value, FieldError> {
    Ok(info.parent.get(&info.field_name).cloned().unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(parent: Value) -> ResolveInfo {
        ResolveInfo {
            field_name: "name".to_string(),
            parent_type: "User".to_string(),
            return_type: TypeRef::named("String"),
            path: vec![PathSegment::from("user"), PathSegment::from("name")],
            parent: Arc::new(parent),
            arguments: [("id".to_string(), Value::from("1"))].into_iter().collect(),
            context: RequestContext::new(),
        }
    }

    #[test]
    fn test_default_resolve_reads_parent_entry() {
        let parent: Value = [("name", "Ada")].into_iter().collect();
        assert_eq!(default_resolve(&info(parent)).unwrap(), Value::from("Ada"));
    }

    #[test]
    fn test_default_resolve_missing_is_null() {
        assert_eq!(default_resolve(&info(Value::object())).unwrap(), Value::Null);
        assert_eq!(default_resolve(&info(Value::from(3))).unwrap(), Value::Null);
    }

    #[test]
    fn test_closure_resolver() {
        let resolver = |info: &ResolveInfo| -> Result<Value, FieldError> {
            let id = info.argument("id").and_then(Value::as_str).ok_or("missing id")?;
            Ok(Value::from(format!("user-{}", id)))
        };
        let resolver: Arc<dyn Resolver> = Arc::new(resolver);
        assert_eq!(resolver.resolve(&info(Value::Null)).unwrap(), Value::from("user-1"));
    }

    #[test]
    fn test_field_error_from_interrupt() {
        let err = FieldError::from(Interrupt::Cancelled);
        assert_eq!(err.to_string(), "request cancelled");
        assert_eq!(FieldError::from("boom").to_string(), "boom");
    }
}
