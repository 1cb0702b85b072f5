//! Request descriptor.

use graphweave_core::{Map, RequestContext, Value};
use graphweave_schema::Schema;
use std::sync::Arc;

/// Everything one request needs
///
/// Built with [`Params::new`] and the `with_*` methods; every part except the
/// schema and source text is optional.
#[derive(Debug, Clone)]
pub struct Params {
    /// Schema to validate and execute against
    pub schema: Arc<Schema>,
    /// Request source text
    pub request_string: String,
    /// Parent value of the root fields
    pub root_value: Value,
    /// Runtime variable values by name
    pub variable_values: Map,
    /// Operation to run; needed only when the document has several
    pub operation_name: Option<String>,
    /// Cancellation, deadline and request data
    pub context: RequestContext,
}

impl Params {
    /// Describe a request with no variables and a null root
    #[must_use]
    pub fn new(schema: Arc<Schema>, request: impl Into<String>) -> Self {
        Self {
            schema,
            request_string: request.into(),
            root_value: Value::Null,
            variable_values: Map::new(),
            operation_name: None,
            context: RequestContext::new(),
        }
    }

    /// Set the root value
    #[must_use]
    pub fn with_root_value(mut self, root: impl Into<Value>) -> Self {
        self.root_value = root.into();
        self
    }

    /// Replace all variable values
    #[must_use]
    pub fn with_variable_values(mut self, variables: Map) -> Self {
        self.variable_values = variables;
        self
    }

    /// Bind one variable
    #[must_use]
    pub fn with_variable(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.variable_values.insert(name.into(), value.into());
        self
    }

    /// Select an operation by name
    #[must_use]
    pub fn with_operation_name(mut self, name: impl Into<String>) -> Self {
        self.operation_name = Some(name.into());
        self
    }

    /// Set the request context
    #[must_use]
    pub fn with_context(mut self, context: RequestContext) -> Self {
        self.context = context;
        self
    }
}
