//! Schema construction errors.

/// Schema is internally inconsistent
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    /// No query root type was given
    #[error("Schema must have a query root type")]
    MissingQueryType,

    /// Two types share a name
    #[error("Type {name} is defined more than once")]
    DuplicateType {
        /// Type name
        name: String,
    },

    /// A name does not match `[_A-Za-z][_0-9A-Za-z]*`, or uses the reserved `__` prefix
    #[error("Invalid name: {name}")]
    InvalidName {
        /// Offending name
        name: String,
    },

    /// A field or argument refers to an unregistered type
    #[error("Unknown type {type_name} referenced by {referrer}")]
    UnknownType {
        /// Missing type
        type_name: String,
        /// `Type.field` or `Type.field(arg:)`
        referrer: String,
    },

    /// A field uses an input-only type, or an argument an output-only type
    #[error("{referrer} cannot use type {type_name}: {reason}")]
    InvalidTypeUsage {
        /// Offending type
        type_name: String,
        /// `Type.field` or `Type.field(arg:)`
        referrer: String,
        /// Why the usage is invalid
        reason: String,
    },

    /// An object type has no fields
    #[error("Object type {name} must define at least one field")]
    EmptyObject {
        /// Type name
        name: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SchemaError::UnknownType {
            type_name: "Missing".to_string(),
            referrer: "Query.field".to_string(),
        };
        assert_eq!(err.to_string(), "Unknown type Missing referenced by Query.field");
    }
}
