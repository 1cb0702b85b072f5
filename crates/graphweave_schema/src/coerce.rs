//! Value coercion.
//!
//! Three directions are covered: resolver results are serialized into leaf
//! values ([`serialize_leaf`]), variable values supplied with the request
//! are checked against their declared types ([`coerce_input_value`]), and
//! literals written in the request are turned into values
//! ([`value_from_ast`]).

use crate::schema::Schema;
use crate::types::{EnumType, NamedType, ScalarKind, TypeRef};
use graphweave_core::{Map, Value};
use graphweave_language::ValueNode;
use std::fmt::Write as _;

/// A value does not fit its type
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct CoercionError {
    /// What went wrong
    pub message: String,
    /// List indices leading to the offending item, outermost first
    pub path: Vec<usize>,
}

impl CoercionError {
    /// Create an error at the top of the value
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            path: Vec::new(),
        }
    }

    fn at_index(mut self, index: usize) -> Self {
        self.path.insert(0, index);
        self
    }

    /// Render the path below `root`, e.g. `ids[1]`
    #[must_use]
    pub fn path_below(&self, root: &str) -> String {
        let mut rendered = root.to_string();
        for index in &self.path {
            let _ = write!(rendered, "[{}]", index);
        }
        rendered
    }
}

type CoercionResult = Result<Value, CoercionError>;

/// Serialize a resolver result for a scalar or enum field
///
/// # Errors
///
/// Returns an error if the value cannot represent the type
pub fn serialize_leaf(named: &NamedType, value: &Value) -> CoercionResult {
    match named {
        NamedType::Scalar(scalar) => serialize_scalar(scalar.kind, value),
        NamedType::Enum(enum_type) => match value {
            Value::String(name) if enum_type.has_value(name) => Ok(value.clone()),
            _ => Err(CoercionError::new(format!(
                "Enum \"{}\" cannot represent value: {}",
                enum_type.name, value
            ))),
        },
        NamedType::Object(object) => Err(CoercionError::new(format!(
            "Type \"{}\" is not a leaf type",
            object.name
        ))),
    }
}

fn serialize_scalar(kind: ScalarKind, value: &Value) -> CoercionResult {
    match kind {
        ScalarKind::Int => {
            let int = match value {
                Value::Int(int) => Some(*int),
                Value::Boolean(flag) => Some(i64::from(*flag)),
                Value::Float(float) if float.fract() == 0.0 => Some(*float as i64),
                Value::String(text) => text.parse::<i64>().ok(),
                _ => None,
            };
            match int {
                Some(int) if i32::try_from(int).is_ok() => Ok(Value::Int(int)),
                Some(_) => Err(CoercionError::new(format!(
                    "Int cannot represent non 32-bit signed integer value: {}",
                    value
                ))),
                None => Err(CoercionError::new(format!(
                    "Int cannot represent non-integer value: {}",
                    value
                ))),
            }
        }
        ScalarKind::Float => match value {
            Value::Float(float) if float.is_finite() => Ok(Value::Float(*float)),
            Value::Int(int) => Ok(Value::Float(*int as f64)),
            Value::Boolean(flag) => Ok(Value::Float(if *flag { 1.0 } else { 0.0 })),
            Value::String(text) => text
                .parse::<f64>()
                .ok()
                .filter(|float| float.is_finite())
                .map(Value::Float)
                .ok_or_else(|| non_numeric(value)),
            _ => Err(non_numeric(value)),
        },
        ScalarKind::String => match value {
            Value::String(_) => Ok(value.clone()),
            Value::Boolean(_) | Value::Int(_) | Value::Float(_) => Ok(Value::String(value.to_string())),
            _ => Err(CoercionError::new(format!("String cannot represent value: {}", value))),
        },
        ScalarKind::Boolean => match value {
            Value::Boolean(_) => Ok(value.clone()),
            Value::Int(int) => Ok(Value::Boolean(*int != 0)),
            Value::Float(float) if float.is_finite() => Ok(Value::Boolean(*float != 0.0)),
            _ => Err(CoercionError::new(format!(
                "Boolean cannot represent a non boolean value: {}",
                value
            ))),
        },
        ScalarKind::Id => match value {
            Value::String(_) => Ok(value.clone()),
            Value::Int(int) => Ok(Value::String(int.to_string())),
            _ => Err(CoercionError::new(format!("ID cannot represent value: {}", value))),
        },
    }
}

fn non_numeric(value: &Value) -> CoercionError {
    CoercionError::new(format!("Float cannot represent non numeric value: {}", value))
}

/// Coerce a variable value supplied with the request
///
/// A single item supplied for a list type is wrapped in a one-element list.
///
/// # Errors
///
/// Returns an error if the value does not fit the type
pub fn coerce_input_value(schema: &Schema, ty: &TypeRef, value: &Value) -> CoercionResult {
    match ty {
        TypeRef::NonNull(inner) => {
            if value.is_null() {
                return Err(CoercionError::new(format!(
                    "Expected non-nullable type \"{}\" not to be null.",
                    ty
                )));
            }
            coerce_input_value(schema, inner, value)
        }
        _ if value.is_null() => Ok(Value::Null),
        TypeRef::List(item_type) => match value {
            Value::List(items) => items
                .iter()
                .enumerate()
                .map(|(index, item)| {
                    coerce_input_value(schema, item_type, item).map_err(|err| err.at_index(index))
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Value::List),
            single => Ok(Value::List(vec![coerce_input_value(schema, item_type, single)?])),
        },
        TypeRef::Named(name) => match schema.get_type(name) {
            Some(NamedType::Scalar(scalar)) => coerce_input_scalar(scalar.kind, value),
            Some(NamedType::Enum(enum_type)) => match value {
                Value::String(name) if enum_type.has_value(name) => Ok(value.clone()),
                Value::String(name) => Err(missing_enum_value(enum_type, name)),
                _ => Err(CoercionError::new(format!(
                    "Enum \"{}\" cannot represent non-string value: {}.",
                    enum_type.name, value
                ))),
            },
            Some(NamedType::Object(_)) => Err(CoercionError::new(format!(
                "Type \"{}\" is not an input type.",
                name
            ))),
            None => Err(CoercionError::new(format!("Unknown type \"{}\".", name))),
        },
    }
}

fn coerce_input_scalar(kind: ScalarKind, value: &Value) -> CoercionResult {
    match kind {
        ScalarKind::Int => {
            let int = match value {
                Value::Int(int) => *int,
                Value::Float(float) if float.fract() == 0.0 && float.is_finite() => *float as i64,
                _ => {
                    return Err(CoercionError::new(format!(
                        "Int cannot represent non-integer value: {}",
                        value
                    )));
                }
            };
            if i32::try_from(int).is_ok() {
                Ok(Value::Int(int))
            } else {
                Err(CoercionError::new(format!(
                    "Int cannot represent non 32-bit signed integer value: {}",
                    value
                )))
            }
        }
        ScalarKind::Float => match value {
            Value::Float(_) => Ok(value.clone()),
            Value::Int(int) => Ok(Value::Float(*int as f64)),
            _ => Err(non_numeric(value)),
        },
        ScalarKind::String => match value {
            Value::String(_) => Ok(value.clone()),
            _ => Err(CoercionError::new(format!(
                "String cannot represent a non string value: {}",
                value
            ))),
        },
        ScalarKind::Boolean => match value {
            Value::Boolean(_) => Ok(value.clone()),
            _ => Err(CoercionError::new(format!(
                "Boolean cannot represent a non boolean value: {}",
                value
            ))),
        },
        ScalarKind::Id => match value {
            Value::String(_) => Ok(value.clone()),
            Value::Int(int) => Ok(Value::String(int.to_string())),
            _ => Err(CoercionError::new(format!("ID cannot represent value: {}", value))),
        },
    }
}

fn missing_enum_value(enum_type: &EnumType, name: &str) -> CoercionError {
    CoercionError::new(format!(
        "Value \"{}\" does not exist in \"{}\" enum.",
        name, enum_type.name
    ))
}

/// Turn a literal written in the request into a value of the given type
///
/// With `variables` set, variable references are replaced by their coerced
/// values, and an unset variable reads as null. Without it, variable
/// references are accepted as-is and read as null; validation uses this
/// form since variable values are unknown until execution.
///
/// # Errors
///
/// Returns an error if the literal does not fit the type
pub fn value_from_ast(
    schema: &Schema,
    node: &ValueNode,
    ty: &TypeRef,
    variables: Option<&Map>,
) -> CoercionResult {
    if let ValueNode::Variable(name) = node {
        let value = variables.and_then(|vars| vars.get(name)).cloned().unwrap_or_default();
        if value.is_null() && ty.is_non_null() && variables.is_some() {
            return Err(CoercionError::new(format!(
                "Expected value of type \"{}\", found null.",
                ty
            )));
        }
        return Ok(value);
    }

    match ty {
        TypeRef::NonNull(inner) => {
            if matches!(node, ValueNode::Null) {
                return Err(CoercionError::new(format!(
                    "Expected value of type \"{}\", found null.",
                    ty
                )));
            }
            value_from_ast(schema, node, inner, variables)
        }
        _ if matches!(node, ValueNode::Null) => Ok(Value::Null),
        TypeRef::List(item_type) => match node {
            ValueNode::List(items) => items
                .iter()
                .enumerate()
                .map(|(index, item)| {
                    value_from_ast(schema, item, item_type, variables).map_err(|err| err.at_index(index))
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Value::List),
            single => Ok(Value::List(vec![value_from_ast(schema, single, item_type, variables)?])),
        },
        TypeRef::Named(name) => match schema.get_type(name) {
            Some(NamedType::Scalar(scalar)) => literal_scalar(scalar.kind, node),
            Some(NamedType::Enum(enum_type)) => match node {
                ValueNode::Enum(value) if enum_type.has_value(value) => Ok(Value::String(value.clone())),
                ValueNode::Enum(value) => Err(missing_enum_value(enum_type, value)),
                other => Err(CoercionError::new(format!(
                    "Enum \"{}\" cannot represent non-enum value: {}.",
                    enum_type.name, other
                ))),
            },
            Some(NamedType::Object(_)) => Err(CoercionError::new(format!(
                "Type \"{}\" is not an input type.",
                name
            ))),
            None => Err(CoercionError::new(format!("Unknown type \"{}\".", name))),
        },
    }
}

fn literal_scalar(kind: ScalarKind, node: &ValueNode) -> CoercionResult {
    match (kind, node) {
        (ScalarKind::Int, ValueNode::Int(int)) => {
            if i32::try_from(*int).is_ok() {
                Ok(Value::Int(*int))
            } else {
                Err(CoercionError::new(format!(
                    "Int cannot represent non 32-bit signed integer value: {}",
                    node
                )))
            }
        }
        (ScalarKind::Int, _) => Err(CoercionError::new(format!(
            "Int cannot represent non-integer value: {}",
            node
        ))),
        (ScalarKind::Float, ValueNode::Int(int)) => Ok(Value::Float(*int as f64)),
        (ScalarKind::Float, ValueNode::Float(float)) => Ok(Value::Float(*float)),
        (ScalarKind::Float, _) => Err(CoercionError::new(format!(
            "Float cannot represent non numeric value: {}",
            node
        ))),
        (ScalarKind::String, ValueNode::String(text)) => Ok(Value::String(text.clone())),
        (ScalarKind::String, _) => Err(CoercionError::new(format!(
            "String cannot represent a non string value: {}",
            node
        ))),
        (ScalarKind::Boolean, ValueNode::Boolean(flag)) => Ok(Value::Boolean(*flag)),
        (ScalarKind::Boolean, _) => Err(CoercionError::new(format!(
            "Boolean cannot represent a non boolean value: {}",
            node
        ))),
        (ScalarKind::Id, ValueNode::String(text)) => Ok(Value::String(text.clone())),
        (ScalarKind::Id, ValueNode::Int(int)) => Ok(Value::String(int.to_string())),
        (ScalarKind::Id, _) => Err(CoercionError::new(format!(
            "ID cannot represent a non-string and non-integer value: {}",
            node
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FieldDefinition, ObjectType};
    use graphweave_language::{parse_value, Source};
    use proptest::prelude::*;

    fn schema() -> Schema {
        Schema::builder()
            .query(ObjectType::new("Query").field(FieldDefinition::new("color", TypeRef::named("Color"))))
            .register(EnumType::new("Color").value("RED").value("GREEN"))
            .build()
            .unwrap()
    }

    fn int() -> TypeRef {
        TypeRef::named("Int")
    }

    fn literal(text: &str) -> ValueNode {
        parse_value(&Source::anonymous(text)).unwrap()
    }

    #[test]
    fn test_serialize_int() {
        let int_type = NamedType::from(ScalarKind::Int);
        assert_eq!(serialize_leaf(&int_type, &Value::Int(7)).unwrap(), Value::Int(7));
        assert_eq!(serialize_leaf(&int_type, &Value::Float(3.0)).unwrap(), Value::Int(3));
        assert_eq!(
            serialize_leaf(&int_type, &Value::Float(1.5)).unwrap_err().message,
            "Int cannot represent non-integer value: 1.5"
        );
        assert_eq!(
            serialize_leaf(&int_type, &Value::Int(3_000_000_000)).unwrap_err().message,
            "Int cannot represent non 32-bit signed integer value: 3000000000"
        );
    }

    #[test]
    fn test_serialize_string_and_id() {
        let string_type = NamedType::from(ScalarKind::String);
        assert_eq!(serialize_leaf(&string_type, &Value::Int(5)).unwrap(), Value::from("5"));
        assert_eq!(serialize_leaf(&string_type, &Value::Boolean(true)).unwrap(), Value::from("true"));
        assert!(serialize_leaf(&string_type, &Value::object()).is_err());

        let id_type = NamedType::from(ScalarKind::Id);
        assert_eq!(serialize_leaf(&id_type, &Value::Int(42)).unwrap(), Value::from("42"));
    }

    #[test]
    fn test_serialize_enum() {
        let schema = schema();
        let color = schema.get_type("Color").unwrap();
        assert_eq!(serialize_leaf(color, &Value::from("RED")).unwrap(), Value::from("RED"));
        assert_eq!(
            serialize_leaf(color, &Value::from("BLUE")).unwrap_err().message,
            "Enum \"Color\" cannot represent value: \"BLUE\""
        );
    }

    #[test]
    fn test_coerce_variable_values() {
        let schema = schema();
        let required = TypeRef::non_null(int());
        assert_eq!(coerce_input_value(&schema, &required, &Value::Int(1)).unwrap(), Value::Int(1));
        assert_eq!(
            coerce_input_value(&schema, &required, &Value::Null).unwrap_err().message,
            "Expected non-nullable type \"Int!\" not to be null."
        );
        assert_eq!(coerce_input_value(&schema, &int(), &Value::Null).unwrap(), Value::Null);
        assert!(coerce_input_value(&schema, &int(), &Value::from("1")).is_err());
        assert_eq!(
            coerce_input_value(&schema, &TypeRef::named("Float"), &Value::Int(2)).unwrap(),
            Value::Float(2.0)
        );
    }

    #[test]
    fn test_coerce_variable_list() {
        let schema = schema();
        let ids = TypeRef::list(TypeRef::named("ID"));
        assert_eq!(
            coerce_input_value(&schema, &ids, &Value::Int(1)).unwrap(),
            Value::List(vec![Value::from("1")])
        );
        let err = coerce_input_value(&schema, &ids, &Value::from(vec![Value::from("a"), Value::Boolean(true)]))
            .unwrap_err();
        assert_eq!(err.path, vec![1]);
        assert_eq!(err.path_below("ids"), "ids[1]");
    }

    #[test]
    fn test_coerce_variable_enum() {
        let schema = schema();
        let color = TypeRef::named("Color");
        assert_eq!(coerce_input_value(&schema, &color, &Value::from("GREEN")).unwrap(), Value::from("GREEN"));
        assert_eq!(
            coerce_input_value(&schema, &color, &Value::from("BLUE")).unwrap_err().message,
            "Value \"BLUE\" does not exist in \"Color\" enum."
        );
    }

    #[test]
    fn test_literal_values() {
        let schema = schema();
        assert_eq!(value_from_ast(&schema, &literal("4"), &int(), None).unwrap(), Value::Int(4));
        assert_eq!(
            value_from_ast(&schema, &literal("4.5"), &int(), None).unwrap_err().message,
            "Int cannot represent non-integer value: 4.5"
        );
        assert_eq!(
            value_from_ast(&schema, &literal("RED"), &TypeRef::named("Color"), None).unwrap(),
            Value::from("RED")
        );
        assert!(value_from_ast(&schema, &literal("\"RED\""), &TypeRef::named("Color"), None).is_err());
        assert_eq!(
            value_from_ast(&schema, &literal("null"), &TypeRef::non_null(int()), None)
                .unwrap_err()
                .message,
            "Expected value of type \"Int!\", found null."
        );
        assert_eq!(
            value_from_ast(&schema, &literal("[1, 2]"), &TypeRef::list(int()), None).unwrap(),
            Value::from(vec![1, 2])
        );
    }

    #[test]
    fn test_literal_variables() {
        let schema = schema();
        let variables: Map = [("n".to_string(), Value::Int(9))].into_iter().collect();
        let node = literal("[$n, $missing]");
        assert_eq!(
            value_from_ast(&schema, &node, &TypeRef::list(int()), Some(&variables)).unwrap(),
            Value::List(vec![Value::Int(9), Value::Null])
        );
        assert_eq!(value_from_ast(&schema, &literal("$x"), &TypeRef::non_null(int()), None).unwrap(), Value::Null);
        assert!(value_from_ast(&schema, &literal("$x"), &TypeRef::non_null(int()), Some(&variables)).is_err());
    }

    proptest! {
        #[test]
        fn test_int_range_respected(n in any::<i64>()) {
            let result = coerce_input_value(&schema(), &int(), &Value::Int(n));
            prop_assert_eq!(result.is_ok(), i32::try_from(n).is_ok());
        }
    }
}
