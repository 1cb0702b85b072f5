//! Coercion of request variables against an operation's declarations.

use graphweave_core::{Diagnostic, Diagnostics, Map};
use graphweave_language::OperationDefinition;
use graphweave_schema::{coerce_input_value, value_from_ast, Schema, TypeRef};

/// Check supplied variable values against the operation's variable definitions
///
/// Declared defaults fill in omitted variables. Variables that are neither
/// supplied nor defaulted are left out of the result, so arguments bound to
/// them fall back to their own defaults. Values for undeclared names are
/// ignored.
///
/// # Errors
///
/// Returns every problem found, one diagnostic per variable
pub fn coerce_variable_values(
    schema: &Schema,
    operation: &OperationDefinition,
    inputs: &Map,
) -> Result<Map, Diagnostics> {
    let mut coerced = Map::new();
    let mut errors = Diagnostics::new();

    for definition in &operation.variable_definitions {
        let name = definition.name.as_str();
        let var_type = TypeRef::from(&definition.var_type);
        let report = |message: String| Diagnostic::with_locations(message, [definition.location]);

        if !schema.is_input_type(&var_type) {
            errors.push(report(format!(
                "Variable \"${}\" expected value of type \"{}\" which cannot be used as an input type.",
                name, var_type
            )));
            continue;
        }

        let Some(value) = inputs.get(name) else {
            if let Some(default) = &definition.default_value {
                match value_from_ast(schema, default, &var_type, None) {
                    Ok(value) => {
                        coerced.insert(name.to_string(), value);
                    }
                    Err(err) => errors.push(report(format!(
                        "Variable \"${}\" has invalid default value {}; {}",
                        name, default, err
                    ))),
                }
            } else if var_type.is_non_null() {
                errors.push(report(format!(
                    "Variable \"${}\" of required type \"{}\" was not provided.",
                    name, var_type
                )));
            }
            continue;
        };

        if value.is_null() && var_type.is_non_null() {
            errors.push(report(format!(
                "Variable \"${}\" of non-null type \"{}\" must not be null.",
                name, var_type
            )));
            continue;
        }

        match coerce_input_value(schema, &var_type, value) {
            Ok(value) => {
                coerced.insert(name.to_string(), value);
            }
            Err(err) if err.path.is_empty() => errors.push(report(format!(
                "Variable \"${}\" got invalid value {}; {}",
                name, value, err
            ))),
            Err(err) => errors.push(report(format!(
                "Variable \"${}\" got invalid value {} at \"{}\"; {}",
                name,
                value,
                err.path_below(name),
                err
            ))),
        }
    }

    if errors.is_empty() {
        Ok(coerced)
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphweave_core::{Location, Value};
    use graphweave_language::{parse, Source};
    use graphweave_schema::{FieldDefinition, ObjectType};

    fn schema() -> Schema {
        Schema::builder()
            .query(ObjectType::new("Query").field(FieldDefinition::new("hello", TypeRef::named("String"))))
            .build()
            .unwrap()
    }

    fn coerce(text: &str, inputs: &[(&str, Value)]) -> Result<Map, Vec<String>> {
        let document = parse(&Source::anonymous(text)).unwrap();
        let operation = document.operations().next().unwrap();
        let inputs: Map = inputs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect();
        coerce_variable_values(&schema(), operation, &inputs)
            .map_err(|errors| errors.into_iter().map(|d| d.message).collect())
    }

    #[test]
    fn test_supplied_and_defaulted() {
        let coerced = coerce(
            "query Q($a: Int!, $b: String = \"x\", $c: Float, $d: Boolean) { hello }",
            &[("a", Value::Int(1)), ("c", Value::Int(2)), ("unused", Value::Null)],
        )
        .unwrap();
        assert_eq!(coerced.get("a"), Some(&Value::Int(1)));
        assert_eq!(coerced.get("b"), Some(&Value::from("x")));
        assert_eq!(coerced.get("c"), Some(&Value::Float(2.0)));
        assert!(!coerced.contains_key("d"));
        assert!(!coerced.contains_key("unused"));
    }

    #[test]
    fn test_explicit_null_is_kept() {
        let coerced = coerce("query Q($b: String = \"x\") { hello }", &[("b", Value::Null)]).unwrap();
        assert_eq!(coerced.get("b"), Some(&Value::Null));
    }

    #[test]
    fn test_missing_and_null_required() {
        let errors = coerce("query Q($a: Int!, $b: ID!) { hello }", &[("b", Value::Null)]).unwrap_err();
        assert_eq!(
            errors,
            vec![
                "Variable \"$a\" of required type \"Int!\" was not provided.",
                "Variable \"$b\" of non-null type \"ID!\" must not be null.",
            ]
        );
    }

    #[test]
    fn test_invalid_values() {
        let errors = coerce(
            "query Q($a: Int, $ids: [ID]) { hello }",
            &[("a", Value::Float(1.5)), ("ids", Value::from(vec![Value::from("a"), Value::Boolean(true)]))],
        )
        .unwrap_err();
        assert_eq!(
            errors,
            vec![
                "Variable \"$a\" got invalid value 1.5; Int cannot represent non-integer value: 1.5",
                "Variable \"$ids\" got invalid value [\"a\", true] at \"ids[1]\"; ID cannot represent value: true",
            ]
        );
    }

    #[test]
    fn test_error_location() {
        let document = parse(&Source::anonymous("query Q(\n  $a: Int!\n) { hello }")).unwrap();
        let operation = document.operations().next().unwrap();
        let errors = coerce_variable_values(&schema(), operation, &Map::new()).unwrap_err();
        assert_eq!(errors.iter().next().unwrap().locations, vec![Location::new(2, 3)]);
    }
}
