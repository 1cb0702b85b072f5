//! Response shape of one request.

use graphweave_core::{CoreResult, Diagnostic, Diagnostics, Value};
use serde::{Deserialize, Serialize};

/// Data and diagnostics produced for one request
///
/// Serializes to the usual response shape: `data` is omitted when absent
/// and `errors` when empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Response data; absent when nothing was executed or execution was aborted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Diagnostics in reporting order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<Diagnostic>,
}

impl ExecutionResult {
    /// Result with data and the errors raised while producing it
    #[must_use]
    pub fn new(data: Value, errors: impl Into<Diagnostics>) -> Self {
        Self {
            data: Some(data),
            errors: errors.into().into_vec(),
        }
    }

    /// Result without data
    #[must_use]
    pub fn from_errors(errors: impl Into<Diagnostics>) -> Self {
        Self {
            data: None,
            errors: errors.into().into_vec(),
        }
    }

    /// Check if no diagnostics were reported
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// Encode as a JSON response body
    ///
    /// # Errors
    ///
    /// Returns error if the data holds a non-finite float
    pub fn to_json(&self) -> CoreResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphweave_core::{Location, PathSegment};

    #[test]
    fn test_response_shape() {
        let data: Value = [("hello", "world")].into_iter().collect();
        let ok = ExecutionResult::new(data, Diagnostics::new());
        assert!(ok.is_ok());
        assert_eq!(ok.to_json().unwrap(), r#"{"data":{"hello":"world"}}"#);

        let failed = ExecutionResult::from_errors(Diagnostic::with_locations("boom", [Location::new(1, 3)]));
        assert_eq!(
            failed.to_json().unwrap(),
            r#"{"errors":[{"message":"boom","locations":[{"line":1,"column":3}]}]}"#
        );
    }

    #[test]
    fn test_partial_result_shape() {
        let data: Value = [("a", Value::Null)].into_iter().collect();
        let error = Diagnostic::new("bad").at_path(vec![PathSegment::from("a")]);
        let partial = ExecutionResult::new(data, error);
        assert_eq!(
            partial.to_json().unwrap(),
            r#"{"data":{"a":null},"errors":[{"message":"bad","path":["a"]}]}"#
        );
        let decoded: ExecutionResult = serde_json::from_str(&partial.to_json().unwrap()).unwrap();
        assert_eq!(decoded, partial);
    }
}
