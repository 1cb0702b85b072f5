//! Syntax errors.

use crate::source::Source;
use graphweave_core::{Diagnostic, Location};

/// Source text does not conform to the request grammar
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Syntax Error {source_name} ({location}) {description}")]
pub struct SyntaxError {
    /// Name of the source the error was found in
    pub source_name: String,
    /// Byte offset of the offending input
    pub offset: usize,
    /// Line and column of the offending input
    pub location: Location,
    /// What went wrong
    pub description: String,
}

impl SyntaxError {
    /// Create a syntax error at a byte offset of a source
    pub fn new(source: &Source, offset: usize, description: impl Into<String>) -> Self {
        Self {
            source_name: source.name().to_string(),
            offset,
            location: source.location_of(offset),
            description: description.into(),
        }
    }

    /// Create a syntax error at a known location
    pub fn at(source: &Source, offset: usize, location: Location, description: impl Into<String>) -> Self {
        Self {
            source_name: source.name().to_string(),
            offset,
            location,
            description: description.into(),
        }
    }

    /// Format as a response diagnostic
    #[must_use]
    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::with_locations(self.to_string(), [self.location])
    }
}

impl From<SyntaxError> for Diagnostic {
    fn from(err: SyntaxError) -> Self {
        err.to_diagnostic()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_names_source_and_position() {
        let source = Source::new("{ a", "GraphQL request");
        let err = SyntaxError::new(&source, 3, "Expected Name, found <EOF>");
        assert_eq!(
            err.to_string(),
            "Syntax Error GraphQL request (1:4) Expected Name, found <EOF>"
        );
    }

    #[test]
    fn test_diagnostic_carries_location() {
        let source = Source::new("\n  }", "req.graphql");
        let diag: Diagnostic = SyntaxError::new(&source, 3, "Unexpected \"}\"").into();
        assert_eq!(diag.locations, vec![Location::new(2, 3)]);
        assert!(diag.message.starts_with("Syntax Error req.graphql (2:3)"));
        assert!(diag.path.is_none());
    }
}
