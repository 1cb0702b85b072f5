//! Named request source.

use graphweave_core::Location;

/// Name given to request sources when the caller supplies none
pub const DEFAULT_SOURCE_NAME: &str = "GraphQL request";

/// Request source text with a name used to label diagnostics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    body: String,
    name: String,
}

impl Source {
    /// Create a named source
    pub fn new(body: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            name: name.into(),
        }
    }

    /// Create a source with the default name
    pub fn anonymous(body: impl Into<String>) -> Self {
        Self::new(body, DEFAULT_SOURCE_NAME)
    }

    /// Source text
    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Source name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Line and column of a byte offset into the body
    ///
    /// Offsets past the end map to the position just after the last character.
    #[must_use]
    pub fn location_of(&self, offset: usize) -> Location {
        let mut line = 1;
        let mut column = 1;
        let mut chars = self.body.char_indices().peekable();
        while let Some((index, ch)) = chars.next() {
            if index >= offset {
                break;
            }
            match ch {
                '\n' => {
                    line += 1;
                    column = 1;
                }
                '\r' => {
                    if !matches!(chars.peek(), Some((_, '\n'))) {
                        line += 1;
                        column = 1;
                    }
                }
                _ => column += 1,
            }
        }
        Location::new(line, column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_name() {
        let source = Source::anonymous("{ a }");
        assert_eq!(source.name(), "GraphQL request");
        assert_eq!(source.body(), "{ a }");
    }

    #[test]
    fn test_location_of_first_line() {
        let source = Source::anonymous("{ hello }");
        assert_eq!(source.location_of(0), Location::new(1, 1));
        assert_eq!(source.location_of(2), Location::new(1, 3));
    }

    #[test]
    fn test_location_of_handles_line_terminators() {
        let source = Source::anonymous("{\n  a\r\n  b\r  c }");
        assert_eq!(source.location_of(4), Location::new(2, 3));
        assert_eq!(source.location_of(9), Location::new(3, 3));
        assert_eq!(source.location_of(13), Location::new(4, 3));
    }

    #[test]
    fn test_location_past_end() {
        let source = Source::anonymous("{ a");
        assert_eq!(source.location_of(99), Location::new(1, 4));
    }
}
