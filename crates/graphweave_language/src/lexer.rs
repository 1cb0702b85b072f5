//! Lexer for request source text.
//!
//! Produces one token at a time. Whitespace, commas, the byte order mark and
//! comments are skipped. Every token records its byte span and its line and
//! column.

use crate::error::SyntaxError;
use crate::source::Source;
use graphweave_core::Location;
use std::fmt;

/// Kind of a lexical token
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// End of input
    Eof,
    /// `!`
    Bang,
    /// `$`
    Dollar,
    /// `&`
    Amp,
    /// `(`
    ParenL,
    /// `)`
    ParenR,
    /// `...`
    Spread,
    /// `:`
    Colon,
    /// `=`
    Equals,
    /// `@`
    At,
    /// `[`
    BracketL,
    /// `]`
    BracketR,
    /// `{`
    BraceL,
    /// `|`
    Pipe,
    /// `}`
    BraceR,
    /// Identifier
    Name(String),
    /// Integer literal, as written
    Int(String),
    /// Float literal, as written
    Float(String),
    /// Quoted string, escapes resolved
    String(String),
    /// Block string, indentation removed
    BlockString(String),
}

impl TokenKind {
    /// Short description used in "Expected X" messages
    #[must_use]
    pub fn describe_kind(&self) -> &'static str {
        match self {
            Self::Eof => "<EOF>",
            Self::Bang => "\"!\"",
            Self::Dollar => "\"$\"",
            Self::Amp => "\"&\"",
            Self::ParenL => "\"(\"",
            Self::ParenR => "\")\"",
            Self::Spread => "\"...\"",
            Self::Colon => "\":\"",
            Self::Equals => "\"=\"",
            Self::At => "\"@\"",
            Self::BracketL => "\"[\"",
            Self::BracketR => "\"]\"",
            Self::BraceL => "\"{\"",
            Self::Pipe => "\"|\"",
            Self::BraceR => "\"}\"",
            Self::Name(_) => "Name",
            Self::Int(_) => "Int",
            Self::Float(_) => "Float",
            Self::String(_) => "String",
            Self::BlockString(_) => "BlockString",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(v) | Self::Int(v) | Self::Float(v) | Self::String(v) | Self::BlockString(v) => {
                write!(f, "{} {:?}", self.describe_kind(), v)
            }
            other => write!(f, "{}", other.describe_kind()),
        }
    }
}

/// A lexical token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Kind and payload
    pub kind: TokenKind,
    /// Byte offset of the first character
    pub start: usize,
    /// Byte offset one past the last character
    pub end: usize,
    /// Line and column of the first character
    pub location: Location,
}

/// Lexer over a [`Source`]
pub struct Lexer<'a> {
    source: &'a Source,
    body: &'a str,
    pos: usize,
    line: usize,
    column: usize,
    counted: usize,
}

impl<'a> Lexer<'a> {
    /// Create a lexer at the start of a source
    #[must_use]
    pub fn new(source: &'a Source) -> Self {
        Self {
            source,
            body: source.body(),
            pos: 0,
            line: 1,
            column: 0,
            counted: 0,
        }
    }

    /// The source being lexed
    #[must_use]
    pub fn source(&self) -> &'a Source {
        self.source
    }

    /// Lex the next token
    ///
    /// # Errors
    ///
    /// Returns error on characters or literals the grammar does not allow
    pub fn next_token(&mut self) -> Result<Token, SyntaxError> {
        self.skip_ignored();
        let start = self.pos;
        let location = self.location();

        let Some(ch) = self.peek() else {
            return Ok(self.token(TokenKind::Eof, start, location));
        };

        let kind = match ch {
            '!' => self.single(TokenKind::Bang),
            '$' => self.single(TokenKind::Dollar),
            '&' => self.single(TokenKind::Amp),
            '(' => self.single(TokenKind::ParenL),
            ')' => self.single(TokenKind::ParenR),
            ':' => self.single(TokenKind::Colon),
            '=' => self.single(TokenKind::Equals),
            '@' => self.single(TokenKind::At),
            '[' => self.single(TokenKind::BracketL),
            ']' => self.single(TokenKind::BracketR),
            '{' => self.single(TokenKind::BraceL),
            '|' => self.single(TokenKind::Pipe),
            '}' => self.single(TokenKind::BraceR),
            '.' => {
                if self.body[self.pos..].starts_with("...") {
                    self.pos += 3;
                    TokenKind::Spread
                } else {
                    return Err(self.error(start, "Cannot parse the unexpected character '.'."));
                }
            }
            '"' => {
                if self.body[self.pos..].starts_with("\"\"\"") {
                    self.read_block_string(start)?
                } else {
                    self.read_string()?
                }
            }
            '-' | '0'..='9' => self.read_number(start)?,
            c if is_name_start(c) => self.read_name(),
            c => {
                return Err(self.error(
                    start,
                    format!("Cannot parse the unexpected character {:?}.", c),
                ));
            }
        };

        Ok(self.token(kind, start, location))
    }

    fn token(&self, kind: TokenKind, start: usize, location: Location) -> Token {
        Token {
            kind,
            start,
            end: self.pos,
            location,
        }
    }

    fn single(&mut self, kind: TokenKind) -> TokenKind {
        self.pos += 1;
        kind
    }

    fn peek(&self) -> Option<char> {
        self.body[self.pos..].chars().next()
    }

    fn peek_at(&self, skip: usize) -> Option<char> {
        self.body[self.pos..].chars().nth(skip)
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    /// Columns count characters; only the text since the last call is scanned
    fn location(&mut self) -> Location {
        self.column += self.body[self.counted..self.pos].chars().count();
        self.counted = self.pos;
        Location::new(self.line, self.column + 1)
    }

    fn error(&self, offset: usize, description: impl Into<String>) -> SyntaxError {
        SyntaxError::new(self.source, offset, description)
    }

    fn newline(&mut self) {
        self.line += 1;
        self.column = 0;
        self.counted = self.pos;
    }

    fn skip_ignored(&mut self) {
        while let Some(ch) = self.peek() {
            match ch {
                '\u{feff}' | ' ' | '\t' | ',' => {
                    self.bump();
                }
                '\n' => {
                    self.bump();
                    self.newline();
                }
                '\r' => {
                    self.bump();
                    if self.peek() == Some('\n') {
                        self.bump();
                    }
                    self.newline();
                }
                '#' => {
                    while let Some(c) = self.peek() {
                        if c == '\n' || c == '\r' {
                            break;
                        }
                        self.bump();
                    }
                }
                _ => break,
            }
        }
    }

    fn read_name(&mut self) -> TokenKind {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if is_name_continue(c) {
                self.bump();
            } else {
                break;
            }
        }
        TokenKind::Name(self.body[start..self.pos].to_string())
    }

    fn read_number(&mut self, start: usize) -> Result<TokenKind, SyntaxError> {
        let mut is_float = false;

        if self.peek() == Some('-') {
            self.bump();
        }

        if self.peek() == Some('0') {
            self.bump();
            if let Some(c) = self.peek().filter(char::is_ascii_digit) {
                return Err(self.error(
                    self.pos,
                    format!("Invalid number, unexpected digit after 0: {:?}.", c),
                ));
            }
        } else {
            self.read_digits()?;
        }

        if self.peek() == Some('.') {
            is_float = true;
            self.bump();
            self.read_digits()?;
        }

        if matches!(self.peek(), Some('e' | 'E')) {
            is_float = true;
            self.bump();
            if matches!(self.peek(), Some('+' | '-')) {
                self.bump();
            }
            self.read_digits()?;
        }

        if let Some(c) = self.peek().filter(|c| *c == '.' || is_name_start(*c)) {
            return Err(self.error(
                self.pos,
                format!("Invalid number, expected digit but got: {:?}.", c),
            ));
        }

        let text = self.body[start..self.pos].to_string();
        Ok(if is_float {
            TokenKind::Float(text)
        } else {
            TokenKind::Int(text)
        })
    }

    fn read_digits(&mut self) -> Result<(), SyntaxError> {
        match self.peek() {
            Some(c) if c.is_ascii_digit() => {}
            Some(c) => {
                return Err(self.error(
                    self.pos,
                    format!("Invalid number, expected digit but got: {:?}.", c),
                ));
            }
            None => {
                return Err(self.error(self.pos, "Invalid number, expected digit but got: <EOF>."));
            }
        }
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
        }
        Ok(())
    }

    fn read_string(&mut self) -> Result<TokenKind, SyntaxError> {
        self.bump();
        let mut value = String::new();
        loop {
            let at = self.pos;
            match self.bump() {
                None | Some('\n' | '\r') => {
                    return Err(self.error(at, "Unterminated string."));
                }
                Some('"') => return Ok(TokenKind::String(value)),
                Some('\\') => {
                    let escaped = match self.bump() {
                        Some('"') => '"',
                        Some('\\') => '\\',
                        Some('/') => '/',
                        Some('b') => '\u{0008}',
                        Some('f') => '\u{000c}',
                        Some('n') => '\n',
                        Some('r') => '\r',
                        Some('t') => '\t',
                        Some('u') => self.read_unicode_escape(at)?,
                        Some(other) => {
                            return Err(self.error(
                                at,
                                format!("Invalid character escape sequence: \\{}.", other),
                            ));
                        }
                        None => return Err(self.error(at, "Unterminated string.")),
                    };
                    value.push(escaped);
                }
                Some(c) if c < ' ' && c != '\t' => {
                    return Err(self.error(
                        at,
                        format!("Invalid character within String: {:?}.", c),
                    ));
                }
                Some(c) => value.push(c),
            }
        }
    }

    fn read_unicode_escape(&mut self, at: usize) -> Result<char, SyntaxError> {
        let digits_start = self.pos;
        let digits: String = (0..4).filter_map(|i| self.peek_at(i)).collect();
        let code = if digits.len() == 4 && digits.chars().all(|c| c.is_ascii_hexdigit()) {
            u32::from_str_radix(&digits, 16).ok().and_then(char::from_u32)
        } else {
            None
        };
        match code {
            Some(c) => {
                self.pos = digits_start + 4;
                Ok(c)
            }
            None => Err(self.error(
                at,
                format!("Invalid character escape sequence: \\u{}.", digits),
            )),
        }
    }

    fn read_block_string(&mut self, start: usize) -> Result<TokenKind, SyntaxError> {
        self.pos += 3;
        let mut raw = String::new();
        loop {
            if self.body[self.pos..].starts_with("\"\"\"") {
                self.pos += 3;
                return Ok(TokenKind::BlockString(block_string_value(&raw)));
            }
            if self.body[self.pos..].starts_with("\\\"\"\"") {
                self.pos += 4;
                raw.push_str("\"\"\"");
                continue;
            }
            match self.bump() {
                None => return Err(self.error(start, "Unterminated string.")),
                Some('\n') => {
                    raw.push('\n');
                    self.newline();
                }
                Some('\r') => {
                    if self.peek() == Some('\n') {
                        self.bump();
                    }
                    raw.push('\n');
                    self.newline();
                }
                Some(c) => raw.push(c),
            }
        }
    }
}

fn is_name_start(c: char) -> bool {
    c == '_' || c.is_ascii_alphabetic()
}

fn is_name_continue(c: char) -> bool {
    c == '_' || c.is_ascii_alphanumeric()
}

/// Remove common indentation and blank leading/trailing lines from a block string
fn block_string_value(raw: &str) -> String {
    let lines: Vec<&str> = raw.split('\n').collect();

    let common_indent = lines
        .iter()
        .skip(1)
        .filter_map(|line| {
            let indent = line.chars().take_while(|c| *c == ' ' || *c == '\t').count();
            (indent < line.chars().count()).then_some(indent)
        })
        .min()
        .unwrap_or(0);

    let mut dedented: Vec<String> = lines
        .iter()
        .enumerate()
        .map(|(i, line)| {
            if i == 0 {
                (*line).to_string()
            } else {
                line.chars().skip(common_indent).collect()
            }
        })
        .collect();

    let is_blank = |line: &String| line.chars().all(|c| c == ' ' || c == '\t');
    while dedented.first().is_some_and(is_blank) {
        dedented.remove(0);
    }
    while dedented.last().is_some_and(is_blank) {
        dedented.pop();
    }

    dedented.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex_all(body: &str) -> Result<Vec<TokenKind>, SyntaxError> {
        let source = Source::anonymous(body);
        let mut lexer = Lexer::new(&source);
        let mut kinds = Vec::new();
        loop {
            let token = lexer.next_token()?;
            if token.kind == TokenKind::Eof {
                return Ok(kinds);
            }
            kinds.push(token.kind);
        }
    }

    #[test]
    fn test_punctuators_and_names() {
        let kinds = lex_all("{ hello(id: $x) @skip ... }").unwrap();
        assert_eq!(
            kinds,
            vec![
                TokenKind::BraceL,
                TokenKind::Name("hello".to_string()),
                TokenKind::ParenL,
                TokenKind::Name("id".to_string()),
                TokenKind::Colon,
                TokenKind::Dollar,
                TokenKind::Name("x".to_string()),
                TokenKind::ParenR,
                TokenKind::At,
                TokenKind::Name("skip".to_string()),
                TokenKind::Spread,
                TokenKind::BraceR,
            ]
        );
    }

    #[test]
    fn test_skips_commas_and_comments() {
        let kinds = lex_all("a,,b # trailing comment\n c").unwrap();
        assert_eq!(kinds.len(), 3);
    }

    #[test]
    fn test_numbers() {
        assert_eq!(lex_all("0").unwrap(), vec![TokenKind::Int("0".to_string())]);
        assert_eq!(lex_all("-12").unwrap(), vec![TokenKind::Int("-12".to_string())]);
        assert_eq!(lex_all("1.5e3").unwrap(), vec![TokenKind::Float("1.5e3".to_string())]);
        assert_eq!(lex_all("2E-1").unwrap(), vec![TokenKind::Float("2E-1".to_string())]);
    }

    #[test]
    fn test_invalid_numbers() {
        assert!(lex_all("01").is_err());
        assert!(lex_all("1.").is_err());
        assert!(lex_all("1.2.3").is_err());
        assert!(lex_all("12abc").is_err());
        assert!(lex_all("-").is_err());
    }

    #[test]
    fn test_string_escapes() {
        let kinds = lex_all(r#""a\"b\\cA\n""#).unwrap();
        assert_eq!(kinds, vec![TokenKind::String("a\"b\\cA\n".to_string())]);
    }

    #[test]
    fn test_unterminated_string() {
        let err = lex_all("\"abc").unwrap_err();
        assert_eq!(err.description, "Unterminated string.");
        assert!(lex_all("\"abc\ndef\"").is_err());
    }

    #[test]
    fn test_bad_escape() {
        let err = lex_all(r#""\q""#).unwrap_err();
        assert_eq!(err.description, "Invalid character escape sequence: \\q.");
        assert!(lex_all(r#""\u00G1""#).is_err());
    }

    #[test]
    fn test_block_string_dedent() {
        let kinds = lex_all("\"\"\"\n    hello\n      world\n  \"\"\"").unwrap();
        assert_eq!(kinds, vec![TokenKind::BlockString("hello\n  world".to_string())]);
    }

    #[test]
    fn test_block_string_escaped_quotes() {
        let kinds = lex_all(r#""""say \""" ok""""#).unwrap();
        assert_eq!(kinds, vec![TokenKind::BlockString("say \"\"\" ok".to_string())]);
    }

    #[test]
    fn test_unexpected_character() {
        let err = lex_all("{ ? }").unwrap_err();
        assert_eq!(err.description, "Cannot parse the unexpected character '?'.");
        assert_eq!(err.location, Location::new(1, 3));
    }

    #[test]
    fn test_token_locations_track_lines() {
        let source = Source::anonymous("{\n  a\n}");
        let mut lexer = Lexer::new(&source);
        assert_eq!(lexer.next_token().unwrap().location, Location::new(1, 1));
        let name = lexer.next_token().unwrap();
        assert_eq!(name.location, Location::new(2, 3));
        assert_eq!((name.start, name.end), (4, 5));
        assert_eq!(lexer.next_token().unwrap().location, Location::new(3, 1));
    }

    #[test]
    fn test_columns_on_long_lines() {
        let body = format!("\"h\u{e9}llo\" {}\n  b", "a ".repeat(1000));
        let source = Source::anonymous(&body);
        let mut lexer = Lexer::new(&source);
        assert_eq!(lexer.next_token().unwrap().location, Location::new(1, 1));
        let mut last = lexer.next_token().unwrap();
        assert_eq!(last.location, Location::new(1, 9));
        for _ in 1..1000 {
            last = lexer.next_token().unwrap();
        }
        assert_eq!(last.kind, TokenKind::Name("a".to_string()));
        assert_eq!(last.location, Location::new(1, 9 + 2 * 999));
        assert_eq!(lexer.next_token().unwrap().location, Location::new(2, 3));
    }

    #[test]
    fn test_token_display() {
        assert_eq!(TokenKind::Eof.to_string(), "<EOF>");
        assert_eq!(TokenKind::Name("x".to_string()).to_string(), "Name \"x\"");
        assert_eq!(TokenKind::BraceR.to_string(), "\"}\"");
    }
}
