//! Recursive-descent parser for executable documents.

use crate::ast::{
    Argument, Definition, Directive, Document, Field, FragmentDefinition, FragmentSpread,
    InlineFragment, ObjectField, OperationDefinition, OperationType, Selection, SelectionSet,
    Type, ValueNode, VariableDefinition,
};
use crate::error::SyntaxError;
use crate::lexer::{Lexer, Token, TokenKind};
use crate::source::Source;
use graphweave_core::Location;

/// Deepest nesting of selection sets, list and object values, and list
/// types a document may use
pub const MAX_NESTING: usize = 128;

/// Parse a source into a document
///
/// # Errors
///
/// Returns the first syntax error found
pub fn parse(source: &Source) -> Result<Document, SyntaxError> {
    Parser::new(source)?.parse_document()
}

/// Parse a standalone value literal, for example a variable default
///
/// # Errors
///
/// Returns the first syntax error found
pub fn parse_value(source: &Source) -> Result<ValueNode, SyntaxError> {
    let mut parser = Parser::new(source)?;
    let value = parser.parse_value_literal(false)?;
    parser.expect(&TokenKind::Eof)?;
    Ok(value)
}

/// Parser with one token of lookahead
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    token: Token,
    depth: usize,
}

impl<'a> Parser<'a> {
    /// Create a parser positioned at the first token
    ///
    /// # Errors
    ///
    /// Returns error if the first token cannot be lexed
    pub fn new(source: &'a Source) -> Result<Self, SyntaxError> {
        let mut lexer = Lexer::new(source);
        let token = lexer.next_token()?;
        Ok(Self {
            lexer,
            token,
            depth: 0,
        })
    }

    /// Parse a whole document
    ///
    /// # Errors
    ///
    /// Returns the first syntax error found
    pub fn parse_document(&mut self) -> Result<Document, SyntaxError> {
        let mut definitions = Vec::new();
        loop {
            definitions.push(self.parse_definition()?);
            if self.peek(&TokenKind::Eof) {
                break;
            }
        }
        Ok(Document { definitions })
    }

    fn parse_definition(&mut self) -> Result<Definition, SyntaxError> {
        match &self.token.kind {
            TokenKind::BraceL => Ok(Definition::Operation(self.parse_operation_definition()?)),
            TokenKind::Name(name) => match name.as_str() {
                "query" | "mutation" | "subscription" => {
                    Ok(Definition::Operation(self.parse_operation_definition()?))
                }
                "fragment" => Ok(Definition::Fragment(self.parse_fragment_definition()?)),
                _ => Err(self.unexpected()),
            },
            _ => Err(self.unexpected()),
        }
    }

    fn parse_operation_definition(&mut self) -> Result<OperationDefinition, SyntaxError> {
        let location = self.token.location;
        if self.peek(&TokenKind::BraceL) {
            return Ok(OperationDefinition {
                operation: OperationType::Query,
                name: None,
                variable_definitions: Vec::new(),
                directives: Vec::new(),
                selection_set: self.parse_selection_set()?,
                location,
            });
        }

        let operation = self.parse_operation_type()?;
        let name = if matches!(self.token.kind, TokenKind::Name(_)) {
            Some(self.parse_name()?)
        } else {
            None
        };

        Ok(OperationDefinition {
            operation,
            name,
            variable_definitions: self.parse_variable_definitions()?,
            directives: self.parse_directives(false)?,
            selection_set: self.parse_selection_set()?,
            location,
        })
    }

    fn parse_operation_type(&mut self) -> Result<OperationType, SyntaxError> {
        let operation = match &self.token.kind {
            TokenKind::Name(name) if name == "query" => OperationType::Query,
            TokenKind::Name(name) if name == "mutation" => OperationType::Mutation,
            TokenKind::Name(name) if name == "subscription" => OperationType::Subscription,
            _ => return Err(self.unexpected()),
        };
        self.advance()?;
        Ok(operation)
    }

    fn parse_variable_definitions(&mut self) -> Result<Vec<VariableDefinition>, SyntaxError> {
        if !self.peek(&TokenKind::ParenL) {
            return Ok(Vec::new());
        }
        self.many(&TokenKind::ParenL, &TokenKind::ParenR, Self::parse_variable_definition)
    }

    fn parse_variable_definition(&mut self) -> Result<VariableDefinition, SyntaxError> {
        let location = self.token.location;
        let name = self.parse_variable()?;
        self.expect(&TokenKind::Colon)?;
        let var_type = self.parse_type()?;
        let default_value = if self.skip(&TokenKind::Equals)? {
            Some(self.parse_value_literal(true)?)
        } else {
            None
        };
        Ok(VariableDefinition {
            name,
            var_type,
            default_value,
            directives: self.parse_directives(true)?,
            location,
        })
    }

    fn parse_variable(&mut self) -> Result<String, SyntaxError> {
        self.expect(&TokenKind::Dollar)?;
        self.parse_name()
    }

    fn parse_type(&mut self) -> Result<Type, SyntaxError> {
        let ty = if self.peek(&TokenKind::BracketL) {
            let inner = self.nested(|p| {
                p.advance()?;
                p.parse_type()
            })?;
            self.expect(&TokenKind::BracketR)?;
            Type::List(Box::new(inner))
        } else {
            Type::Named(self.parse_name()?)
        };

        if self.skip(&TokenKind::Bang)? {
            Ok(Type::NonNull(Box::new(ty)))
        } else {
            Ok(ty)
        }
    }

    fn parse_selection_set(&mut self) -> Result<SelectionSet, SyntaxError> {
        let location = self.token.location;
        let selections = self.nested(|p| {
            p.many(&TokenKind::BraceL, &TokenKind::BraceR, Self::parse_selection)
        })?;
        Ok(SelectionSet {
            selections,
            location,
        })
    }

    fn parse_selection(&mut self) -> Result<Selection, SyntaxError> {
        if self.peek(&TokenKind::Spread) {
            self.parse_fragment()
        } else {
            Ok(Selection::Field(self.parse_field()?))
        }
    }

    fn parse_field(&mut self) -> Result<Field, SyntaxError> {
        let location = self.token.location;
        let name_or_alias = self.parse_name()?;
        let (alias, name) = if self.skip(&TokenKind::Colon)? {
            (Some(name_or_alias), self.parse_name()?)
        } else {
            (None, name_or_alias)
        };

        let arguments = self.parse_arguments(false)?;
        let directives = self.parse_directives(false)?;
        let selection_set = if self.peek(&TokenKind::BraceL) {
            Some(self.parse_selection_set()?)
        } else {
            None
        };

        Ok(Field {
            alias,
            name,
            arguments,
            directives,
            selection_set,
            location,
        })
    }

    fn parse_arguments(&mut self, is_const: bool) -> Result<Vec<Argument>, SyntaxError> {
        if !self.peek(&TokenKind::ParenL) {
            return Ok(Vec::new());
        }
        self.many(&TokenKind::ParenL, &TokenKind::ParenR, |p| p.parse_argument(is_const))
    }

    fn parse_argument(&mut self, is_const: bool) -> Result<Argument, SyntaxError> {
        let location = self.token.location;
        let name = self.parse_name()?;
        self.expect(&TokenKind::Colon)?;
        Ok(Argument {
            name,
            value: self.parse_value_literal(is_const)?,
            location,
        })
    }

    fn parse_fragment(&mut self) -> Result<Selection, SyntaxError> {
        let location = self.token.location;
        self.expect(&TokenKind::Spread)?;

        let on_keyword = matches!(&self.token.kind, TokenKind::Name(name) if name == "on");
        if !on_keyword && matches!(self.token.kind, TokenKind::Name(_)) {
            let name = self.parse_name()?;
            return Ok(Selection::FragmentSpread(FragmentSpread {
                name,
                directives: self.parse_directives(false)?,
                location,
            }));
        }

        let type_condition = if on_keyword {
            self.advance()?;
            Some(self.parse_name()?)
        } else {
            None
        };

        Ok(Selection::InlineFragment(InlineFragment {
            type_condition,
            directives: self.parse_directives(false)?,
            selection_set: self.parse_selection_set()?,
            location,
        }))
    }

    fn parse_fragment_definition(&mut self) -> Result<FragmentDefinition, SyntaxError> {
        let location = self.token.location;
        self.expect_keyword("fragment")?;
        if matches!(&self.token.kind, TokenKind::Name(name) if name == "on") {
            return Err(self.unexpected());
        }
        let name = self.parse_name()?;
        self.expect_keyword("on")?;
        let type_condition = self.parse_name()?;

        Ok(FragmentDefinition {
            name,
            type_condition,
            directives: self.parse_directives(false)?,
            selection_set: self.parse_selection_set()?,
            location,
        })
    }

    fn parse_directives(&mut self, is_const: bool) -> Result<Vec<Directive>, SyntaxError> {
        let mut directives = Vec::new();
        while self.peek(&TokenKind::At) {
            let location = self.token.location;
            self.advance()?;
            let name = self.parse_name()?;
            directives.push(Directive {
                name,
                arguments: self.parse_arguments(is_const)?,
                location,
            });
        }
        Ok(directives)
    }

    /// Parse a value; `is_const` rejects variable references
    fn parse_value_literal(&mut self, is_const: bool) -> Result<ValueNode, SyntaxError> {
        let value = match &self.token.kind {
            TokenKind::BracketL => {
                return Ok(ValueNode::List(self.nested(|p| {
                    p.any(&TokenKind::BracketL, &TokenKind::BracketR, |p| {
                        p.parse_value_literal(is_const)
                    })
                })?));
            }
            TokenKind::BraceL => {
                return Ok(ValueNode::Object(self.nested(|p| {
                    p.any(&TokenKind::BraceL, &TokenKind::BraceR, |p| {
                        p.parse_object_field(is_const)
                    })
                })?));
            }
            TokenKind::Dollar if !is_const => {
                return Ok(ValueNode::Variable(self.parse_variable()?));
            }
            TokenKind::Int(text) => match text.parse::<i64>() {
                Ok(i) => ValueNode::Int(i),
                Err(_) => {
                    return Err(self.error_here(format!(
                        "Integer literal {} is out of range.",
                        text
                    )));
                }
            },
            TokenKind::Float(text) => match text.parse::<f64>() {
                Ok(x) => ValueNode::Float(x),
                Err(_) => return Err(self.error_here(format!("Invalid float literal {}.", text))),
            },
            TokenKind::String(s) | TokenKind::BlockString(s) => ValueNode::String(s.clone()),
            TokenKind::Name(name) => match name.as_str() {
                "true" => ValueNode::Boolean(true),
                "false" => ValueNode::Boolean(false),
                "null" => ValueNode::Null,
                other => ValueNode::Enum(other.to_string()),
            },
            _ => return Err(self.unexpected()),
        };
        self.advance()?;
        Ok(value)
    }

    fn parse_object_field(&mut self, is_const: bool) -> Result<ObjectField, SyntaxError> {
        let location = self.token.location;
        let name = self.parse_name()?;
        self.expect(&TokenKind::Colon)?;
        Ok(ObjectField {
            name,
            value: self.parse_value_literal(is_const)?,
            location,
        })
    }

    fn parse_name(&mut self) -> Result<String, SyntaxError> {
        match &self.token.kind {
            TokenKind::Name(name) => {
                let name = name.clone();
                self.advance()?;
                Ok(name)
            }
            _ => Err(self.expected("Name")),
        }
    }

    /// One or more items between delimiters
    fn many<T>(
        &mut self,
        open: &TokenKind,
        close: &TokenKind,
        mut item: impl FnMut(&mut Self) -> Result<T, SyntaxError>,
    ) -> Result<Vec<T>, SyntaxError> {
        self.expect(open)?;
        let mut items = vec![item(self)?];
        while !self.skip(close)? {
            items.push(item(self)?);
        }
        Ok(items)
    }

    /// Zero or more items between delimiters
    fn any<T>(
        &mut self,
        open: &TokenKind,
        close: &TokenKind,
        mut item: impl FnMut(&mut Self) -> Result<T, SyntaxError>,
    ) -> Result<Vec<T>, SyntaxError> {
        self.expect(open)?;
        let mut items = Vec::new();
        while !self.skip(close)? {
            items.push(item(self)?);
        }
        Ok(items)
    }

    /// Run `parse` one nesting level deeper, failing past [`MAX_NESTING`]
    fn nested<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> Result<T, SyntaxError>,
    ) -> Result<T, SyntaxError> {
        if self.depth >= MAX_NESTING {
            return Err(self.error_here(format!(
                "Document nests deeper than {} levels.",
                MAX_NESTING
            )));
        }
        self.depth += 1;
        let parsed = parse(self);
        self.depth -= 1;
        parsed
    }

    fn advance(&mut self) -> Result<(), SyntaxError> {
        self.token = self.lexer.next_token()?;
        Ok(())
    }

    /// Check the current token's kind, ignoring payloads
    fn peek(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(&self.token.kind) == std::mem::discriminant(kind)
    }

    fn skip(&mut self, kind: &TokenKind) -> Result<bool, SyntaxError> {
        if self.peek(kind) {
            self.advance()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn expect(&mut self, kind: &TokenKind) -> Result<(), SyntaxError> {
        if self.peek(kind) {
            self.advance()
        } else {
            Err(self.expected(kind.describe_kind()))
        }
    }

    fn expect_keyword(&mut self, keyword: &str) -> Result<(), SyntaxError> {
        match &self.token.kind {
            TokenKind::Name(name) if name == keyword => self.advance(),
            _ => Err(self.expected(&format!("{:?}", keyword))),
        }
    }

    fn expected(&self, what: &str) -> SyntaxError {
        self.error_here(format!("Expected {}, found {}", what, self.token.kind))
    }

    fn unexpected(&self) -> SyntaxError {
        self.error_here(format!("Unexpected {}", self.token.kind))
    }

    fn error_here(&self, description: impl Into<String>) -> SyntaxError {
        SyntaxError::at(
            self.lexer.source(),
            self.token.start,
            self.token.location,
            description,
        )
    }

    /// Location of the current token
    #[must_use]
    pub fn location(&self) -> Location {
        self.token.location
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_str(body: &str) -> Result<Document, SyntaxError> {
        parse(&Source::anonymous(body))
    }

    fn first_operation(doc: &Document) -> &OperationDefinition {
        doc.operations().next().unwrap()
    }

    #[test]
    fn test_parse_shorthand_query() {
        let doc = parse_str("{ hello }").unwrap();
        let op = first_operation(&doc);
        assert_eq!(op.operation, OperationType::Query);
        assert!(op.name.is_none());
        assert_eq!(op.selection_set.selections.len(), 1);
        match &op.selection_set.selections[0] {
            Selection::Field(field) => {
                assert_eq!(field.name, "hello");
                assert_eq!(field.location, Location::new(1, 3));
            }
            other => panic!("unexpected selection {:?}", other),
        }
    }

    #[test]
    fn test_parse_named_operation_with_variables() {
        let doc = parse_str(
            "query Greet($name: String! = \"x\", $ids: [ID!]) @live { greet(name: $name) }",
        )
        .unwrap();
        let op = first_operation(&doc);
        assert_eq!(op.name.as_deref(), Some("Greet"));
        assert_eq!(op.variable_definitions.len(), 2);
        assert_eq!(op.variable_definitions[0].var_type.to_string(), "String!");
        assert_eq!(
            op.variable_definitions[0].default_value,
            Some(ValueNode::String("x".to_string()))
        );
        assert_eq!(op.variable_definitions[1].var_type.to_string(), "[ID!]");
        assert_eq!(op.directives[0].name, "live");
    }

    #[test]
    fn test_parse_alias_arguments_and_nesting() {
        let doc = parse_str(r#"{ me: user(id: 4, tags: ["a"], filter: {active: true}) { name } }"#)
            .unwrap();
        let Selection::Field(field) = &first_operation(&doc).selection_set.selections[0] else {
            panic!("expected field");
        };
        assert_eq!(field.alias.as_deref(), Some("me"));
        assert_eq!(field.name, "user");
        assert_eq!(field.response_key(), "me");
        assert_eq!(field.arguments.len(), 3);
        assert_eq!(field.argument("id").unwrap().value, ValueNode::Int(4));
        assert!(matches!(
            field.argument("filter").unwrap().value,
            ValueNode::Object(_)
        ));
        assert!(field.selection_set.is_some());
    }

    #[test]
    fn test_parse_fragments() {
        let doc = parse_str(
            "query { ...Parts ... on Query { b } ... @include(if: true) { c } }
             fragment Parts on Query { a }",
        )
        .unwrap();
        let selections = &first_operation(&doc).selection_set.selections;
        assert!(matches!(&selections[0], Selection::FragmentSpread(s) if s.name == "Parts"));
        assert!(matches!(
            &selections[1],
            Selection::InlineFragment(f) if f.type_condition.as_deref() == Some("Query")
        ));
        assert!(matches!(
            &selections[2],
            Selection::InlineFragment(f) if f.type_condition.is_none() && f.directives.len() == 1
        ));
        let frag = doc.fragment("Parts").unwrap();
        assert_eq!(frag.type_condition, "Query");
    }

    #[test]
    fn test_parse_multiple_operations() {
        let doc = parse_str("query A { a } mutation B { b }").unwrap();
        let ops: Vec<_> = doc.operations().collect();
        assert_eq!(ops.len(), 2);
        assert_eq!(ops[1].operation, OperationType::Mutation);
    }

    #[test]
    fn test_unterminated_selection_set() {
        let err = parse_str("{ invalidSyntax").unwrap_err();
        assert_eq!(err.description, "Expected Name, found <EOF>");
        assert_eq!(err.location, Location::new(1, 16));
        assert_eq!(
            err.to_string(),
            "Syntax Error GraphQL request (1:16) Expected Name, found <EOF>"
        );
    }

    #[test]
    fn test_empty_document_is_rejected() {
        let err = parse_str("   ").unwrap_err();
        assert_eq!(err.description, "Unexpected <EOF>");
    }

    #[test]
    fn test_empty_selection_set_is_rejected() {
        assert!(parse_str("{ }").is_err());
    }

    #[test]
    fn test_unknown_definition_keyword() {
        let err = parse_str("type Query { a: Int }").unwrap_err();
        assert_eq!(err.description, "Unexpected Name \"type\"");
    }

    #[test]
    fn test_fragment_named_on_is_rejected() {
        assert!(parse_str("fragment on on Query { a }").is_err());
    }

    #[test]
    fn test_variables_rejected_in_const_positions() {
        assert!(parse_str("query ($a: Int = $b) { a }").is_err());
    }

    #[test]
    fn test_missing_colon_in_argument() {
        let err = parse_str("{ a(x 1) }").unwrap_err();
        assert_eq!(err.description, "Expected \":\", found Int \"1\"");
    }

    #[test]
    fn test_parse_value() {
        let value = parse_value(&Source::anonymous("[1, 2.5, ENUM, null, {a: \"b\"}]")).unwrap();
        assert_eq!(
            value,
            ValueNode::List(vec![
                ValueNode::Int(1),
                ValueNode::Float(2.5),
                ValueNode::Enum("ENUM".to_string()),
                ValueNode::Null,
                ValueNode::Object(vec![ObjectField {
                    name: "a".to_string(),
                    value: ValueNode::String("b".to_string()),
                    location: Location::new(1, 23),
                }]),
            ])
        );
    }

    #[test]
    fn test_int_out_of_range() {
        let err = parse_str("{ a(x: 99999999999999999999) }").unwrap_err();
        assert!(err.description.contains("out of range"));
    }

    #[test]
    fn test_nesting_limit() {
        let depth = MAX_NESTING - 1;
        let within = format!("{{ a(x: {}1{}) }}", "[".repeat(depth), "]".repeat(depth));
        assert!(parse_str(&within).is_ok());

        let err = parse_str(&format!("{{ a(x: {}) }}", "[".repeat(100_000))).unwrap_err();
        assert_eq!(err.description, "Document nests deeper than 128 levels.");
        assert_eq!(err.location, Location::new(1, 7 + MAX_NESTING));

        let err = parse_str(&"{ a ".repeat(50_000)).unwrap_err();
        assert_eq!(err.description, "Document nests deeper than 128 levels.");
        assert!(parse_str(&format!("{{ a(x: {}) }}", "{b: ".repeat(10_000))).is_err());
        assert!(parse_str(&format!("query ($v: {}Int) {{ a }}", "[".repeat(10_000))).is_err());
    }

    #[test]
    fn test_nesting_limit_is_per_path() {
        let wide = format!("{{ {} }}", "a { b } ".repeat(MAX_NESTING * 4));
        assert!(parse_str(&wide).is_ok());
    }

    proptest::proptest! {
        #[test]
        fn test_parse_never_panics(body in "\\PC{0,64}") {
            let _ = parse_str(&body);
        }

        #[test]
        fn test_truncated_documents_fail_cleanly(cut in 1usize..24) {
            let body = "query Q($a: Int = 3) { a(x: $a) { b c } ...F } fragment F on Query { d }";
            let truncated = &body[..body.len() - cut];
            let err = parse_str(truncated).unwrap_err();
            proptest::prop_assert!(err.location.line >= 1);
            proptest::prop_assert!(err.offset <= truncated.len());
        }
    }
}
