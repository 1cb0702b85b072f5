//! GRAPHWEAVE Language
//!
//! Lexer and recursive-descent parser that turn request source text into an
//! executable [`Document`]. Only executable definitions (operations and
//! fragments) are accepted.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod ast;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod source;

pub use ast::{
    Argument, Definition, Directive, Document, Field, FragmentDefinition, FragmentSpread,
    InlineFragment, ObjectField, OperationDefinition, OperationType, Selection, SelectionSet,
    Type, ValueNode, VariableDefinition,
};
pub use error::SyntaxError;
pub use lexer::{Lexer, Token, TokenKind};
pub use parser::{parse, parse_value, Parser, MAX_NESTING};
pub use source::Source;
