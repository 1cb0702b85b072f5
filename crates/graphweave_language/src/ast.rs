//! Syntax tree of an executable request document.
//!
//! Every node records the [`Location`] of its first token. The tree is
//! immutable once parsed and is shared read-only by validation and execution.

use graphweave_core::Location;
use std::fmt;

/// A parsed request document
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Definitions in source order
    pub definitions: Vec<Definition>,
}

impl Document {
    /// Operation definitions in source order
    pub fn operations(&self) -> impl Iterator<Item = &OperationDefinition> {
        self.definitions.iter().filter_map(|def| match def {
            Definition::Operation(op) => Some(op),
            Definition::Fragment(_) => None,
        })
    }

    /// Fragment definitions in source order
    pub fn fragments(&self) -> impl Iterator<Item = &FragmentDefinition> {
        self.definitions.iter().filter_map(|def| match def {
            Definition::Fragment(frag) => Some(frag),
            Definition::Operation(_) => None,
        })
    }

    /// First fragment definition with the given name
    #[must_use]
    pub fn fragment(&self, name: &str) -> Option<&FragmentDefinition> {
        self.fragments().find(|frag| frag.name == name)
    }
}

/// Top-level definition
#[derive(Debug, Clone, PartialEq)]
pub enum Definition {
    /// Query, mutation or subscription
    Operation(OperationDefinition),
    /// Named fragment
    Fragment(FragmentDefinition),
}

/// Kind of operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationType {
    /// Read-only query
    Query,
    /// Mutation, root fields run in order
    Mutation,
    /// Subscription
    Subscription,
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Query => write!(f, "query"),
            Self::Mutation => write!(f, "mutation"),
            Self::Subscription => write!(f, "subscription"),
        }
    }
}

/// An operation definition
#[derive(Debug, Clone, PartialEq)]
pub struct OperationDefinition {
    /// Kind of operation
    pub operation: OperationType,
    /// Optional operation name
    pub name: Option<String>,
    /// Declared variables
    pub variable_definitions: Vec<VariableDefinition>,
    /// Directives on the operation
    pub directives: Vec<Directive>,
    /// Root selection set
    pub selection_set: SelectionSet,
    /// Location of the first token
    pub location: Location,
}

/// A declared variable
#[derive(Debug, Clone, PartialEq)]
pub struct VariableDefinition {
    /// Variable name without `$`
    pub name: String,
    /// Declared type
    pub var_type: Type,
    /// Default value, if any
    pub default_value: Option<ValueNode>,
    /// Directives on the variable
    pub directives: Vec<Directive>,
    /// Location of `$`
    pub location: Location,
}

/// A type reference in a variable definition
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    /// Named type
    Named(String),
    /// List of the inner type
    List(Box<Type>),
    /// Non-null inner type
    NonNull(Box<Type>),
}

impl Type {
    /// Innermost named type
    #[must_use]
    pub fn base_name(&self) -> &str {
        match self {
            Self::Named(name) => name,
            Self::List(inner) | Self::NonNull(inner) => inner.base_name(),
        }
    }

    /// Check for a non-null wrapper
    #[must_use]
    pub const fn is_non_null(&self) -> bool {
        matches!(self, Self::NonNull(_))
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => write!(f, "{}", name),
            Self::List(inner) => write!(f, "[{}]", inner),
            Self::NonNull(inner) => write!(f, "{}!", inner),
        }
    }
}

/// A selection set
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionSet {
    /// Selections in source order
    pub selections: Vec<Selection>,
    /// Location of `{`
    pub location: Location,
}

/// One entry of a selection set
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    /// Field selection
    Field(Field),
    /// `...Name`
    FragmentSpread(FragmentSpread),
    /// `... on Type { }`
    InlineFragment(InlineFragment),
}

impl Selection {
    /// Directives attached to the selection
    #[must_use]
    pub fn directives(&self) -> &[Directive] {
        match self {
            Self::Field(field) => &field.directives,
            Self::FragmentSpread(spread) => &spread.directives,
            Self::InlineFragment(inline) => &inline.directives,
        }
    }
}

/// A field selection
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    /// Alias, if any
    pub alias: Option<String>,
    /// Field name
    pub name: String,
    /// Arguments in source order
    pub arguments: Vec<Argument>,
    /// Directives on the field
    pub directives: Vec<Directive>,
    /// Sub-selection, if any
    pub selection_set: Option<SelectionSet>,
    /// Location of the alias or name
    pub location: Location,
}

impl Field {
    /// Key of this field in the response object
    #[must_use]
    pub fn response_key(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }

    /// Argument node by name
    #[must_use]
    pub fn argument(&self, name: &str) -> Option<&Argument> {
        self.arguments.iter().find(|arg| arg.name == name)
    }
}

/// A named argument
#[derive(Debug, Clone, PartialEq)]
pub struct Argument {
    /// Argument name
    pub name: String,
    /// Literal or variable value
    pub value: ValueNode,
    /// Location of the name
    pub location: Location,
}

/// `...FragmentName`
#[derive(Debug, Clone, PartialEq)]
pub struct FragmentSpread {
    /// Fragment name
    pub name: String,
    /// Directives on the spread
    pub directives: Vec<Directive>,
    /// Location of `...`
    pub location: Location,
}

/// `... on Type { }`
#[derive(Debug, Clone, PartialEq)]
pub struct InlineFragment {
    /// Type condition, if any
    pub type_condition: Option<String>,
    /// Directives on the fragment
    pub directives: Vec<Directive>,
    /// Fragment selections
    pub selection_set: SelectionSet,
    /// Location of `...`
    pub location: Location,
}

/// `fragment Name on Type { }`
#[derive(Debug, Clone, PartialEq)]
pub struct FragmentDefinition {
    /// Fragment name
    pub name: String,
    /// Type condition
    pub type_condition: String,
    /// Directives on the definition
    pub directives: Vec<Directive>,
    /// Fragment selections
    pub selection_set: SelectionSet,
    /// Location of `fragment`
    pub location: Location,
}

/// `@name(args)`
#[derive(Debug, Clone, PartialEq)]
pub struct Directive {
    /// Directive name without `@`
    pub name: String,
    /// Arguments in source order
    pub arguments: Vec<Argument>,
    /// Location of `@`
    pub location: Location,
}

impl Directive {
    /// Argument node by name
    #[must_use]
    pub fn argument(&self, name: &str) -> Option<&Argument> {
        self.arguments.iter().find(|arg| arg.name == name)
    }
}

/// A value literal or variable reference
#[derive(Debug, Clone, PartialEq)]
pub enum ValueNode {
    /// `$name`
    Variable(String),
    /// Integer literal
    Int(i64),
    /// Float literal
    Float(f64),
    /// String or block string literal
    String(String),
    /// `true` or `false`
    Boolean(bool),
    /// `null`
    Null,
    /// Bare enum value
    Enum(String),
    /// `[ ... ]`
    List(Vec<ValueNode>),
    /// `{ name: value }`
    Object(Vec<ObjectField>),
}

impl ValueNode {
    /// Names of every variable referenced inside this value
    #[must_use]
    pub fn variables(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_variables(&mut names);
        names
    }

    fn collect_variables<'a>(&'a self, names: &mut Vec<&'a str>) {
        match self {
            Self::Variable(name) => names.push(name),
            Self::List(items) => items.iter().for_each(|item| item.collect_variables(names)),
            Self::Object(fields) => fields.iter().for_each(|f| f.value.collect_variables(names)),
            _ => {}
        }
    }
}

impl fmt::Display for ValueNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Variable(name) => write!(f, "${}", name),
            Self::Int(i) => write!(f, "{}", i),
            Self::Float(x) => write!(f, "{}", x),
            Self::String(s) => write!(f, "{:?}", s),
            Self::Boolean(b) => write!(f, "{}", b),
            Self::Null => write!(f, "null"),
            Self::Enum(name) => write!(f, "{}", name),
            Self::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Self::Object(fields) => {
                write!(f, "{{")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", field.name, field.value)?;
                }
                write!(f, "}}")
            }
        }
    }
}

/// One entry of an object literal
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectField {
    /// Field name
    pub name: String,
    /// Field value
    pub value: ValueNode,
    /// Location of the name
    pub location: Location,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_display() {
        let ty = Type::NonNull(Box::new(Type::List(Box::new(Type::NonNull(Box::new(
            Type::Named("Int".to_string()),
        ))))));
        assert_eq!(ty.to_string(), "[Int!]!");
        assert_eq!(ty.base_name(), "Int");
        assert!(ty.is_non_null());
    }

    #[test]
    fn test_value_variables() {
        let value = ValueNode::List(vec![
            ValueNode::Variable("a".to_string()),
            ValueNode::Object(vec![ObjectField {
                name: "x".to_string(),
                value: ValueNode::Variable("b".to_string()),
                location: Location::new(1, 1),
            }]),
            ValueNode::Int(3),
        ]);
        assert_eq!(value.variables(), vec!["a", "b"]);
        assert_eq!(value.to_string(), "[$a, {x: $b}, 3]");
    }

    #[test]
    fn test_response_key_prefers_alias() {
        let field = Field {
            alias: Some("greeting".to_string()),
            name: "hello".to_string(),
            arguments: Vec::new(),
            directives: Vec::new(),
            selection_set: None,
            location: Location::new(1, 3),
        };
        assert_eq!(field.response_key(), "greeting");
    }
}
