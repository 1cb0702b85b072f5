//! Argument rules for fields and directives.

use crate::context::{ArgumentSite, ArgumentTarget, ValidationContext};
use crate::validator::ValidationRule;
use graphweave_core::Diagnostics;
use graphweave_language::ValueNode;
use graphweave_schema::value_from_ast;
use indexmap::IndexMap;

/// How a site is named in messages: `field "Query.user"` or `directive "@skip"`
fn describe(site: &ArgumentSite<'_>) -> String {
    match site.target {
        ArgumentTarget::Field(info) => match info.parent_type {
            Some(parent) => format!("field \"{}.{}\"", parent.name, info.field.name),
            None => format!("field \"{}\"", info.field.name),
        },
        ArgumentTarget::Directive { directive, .. } => format!("directive \"@{}\"", directive.name),
    }
}

/// Supplied arguments must be declared by the field or directive
#[derive(Debug, Clone, Copy, Default)]
pub struct KnownArgumentNames;

impl ValidationRule for KnownArgumentNames {
    fn name(&self) -> &'static str {
        "KnownArgumentNames"
    }

    fn validate(&self, context: &ValidationContext<'_>, diagnostics: &mut Diagnostics) {
        for site in context.argument_sites() {
            let Some(definitions) = site.definitions() else {
                continue;
            };
            for argument in site.arguments {
                if !definitions.contains_key(&argument.name) {
                    diagnostics.report(
                        format!("Unknown argument \"{}\" on {}.", argument.name, describe(&site)),
                        [argument.location],
                    );
                }
            }
        }
    }
}

/// An argument may be supplied only once per field or directive
#[derive(Debug, Clone, Copy, Default)]
pub struct UniqueArgumentNames;

impl ValidationRule for UniqueArgumentNames {
    fn name(&self) -> &'static str {
        "UniqueArgumentNames"
    }

    fn validate(&self, context: &ValidationContext<'_>, diagnostics: &mut Diagnostics) {
        for site in context.argument_sites() {
            let mut known = IndexMap::new();
            for argument in site.arguments {
                match known.get(argument.name.as_str()) {
                    Some(&first) => diagnostics.report(
                        format!("There can be only one argument named \"{}\".", argument.name),
                        [first, argument.location],
                    ),
                    None => {
                        known.insert(argument.name.as_str(), argument.location);
                    }
                }
            }
        }
    }
}

/// Literal argument values must fit the declared argument type
///
/// Variable references are not checked here; their values are coerced
/// against the variable's declared type when the request runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArgumentsOfCorrectType;

impl ValidationRule for ArgumentsOfCorrectType {
    fn name(&self) -> &'static str {
        "ArgumentsOfCorrectType"
    }

    fn validate(&self, context: &ValidationContext<'_>, diagnostics: &mut Diagnostics) {
        for site in context.argument_sites() {
            let Some(definitions) = site.definitions() else {
                continue;
            };
            for argument in site.arguments {
                let Some(definition) = definitions.get(&argument.name) else {
                    continue;
                };
                if let Err(err) = value_from_ast(context.schema(), &argument.value, &definition.value_type, None) {
                    let message = if err.path.is_empty() {
                        err.message
                    } else {
                        format!("{} (at {})", err.message, err.path_below(&argument.name))
                    };
                    diagnostics.report(message, [argument.location]);
                }
            }
        }
    }
}

/// Required arguments must be supplied
#[derive(Debug, Clone, Copy, Default)]
pub struct ProvidedNonNullArguments;

impl ValidationRule for ProvidedNonNullArguments {
    fn name(&self) -> &'static str {
        "ProvidedNonNullArguments"
    }

    fn validate(&self, context: &ValidationContext<'_>, diagnostics: &mut Diagnostics) {
        for site in context.argument_sites() {
            let Some(definitions) = site.definitions() else {
                continue;
            };
            for definition in definitions.values().filter(|def| def.is_required()) {
                if site.arguments.iter().any(|argument| argument.name == definition.name) {
                    continue;
                }
                let owner = match site.target {
                    ArgumentTarget::Field(info) => format!("Field \"{}\"", info.field.name),
                    ArgumentTarget::Directive { directive, .. } => format!("Directive \"@{}\"", directive.name),
                };
                diagnostics.report(
                    format!(
                        "{} argument \"{}\" of type \"{}\" is required, but it was not provided.",
                        owner, definition.name, definition.value_type
                    ),
                    [site.location],
                );
            }
        }
    }
}

/// Object literals must not repeat a field name
#[derive(Debug, Clone, Copy, Default)]
pub struct UniqueInputFieldNames;

fn check_object_literals(value: &ValueNode, diagnostics: &mut Diagnostics) {
    match value {
        ValueNode::List(items) => {
            for item in items {
                check_object_literals(item, diagnostics);
            }
        }
        ValueNode::Object(fields) => {
            let mut known = IndexMap::new();
            for field in fields {
                match known.get(field.name.as_str()) {
                    Some(&first) => diagnostics.report(
                        format!("There can be only one input field named \"{}\".", field.name),
                        [first, field.location],
                    ),
                    None => {
                        known.insert(field.name.as_str(), field.location);
                    }
                }
                check_object_literals(&field.value, diagnostics);
            }
        }
        _ => {}
    }
}

impl ValidationRule for UniqueInputFieldNames {
    fn name(&self) -> &'static str {
        "UniqueInputFieldNames"
    }

    fn validate(&self, context: &ValidationContext<'_>, diagnostics: &mut Diagnostics) {
        for site in context.argument_sites() {
            for argument in site.arguments {
                check_object_literals(&argument.value, diagnostics);
            }
        }
    }
}
