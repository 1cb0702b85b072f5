//! GRAPHWEAVE Validation
//!
//! Checks a parsed [`Document`](graphweave_language::Document) against a
//! [`Schema`](graphweave_schema::Schema) before anything is executed. Each
//! check is a [`ValidationRule`]; [`RuleSet::specified`] holds the standard
//! rules in a fixed order, and [`validate`] runs a set and collects every
//! diagnostic the rules report.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod context;
pub mod nesting;
pub mod rules;
pub mod validator;

pub use context::{ArgumentSite, ArgumentTarget, FieldInfo, ValidationContext};
pub use nesting::check_nesting;
pub use rules::MaxDepth;
pub use validator::{validate, RuleSet, ValidationResult, ValidationRule};
