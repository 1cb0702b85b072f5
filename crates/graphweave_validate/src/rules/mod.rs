//! Standard validation rules.
//!
//! Messages follow the wording clients of GraphQL servers expect, so error
//! text can be compared across implementations.

mod arguments;
mod depth;
mod directives;
mod fields;
mod fragments;
mod operations;
mod overlap;
mod types;
mod variables;

pub use arguments::{
    ArgumentsOfCorrectType, KnownArgumentNames, ProvidedNonNullArguments, UniqueArgumentNames,
    UniqueInputFieldNames,
};
pub use depth::MaxDepth;
pub use directives::KnownDirectives;
pub use fields::{FieldsOnCorrectType, ScalarLeafs};
pub use fragments::{KnownFragmentNames, NoFragmentCycles, NoUnusedFragments, UniqueFragmentNames};
pub use operations::{LoneAnonymousOperation, UniqueOperationNames};
pub use overlap::OverlappingFieldsCanBeMerged;
pub use types::{FragmentsOnCompositeTypes, KnownTypeNames, VariablesAreInputTypes};
pub use variables::{NoUndefinedVariables, NoUnusedVariables, UniqueVariableNames};
