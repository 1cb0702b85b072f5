//! GRAPHWEAVE Runtime
//!
//! Executes a validated document against a schema. Field resolution is
//! driven by a [`Scheduling`] strategy: [`Scheduling::SingleThread`] runs
//! every resolver on the polling thread in selection order, while
//! [`Scheduling::WorkerPool`] resolves sibling fields and list items
//! concurrently on the Tokio blocking pool. Both strategies assemble data
//! and errors in selection order, so their results are interchangeable.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod collect;
pub mod executor;
pub mod result;
pub mod scheduling;
pub mod variables;

pub use executor::{execute, ExecuteParams};
pub use result::ExecutionResult;
pub use scheduling::Scheduling;
pub use variables::coerce_variable_values;
