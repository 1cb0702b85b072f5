//! GRAPHWEAVE
//!
//! Request pipeline for a GraphQL-style query language. A request, described
//! by [`Params`], is parsed, validated against its [`Schema`] and executed;
//! the first failing stage ends the request and every outcome is reported
//! as one [`ExecutionResult`].
//!
//! Two entry points share the same pipeline:
//!
//! - [`run_async`] resolves sibling fields and list items concurrently on a
//!   worker pool and blocks until the result is assembled.
//! - [`run_sync`] runs every resolver on the calling thread, in selection
//!   order.
//!
//! For resolvers without side effects both produce the same data and the
//! same errors in the same order.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod params;
pub mod pipeline;

// Re-exports
pub use config::PipelineConfig;
pub use error::{PipelineError, PipelineResult};
pub use params::Params;
pub use pipeline::{run_async, run_sync, Pipeline};

pub use graphweave_core::{Diagnostic, Interrupt, Location, Map, PathSegment, RequestContext, Value};
pub use graphweave_runtime::{ExecutionResult, Scheduling};
pub use graphweave_schema::{
    DirectiveDefinition, DirectiveLocation, EnumType, FieldDefinition, FieldError, InputValueDefinition,
    ObjectType, ResolveInfo, Resolver, Schema, SchemaError, TypeRef,
};
pub use graphweave_validate::{RuleSet, ValidationRule};
