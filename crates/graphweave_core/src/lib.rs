//! GRAPHWEAVE Core Types
//!
//! Plain data shared by every pipeline stage: the tagged [`Value`] used for
//! variables, root values and response data, the [`Diagnostic`] record and
//! its ordered [`Diagnostics`] accumulator, and the per-request
//! [`RequestContext`] carrying cancellation, deadline and request data.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod context;
pub mod diagnostic;
pub mod error;
pub mod value;

// Re-exports
pub use context::{Interrupt, RequestContext};
pub use diagnostic::{Diagnostic, Diagnostics, Location, PathSegment};
pub use error::{CoreError, CoreResult};
pub use value::{Map, Value};
