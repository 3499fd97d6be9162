//! lf-core: shared types, IDs, errors, configuration, and run events.
//!
//! This crate is the foundational dependency for all other lf-* crates,
//! providing the unified error type, the resource model, typed identifiers,
//! application configuration, the error-reporting seam, and a broadcast
//! event bus carrying per-stage timings.

pub mod config;
pub mod error;
pub mod events;
pub mod ids;
pub mod invocation;
pub mod report;
pub mod resource;

// Re-export the most commonly used items at the crate root.
pub use error::{Error, Result};
pub use ids::*;
pub use invocation::{StageInvocation, StageOutcome};
pub use report::{ErrorSink, TracingErrorSink};
pub use resource::*;
