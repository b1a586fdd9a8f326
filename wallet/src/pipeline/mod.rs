//! Sequential transaction pipeline.
//!
//! A run is an explicit state machine over its steps: every suspension,
//! failure and partial completion is visible in the step statuses.

mod engine;
mod error;
mod run;
mod step;

pub use engine::*;
pub use error::*;
pub use run::*;
pub use step::*;
