//! Bounded-concurrency orchestration of a selected work set.
//!
//! [`execute`] runs an [`ItemProcessor`] over every selected item with at
//! most [`ExecuteOptions::limit`] items in flight. The first failure cancels
//! the run's [`RunContext`], stops further dispatch and becomes the single
//! error returned to the caller.

pub mod context;
pub mod error;
pub mod executor;
pub mod options;
pub mod processor;
mod report;

pub use context::RunContext;
pub use error::{BoxError, OrchestratorError, Result};
pub use executor::{execute, execute_selected};
pub use options::ExecuteOptions;
pub use processor::ItemProcessor;
