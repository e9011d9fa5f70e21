//! Run events for the platform orchestrator
//!
//! This crate provides the event bus and the structured events emitted
//! while a work set is processed. Consumers subscribe to observe per-item
//! completions and the aggregate run outcome.

mod bus;
mod types;

pub use bus::{EventBus, EventRecorder};
pub use types::*;
