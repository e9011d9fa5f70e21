//! Domain types for platform components.
//!
//! A [`Platform`] is a named, ordered collection of [`Component`]s. The
//! [`Selectors`] narrow that collection down to the work set handed to the
//! orchestrator.

pub mod domain;
pub mod error;
pub mod selector;

pub use domain::{Component, Platform, WorkItem};
pub use error::{CoreError, Result};
pub use selector::{LabelRequirement, Selector, Selectors};
