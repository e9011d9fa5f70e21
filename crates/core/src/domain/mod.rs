mod component;
mod platform;

pub use component::{Component, WorkItem};
pub use platform::Platform;
