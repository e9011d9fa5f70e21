use platform_core::CoreError;
use thiserror::Error;

/// Error type returned by item processors.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("Selection failed: {0}")]
    Selection(#[from] CoreError),

    #[error("Cancelled before {description} completed")]
    Cancelled { description: String },

    #[error("Processing {description} failed")]
    Processing {
        description: String,
        #[source]
        source: BoxError,
    },

    #[error("Processing {description} panicked: {message}")]
    Panicked { description: String, message: String },

    #[error("Dispatch failed: {0}")]
    Dispatch(String),
}

impl OrchestratorError {
    pub fn cancelled(description: impl Into<String>) -> Self {
        Self::Cancelled {
            description: description.into(),
        }
    }

    pub fn processing(description: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Processing {
            description: description.into(),
            source: source.into(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    /// Description of the item the error originated from, if any.
    pub fn description(&self) -> Option<&str> {
        match self {
            Self::Cancelled { description }
            | Self::Processing { description, .. }
            | Self::Panicked { description, .. } => Some(description),
            Self::Selection(_) | Self::Dispatch(_) => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, OrchestratorError>;
