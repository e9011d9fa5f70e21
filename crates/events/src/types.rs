//! Event types emitted by orchestrator runs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// Envelope wrapping all events with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// Unique event ID
    pub id: Uuid,
    /// When the event occurred
    pub timestamp: DateTime<Utc>,
    /// The actual event
    pub event: Event,
}

impl EventEnvelope {
    /// Create a new event envelope with auto-generated ID and timestamp
    pub fn new(event: Event) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            event,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// One item finished processing, successfully or not
    #[serde(rename = "item.completed")]
    ItemCompleted {
        run_id: Uuid,
        /// 1-based position among the selected items
        num: usize,
        total: usize,
        description: String,
        duration_ms: u64,
        success: bool,
    },

    /// Every dispatched item has settled
    #[serde(rename = "run.completed")]
    RunCompleted {
        run_id: Uuid,
        total: usize,
        duration_ms: u64,
        success: bool,
    },
}

impl Event {
    pub fn item_completed(
        run_id: Uuid,
        num: usize,
        total: usize,
        description: impl Into<String>,
        duration: Duration,
        success: bool,
    ) -> Self {
        Self::ItemCompleted {
            run_id,
            num,
            total,
            description: description.into(),
            duration_ms: duration_millis(duration),
            success,
        }
    }

    pub fn run_completed(run_id: Uuid, total: usize, duration: Duration, success: bool) -> Self {
        Self::RunCompleted {
            run_id,
            total,
            duration_ms: duration_millis(duration),
            success,
        }
    }

    pub fn run_id(&self) -> Uuid {
        match self {
            Event::ItemCompleted { run_id, .. } => *run_id,
            Event::RunCompleted { run_id, .. } => *run_id,
        }
    }

    pub fn is_item_completed(&self) -> bool {
        matches!(self, Event::ItemCompleted { .. })
    }

    pub fn is_run_completed(&self) -> bool {
        matches!(self, Event::RunCompleted { .. })
    }
}

fn duration_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
