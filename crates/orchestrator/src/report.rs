//! Tiered completion logging for a run.
//!
//! Every record goes to `tracing` (INFO when verbose, DEBUG otherwise) and,
//! when the run context carries one, to the event bus.

use events::{Event, EventBus, EventEnvelope};
use std::time::Duration;
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub(crate) struct RunReporter {
    run_id: Uuid,
    total: usize,
    verbose: bool,
    bus: Option<EventBus>,
}

impl RunReporter {
    pub(crate) fn new(run_id: Uuid, total: usize, verbose: bool, bus: Option<EventBus>) -> Self {
        Self {
            run_id,
            total,
            verbose,
            bus,
        }
    }

    /// `num` is the 1-based position among the selected items.
    pub(crate) fn item_completed(
        &self,
        num: usize,
        description: &str,
        duration: Duration,
        success: bool,
    ) {
        let message = if success {
            format!("processed {} in {:?}", description, duration)
        } else {
            format!("failed {} after {:?}", description, duration)
        };

        if self.verbose {
            info!(
                run_id = %self.run_id,
                num,
                total = self.total,
                item = %description,
                ?duration,
                success,
                "{}",
                message
            );
        } else {
            debug!(
                run_id = %self.run_id,
                num,
                total = self.total,
                item = %description,
                ?duration,
                success,
                "{}",
                message
            );
        }

        self.publish(Event::item_completed(
            self.run_id,
            num,
            self.total,
            description,
            duration,
            success,
        ));
    }

    pub(crate) fn run_completed(&self, duration: Duration, success: bool) {
        let message = format!("processed {} items in {:?}", self.total, duration);

        if self.verbose {
            info!(run_id = %self.run_id, total = self.total, ?duration, success, "{}", message);
        } else {
            debug!(run_id = %self.run_id, total = self.total, ?duration, success, "{}", message);
        }

        self.publish(Event::run_completed(
            self.run_id,
            self.total,
            duration,
            success,
        ));
    }

    fn publish(&self, event: Event) {
        if let Some(ref bus) = self.bus {
            bus.publish(EventEnvelope::new(event));
        }
    }
}
