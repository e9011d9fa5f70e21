//! Bounded executor for a selected work set.
//!
//! A single dispatcher task walks the items in selection order and admits
//! each one through a semaphore sized to the concurrency limit, so at most
//! `limit` workers plus the dispatcher are alive at once. Workers run the
//! processor and report their timing. The first failure is kept, the run
//! context is cancelled and the dispatcher stops admitting items; workers
//! already running finish on their own terms. Dropping the `execute` future
//! cancels the run the same way.

use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::debug;
use uuid::Uuid;

use platform_core::WorkItem;

use crate::context::RunContext;
use crate::error::{OrchestratorError, Result};
use crate::options::ExecuteOptions;
use crate::processor::ItemProcessor;
use crate::report::RunReporter;

/// Process every item in `items` with bounded concurrency.
///
/// Returns `Ok(())` only if every item was processed successfully. Otherwise
/// returns the first error observed, by completion order; later errors are
/// dropped. A per-item event fires for every processor invocation that
/// completes, and one aggregate event fires once all workers have settled.
///
/// Selection is the caller's job here; see [`execute_selected`].
pub async fn execute<T, P>(
    ctx: &RunContext,
    items: &[Arc<T>],
    processor: P,
    options: &ExecuteOptions,
) -> Result<()>
where
    T: WorkItem + Send + Sync + 'static,
    P: ItemProcessor<T>,
{
    let started = Instant::now();
    let run_id = Uuid::new_v4();
    let limit = effective_limit(options.limit(), items.len());
    let run_ctx = ctx.child();
    let cancel_on_drop = run_ctx.token().clone().drop_guard();
    let reporter = RunReporter::new(
        run_id,
        items.len(),
        options.verbose,
        run_ctx.events().cloned(),
    );

    debug!(run_id = %run_id, total = items.len(), limit, "Dispatching items");

    let run = Arc::new(Run {
        ctx: run_ctx,
        processor,
        reporter: reporter.clone(),
        first_error: Mutex::new(None),
    });

    let dispatcher = tokio::spawn(dispatch(Arc::clone(&run), items.to_vec(), limit));
    if let Err(e) = dispatcher.await {
        run.fail(OrchestratorError::Dispatch(e.to_string()));
    }
    let _ = cancel_on_drop.disarm();

    let outcome = run.take_error();
    reporter.run_completed(started.elapsed(), outcome.is_none());

    match outcome {
        Some(error) => Err(error),
        None => Ok(()),
    }
}

/// Narrow `collection` with `options.selectors`, then [`execute`] the rest.
pub async fn execute_selected<T, P>(
    ctx: &RunContext,
    collection: &[Arc<T>],
    processor: P,
    options: &ExecuteOptions,
) -> Result<()>
where
    T: WorkItem + Send + Sync + 'static,
    P: ItemProcessor<T>,
{
    let selected = options.selectors.select(collection);
    debug!(
        available = collection.len(),
        selected = selected.len(),
        "Selected items"
    );
    execute(ctx, &selected, processor, options).await
}

/// State shared by the dispatcher and every worker of one invocation.
struct Run<P> {
    ctx: RunContext,
    processor: P,
    reporter: RunReporter,
    first_error: Mutex<Option<OrchestratorError>>,
}

impl<P> Run<P> {
    /// Keep `error` if it is the first one and cancel the run.
    fn fail(&self, error: OrchestratorError) {
        let mut slot = self.first_error.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.is_none() {
            *slot = Some(error);
            drop(slot);
            self.ctx.cancel();
        }
    }

    fn take_error(&self) -> Option<OrchestratorError> {
        self.first_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    async fn process<T>(&self, index: usize, item: Arc<T>)
    where
        T: WorkItem + Send + Sync + 'static,
        P: ItemProcessor<T>,
    {
        let description = item.describe();
        if self.ctx.is_cancelled() {
            self.fail(OrchestratorError::cancelled(description));
            return;
        }

        let started = Instant::now();
        let outcome = AssertUnwindSafe(self.processor.process(self.ctx.clone(), index, item))
            .catch_unwind()
            .await;
        let duration = started.elapsed();

        let result = match outcome {
            Ok(Ok(())) => Ok(()),
            Ok(Err(source)) => Err(OrchestratorError::Processing {
                description: description.clone(),
                source,
            }),
            Err(payload) => Err(OrchestratorError::Panicked {
                description: description.clone(),
                message: panic_message(payload.as_ref()),
            }),
        };

        self.reporter
            .item_completed(index + 1, &description, duration, result.is_ok());

        if let Err(error) = result {
            self.fail(error);
        }
    }
}

async fn dispatch<T, P>(run: Arc<Run<P>>, items: Vec<Arc<T>>, limit: usize)
where
    T: WorkItem + Send + Sync + 'static,
    P: ItemProcessor<T>,
{
    let permits = Arc::new(Semaphore::new(limit));
    let mut workers = JoinSet::new();

    for (index, item) in items.into_iter().enumerate() {
        if run.ctx.is_cancelled() {
            run.fail(OrchestratorError::cancelled(item.describe()));
            break;
        }

        let permit = tokio::select! {
            biased;
            _ = run.ctx.cancelled() => {
                run.fail(OrchestratorError::cancelled(item.describe()));
                break;
            }
            permit = Arc::clone(&permits).acquire_owned() => match permit {
                Ok(permit) => permit,
                Err(e) => {
                    run.fail(OrchestratorError::Dispatch(e.to_string()));
                    break;
                }
            },
        };

        let run = Arc::clone(&run);
        workers.spawn(async move {
            let _permit = permit;
            run.process(index, item).await;
        });
    }

    while let Some(joined) = workers.join_next().await {
        if let Err(e) = joined {
            run.fail(OrchestratorError::Dispatch(e.to_string()));
        }
    }
}

/// Never more permits than items, and never more than a semaphore can hold.
fn effective_limit(limit: usize, items: usize) -> usize {
    limit.min(items.max(1)).min(Semaphore::MAX_PERMITS)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panic_message_str() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");
    }

    #[test]
    fn test_panic_message_string() {
        let payload: Box<dyn Any + Send> = Box::new(String::from("kaboom"));
        assert_eq!(panic_message(payload.as_ref()), "kaboom");
    }

    #[test]
    fn test_panic_message_unknown() {
        let payload: Box<dyn Any + Send> = Box::new(7_u32);
        assert_eq!(panic_message(payload.as_ref()), "unknown panic payload");
    }

    #[test]
    fn test_effective_limit_is_bounded() {
        assert_eq!(effective_limit(4, 10), 4);
        assert_eq!(effective_limit(8, 3), 3);
        assert_eq!(effective_limit(8, 0), 1);
        assert_eq!(effective_limit(usize::MAX, usize::MAX), Semaphore::MAX_PERMITS);
    }

    #[test]
    fn test_first_error_wins() {
        let run = Run {
            ctx: RunContext::new(),
            processor: (),
            reporter: RunReporter::new(Uuid::new_v4(), 0, false, None),
            first_error: Mutex::new(None),
        };

        run.fail(OrchestratorError::cancelled("first"));
        run.fail(OrchestratorError::cancelled("second"));

        assert!(run.ctx.is_cancelled());
        let error = run.take_error().unwrap();
        assert_eq!(error.description(), Some("first"));
        assert!(run.take_error().is_none());
    }
}
