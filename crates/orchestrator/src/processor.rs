use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;

use crate::context::RunContext;
use crate::error::BoxError;

/// Work applied to each selected item.
///
/// Implementations are expected to watch [`RunContext::cancelled`] during
/// long work and return early once the run is cancelled. Any closure of
/// shape `Fn(RunContext, usize, Arc<T>) -> impl Future<Output = Result<(), BoxError>>`
/// is a processor.
#[async_trait]
pub trait ItemProcessor<T>: Send + Sync + 'static
where
    T: Send + Sync + 'static,
{
    async fn process(&self, ctx: RunContext, index: usize, item: Arc<T>) -> Result<(), BoxError>;
}

#[async_trait]
impl<T, F, Fut> ItemProcessor<T> for F
where
    T: Send + Sync + 'static,
    F: Fn(RunContext, usize, Arc<T>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
{
    async fn process(&self, ctx: RunContext, index: usize, item: Arc<T>) -> Result<(), BoxError> {
        (self)(ctx, index, item).await
    }
}
