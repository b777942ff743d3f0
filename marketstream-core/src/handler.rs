use std::future::Future;

use async_trait::async_trait;

use crate::{MarketDataRecord, StreamError};

/// What a handler wants the stream to do after a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Flow {
    /// Fetch the next record.
    #[default]
    Continue,
    /// Stop the stream gracefully.
    Stop,
}

/// Conversion from a handler's return value into a [`Flow`].
///
/// `false` stops the stream; `()`, `true` and `None` continue it. Errors are
/// passed through unchanged.
pub trait IntoFlow {
    /// Interpret the value.
    ///
    /// # Errors
    /// Returns the handler's own error when the value carries one.
    fn into_flow(self) -> Result<Flow, StreamError>;
}

impl IntoFlow for Flow {
    fn into_flow(self) -> Result<Flow, StreamError> {
        Ok(self)
    }
}

impl IntoFlow for () {
    fn into_flow(self) -> Result<Flow, StreamError> {
        Ok(Flow::Continue)
    }
}

impl IntoFlow for bool {
    fn into_flow(self) -> Result<Flow, StreamError> {
        Ok(if self { Flow::Continue } else { Flow::Stop })
    }
}

impl IntoFlow for Option<bool> {
    fn into_flow(self) -> Result<Flow, StreamError> {
        self.map_or(Ok(Flow::Continue), IntoFlow::into_flow)
    }
}

impl<T: IntoFlow> IntoFlow for Result<T, StreamError> {
    fn into_flow(self) -> Result<Flow, StreamError> {
        self.and_then(IntoFlow::into_flow)
    }
}

/// User callback invoked once per record.
///
/// Implemented for every `Fn(MarketDataRecord) -> impl Future` whose output
/// implements [`IntoFlow`], so plain async functions and closures work as
/// handlers. Invocations for one stream never overlap.
#[async_trait]
pub trait RecordHandler: Send + Sync + 'static {
    /// Process one record.
    async fn on_record(&self, record: MarketDataRecord) -> Result<Flow, StreamError>;
}

#[async_trait]
impl<F, Fut, R> RecordHandler for F
where
    F: Fn(MarketDataRecord) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send,
    R: IntoFlow + Send,
{
    async fn on_record(&self, record: MarketDataRecord) -> Result<Flow, StreamError> {
        (self)(record).await.into_flow()
    }
}
