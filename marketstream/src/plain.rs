use std::future::Future;

use async_trait::async_trait;
use marketstream_core::{EntryPoint, StopSignal, StreamError, StreamReport, Termination};

/// An undecorated unit of async work.
///
/// It can be run on its own but carries no stream configuration, so
/// introspection reports `StreamError::NotDecorated` for it and the
/// multi-stream orchestrator refuses it.
pub struct PlainTask<F> {
    name: String,
    task: F,
}

impl<F, Fut> PlainTask<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), StreamError>> + Send,
{
    /// Wrap `task` under `name`.
    pub fn new(name: impl Into<String>, task: F) -> Self {
        Self {
            name: name.into(),
            task,
        }
    }
}

#[async_trait]
impl<F, Fut> EntryPoint for PlainTask<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), StreamError>> + Send,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn run_until(&self, mut stop: StopSignal) -> Result<StreamReport, StreamError> {
        let termination = tokio::select! {
            biased;
            () = stop.stopped() => Termination::Cancelled,
            res = (self.task)() => {
                res?;
                Termination::Stopped
            }
        };
        Ok(StreamReport {
            name: self.name.clone(),
            exchange: String::new(),
            termination,
            delivered: 0,
            reconnects: 0,
        })
    }
}
