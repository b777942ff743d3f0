use async_trait::async_trait;

use crate::{StopSignal, StreamConfig, StreamError, StreamReport};

/// A named, runnable unit of streaming work.
///
/// Decorated streams expose their [`StreamConfig`]; plain tasks return `None`
/// from [`EntryPoint::stream_config`], which is how introspection and the
/// multi-stream orchestrator tell the two apart.
#[async_trait]
pub trait EntryPoint: Send + Sync {
    /// Name of the entry point, used in reports and logs.
    fn name(&self) -> &str;

    /// Stream metadata attached at decoration time, if any.
    fn stream_config(&self) -> Option<&StreamConfig> {
        None
    }

    /// Run until the unit finishes or `stop` fires.
    ///
    /// # Errors
    /// Returns the error that terminated the unit.
    async fn run_until(&self, stop: StopSignal) -> Result<StreamReport, StreamError>;
}
