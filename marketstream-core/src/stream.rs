use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::{JoinError, JoinHandle};

use crate::{StreamError, StreamReport};

/// Receiving side of a cooperative stop request.
///
/// Cloning yields another observer of the same request. A signal whose
/// trigger was dropped without firing never fires.
#[derive(Debug, Clone, Default)]
pub struct StopSignal {
    rx: Option<watch::Receiver<bool>>,
}

impl StopSignal {
    /// A signal that never fires.
    #[must_use]
    pub const fn never() -> Self {
        Self { rx: None }
    }

    /// Returns `true` once a stop was requested.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.rx.as_ref().is_some_and(|rx| *rx.borrow())
    }

    /// Resolve once a stop was requested.
    pub async fn stopped(&mut self) {
        if let Some(rx) = self.rx.as_mut()
            && rx.wait_for(|stopped| *stopped).await.is_ok()
        {
            return;
        }
        std::future::pending::<()>().await;
    }
}

/// Sending side of a cooperative stop request. Clones share the request.
#[derive(Debug, Clone)]
pub struct StopTrigger {
    tx: Arc<watch::Sender<bool>>,
}

impl StopTrigger {
    /// Request a stop. Idempotent.
    pub fn stop(&self) {
        self.tx.send_replace(true);
    }

    /// Returns `true` once [`StopTrigger::stop`] was called.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        *self.tx.borrow()
    }

    /// Another signal observing this trigger.
    #[must_use]
    pub fn signal(&self) -> StopSignal {
        StopSignal {
            rx: Some(self.tx.subscribe()),
        }
    }
}

/// Create a connected trigger/signal pair.
#[must_use]
pub fn stop_channel() -> (StopTrigger, StopSignal) {
    let (tx, rx) = watch::channel(false);
    (StopTrigger { tx: Arc::new(tx) }, StopSignal { rx: Some(rx) })
}

/// Map a task join failure into a `StreamError`.
#[must_use]
pub fn join_error(err: JoinError) -> StreamError {
    if err.is_cancelled() {
        return StreamError::Other("stream task was aborted".into());
    }
    let payload = err.into_panic();
    let msg = payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "opaque panic payload".to_string());
    #[cfg(feature = "tracing")]
    tracing::error!(target: "marketstream", panic = %msg, "stream task panicked");
    StreamError::Other(format!("stream task panicked: {msg}"))
}

/// Handle to a spawned stream.
///
/// Dropping the handle requests a cooperative stop but does not abort the
/// task: a handler invocation in flight always completes.
#[derive(Debug)]
pub struct StreamHandle<T = StreamReport> {
    inner: Option<JoinHandle<Result<T, StreamError>>>,
    stop: Option<StopTrigger>,
}

impl<T> StreamHandle<T> {
    /// Wrap a spawned task and the trigger that stops it.
    #[must_use]
    pub const fn new(inner: JoinHandle<Result<T, StreamError>>, stop: StopTrigger) -> Self {
        Self {
            inner: Some(inner),
            stop: Some(stop),
        }
    }

    /// Request a graceful stop without waiting for it.
    pub fn cancel(&self) {
        if let Some(stop) = &self.stop {
            stop.stop();
        }
    }

    /// Returns `true` once the task has completed.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.inner.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Abort the task immediately, possibly mid-handler.
    pub fn abort(&self) {
        if let Some(h) = &self.inner {
            h.abort();
        }
    }

    /// Wait for the task to finish on its own.
    ///
    /// # Errors
    /// Returns the stream's error, or `StreamError::Other` if the task
    /// panicked or was aborted.
    pub async fn join(mut self) -> Result<T, StreamError> {
        let Some(inner) = self.inner.take() else {
            return Err(StreamError::Other("stream handle already joined".into()));
        };
        let out = inner.await.map_err(join_error)?;
        self.stop.take();
        out
    }

    /// Request a graceful stop and wait for the task to finish.
    ///
    /// # Errors
    /// Same as [`StreamHandle::join`].
    pub async fn stop(self) -> Result<T, StreamError> {
        self.cancel();
        self.join().await
    }
}

impl<T> Drop for StreamHandle<T> {
    fn drop(&mut self) {
        // `join` clears `stop` once the task has finished
        if let Some(stop) = self.stop.take() {
            #[cfg(feature = "tracing")]
            tracing::debug!(target: "marketstream", "stream handle dropped, requesting stop");
            stop.stop();
        }
    }
}
