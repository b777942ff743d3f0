use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use marketstream_core::{
    EntryPoint, FeedConnector, RecordHandler, StopSignal, StreamConfig, StreamError,
    StreamHandle, StreamReport, stop_channel,
};
use serde_json::{Map, Value};

use crate::builder::StreamerBuilder;
use crate::runner;

/// A handler decorated with stream configuration.
///
/// Running it connects to the configured feed and feeds every record to the
/// handler, one at a time, reconnecting according to the configured policy.
/// A `Streamer` can be run any number of times; every run starts from a fresh
/// runner and shares no mutable state with other runs.
pub struct Streamer<H: ?Sized = dyn RecordHandler> {
    pub(crate) name: String,
    pub(crate) config: Arc<StreamConfig>,
    pub(crate) connector: Arc<dyn FeedConnector>,
    pub(crate) handler: Arc<H>,
}

impl Streamer {
    /// Start configuring a stream. Same as [`crate::streamer`].
    #[must_use]
    pub fn builder() -> StreamerBuilder {
        StreamerBuilder::new()
    }
}

impl<H: ?Sized> Clone for Streamer<H> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            config: Arc::clone(&self.config),
            connector: Arc::clone(&self.connector),
            handler: Arc::clone(&self.handler),
        }
    }
}

impl<H: ?Sized> fmt::Debug for Streamer<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Streamer")
            .field("name", &self.name)
            .field("connector", &self.connector.name())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<H: RecordHandler + ?Sized> Streamer<H> {
    /// Name used in reports and logs.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The configuration attached at decoration time.
    #[must_use]
    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    /// Name of the feed connector in use.
    #[must_use]
    pub fn connector_name(&self) -> &'static str {
        self.connector.name()
    }

    /// The wrapped handler.
    #[must_use]
    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// Effective options keyed by option name.
    #[must_use]
    pub fn describe(&self) -> Map<String, Value> {
        self.config.to_options_map()
    }

    /// Run the stream until the handler stops it, the feed ends, or it fails.
    ///
    /// Behavior:
    /// - Records are delivered in production order; the next record is not
    ///   read until the handler finished with the previous one.
    /// - Connection failures are retried per the reconnect policy. The
    ///   attempt counter resets once a record is delivered on a new connection.
    /// - A handler error ends the stream immediately and is returned unchanged.
    ///
    /// # Errors
    /// Returns the handler's error, the raw connection error when
    /// `auto_reconnect` is off, or `StreamError::ReconnectsExhausted`.
    pub async fn run(&self) -> Result<StreamReport, StreamError> {
        self.run_until(StopSignal::never()).await
    }

    /// Like [`Streamer::run`], but also ends with `Termination::Cancelled`
    /// once `stop` fires. The signal is observed between handler invocations
    /// and while waiting for records or reconnect delays.
    ///
    /// # Errors
    /// Same as [`Streamer::run`].
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            target = "marketstream",
            skip(self, stop),
            fields(stream = %self.name, exchange = %self.config.exchange()),
        )
    )]
    pub async fn run_until(&self, stop: StopSignal) -> Result<StreamReport, StreamError> {
        runner::drive(
            &self.name,
            &self.config,
            &*self.connector,
            &*self.handler,
            stop,
        )
        .await
    }

    /// Run the stream on a Tokio task.
    ///
    /// The returned handle stops the stream cooperatively on
    /// [`StreamHandle::stop`], [`StreamHandle::cancel`] or drop.
    #[must_use = "dropping the handle stops the stream"]
    pub fn spawn(&self) -> StreamHandle {
        let (trigger, signal) = stop_channel();
        let me = self.clone();
        let join = tokio::spawn(async move { me.run_until(signal).await });
        StreamHandle::new(join, trigger)
    }
}

#[async_trait]
impl<H: RecordHandler + ?Sized> EntryPoint for Streamer<H> {
    fn name(&self) -> &str {
        &self.name
    }

    fn stream_config(&self) -> Option<&StreamConfig> {
        Some(&self.config)
    }

    async fn run_until(&self, stop: StopSignal) -> Result<StreamReport, StreamError> {
        Streamer::<H>::run_until(self, stop).await
    }
}
