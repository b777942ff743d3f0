use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use marketstream_core::{
    FeedConnector, RecordHandler, StreamConfig, StreamConfigBuilder, StreamError, StreamOptions,
};
use marketstream_mock::SyntheticConnector;

use crate::streamer::Streamer;

/// Start configuring a stream.
///
/// ```rust,ignore
/// let stream = marketstream::streamer()
///     .exchange("binance")
///     .symbols(["BTC/USDT"])
///     .timeframe("1m")
///     .build(|record: MarketDataRecord| async move {
///         println!("{} @ {}", record.symbol, record.price);
///     })?;
/// stream.run().await?;
/// ```
#[must_use]
pub fn streamer() -> StreamerBuilder {
    StreamerBuilder::new()
}

/// Decorator factory: collects stream options, the feed and a name.
///
/// Nothing is validated until [`StreamerBuilder::decorator`] or
/// [`StreamerBuilder::build`], which fail with `StreamError::Configuration`
/// naming the first invalid option.
#[derive(Clone, Default)]
pub struct StreamerBuilder {
    config: StreamConfigBuilder,
    connector: Option<Arc<dyn FeedConnector>>,
    name: Option<String>,
}

impl StreamerBuilder {
    /// Create a builder with default options and the synthetic feed.
    ///
    /// Defaults: exchange `binance`, symbols `BTC/USDT` and `ETH/USDT`,
    /// timeframe `1m`, automatic reconnects every 5 s, at most 3 in a row.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Exchange identifier; compared and stored lower-cased.
    #[must_use]
    pub fn exchange(mut self, exchange: impl Into<String>) -> Self {
        self.config = self.config.exchange(exchange);
        self
    }

    /// Trading pairs to stream. Must be non-empty.
    #[must_use]
    pub fn symbols<I, S>(mut self, symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config = self.config.symbols(symbols);
        self
    }

    /// Candle interval, as a token such as `"5m"` or a `Timeframe`.
    ///
    /// Behavior and trade-offs:
    /// - The synthetic feed paces records from the timeframe: `1m` yields about
    ///   one record per second, longer timeframes proportionally fewer.
    #[must_use]
    pub fn timeframe(mut self, timeframe: impl std::fmt::Display) -> Self {
        self.config = self.config.timeframe(timeframe);
        self
    }

    /// Toggle automatic reconnection after connection failures.
    ///
    /// Behavior and trade-offs:
    /// - When disabled, the first connection failure ends the stream and the
    ///   raw connection error is returned.
    #[must_use]
    pub fn auto_reconnect(mut self, yes: bool) -> Self {
        self.config = self.config.auto_reconnect(yes);
        self
    }

    /// Wait before each reconnection attempt.
    #[must_use]
    pub fn reconnect_delay(mut self, delay: Duration) -> Self {
        self.config = self.config.reconnect_delay(delay);
        self
    }

    /// Wait before each reconnection attempt, in seconds.
    #[must_use]
    pub fn reconnect_delay_secs(mut self, secs: f64) -> Self {
        self.config = self.config.reconnect_delay_secs(secs);
        self
    }

    /// Consecutive reconnects allowed before the stream fails.
    ///
    /// Behavior and trade-offs:
    /// - The counter resets after a record is delivered on a new connection,
    ///   so a flaky but working feed is never given up on.
    /// - `0` makes the first connection failure terminal while still
    ///   reporting `StreamError::ReconnectsExhausted`.
    #[must_use]
    pub fn max_reconnect_attempts(mut self, attempts: i64) -> Self {
        self.config = self.config.max_reconnect_attempts(attempts);
        self
    }

    /// Retry connection failures forever.
    #[must_use]
    pub fn unbounded_reconnects(mut self) -> Self {
        self.config = self.config.unbounded_reconnects();
        self
    }

    /// Multiply the reconnect delay by `factor` after each consecutive attempt.
    ///
    /// Behavior and trade-offs:
    /// - `1` (the default) keeps every wait at exactly `reconnect_delay`.
    /// - Larger factors back off quickly from a failing exchange; pair with
    ///   [`StreamerBuilder::max_reconnect_delay`] to bound the wait.
    #[must_use]
    pub fn backoff_factor(mut self, factor: u32) -> Self {
        self.config = self.config.backoff_factor(factor);
        self
    }

    /// Ceiling for grown reconnect delays.
    #[must_use]
    pub fn max_reconnect_delay(mut self, delay: Duration) -> Self {
        self.config = self.config.max_reconnect_delay(delay);
        self
    }

    /// Ceiling for grown reconnect delays, in seconds.
    #[must_use]
    pub fn max_reconnect_delay_secs(mut self, secs: f64) -> Self {
        self.config = self.config.max_reconnect_delay_secs(secs);
        self
    }

    /// Random jitter (percent of the delay) added to each reconnect wait.
    ///
    /// Behavior and trade-offs:
    /// - Spreads out reconnects of many streams hitting the same exchange at
    ///   the cost of less predictable timing.
    #[must_use]
    pub fn jitter_percent(mut self, percent: u32) -> Self {
        self.config = self.config.jitter_percent(percent);
        self
    }

    /// Overlay raw options, e.g. parsed with [`StreamOptions::from_json`].
    #[must_use]
    pub fn options(mut self, opts: StreamOptions) -> Self {
        self.config = self.config.options(opts);
        self
    }

    /// Feed to connect to. Defaults to [`SyntheticConnector`].
    #[must_use]
    pub fn connector(mut self, connector: Arc<dyn FeedConnector>) -> Self {
        self.connector = Some(connector);
        self
    }

    /// Name used in reports and logs. Defaults to the handler's type name.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Validate the options and produce a reusable decorator.
    ///
    /// # Errors
    /// Returns `StreamError::Configuration` naming the first invalid option.
    pub fn decorator(self) -> Result<StreamDecorator, StreamError> {
        let config = self.config.build()?;
        Ok(StreamDecorator {
            config: Arc::new(config),
            connector: self
                .connector
                .unwrap_or_else(|| Arc::new(SyntheticConnector::new()) as Arc<dyn FeedConnector>),
            name: self.name,
        })
    }

    /// Validate the options and decorate `handler` in one step.
    ///
    /// # Errors
    /// Returns `StreamError::Configuration` naming the first invalid option.
    pub fn build<H: RecordHandler>(self, handler: H) -> Result<Streamer<H>, StreamError> {
        Ok(self.decorator()?.decorate(handler))
    }
}

/// A validated configuration ready to wrap handlers.
///
/// The same decorator can wrap any number of handlers; each resulting
/// [`Streamer`] shares the read-only configuration and feed.
#[derive(Clone)]
pub struct StreamDecorator {
    config: Arc<StreamConfig>,
    connector: Arc<dyn FeedConnector>,
    name: Option<String>,
}

impl fmt::Debug for StreamDecorator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamDecorator")
            .field("name", &self.name)
            .field("connector", &self.connector.name())
            .field("config", &self.config)
            .finish()
    }
}

impl StreamDecorator {
    /// The validated configuration.
    #[must_use]
    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    /// Wrap `handler` into a runnable [`Streamer`].
    #[must_use]
    pub fn decorate<H: RecordHandler>(&self, handler: H) -> Streamer<H> {
        Streamer {
            name: self
                .name
                .clone()
                .unwrap_or_else(|| handler_name::<H>().to_string()),
            config: Arc::clone(&self.config),
            connector: Arc::clone(&self.connector),
            handler: Arc::new(handler),
        }
    }
}

// Last path segment of the handler's type name, without generic arguments.
fn handler_name<H>() -> &'static str {
    let full = std::any::type_name::<H>();
    let path = full.split('<').next().unwrap_or(full);
    path.rsplit("::").next().unwrap_or(path)
}
