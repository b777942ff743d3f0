//! Marketstream turns plain async callbacks into managed market-data streams.
//!
//! Overview
//! - A *decorator* ([`StreamerBuilder`] / [`StreamDecorator`], or the
//!   `#[market_stream]` attribute) validates stream options once and attaches
//!   them to a handler, producing a runnable [`Streamer`].
//! - Running a [`Streamer`] connects to a feed (by default the synthetic
//!   random-walk feed from `marketstream-mock`), delivers every record to the
//!   handler one at a time, and reconnects after connection failures.
//! - [`MultiStream`] runs several decorated streams concurrently and
//!   independently and aggregates their outcomes.
//! - [`describe`] and [`stream_config`] read the options attached to a
//!   decorated entry point.
//!
//! Key behaviors and trade-offs
//! - Handler contract: returning `false` (or [`Flow::Stop`]) stops the stream
//!   gracefully; any other value continues. An error returned by the handler
//!   ends the stream and is propagated unchanged.
//! - Reconnects: with `auto_reconnect` on, a failed connect or read waits
//!   `reconnect_delay` and reconnects, at most `max_reconnect_attempts` times
//!   in a row. The counter resets once a record is delivered on the new
//!   connection. Optional exponential growth and jitter spread out storms.
//! - Cancellation is cooperative: it is observed between handler calls and
//!   during feed or reconnect waits, never in the middle of a handler call.
//! - A feed that ends on its own finishes the stream as
//!   [`Termination::Exhausted`] instead of reconnecting.
//!
//! Examples
//! Decorating a handler with the builder:
//! ```rust,ignore
//! use marketstream::{MarketDataRecord, streamer};
//!
//! let stream = streamer()
//!     .exchange("binance")
//!     .symbols(["BTC/USDT", "ETH/USDT"])
//!     .timeframe("1m")
//!     .reconnect_delay_secs(5.0)
//!     .build(|record: MarketDataRecord| async move {
//!         println!("{} @ {}", record.symbol, record.price);
//!         record.price < 60_000.into()
//!     })?;
//! let report = stream.run().await?;
//! ```
//!
//! The same with the attribute:
//! ```rust,ignore
//! #[marketstream::market_stream(exchange = "coinbase", symbols = ["BTC/USD"])]
//! async fn btc(record: MarketDataRecord) -> bool {
//!     record.price < 60_000.into()
//! }
//!
//! let report = btc()?.run().await?;
//! ```
//!
//! Running several streams:
//! ```rust,ignore
//! let report = MultiStream::new()
//!     .with_stream(btc()?)
//!     .with_stream(eth()?)
//!     .run()
//!     .await?;
//! assert_eq!(report.failed(), 0);
//! ```
//!
//! See `demos/examples/` for runnable end-to-end demonstrations.
#![warn(missing_docs)]

// Lets `#[market_stream]` expansions name this crate from inside it, too.
extern crate self as marketstream;

mod builder;
mod introspect;
mod orchestrator;
mod plain;
mod runner;
mod streamer;

pub use builder::{StreamDecorator, StreamerBuilder, streamer};
pub use introspect::{describe, stream_config};
pub use orchestrator::{MultiStream, MultiStreamHandle};
pub use plain::PlainTask;
pub use streamer::Streamer;

#[cfg(feature = "macros")]
pub use marketstream_macros::market_stream;

pub use marketstream_mock::{ScriptController, ScriptedConnector, SessionScript, SyntheticConnector};

// Re-export core types for convenience
pub use marketstream_core::{
    AttemptLimit, DataSource, EntryPoint, FeedConnector, Flow, IntoFlow, MarketDataRecord,
    MaxAttempts, MultiStreamReport, ReconnectPolicy, RecordHandler, StopSignal, StopTrigger,
    StreamConfig, StreamConfigBuilder, StreamError, StreamHandle, StreamOptions, StreamReport,
    Termination, Timeframe, UnitOutcome, stop_channel,
};
pub use marketstream_core::{
    DEFAULT_EXCHANGE, DEFAULT_MAX_RECONNECT_ATTEMPTS, DEFAULT_MAX_RECONNECT_DELAY,
    DEFAULT_RECONNECT_DELAY, DEFAULT_SYMBOLS,
};
