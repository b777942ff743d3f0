//! Configuration, record and error types shared across the marketstream crates.
#![warn(missing_docs)]

mod config;
mod error;
mod record;
mod reports;
mod timeframe;

pub use config::{
    AttemptLimit, DEFAULT_EXCHANGE, DEFAULT_MAX_RECONNECT_ATTEMPTS, DEFAULT_MAX_RECONNECT_DELAY,
    DEFAULT_RECONNECT_DELAY, DEFAULT_SYMBOLS, MaxAttempts, ReconnectPolicy, StreamConfig,
    StreamConfigBuilder, StreamOptions,
};
pub use error::StreamError;
pub use record::MarketDataRecord;
pub use reports::{MultiStreamReport, StreamReport, Termination, UnitOutcome};
pub use timeframe::Timeframe;
