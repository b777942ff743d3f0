//! Re-export of foundational types from `marketstream-types`.
// Consolidated re-exports so downstream crates can depend on `marketstream-core` only

pub use marketstream_types::{
    AttemptLimit, MarketDataRecord, MaxAttempts, MultiStreamReport, ReconnectPolicy, StreamConfig,
    StreamConfigBuilder, StreamError, StreamOptions, StreamReport, Termination, Timeframe,
    UnitOutcome,
};
pub use marketstream_types::{
    DEFAULT_EXCHANGE, DEFAULT_MAX_RECONNECT_ATTEMPTS, DEFAULT_MAX_RECONNECT_DELAY,
    DEFAULT_RECONNECT_DELAY, DEFAULT_SYMBOLS,
};
