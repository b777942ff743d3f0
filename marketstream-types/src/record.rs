//! Market data delivered to stream handlers.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One tick of market data.
///
/// Serialized as `{symbol, price, volume, timestamp, exchange}` with numeric
/// price/volume and `timestamp` in epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketDataRecord {
    /// Trading pair, one of the stream's configured symbols.
    pub symbol: String,
    /// Last traded price; strictly positive.
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    /// Traded volume; non-negative.
    #[serde(with = "rust_decimal::serde::float")]
    pub volume: Decimal,
    /// Generation time; non-decreasing within one stream.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    /// Exchange identifier copied from the stream configuration.
    pub exchange: String,
}

impl MarketDataRecord {
    /// Timestamp as integer epoch milliseconds.
    #[must_use]
    pub fn timestamp_ms(&self) -> i64 {
        self.timestamp.timestamp_millis()
    }
}
