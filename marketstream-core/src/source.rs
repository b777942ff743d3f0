use async_trait::async_trait;

use crate::{MarketDataRecord, StreamConfig, StreamError};

/// One live connection to a market-data feed.
///
/// Records are pulled one at a time so the caller controls pacing and can
/// cancel between records. A source is not restartable: after an error the
/// runner closes it and asks the connector for a fresh one.
#[async_trait]
pub trait DataSource: Send {
    /// Wait for and return the next record.
    ///
    /// `Ok(None)` means the feed ended normally. An `Err` is treated as a
    /// connection failure when it is `StreamError::Connection`.
    async fn next_record(&mut self) -> Result<Option<MarketDataRecord>, StreamError>;

    /// Release any resources held by the connection.
    async fn close(&mut self) {}
}

/// Factory for [`DataSource`] connections.
///
/// Implementations wrap a concrete feed (synthetic, scripted, or a real
/// exchange client). A failed `connect` counts as a connection failure.
#[async_trait]
pub trait FeedConnector: Send + Sync {
    /// Human-readable connector name used in logs.
    fn name(&self) -> &'static str;

    /// Open a new connection producing records for `config`.
    async fn connect(&self, config: &StreamConfig) -> Result<Box<dyn DataSource>, StreamError>;
}
