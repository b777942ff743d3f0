mod stream;

use stream::market_stream_impl;

/// Decorate an `async fn(MarketDataRecord) -> R` as a market-data stream.
///
/// The function is replaced by `fn name() -> Result<Streamer<impl RecordHandler>, StreamError>`
/// that validates the options and wraps the original body as the handler.
///
/// Options: `exchange`, `symbols`, `timeframe`, `auto_reconnect`,
/// `reconnect_delay` (seconds), `max_reconnect_attempts` (count or
/// `"unbounded"`), `backoff_factor`, `max_reconnect_delay` (seconds),
/// `jitter_percent`, `name` and `connector` (an expression yielding
/// `Arc<dyn FeedConnector>`).
#[proc_macro_attribute]
pub fn market_stream(
    attr: proc_macro::TokenStream,
    item: proc_macro::TokenStream,
) -> proc_macro::TokenStream {
    market_stream_impl(attr, item)
}
