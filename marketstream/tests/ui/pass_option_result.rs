use marketstream::{MarketDataRecord, market_stream};

/// Doc comments and other attributes are kept on the generated function.
#[market_stream(timeframe = "15m", auto_reconnect = false)]
#[allow(clippy::unused_async)]
async fn maybe_stop(record: MarketDataRecord) -> Option<bool> {
    record.symbol.starts_with("ETH").then_some(false)
}

fn main() {
    let _ = maybe_stop().map(|s| s.describe());
}
