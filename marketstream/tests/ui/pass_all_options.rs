use std::sync::Arc;

use marketstream::{Flow, MarketDataRecord, StreamError, SyntheticConnector, market_stream};

#[market_stream(
    exchange = "kraken",
    symbols = ["XBT/USD", "ETH/USD"],
    timeframe = "1h",
    auto_reconnect = true,
    reconnect_delay = 0.5,
    max_reconnect_attempts = 10,
    backoff_factor = 2,
    max_reconnect_delay = 30,
    jitter_percent = 20,
    name = "kraken-majors",
    connector = Arc::new(SyntheticConnector::new().with_seed(9)),
)]
pub async fn majors(record: MarketDataRecord) -> Result<Flow, StreamError> {
    if record.volume.is_zero() {
        return Err(StreamError::handler("empty trade"));
    }
    Ok(Flow::Continue)
}

fn main() {
    let stream = majors().expect("valid options");
    assert_eq!(stream.name(), "kraken-majors");
}
