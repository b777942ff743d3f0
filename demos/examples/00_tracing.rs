use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use marketstream::{MarketDataRecord, streamer};
use marketstream_demos::common::{get_connector, init_tracing};
use tracing_subscriber::fmt::format::FmtSpan;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Human-friendly subscriber with env-based filtering.
    // Suggested: RUST_LOG=info,marketstream=trace
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .with_span_events(FmtSpan::ENTER | FmtSpan::EXIT)
        .try_init();
    // No-op when the subscriber above is already installed
    init_tracing();

    let seen = Arc::new(AtomicUsize::new(0));
    let stream = streamer()
        .exchange("binance")
        .symbols(["BTC/USDT"])
        .connector(get_connector())
        .name("traced")
        .build(move |record: MarketDataRecord| {
            let n = seen.fetch_add(1, Ordering::Relaxed) + 1;
            async move {
                tracing::info!(n, symbol = %record.symbol, price = %record.price, "tick");
                n < 5
            }
        })?;

    let report = stream.run().await?;
    tracing::info!(?report, "done");
    Ok(())
}
