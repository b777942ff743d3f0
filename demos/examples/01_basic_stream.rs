use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use marketstream::{MarketDataRecord, streamer};
use marketstream_demos::common::get_connector;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Count records so the handler can stop the stream after ten of them.
    let seen = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&seen);

    // 2. Decorate a closure with stream options.
    let stream = streamer()
        .exchange("binance")
        .symbols(["BTC/USDT", "ETH/USDT"])
        .timeframe("1m")
        .reconnect_delay_secs(5.0)
        .connector(get_connector())
        .build(move |record: MarketDataRecord| {
            let n = counter.fetch_add(1, Ordering::Relaxed) + 1;
            async move {
                println!(
                    "[{n:>2}] {} {} @ {} (vol {})",
                    record.timestamp.format("%H:%M:%S%.3f"),
                    record.symbol,
                    record.price,
                    record.volume
                );
                // Returning false stops the stream gracefully
                n < 10
            }
        })?;

    // 3. Run until the handler asks to stop.
    let report = stream.run().await?;
    println!("{report:#?}");
    Ok(())
}
