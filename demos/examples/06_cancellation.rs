use std::time::Duration;

use marketstream::{MarketDataRecord, streamer};
use marketstream_demos::common::{demo_wait, get_connector, init_tracing};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    // A handler that never stops on its own.
    let stream = streamer()
        .symbols(["BTC/USDT", "ETH/USDT", "SOL/USDT"])
        .connector(get_connector())
        .build(|record: MarketDataRecord| async move {
            println!("{} @ {}", record.symbol, record.price);
        })?;

    // Run it in the background and stop it from the outside.
    let handle = stream.spawn();
    tokio::time::sleep(demo_wait(Duration::from_secs(5))).await;
    let report = handle.stop().await?;

    println!(
        "{:?} after {} records ({} reconnects)",
        report.termination, report.delivered, report.reconnects
    );
    Ok(())
}
