use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use marketstream::{MarketDataRecord, StreamError, SyntheticConnector, streamer};
use marketstream_demos::common::{fast_mode, init_tracing};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // RUST_LOG=info shows every scheduled reconnect.
    init_tracing();

    // A feed that drops the connection on roughly one read in four.
    let pacing = if fast_mode() {
        Duration::from_millis(5)
    } else {
        Duration::from_millis(200)
    };
    let flaky = SyntheticConnector::new()
        .with_pacing(pacing)
        .with_seed(7)
        .with_drop_rate(0.25);

    let seen = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&seen);
    let stream = streamer()
        .symbols(["SOL/USDT"])
        .reconnect_delay(pacing)
        .backoff_factor(2)
        .max_reconnect_delay(pacing * 8)
        .jitter_percent(10)
        .unbounded_reconnects()
        .connector(Arc::new(flaky))
        .build(move |record: MarketDataRecord| {
            let n = counter.fetch_add(1, Ordering::Relaxed) + 1;
            async move {
                println!("[{n:>2}] {} @ {}", record.symbol, record.price);
                n < 20
            }
        })?;

    let report = stream.run().await?;
    println!(
        "delivered {} records across {} reconnects",
        report.delivered, report.reconnects
    );

    // With a bound, a feed that never comes back eventually gives up.
    let dead = SyntheticConnector::new().with_pacing(pacing).with_drop_rate(1.0);
    let outcome = streamer()
        .reconnect_delay(pacing)
        .max_reconnect_attempts(2)
        .connector(Arc::new(dead))
        .build(|_record: MarketDataRecord| async {})?
        .run()
        .await;
    match outcome {
        Err(StreamError::ReconnectsExhausted { attempts, last, .. }) => {
            println!("gave up after {attempts} attempts: {last}");
        }
        Err(other) => return Err(other.into()),
        Ok(report) => println!("dead feed unexpectedly finished: {report:?}"),
    }
    Ok(())
}
