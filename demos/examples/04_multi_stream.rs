use marketstream::{MarketDataRecord, MultiStream, StreamError, streamer};
use marketstream_demos::common::{get_connector, init_tracing};
use rust_decimal::Decimal;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    // Each unit stops once its price leaves a band; one of them fails on purpose.
    let btc = streamer()
        .symbols(["BTC/USDT"])
        .name("btc")
        .connector(get_connector())
        .build(|record: MarketDataRecord| async move {
            println!("btc: {}", record.price);
            (Decimal::from(49_900)..=Decimal::from(50_100)).contains(&record.price)
        })?;

    let eth = streamer()
        .exchange("kraken")
        .symbols(["ETH/USD"])
        .name("eth")
        .connector(get_connector())
        .build(|record: MarketDataRecord| async move {
            println!("eth: {}", record.price);
            (Decimal::from(2_970)..=Decimal::from(3_030)).contains(&record.price)
        })?;

    let picky = streamer()
        .symbols(["DOGE/USDT"])
        .name("picky")
        .connector(get_connector())
        .build(|record: MarketDataRecord| async move {
            Err::<(), _>(StreamError::handler(format!(
                "refusing {} at {}",
                record.symbol, record.price
            )))
        })?;

    let report = MultiStream::new()
        .with_stream(btc)
        .with_stream(eth)
        .with_stream(picky)
        .run()
        .await?;

    for outcome in &report.outcomes {
        match &outcome.result {
            Ok(r) => println!(
                "{:<6} {:?} after {} records",
                outcome.name, r.termination, r.delivered
            ),
            Err(e) => println!("{:<6} failed: {e}", outcome.name),
        }
    }
    println!("stopped={} failed={}", report.stopped(), report.failed());
    Ok(())
}
