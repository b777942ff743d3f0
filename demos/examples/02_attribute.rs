use marketstream::{MarketDataRecord, describe, market_stream};
use marketstream_demos::common::get_connector;
use rust_decimal::Decimal;

#[market_stream(
    exchange = "coinbase",
    symbols = ["BTC/USD"],
    timeframe = "1m",
    reconnect_delay = 2,
    connector = get_connector()
)]
async fn btc_breakout(record: MarketDataRecord) -> bool {
    let threshold = Decimal::from(50_000);
    println!("{} @ {}", record.symbol, record.price);
    if record.price > threshold {
        println!("-> above {threshold}, stopping");
        return false;
    }
    // Keep going while the price stays under the threshold, but not forever.
    record.price > Decimal::from(49_000)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let stream = btc_breakout()?;
    println!(
        "options: {}",
        serde_json::to_string_pretty(&describe(&stream)?)?
    );
    let report = stream.run().await?;
    println!("{} finished: {:?}", report.name, report.termination);
    Ok(())
}
