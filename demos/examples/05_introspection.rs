use marketstream::{
    EntryPoint, MarketDataRecord, PlainTask, StreamOptions, describe, stream_config, streamer,
};

async fn log_trade(record: MarketDataRecord) {
    println!("{} {}", record.symbol, record.price);
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Options can come from a JSON document, overlaid on builder settings.
    let opts = StreamOptions::from_json(
        r#"{"exchange": "Coinbase", "symbols": ["BTC/USD", "ETH/USD"], "max_reconnect_attempts": "unbounded"}"#,
    )?;
    let stream = streamer().timeframe("15m").options(opts).build(log_trade)?;
    let plain = PlainTask::new("housekeeping", || async { Ok(()) });

    let entries: [&dyn EntryPoint; 2] = [&stream, &plain];
    for entry in entries {
        match describe(entry) {
            Ok(map) => println!(
                "{}: {}",
                entry.name(),
                serde_json::to_string_pretty(&map)?
            ),
            Err(e) => println!("{}: {e}", entry.name()),
        }
    }

    if let Some(cfg) = stream_config(&stream) {
        println!(
            "{} streams {} symbols every {}",
            cfg.exchange(),
            cfg.symbols().len(),
            cfg.timeframe()
        );
    }
    Ok(())
}
