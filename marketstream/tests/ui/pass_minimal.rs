use marketstream::{MarketDataRecord, market_stream};

#[market_stream(symbols = ["BTC/USDT"])]
async fn ticker(record: MarketDataRecord) {
    let _ = record.price;
}

fn main() {
    let stream = ticker().expect("valid options");
    let _ = stream.config();
}
