// Re-export helpers so tests can `use helpers::*;`
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use chrono::Utc;
use marketstream::{
    FeedConnector, MarketDataRecord, ScriptController, ScriptedConnector, StreamError,
    StreamerBuilder, streamer,
};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

pub const BTC: &str = "BTC/USDT";
pub const ETH: &str = "ETH/USDT";

/// A record for `symbol` at a whole-number price.
pub fn rec(symbol: &str, price: i64) -> MarketDataRecord {
    MarketDataRecord {
        symbol: symbol.to_string(),
        price: Decimal::from(price),
        volume: Decimal::ONE,
        timestamp: Utc::now(),
        exchange: "binance".to_string(),
    }
}

/// A transient feed failure.
pub fn drop_err() -> StreamError {
    StreamError::connection("binance", "connection reset")
}

/// Scripted feed plus a builder wired to it with a 5 s reconnect delay.
pub fn scripted(name: &'static str) -> (StreamerBuilder, ScriptController) {
    let (conn, controller) = ScriptedConnector::new_with_controller(name);
    (builder_for(conn), controller)
}

pub fn builder_for(conn: Arc<dyn FeedConnector>) -> StreamerBuilder {
    streamer()
        .exchange("binance")
        .symbols([BTC, ETH])
        .reconnect_delay_secs(5.0)
        .connector(conn)
}

/// Collects every record it sees; stops once it has seen `stop_after` records.
#[derive(Clone, Default)]
pub struct Recorder {
    pub seen: Arc<Mutex<Vec<MarketDataRecord>>>,
}

impl Recorder {
    pub fn prices(&self) -> Vec<i64> {
        self.seen
            .lock()
            .unwrap()
            .iter()
            .filter_map(|r| r.price.to_i64())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    /// Handler that records and continues until `stop_after` records were seen.
    pub fn handler(
        &self,
        stop_after: usize,
    ) -> impl Fn(MarketDataRecord) -> std::future::Ready<bool> + Send + Sync + 'static {
        let seen = Arc::clone(&self.seen);
        move |record| {
            let mut guard = seen.lock().unwrap();
            guard.push(record);
            std::future::ready(guard.len() < stop_after)
        }
    }
}
