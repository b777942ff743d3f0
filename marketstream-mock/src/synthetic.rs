use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;

use marketstream_core::{DataSource, FeedConnector, MarketDataRecord, StreamConfig, StreamError};

/// Lowest price a synthetic walk can reach.
pub const PRICE_FLOOR: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

// One walk step moves the price by at most this many millionths (0.5 %).
const MAX_STEP_PPM: i64 = 5_000;
// Volume is drawn in hundredths from [0.01, 100).
const VOLUME_CENTS: std::ops::Range<i64> = 1..10_000;

/// Starting price of the walk for `symbol`.
///
/// Well-known base assets start near a realistic level; anything else gets a
/// stable value in `[10, 1000)` derived from the symbol text.
#[must_use]
pub fn base_price(symbol: &str) -> Decimal {
    let base = symbol.split(['/', '-', ':']).next().unwrap_or(symbol);
    match base.to_ascii_uppercase().as_str() {
        "BTC" | "XBT" => Decimal::from(50_000),
        "ETH" => Decimal::from(3_000),
        "SOL" => Decimal::from(150),
        _ => {
            let h = symbol
                .bytes()
                .fold(0u64, |h, b| h.wrapping_mul(31).wrapping_add(u64::from(b)));
            Decimal::from(10 + h % 990)
        }
    }
}

// Apply a relative step, rounded to cents. A non-zero step always moves the
// price by at least one tick so cheap symbols cannot freeze.
fn walk(price: Decimal, step: Decimal) -> Decimal {
    let mut next = (price * (Decimal::ONE + step)).round_dp(2);
    if next == price && !step.is_zero() {
        next = if step.is_sign_negative() {
            price - PRICE_FLOOR
        } else {
            price + PRICE_FLOOR
        };
    }
    next.max(PRICE_FLOOR)
}

/// Connector producing [`SyntheticFeed`]s.
///
/// Every `connect` builds a fresh feed, so the price walk restarts from the
/// base prices after a reconnect.
#[derive(Debug)]
pub struct SyntheticConnector {
    pacing: Option<Duration>,
    seed: Option<u64>,
    drop_rate: f64,
    connections: AtomicU64,
}

impl Default for SyntheticConnector {
    fn default() -> Self {
        Self::new()
    }
}

impl SyntheticConnector {
    /// Connector with timeframe-derived pacing, an OS-seeded RNG and no drops.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            pacing: None,
            seed: None,
            drop_rate: 0.0,
            connections: AtomicU64::new(0),
        }
    }

    /// Override the pause before each record. `Duration::ZERO` disables pacing.
    #[must_use]
    pub const fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = Some(pacing);
        self
    }

    /// Seed the RNG. Connection `n` uses `seed + n`, so runs are reproducible.
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Probability in `[0, 1]` that a read fails with a connection error.
    ///
    /// Out-of-range values are clamped and NaN is treated as zero.
    #[must_use]
    pub fn with_drop_rate(mut self, rate: f64) -> Self {
        self.drop_rate = if rate.is_nan() { 0.0 } else { rate.clamp(0.0, 1.0) };
        self
    }

    /// Build a feed for `config` without going through the trait object.
    #[must_use]
    pub fn feed(&self, config: &StreamConfig) -> SyntheticFeed {
        let n = self.connections.fetch_add(1, Ordering::Relaxed);
        let rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(n)),
            None => StdRng::from_os_rng(),
        };
        SyntheticFeed {
            exchange: config.exchange().to_string(),
            symbols: config.symbols().to_vec(),
            prices: config.symbols().iter().map(|s| base_price(s)).collect(),
            cursor: 0,
            pacing: self.pacing.unwrap_or_else(|| config.timeframe().pacing()),
            drop_rate: self.drop_rate,
            rng,
            last_ts: None,
            closed: false,
        }
    }
}

#[async_trait]
impl FeedConnector for SyntheticConnector {
    fn name(&self) -> &'static str {
        "synthetic"
    }

    async fn connect(&self, config: &StreamConfig) -> Result<Box<dyn DataSource>, StreamError> {
        Ok(Box::new(self.feed(config)))
    }
}

/// Endless pseudo-random feed for one connection.
pub struct SyntheticFeed {
    exchange: String,
    symbols: Vec<String>,
    prices: Vec<Decimal>,
    cursor: usize,
    pacing: Duration,
    drop_rate: f64,
    rng: StdRng,
    last_ts: Option<DateTime<Utc>>,
    closed: bool,
}

impl SyntheticFeed {
    /// Produce the next record immediately, skipping pacing and drops.
    ///
    /// Returns `None` once the feed was closed or has no symbols.
    pub fn generate(&mut self) -> Option<MarketDataRecord> {
        if self.closed || self.symbols.is_empty() {
            return None;
        }
        let idx = self.cursor;
        self.cursor = (self.cursor + 1) % self.symbols.len();

        let step = Decimal::new(self.rng.random_range(-MAX_STEP_PPM..=MAX_STEP_PPM), 6);
        let price = walk(self.prices[idx], step);
        self.prices[idx] = price;

        let volume = Decimal::new(self.rng.random_range(VOLUME_CENTS), 2);

        let now = Utc::now();
        let timestamp = match self.last_ts {
            Some(last) if last > now => last,
            _ => now,
        };
        self.last_ts = Some(timestamp);

        Some(MarketDataRecord {
            symbol: self.symbols[idx].clone(),
            price,
            volume,
            timestamp,
            exchange: self.exchange.clone(),
        })
    }
}

#[async_trait]
impl DataSource for SyntheticFeed {
    async fn next_record(&mut self) -> Result<Option<MarketDataRecord>, StreamError> {
        if self.closed {
            return Ok(None);
        }
        if !self.pacing.is_zero() {
            tokio::time::sleep(self.pacing).await;
        }
        if self.drop_rate > 0.0 && self.rng.random_bool(self.drop_rate) {
            #[cfg(feature = "tracing")]
            tracing::debug!(exchange = %self.exchange, "synthetic feed dropped the connection");
            return Err(StreamError::connection(
                &self.exchange,
                "synthetic connection drop",
            ));
        }
        Ok(self.generate())
    }

    async fn close(&mut self) {
        self.closed = true;
    }
}
