//! Stream configuration: raw options, validation and the immutable result.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::StreamError;
use crate::timeframe::Timeframe;

/// Exchange used when none is configured.
pub const DEFAULT_EXCHANGE: &str = "binance";
/// Symbols streamed when none are configured.
pub const DEFAULT_SYMBOLS: [&str; 2] = ["BTC/USDT", "ETH/USDT"];
/// Wait before each reconnection attempt when none is configured.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(5);
/// Reconnection bound when none is configured.
pub const DEFAULT_MAX_RECONNECT_ATTEMPTS: u32 = 3;
/// Upper bound for grown reconnect delays when none is configured.
pub const DEFAULT_MAX_RECONNECT_DELAY: Duration = Duration::from_secs(30);

const UNBOUNDED: &str = "unbounded";

/// Upper bound on consecutive reconnection attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MaxAttempts {
    /// Give up after this many reconnects without a delivered record.
    Bounded(u32),
    /// Never give up.
    Unbounded,
}

impl MaxAttempts {
    /// Whether another reconnect is permitted after `attempts` consecutive ones.
    #[must_use]
    pub const fn allows(self, attempts: u32) -> bool {
        match self {
            Self::Bounded(max) => attempts < max,
            Self::Unbounded => true,
        }
    }
}

impl Default for MaxAttempts {
    fn default() -> Self {
        Self::Bounded(DEFAULT_MAX_RECONNECT_ATTEMPTS)
    }
}

impl fmt::Display for MaxAttempts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bounded(n) => write!(f, "{n}"),
            Self::Unbounded => f.write_str(UNBOUNDED),
        }
    }
}

impl Serialize for MaxAttempts {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Bounded(n) => serializer.serialize_u32(*n),
            Self::Unbounded => serializer.serialize_str(UNBOUNDED),
        }
    }
}

/// Raw `max_reconnect_attempts` value as written by a caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttemptLimit {
    /// A plain count; negative values are rejected during validation.
    Count(i64),
    /// A keyword; only `"unbounded"` is recognized.
    Keyword(String),
}

impl From<MaxAttempts> for AttemptLimit {
    fn from(value: MaxAttempts) -> Self {
        match value {
            MaxAttempts::Bounded(n) => Self::Count(i64::from(n)),
            MaxAttempts::Unbounded => Self::Keyword(UNBOUNDED.to_string()),
        }
    }
}

impl TryFrom<AttemptLimit> for MaxAttempts {
    type Error = StreamError;

    fn try_from(value: AttemptLimit) -> Result<Self, Self::Error> {
        match value {
            AttemptLimit::Count(n) if n < 0 => Err(StreamError::configuration(
                "max_reconnect_attempts",
                format!("must be non-negative, got {n}"),
            )),
            AttemptLimit::Count(n) => u32::try_from(n).map(Self::Bounded).map_err(|_| {
                StreamError::configuration("max_reconnect_attempts", format!("{n} is too large"))
            }),
            AttemptLimit::Keyword(k) if k.eq_ignore_ascii_case(UNBOUNDED) => Ok(Self::Unbounded),
            AttemptLimit::Keyword(k) => Err(StreamError::configuration(
                "max_reconnect_attempts",
                format!("expected a count or \"{UNBOUNDED}\", got '{k}'"),
            )),
        }
    }
}

/// How a stream reacts to connection-level failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReconnectPolicy {
    /// When false, the first connection failure terminates the stream.
    pub auto_reconnect: bool,
    /// Base wait before each reconnection attempt.
    pub reconnect_delay: Duration,
    /// Consecutive reconnects allowed before the stream fails.
    pub max_reconnect_attempts: MaxAttempts,
    /// Multiplier applied to the delay after each consecutive attempt (>= 1).
    pub backoff_factor: u32,
    /// Ceiling for grown delays; never lowers `reconnect_delay` itself.
    pub max_reconnect_delay: Duration,
    /// Random jitter percentage [0, 100] added to each delay.
    pub jitter_percent: u8,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            auto_reconnect: true,
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            max_reconnect_attempts: MaxAttempts::default(),
            backoff_factor: 1,
            max_reconnect_delay: DEFAULT_MAX_RECONNECT_DELAY,
            jitter_percent: 0,
        }
    }
}

impl ReconnectPolicy {
    /// Whether a connection failure after `attempts` consecutive reconnects may be retried.
    #[must_use]
    pub const fn may_retry(&self, attempts: u32) -> bool {
        self.auto_reconnect && self.max_reconnect_attempts.allows(attempts)
    }
}

/// Recognized configuration options, every one optional.
///
/// This is the loosely typed form accepted from callers and config files;
/// [`StreamConfig::try_from`] validates it and fills in defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StreamOptions {
    /// Exchange identifier, compared case-insensitively.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exchange: Option<String>,
    /// Trading pairs to stream.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbols: Option<Vec<String>>,
    /// Candle interval token such as `1m` or `4h`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeframe: Option<String>,
    /// Whether connection failures are retried.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_reconnect: Option<bool>,
    /// Wait before each reconnect, in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reconnect_delay: Option<f64>,
    /// Reconnect bound: a count or `"unbounded"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_reconnect_attempts: Option<AttemptLimit>,
    /// Delay multiplier per consecutive attempt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backoff_factor: Option<u32>,
    /// Ceiling for grown delays, in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_reconnect_delay: Option<f64>,
    /// Random jitter percentage added to each delay.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jitter_percent: Option<u32>,
}

impl StreamOptions {
    /// Parse options from a JSON object. Unknown option names are rejected.
    ///
    /// # Errors
    /// Returns `StreamError::Configuration` when the document is malformed.
    pub fn from_json(json: &str) -> Result<Self, StreamError> {
        serde_json::from_str(json).map_err(|e| StreamError::configuration("options", e.to_string()))
    }

    /// Overlay every option set in `other` on top of `self`.
    #[must_use]
    pub fn merged(mut self, other: Self) -> Self {
        macro_rules! overlay {
            ($($field:ident),*) => {
                $( if other.$field.is_some() { self.$field = other.$field; } )*
            };
        }
        overlay!(
            exchange,
            symbols,
            timeframe,
            auto_reconnect,
            reconnect_delay,
            max_reconnect_attempts,
            backoff_factor,
            max_reconnect_delay,
            jitter_percent
        );
        self
    }
}

/// Validated, immutable configuration of one stream.
///
/// Built once when a handler is decorated and shared read-only afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "StreamOptions", into = "StreamOptions")]
pub struct StreamConfig {
    exchange: String,
    symbols: Vec<String>,
    timeframe: Timeframe,
    reconnect: ReconnectPolicy,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            exchange: DEFAULT_EXCHANGE.to_string(),
            symbols: DEFAULT_SYMBOLS.iter().map(ToString::to_string).collect(),
            timeframe: Timeframe::default(),
            reconnect: ReconnectPolicy::default(),
        }
    }
}

impl StreamConfig {
    /// Start building a configuration from defaults.
    #[must_use]
    pub fn builder() -> StreamConfigBuilder {
        StreamConfigBuilder::default()
    }

    /// Lower-cased exchange identifier.
    #[must_use]
    pub fn exchange(&self) -> &str {
        &self.exchange
    }

    /// Configured trading pairs, in configuration order.
    #[must_use]
    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    /// Configured candle interval.
    #[must_use]
    pub const fn timeframe(&self) -> Timeframe {
        self.timeframe
    }

    /// Reconnection behavior.
    #[must_use]
    pub const fn reconnect(&self) -> &ReconnectPolicy {
        &self.reconnect
    }

    /// Whether `symbol` is one of the configured pairs.
    #[must_use]
    pub fn contains_symbol(&self, symbol: &str) -> bool {
        self.symbols.iter().any(|s| s == symbol)
    }

    /// Effective option values keyed by option name.
    ///
    /// Durations are rendered in seconds; an unbounded reconnect limit is
    /// rendered as `"unbounded"`.
    #[must_use]
    pub fn to_options_map(&self) -> Map<String, Value> {
        match serde_json::to_value(StreamOptions::from(self.clone())) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }
}

impl From<StreamConfig> for StreamOptions {
    fn from(cfg: StreamConfig) -> Self {
        let r = cfg.reconnect;
        Self {
            exchange: Some(cfg.exchange),
            symbols: Some(cfg.symbols),
            timeframe: Some(cfg.timeframe.to_string()),
            auto_reconnect: Some(r.auto_reconnect),
            reconnect_delay: Some(r.reconnect_delay.as_secs_f64()),
            max_reconnect_attempts: Some(r.max_reconnect_attempts.into()),
            backoff_factor: Some(r.backoff_factor),
            max_reconnect_delay: Some(r.max_reconnect_delay.as_secs_f64()),
            jitter_percent: Some(u32::from(r.jitter_percent)),
        }
    }
}

fn seconds(field: &str, value: f64) -> Result<Duration, StreamError> {
    if !value.is_finite() || value < 0.0 {
        return Err(StreamError::configuration(
            field,
            format!("must be a non-negative number of seconds, got {value}"),
        ));
    }
    Duration::try_from_secs_f64(value)
        .map_err(|e| StreamError::configuration(field, e.to_string()))
}

impl TryFrom<StreamOptions> for StreamConfig {
    type Error = StreamError;

    fn try_from(opts: StreamOptions) -> Result<Self, Self::Error> {
        let defaults = Self::default();

        let exchange = match opts.exchange {
            Some(raw) => {
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    return Err(StreamError::configuration("exchange", "must not be empty"));
                }
                trimmed.to_lowercase()
            }
            None => defaults.exchange,
        };

        let symbols = match opts.symbols {
            Some(list) => {
                if list.is_empty() {
                    return Err(StreamError::configuration(
                        "symbols",
                        "at least one symbol is required",
                    ));
                }
                let mut out = Vec::with_capacity(list.len());
                for s in list {
                    let trimmed = s.trim();
                    if trimmed.is_empty() {
                        return Err(StreamError::configuration(
                            "symbols",
                            "symbols must not be blank",
                        ));
                    }
                    out.push(trimmed.to_string());
                }
                out
            }
            None => defaults.symbols,
        };

        let timeframe = match opts.timeframe {
            Some(token) => token.parse()?,
            None => defaults.timeframe,
        };

        let base = defaults.reconnect;
        let reconnect_delay = match opts.reconnect_delay {
            Some(v) => seconds("reconnect_delay", v)?,
            None => base.reconnect_delay,
        };
        let max_reconnect_attempts = match opts.max_reconnect_attempts {
            Some(limit) => MaxAttempts::try_from(limit)?,
            None => base.max_reconnect_attempts,
        };
        let backoff_factor = match opts.backoff_factor {
            Some(0) => {
                return Err(StreamError::configuration(
                    "backoff_factor",
                    "must be at least 1",
                ));
            }
            Some(f) => f,
            None => base.backoff_factor,
        };
        let max_reconnect_delay = match opts.max_reconnect_delay {
            Some(v) => seconds("max_reconnect_delay", v)?,
            None => base.max_reconnect_delay,
        };
        let jitter_percent = match opts.jitter_percent {
            Some(p) => u8::try_from(p)
                .ok()
                .filter(|p| *p <= 100)
                .ok_or_else(|| {
                    StreamError::configuration(
                        "jitter_percent",
                        format!("must be within 0..=100, got {p}"),
                    )
                })?,
            None => base.jitter_percent,
        };

        Ok(Self {
            exchange,
            symbols,
            timeframe,
            reconnect: ReconnectPolicy {
                auto_reconnect: opts.auto_reconnect.unwrap_or(base.auto_reconnect),
                reconnect_delay,
                max_reconnect_attempts,
                backoff_factor,
                max_reconnect_delay,
                jitter_percent,
            },
        })
    }
}

/// Builder collecting options before validation.
///
/// Every setter records the raw value; nothing is checked until
/// [`StreamConfigBuilder::build`].
#[derive(Debug, Clone, Default)]
pub struct StreamConfigBuilder {
    opts: StreamOptions,
}

impl StreamConfigBuilder {
    /// Exchange identifier; stored lower-cased.
    #[must_use]
    pub fn exchange(mut self, exchange: impl Into<String>) -> Self {
        self.opts.exchange = Some(exchange.into());
        self
    }

    /// Replace the symbol list.
    #[must_use]
    pub fn symbols<I, S>(mut self, symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.opts.symbols = Some(symbols.into_iter().map(Into::into).collect());
        self
    }

    /// Candle interval, as a token (`"5m"`) or a [`Timeframe`].
    #[must_use]
    pub fn timeframe(mut self, timeframe: impl fmt::Display) -> Self {
        self.opts.timeframe = Some(timeframe.to_string());
        self
    }

    /// Toggle automatic reconnection.
    #[must_use]
    pub const fn auto_reconnect(mut self, yes: bool) -> Self {
        self.opts.auto_reconnect = Some(yes);
        self
    }

    /// Wait before each reconnection attempt.
    #[must_use]
    pub fn reconnect_delay(mut self, delay: Duration) -> Self {
        self.opts.reconnect_delay = Some(delay.as_secs_f64());
        self
    }

    /// Wait before each reconnection attempt, in (possibly fractional) seconds.
    #[must_use]
    pub const fn reconnect_delay_secs(mut self, secs: f64) -> Self {
        self.opts.reconnect_delay = Some(secs);
        self
    }

    /// Bound consecutive reconnects; negative values fail validation.
    #[must_use]
    pub fn max_reconnect_attempts(mut self, attempts: i64) -> Self {
        self.opts.max_reconnect_attempts = Some(AttemptLimit::Count(attempts));
        self
    }

    /// Never give up reconnecting.
    #[must_use]
    pub fn unbounded_reconnects(mut self) -> Self {
        self.opts.max_reconnect_attempts = Some(MaxAttempts::Unbounded.into());
        self
    }

    /// Multiply the delay by this factor after each consecutive attempt.
    #[must_use]
    pub const fn backoff_factor(mut self, factor: u32) -> Self {
        self.opts.backoff_factor = Some(factor);
        self
    }

    /// Ceiling for grown reconnect delays.
    #[must_use]
    pub fn max_reconnect_delay(mut self, delay: Duration) -> Self {
        self.opts.max_reconnect_delay = Some(delay.as_secs_f64());
        self
    }

    /// Ceiling for grown reconnect delays, in seconds.
    #[must_use]
    pub const fn max_reconnect_delay_secs(mut self, secs: f64) -> Self {
        self.opts.max_reconnect_delay = Some(secs);
        self
    }

    /// Random jitter percentage added to each delay.
    #[must_use]
    pub const fn jitter_percent(mut self, percent: u32) -> Self {
        self.opts.jitter_percent = Some(percent);
        self
    }

    /// Overlay a set of raw options, e.g. loaded from a file.
    #[must_use]
    pub fn options(mut self, opts: StreamOptions) -> Self {
        self.opts = self.opts.merged(opts);
        self
    }

    /// Raw options collected so far.
    #[must_use]
    pub const fn raw_options(&self) -> &StreamOptions {
        &self.opts
    }

    /// Validate the options and apply defaults.
    ///
    /// # Errors
    /// Returns `StreamError::Configuration` naming the first invalid option.
    pub fn build(self) -> Result<StreamConfig, StreamError> {
        StreamConfig::try_from(self.opts)
    }
}
