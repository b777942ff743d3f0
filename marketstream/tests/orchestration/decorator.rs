use std::time::Duration;

use marketstream::{
    MarketDataRecord, SessionScript, StreamError, StreamOptions, Termination, streamer,
};

use crate::helpers::{BTC, ETH, Recorder, rec, scripted};

fn field_of(err: &StreamError) -> Option<&str> {
    match err {
        StreamError::Configuration { field, .. } => Some(field),
        _ => None,
    }
}

async fn keep_going(_record: MarketDataRecord) -> bool {
    true
}

#[test]
fn invalid_options_fail_at_decoration() {
    let cases = [
        (streamer().symbols(Vec::<String>::new()), "symbols"),
        (streamer().symbols(["BTC/USDT", "  "]), "symbols"),
        (streamer().exchange(" "), "exchange"),
        (streamer().timeframe("7m"), "timeframe"),
        (streamer().reconnect_delay_secs(-1.0), "reconnect_delay"),
        (streamer().max_reconnect_attempts(-2), "max_reconnect_attempts"),
        (streamer().backoff_factor(0), "backoff_factor"),
        (streamer().jitter_percent(101), "jitter_percent"),
    ];
    for (builder, field) in cases {
        let err = builder.decorator().unwrap_err();
        assert_eq!(field_of(&err), Some(field), "{err}");
    }
}

#[test]
fn defaults_match_documented_values() {
    let decorator = streamer().decorator().unwrap();
    let cfg = decorator.config();
    assert_eq!(cfg.exchange(), marketstream::DEFAULT_EXCHANGE);
    assert_eq!(cfg.symbols(), ["BTC/USDT", "ETH/USDT"]);
    assert_eq!(cfg.timeframe().to_string(), "1m");
    assert!(cfg.reconnect().auto_reconnect);
    assert_eq!(cfg.reconnect().reconnect_delay, Duration::from_secs(5));
}

#[test]
fn decorator_debug_shows_feed_and_config() {
    let decorator = streamer().exchange("kraken").name("majors").decorator().unwrap();
    let shown = format!("{decorator:?}");
    assert!(shown.contains("synthetic"), "{shown}");
    assert!(shown.contains("kraken"), "{shown}");
    assert!(shown.contains("majors"), "{shown}");
}

#[test]
fn stream_name_defaults_to_handler_function() {
    let stream = streamer().build(keep_going).unwrap();
    assert_eq!(stream.name(), "keep_going");

    let named = streamer().name("btc-ticker").build(keep_going).unwrap();
    assert_eq!(named.name(), "btc-ticker");
}

#[test]
fn options_overlay_json_settings() {
    let opts = StreamOptions::from_json(
        r#"{"exchange": "Kraken", "symbols": ["XBT/USD"], "max_reconnect_attempts": "unbounded"}"#,
    )
    .unwrap();
    let decorator = streamer().timeframe("15m").options(opts).decorator().unwrap();

    let cfg = decorator.config();
    assert_eq!(cfg.exchange(), "kraken");
    assert_eq!(cfg.symbols(), ["XBT/USD"]);
    assert_eq!(cfg.timeframe().to_string(), "15m");
    assert!(cfg.reconnect().may_retry(u32::MAX));

    let err = StreamOptions::from_json(r#"{"speed": 3}"#).unwrap_err();
    assert_eq!(field_of(&err), Some("options"));
}

#[tokio::test]
async fn one_decorator_wraps_independent_handlers() {
    let (builder, controller) = scripted("P0");
    controller
        .set_default_script(SessionScript::Records(vec![rec(BTC, 1), rec(ETH, 2)]))
        .await;
    let decorator = builder.decorator().unwrap();

    let first = Recorder::default();
    let second = Recorder::default();
    let a = decorator.decorate(first.handler(1));
    let b = decorator.decorate(second.handler(usize::MAX));
    assert_eq!(a.config(), b.config());

    let ra = a.run().await.unwrap();
    let rb = b.run().await.unwrap();
    assert_eq!(ra.termination, Termination::Stopped);
    assert_eq!(rb.termination, Termination::Exhausted);
    assert_eq!(first.prices(), vec![1]);
    assert_eq!(second.prices(), vec![1, 2]);
    assert_eq!(controller.connect_attempts().await, 2);
}

#[tokio::test]
async fn connect_receives_configured_symbols() {
    let (builder, controller) = scripted("P0");
    controller.push_script(SessionScript::Records(Vec::new())).await;
    let stream = builder
        .symbols(["SOL/USDT"])
        .build(|_r: MarketDataRecord| async {})
        .unwrap();

    stream.run().await.unwrap();
    assert_eq!(
        controller.connect_requests().await,
        vec![vec!["SOL/USDT".to_string()]]
    );
}

mod props {
    use marketstream::streamer;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn exchange_is_trimmed_and_lower_cased(name in "[A-Za-z]{1,12}", pad in 0usize..3) {
            let raw = format!("{}{name}{}", " ".repeat(pad), " ".repeat(pad));
            let decorator = streamer().exchange(raw).decorator().unwrap();
            prop_assert_eq!(decorator.config().exchange(), name.to_lowercase());
        }

        #[test]
        fn attempt_bound_is_accepted_iff_non_negative(n in -1_000i64..1_000) {
            let res = streamer().max_reconnect_attempts(n).decorator();
            prop_assert_eq!(res.is_ok(), n >= 0);
        }
    }
}
