use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use marketstream::{Flow, MarketDataRecord, SessionScript, StreamError, Termination};
use rust_decimal::Decimal;

use crate::helpers::{BTC, ETH, Recorder, rec, scripted};

#[tokio::test]
async fn delivers_records_in_order_until_handler_stops() {
    let (builder, controller) = scripted("P0");
    controller
        .push_script(SessionScript::Cycle(vec![rec(BTC, 1), rec(ETH, 2), rec(BTC, 3)]))
        .await;
    let recorder = Recorder::default();
    let stream = builder.name("ordered").build(recorder.handler(5)).unwrap();

    let report = stream.run().await.unwrap();
    assert_eq!(report.name, "ordered");
    assert_eq!(report.exchange, "binance");
    assert_eq!(report.termination, Termination::Stopped);
    assert_eq!(report.delivered, 5);
    assert_eq!(report.reconnects, 0);
    assert_eq!(recorder.prices(), vec![1, 2, 3, 1, 2]);
    assert_eq!(controller.connect_attempts().await, 1);
}

#[tokio::test]
async fn every_record_matches_the_configuration() {
    let (builder, controller) = scripted("P0");
    controller
        .push_script(SessionScript::Records(vec![
            rec(BTC, 1),
            rec("DOGE/USDT", 2),
            rec(ETH, 3),
        ]))
        .await;
    let recorder = Recorder::default();
    let stream = builder.build(recorder.handler(usize::MAX)).unwrap();
    stream.run().await.unwrap();

    for record in recorder.seen.lock().unwrap().iter() {
        assert_eq!(record.exchange, stream.config().exchange());
        assert!(stream.config().contains_symbol(&record.symbol));
    }
    assert_eq!(recorder.len(), 2);
}

#[tokio::test]
async fn handler_error_propagates_unchanged_without_retry() {
    let (builder, controller) = scripted("P0");
    controller
        .push_script(SessionScript::Cycle(vec![rec(BTC, 1), rec(BTC, 2)]))
        .await;
    let stream = builder
        .build(|record: MarketDataRecord| async move {
            if record.price == Decimal::from(2) {
                Err(StreamError::handler("bad tick"))
            } else {
                Ok(Flow::Continue)
            }
        })
        .unwrap();

    let err = stream.run().await.unwrap_err();
    assert_eq!(err, StreamError::Handler("bad tick".into()));
    assert_eq!(controller.connect_attempts().await, 1);
}

#[tokio::test]
async fn non_connection_feed_error_is_terminal() {
    let (builder, controller) = scripted("P0");
    let corrupt = StreamError::Other("corrupt frame".into());
    controller
        .push_script(SessionScript::RecordsThenFail(vec![rec(BTC, 1)], corrupt.clone()))
        .await;
    let stream = builder.build(|_r: MarketDataRecord| async {}).unwrap();

    assert_eq!(stream.run().await.unwrap_err(), corrupt);
    assert_eq!(controller.connect_attempts().await, 1);
}

#[tokio::test]
async fn ended_feed_finishes_as_exhausted() {
    let (builder, controller) = scripted("P0");
    controller
        .push_script(SessionScript::Records(vec![rec(BTC, 1), rec(ETH, 2)]))
        .await;
    let stream = builder.build(|_r: MarketDataRecord| async {}).unwrap();

    let report = stream.run().await.unwrap();
    assert_eq!(report.termination, Termination::Exhausted);
    assert_eq!(report.delivered, 2);
    assert_eq!(controller.connect_attempts().await, 1);
}

#[tokio::test]
async fn optional_bool_only_stops_on_false() {
    let (builder, controller) = scripted("P0");
    controller
        .push_script(SessionScript::Cycle(vec![rec(BTC, 1), rec(BTC, 2), rec(BTC, 3)]))
        .await;
    let stream = builder
        .build(|record: MarketDataRecord| async move {
            (record.price == Decimal::from(3)).then_some(false)
        })
        .unwrap();

    let report = stream.run().await.unwrap();
    assert_eq!(report.termination, Termination::Stopped);
    assert_eq!(report.delivered, 3);
}

#[tokio::test]
async fn separate_runs_share_no_state() {
    let (builder, controller) = scripted("P0");
    controller
        .set_default_script(SessionScript::Records(vec![rec(BTC, 1), rec(ETH, 2)]))
        .await;
    let stream = builder.build(|_r: MarketDataRecord| async { true }).unwrap();

    let first = stream.run().await.unwrap();
    let second = stream.run().await.unwrap();
    assert_eq!(first, second);
    assert_eq!(first.delivered, 2);
    assert_eq!(controller.connect_attempts().await, 2);
}

#[tokio::test]
async fn handler_error_on_third_record_ends_after_exactly_three_calls() {
    let (builder, controller) = scripted("P0");
    controller
        .push_script(SessionScript::Cycle(vec![rec(BTC, 1), rec(ETH, 2)]))
        .await;
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let stream = builder
        .build(move |_r: MarketDataRecord| {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                if n == 3 {
                    Err(StreamError::handler("third record rejected"))
                } else {
                    Ok(())
                }
            }
        })
        .unwrap();

    let err = stream.run().await.unwrap_err();
    assert_eq!(err, StreamError::Handler("third record rejected".into()));
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(controller.connect_attempts().await, 1);
}

#[tokio::test]
async fn false_on_first_record_stops_after_one_call() {
    let (builder, controller) = scripted("P0");
    controller
        .push_script(SessionScript::Cycle(vec![rec(BTC, 1), rec(ETH, 2)]))
        .await;
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let stream = builder
        .build(move |_r: MarketDataRecord| {
            counter.fetch_add(1, Ordering::SeqCst);
            async { false }
        })
        .unwrap();

    let report = stream.run().await.unwrap();
    assert_eq!(report.termination, Termination::Stopped);
    assert_eq!(report.delivered, 1);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}
