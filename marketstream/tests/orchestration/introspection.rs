use marketstream::{
    EntryPoint, MarketDataRecord, PlainTask, StopSignal, StreamError, Termination, Timeframe,
    describe, stream_config, streamer,
};
use serde_json::json;

async fn on_trade(_record: MarketDataRecord) -> bool {
    true
}

#[test]
fn describe_reports_attached_options() {
    let stream = streamer()
        .exchange("coinbase")
        .symbols(["BTC/USD"])
        .build(on_trade)
        .unwrap();

    let map = describe(&stream).unwrap();
    assert_eq!(map["exchange"], json!("coinbase"));
    assert_eq!(map["symbols"], json!(["BTC/USD"]));
    assert_eq!(map["timeframe"], json!("1m"));
    assert_eq!(map["auto_reconnect"], json!(true));
    assert_eq!(map["reconnect_delay"], json!(5.0));
    assert_eq!(map["max_reconnect_attempts"], json!(3));
    assert_eq!(map, stream.describe());
}

#[test]
fn introspection_works_through_trait_objects() {
    let stream = streamer()
        .timeframe(Timeframe::H4)
        .unbounded_reconnects()
        .build(on_trade)
        .unwrap();
    let entry: &dyn EntryPoint = &stream;

    let config = stream_config(entry).unwrap();
    assert_eq!(config.timeframe(), Timeframe::H4);
    assert_eq!(
        describe(entry).unwrap()["max_reconnect_attempts"],
        json!("unbounded")
    );
}

#[test]
fn plain_task_is_not_decorated() {
    let plain = PlainTask::new("cleanup", || async { Ok(()) });
    assert!(stream_config(&plain).is_none());
    assert_eq!(
        describe(&plain).unwrap_err(),
        StreamError::NotDecorated { name: "cleanup".into() }
    );
}

#[tokio::test]
async fn plain_task_still_runs_on_its_own() {
    let plain = PlainTask::new("cleanup", || async { Ok(()) });
    let report = plain.run_until(StopSignal::never()).await.unwrap();
    assert_eq!(report.termination, Termination::Stopped);

    let failing = PlainTask::new("broken", || async { Err::<(), _>(StreamError::handler("nope")) });
    assert_eq!(
        failing.run_until(StopSignal::never()).await.unwrap_err(),
        StreamError::Handler("nope".into())
    );
}
