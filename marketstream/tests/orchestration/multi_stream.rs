use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use marketstream::{
    MarketDataRecord, MultiStream, PlainTask, SessionScript, StreamError, Termination,
};

use crate::helpers::{BTC, ETH, Recorder, rec, scripted};

#[tokio::test]
async fn empty_orchestrator_is_rejected() {
    let err = MultiStream::new().run().await.unwrap_err();
    assert!(matches!(err, StreamError::InvalidArg(_)));
    assert!(MultiStream::new().spawn().is_err());
}

#[tokio::test]
async fn plain_task_is_rejected_before_anything_runs() {
    let (builder, controller) = scripted("P0");
    let stream = builder.build(|_r: MarketDataRecord| async {}).unwrap();
    let multi = MultiStream::new()
        .with_stream(stream)
        .with_stream(PlainTask::new("housekeeping", || async { Ok(()) }));

    let err = multi.run().await.unwrap_err();
    assert_eq!(err, StreamError::NotDecorated { name: "housekeeping".into() });
    assert_eq!(controller.connect_attempts().await, 0);
}

#[tokio::test(start_paused = true)]
async fn units_finish_independently_in_input_order() {
    let (failing, failing_ctl) = scripted("P1");
    failing_ctl
        .push_script(SessionScript::Cycle(vec![rec(BTC, 1)]))
        .await;
    let failing = failing
        .name("failing")
        .build(|_r: MarketDataRecord| async { Err::<(), _>(StreamError::handler("boom")) })
        .unwrap();

    let (stopping, stopping_ctl) = scripted("P2");
    stopping_ctl.set_pacing(Duration::from_secs(1)).await;
    stopping_ctl
        .push_script(SessionScript::Cycle(vec![rec(ETH, 2)]))
        .await;
    let recorder = Recorder::default();
    let stopping = stopping.name("stopping").build(recorder.handler(3)).unwrap();

    let (ending, ending_ctl) = scripted("P3");
    ending_ctl
        .push_script(SessionScript::Records(vec![rec(BTC, 3), rec(ETH, 4)]))
        .await;
    let ending = ending.name("ending").build(|_r: MarketDataRecord| async {}).unwrap();

    let report = MultiStream::new()
        .with_stream(failing)
        .with_stream(stopping)
        .with_stream(ending)
        .run()
        .await
        .unwrap();

    let names: Vec<&str> = report.outcomes.iter().map(|o| o.name.as_str()).collect();
    assert_eq!(names, vec!["failing", "stopping", "ending"]);
    assert_eq!(report.failed(), 1);
    assert_eq!(report.stopped(), 1);
    assert_eq!(
        report.get("failing").and_then(|o| o.error()),
        Some(&StreamError::Handler("boom".into()))
    );
    let stopped = report.get("stopping").unwrap().result.as_ref().unwrap();
    assert_eq!(stopped.delivered, 3);
    assert!(report.get("ending").unwrap().is_exhausted());
}

#[tokio::test]
async fn panicking_unit_is_reported_as_error() {
    let (panicky, ctl) = scripted("P0");
    ctl.push_script(SessionScript::Records(vec![rec(BTC, 1)])).await;
    let panicky = panicky
        .name("panicky")
        .build(|r: MarketDataRecord| async move {
            if !r.symbol.is_empty() {
                panic!("handler exploded");
            }
        })
        .unwrap();
    let (calm, calm_ctl) = scripted("P1");
    calm_ctl
        .push_script(SessionScript::Records(vec![rec(ETH, 2)]))
        .await;
    let calm = calm.name("calm").build(|_r: MarketDataRecord| async {}).unwrap();

    let report = MultiStream::new()
        .with_stream(panicky)
        .with_stream(calm)
        .run()
        .await
        .unwrap();

    match report.get("panicky").and_then(|o| o.error()) {
        Some(StreamError::Other(msg)) => assert!(msg.contains("handler exploded")),
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert!(report.get("calm").unwrap().is_exhausted());
}

#[tokio::test(start_paused = true)]
async fn stopping_the_handle_cancels_every_unit() {
    let mut multi = MultiStream::new();
    let mut controllers = Vec::new();
    for name in ["a", "b"] {
        let (builder, ctl) = scripted("P0");
        ctl.set_pacing(Duration::from_secs(1)).await;
        ctl.push_script(SessionScript::Cycle(vec![rec(BTC, 1)])).await;
        multi = multi.with_stream(builder.name(name).build(|_r: MarketDataRecord| async {}).unwrap());
        controllers.push(ctl);
    }

    let handle = multi.spawn().unwrap();
    tokio::time::sleep(Duration::from_millis(2_500)).await;
    let report = handle.stop().await.unwrap();

    assert_eq!(report.cancelled(), 2);
    for outcome in &report.outcomes {
        let unit = outcome.result.as_ref().unwrap();
        assert_eq!(unit.termination, Termination::Cancelled);
        assert_eq!(unit.delivered, 2);
    }
}

#[tokio::test(start_paused = true)]
async fn dropping_the_run_future_cancels_units() {
    let (builder, ctl) = scripted("P0");
    ctl.set_pacing(Duration::from_secs(1)).await;
    ctl.push_script(SessionScript::Cycle(vec![rec(BTC, 1)])).await;
    let recorder = Recorder::default();
    let multi = MultiStream::new().with_stream(builder.build(recorder.handler(usize::MAX)).unwrap());

    let res = tokio::time::timeout(Duration::from_millis(2_500), multi.run()).await;
    assert!(res.is_err());
    tokio::time::sleep(Duration::from_secs(10)).await;

    assert_eq!(recorder.len(), 2);
}

#[tokio::test]
async fn one_unit_stopping_and_one_failing_both_report() {
    let (quick, quick_ctl) = scripted("P1");
    quick_ctl
        .push_script(SessionScript::Cycle(vec![rec(BTC, 1)]))
        .await;
    let quick_calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&quick_calls);
    let quick = quick
        .name("quick")
        .build(move |_r: MarketDataRecord| {
            counter.fetch_add(1, Ordering::SeqCst);
            async { false }
        })
        .unwrap();

    let (flaky, flaky_ctl) = scripted("P2");
    flaky_ctl
        .push_script(SessionScript::Cycle(vec![rec(ETH, 2)]))
        .await;
    let flaky_calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&flaky_calls);
    let flaky = flaky
        .name("flaky")
        .build(move |_r: MarketDataRecord| {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                if n == 2 {
                    Err(StreamError::handler("second record rejected"))
                } else {
                    Ok(())
                }
            }
        })
        .unwrap();

    let report = MultiStream::new()
        .with_stream(quick)
        .with_stream(flaky)
        .run()
        .await
        .unwrap();

    assert_eq!(report.outcomes.len(), 2);
    let quick_report = report.get("quick").unwrap().result.as_ref().unwrap();
    assert_eq!(quick_report.termination, Termination::Stopped);
    assert_eq!(quick_report.delivered, 1);
    assert_eq!(
        report.get("flaky").and_then(|o| o.error()),
        Some(&StreamError::Handler("second record rejected".into()))
    );
    assert_eq!(quick_calls.load(Ordering::SeqCst), 1);
    assert_eq!(flaky_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn abandoning_multi_stream_join_cancels_units() {
    let (builder, ctl) = scripted("P0");
    ctl.set_pacing(Duration::from_secs(1)).await;
    ctl.push_script(SessionScript::Cycle(vec![rec(BTC, 1)])).await;
    let recorder = Recorder::default();
    let multi = MultiStream::new().with_stream(builder.build(recorder.handler(usize::MAX)).unwrap());

    let handle = multi.spawn().unwrap();
    let joined = tokio::time::timeout(Duration::from_millis(2_500), handle.join()).await;
    assert!(joined.is_err());
    tokio::time::sleep(Duration::from_secs(10)).await;

    assert_eq!(recorder.len(), 2);
}
