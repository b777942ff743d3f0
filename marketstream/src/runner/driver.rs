use marketstream_core::{
    DataSource, FeedConnector, Flow, RecordHandler, StopSignal, StreamConfig, StreamError,
    StreamReport,
};

use super::backoff::jitter_wait;
use super::state::{Action, Event, Runner};

/// Drive one stream from `Idle` to a terminal phase.
///
/// The stop signal is raced against connecting, reading (including the
/// source's pacing) and reconnect waits. It is never raced against the
/// handler, so an invocation in flight always completes.
pub async fn drive<H>(
    name: &str,
    config: &StreamConfig,
    connector: &dyn FeedConnector,
    handler: &H,
    mut stop: StopSignal,
) -> Result<StreamReport, StreamError>
where
    H: RecordHandler + ?Sized,
{
    let mut runner = Runner::new(config);
    let mut source: Option<Box<dyn DataSource>> = None;
    let mut event = Some(Event::Start);

    while let Some(current) = event.take() {
        let (next, actions) = runner.handle(current);
        runner = next;

        for action in actions {
            match action {
                Action::CloseSource => {
                    if let Some(mut src) = source.take() {
                        src.close().await;
                    }
                }
                Action::Connect => {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(
                        stream = name,
                        connector = connector.name(),
                        exchange = config.exchange(),
                        attempt = runner.attempts,
                        "connecting"
                    );
                    event = Some(tokio::select! {
                        biased;
                        () = stop.stopped() => Event::Cancel,
                        res = connector.connect(config) => match res {
                            Ok(src) => {
                                source = Some(src);
                                Event::Connected
                            }
                            Err(e) => {
                                #[cfg(feature = "tracing")]
                                tracing::warn!(stream = name, error = %e, "connect failed");
                                Event::ConnectFailed(e)
                            }
                        },
                    });
                }
                Action::PullRecord => {
                    event = Some(pull(config, source.as_deref_mut(), handler, &mut stop).await);
                }
                Action::ScheduleReconnect { attempt, delay } => {
                    let wait = jitter_wait(delay, runner.policy.jitter_percent);
                    #[cfg(feature = "tracing")]
                    tracing::info!(
                        stream = name,
                        exchange = config.exchange(),
                        attempt,
                        wait_ms = u64::try_from(wait.as_millis()).unwrap_or(u64::MAX),
                        "scheduling reconnect"
                    );
                    #[cfg(not(feature = "tracing"))]
                    let _ = attempt;
                    event = Some(tokio::select! {
                        biased;
                        () = stop.stopped() => Event::Cancel,
                        () = tokio::time::sleep(wait) => Event::DelayElapsed,
                    });
                }
            }
        }
    }

    #[cfg(feature = "tracing")]
    match &runner.error {
        Some(e) => tracing::error!(stream = name, error = %e, "stream failed"),
        None => tracing::info!(
            stream = name,
            phase = ?runner.phase,
            delivered = runner.delivered,
            "stream finished"
        ),
    }

    runner.into_result(name)
}

async fn pull<H>(
    config: &StreamConfig,
    source: Option<&mut (dyn DataSource + 'static)>,
    handler: &H,
    stop: &mut StopSignal,
) -> Event
where
    H: RecordHandler + ?Sized,
{
    if stop.is_stopped() {
        return Event::Cancel;
    }
    let Some(src) = source else {
        return Event::FeedFailed(StreamError::connection(
            config.exchange(),
            "no active connection",
        ));
    };
    let read = tokio::select! {
        biased;
        () = stop.stopped() => return Event::Cancel,
        read = src.next_record() => read,
    };
    match read {
        Ok(Some(record)) => match handler.on_record(record).await {
            Ok(Flow::Continue) => Event::RecordDelivered,
            Ok(Flow::Stop) => Event::HandlerStopped,
            Err(e) => Event::HandlerFailed(e),
        },
        Ok(None) => Event::FeedEnded,
        Err(e) if e.is_connection() => {
            #[cfg(feature = "tracing")]
            tracing::warn!(exchange = config.exchange(), error = %e, "feed failed");
            Event::FeedFailed(e)
        }
        Err(e) => Event::FeedBroken(e),
    }
}
