use std::time::Duration;

use marketstream_core::{
    ReconnectPolicy, StreamConfig, StreamError, StreamReport, Termination,
};

use super::backoff::reconnect_delay;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Connecting,
    Streaming,
    Reconnecting,
    Stopped,
    Exhausted,
    Cancelled,
    Failed,
}

impl Phase {
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Stopped | Self::Exhausted | Self::Cancelled | Self::Failed
        )
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    Start,
    Connected,
    ConnectFailed(StreamError),
    /// The handler completed and asked for the next record.
    RecordDelivered,
    /// The handler completed and asked to stop.
    HandlerStopped,
    HandlerFailed(StreamError),
    /// A connection-level failure while reading.
    FeedFailed(StreamError),
    /// A read failed with an error the reconnect policy does not cover.
    FeedBroken(StreamError),
    FeedEnded,
    DelayElapsed,
    Cancel,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    Connect,
    PullRecord,
    CloseSource,
    ScheduleReconnect { attempt: u32, delay: Duration },
}

#[derive(Debug)]
pub struct Runner {
    pub phase: Phase,
    pub exchange: String,
    pub policy: ReconnectPolicy,
    /// Consecutive reconnects since the last delivered record.
    pub attempts: u32,
    /// Reconnects over the whole run.
    pub reconnects: u32,
    pub delivered: u64,
    /// Records delivered on the current connection.
    pub connection_delivered: u64,
    pub error: Option<StreamError>,
}

impl Runner {
    pub fn new(config: &StreamConfig) -> Self {
        Self {
            phase: Phase::Idle,
            exchange: config.exchange().to_string(),
            policy: *config.reconnect(),
            attempts: 0,
            reconnects: 0,
            delivered: 0,
            connection_delivered: 0,
            error: None,
        }
    }

    pub fn handle(mut self, event: Event) -> (Self, Vec<Action>) {
        if self.phase.is_terminal() {
            return (self, Vec::new());
        }
        match (self.phase, event) {
            (Phase::Idle, Event::Start) | (Phase::Reconnecting, Event::DelayElapsed) => {
                self.phase = Phase::Connecting;
                (self, vec![Action::Connect])
            }
            (Phase::Connecting, Event::Connected) => {
                self.phase = Phase::Streaming;
                self.connection_delivered = 0;
                (self, vec![Action::PullRecord])
            }
            (Phase::Connecting, Event::ConnectFailed(error))
            | (Phase::Streaming, Event::FeedFailed(error)) => self.connection_failure(error),
            (Phase::Streaming, Event::RecordDelivered) => {
                self.record_delivered();
                (self, vec![Action::PullRecord])
            }
            (Phase::Streaming, Event::HandlerStopped) => {
                self.record_delivered();
                self.finish(Phase::Stopped, None)
            }
            (Phase::Streaming, Event::HandlerFailed(error) | Event::FeedBroken(error)) => {
                self.finish(Phase::Failed, Some(error))
            }
            (Phase::Streaming, Event::FeedEnded) => self.finish(Phase::Exhausted, None),
            (_, Event::Cancel) => self.finish(Phase::Cancelled, None),
            // Events that do not apply to the current phase are ignored
            _ => (self, Vec::new()),
        }
    }

    fn record_delivered(&mut self) {
        self.delivered += 1;
        self.connection_delivered += 1;
        if self.connection_delivered == 1 {
            self.attempts = 0;
        }
    }

    fn connection_failure(mut self, error: StreamError) -> (Self, Vec<Action>) {
        if !self.policy.auto_reconnect {
            return self.finish(Phase::Failed, Some(error));
        }
        if !self.policy.may_retry(self.attempts) {
            let exhausted = StreamError::ReconnectsExhausted {
                exchange: self.exchange.clone(),
                attempts: self.attempts,
                last: Box::new(error),
            };
            return self.finish(Phase::Failed, Some(exhausted));
        }
        self.attempts = self.attempts.saturating_add(1);
        self.reconnects = self.reconnects.saturating_add(1);
        self.phase = Phase::Reconnecting;
        let attempt = self.attempts;
        let delay = reconnect_delay(&self.policy, attempt);
        (
            self,
            vec![
                Action::CloseSource,
                Action::ScheduleReconnect { attempt, delay },
            ],
        )
    }

    fn finish(mut self, phase: Phase, error: Option<StreamError>) -> (Self, Vec<Action>) {
        self.phase = phase;
        self.error = error;
        (self, vec![Action::CloseSource])
    }

    /// Final result once the runner reached a terminal phase.
    pub fn into_result(self, name: &str) -> Result<StreamReport, StreamError> {
        let termination = match self.phase {
            Phase::Stopped => Termination::Stopped,
            Phase::Exhausted => Termination::Exhausted,
            Phase::Cancelled => Termination::Cancelled,
            Phase::Failed => {
                return Err(self
                    .error
                    .unwrap_or_else(|| StreamError::Other("stream failed".into())));
            }
            phase => {
                return Err(StreamError::Other(format!(
                    "stream ended in non-terminal phase {phase:?}"
                )));
            }
        };
        Ok(StreamReport {
            name: name.to_string(),
            exchange: self.exchange,
            termination,
            delivered: self.delivered,
            reconnects: self.reconnects,
        })
    }
}
