use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, oneshot};

use marketstream_core::{DataSource, FeedConnector, MarketDataRecord, StreamConfig, StreamError};

/// Instruction for how one connection attempt should behave.
#[derive(Debug, Clone)]
pub enum SessionScript {
    /// Connect, deliver these records, then end the feed.
    Records(Vec<MarketDataRecord>),
    /// Connect, deliver these records, then fail the next read with the error.
    RecordsThenFail(Vec<MarketDataRecord>, StreamError),
    /// Connect and deliver these records over and over until stopped or killed.
    Cycle(Vec<MarketDataRecord>),
    /// Fail the connection attempt itself.
    FailConnect(StreamError),
    /// Never finish connecting (simulate a network stall).
    Hang,
}

#[derive(Default)]
struct InternalState {
    queue: VecDeque<SessionScript>,
    default_script: Option<SessionScript>,
    connect_requests: Vec<Vec<String>>,
    kill_switch: Option<oneshot::Sender<()>>,
    pacing: Duration,
}

/// Controller handle used by tests to drive a [`ScriptedConnector`] from the outside.
pub struct ScriptController {
    state: Arc<Mutex<InternalState>>,
}

impl ScriptController {
    /// Queue a script for the next unserved connection attempt.
    pub async fn push_script(&self, script: SessionScript) {
        self.state.lock().await.queue.push_back(script);
    }

    /// Queue several scripts in order.
    pub async fn push_scripts(&self, scripts: impl IntoIterator<Item = SessionScript>) {
        self.state.lock().await.queue.extend(scripts);
    }

    /// Script used once the queue is empty.
    pub async fn set_default_script(&self, script: SessionScript) {
        self.state.lock().await.default_script = Some(script);
    }

    /// Pause before each record delivered by later sessions.
    pub async fn set_pacing(&self, pacing: Duration) {
        self.state.lock().await.pacing = pacing;
    }

    /// Number of `connect` calls observed so far.
    pub async fn connect_attempts(&self) -> usize {
        self.state.lock().await.connect_requests.len()
    }

    /// Symbols requested by every `connect` call, in call order.
    pub async fn connect_requests(&self) -> Vec<Vec<String>> {
        self.state.lock().await.connect_requests.clone()
    }

    /// Remotely kill the most recent session so its next read fails.
    ///
    /// Returns `false` when no session is active.
    pub async fn fail_active(&self) -> bool {
        let mut guard = self.state.lock().await;
        guard
            .kill_switch
            .take()
            .is_some_and(|tx| tx.send(()).is_ok())
    }

    /// Clear all queued scripts, the default script and the request log.
    pub async fn clear_all(&self) {
        let mut guard = self.state.lock().await;
        guard.queue.clear();
        guard.default_script = None;
        guard.connect_requests.clear();
        guard.kill_switch = None;
    }
}

/// A connector that defers every connection outcome to a [`ScriptController`].
pub struct ScriptedConnector {
    name: &'static str,
    state: Arc<Mutex<InternalState>>,
}

impl ScriptedConnector {
    /// Create a new scripted connector and its controller.
    #[must_use]
    pub fn new_with_controller(name: &'static str) -> (Arc<dyn FeedConnector>, ScriptController) {
        let state = Arc::new(Mutex::new(InternalState::default()));
        let controller = ScriptController {
            state: Arc::clone(&state),
        };
        let me = Arc::new(Self { name, state });
        (me as Arc<dyn FeedConnector>, controller)
    }
}

#[async_trait]
impl FeedConnector for ScriptedConnector {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn connect(&self, config: &StreamConfig) -> Result<Box<dyn DataSource>, StreamError> {
        // Pick the script and publish a kill switch without holding the lock across await
        let (script, pacing, kill_rx) = {
            let mut guard = self.state.lock().await;
            guard.connect_requests.push(config.symbols().to_vec());
            let script = guard
                .queue
                .pop_front()
                .or_else(|| guard.default_script.clone());
            let (kill_tx, kill_rx) = oneshot::channel();
            if matches!(
                script,
                Some(
                    SessionScript::Records(_)
                        | SessionScript::RecordsThenFail(..)
                        | SessionScript::Cycle(_)
                )
            ) {
                guard.kill_switch = Some(kill_tx);
            }
            (script, guard.pacing, kill_rx)
        };

        let (records, tail) = match script {
            None => {
                return Err(StreamError::connection(
                    config.exchange(),
                    format!("{}: no scripted session available", self.name),
                ));
            }
            Some(SessionScript::FailConnect(e)) => return Err(e),
            Some(SessionScript::Hang) => return std::future::pending().await,
            Some(SessionScript::Records(r)) => (r, Tail::End),
            Some(SessionScript::RecordsThenFail(r, e)) => (r, Tail::Fail(e)),
            Some(SessionScript::Cycle(r)) => (r, Tail::Cycle),
        };

        let records = records
            .into_iter()
            .filter(|r| config.contains_symbol(&r.symbol))
            .map(|mut r| {
                config.exchange().clone_into(&mut r.exchange);
                r
            })
            .collect();

        Ok(Box::new(ScriptedSession {
            exchange: config.exchange().to_string(),
            records,
            cursor: 0,
            tail,
            pacing,
            kill_rx,
            closed: false,
        }))
    }
}

enum Tail {
    End,
    Fail(StreamError),
    Cycle,
}

struct ScriptedSession {
    exchange: String,
    records: Vec<MarketDataRecord>,
    cursor: usize,
    tail: Tail,
    pacing: Duration,
    kill_rx: oneshot::Receiver<()>,
    closed: bool,
}

impl ScriptedSession {
    fn killed(&mut self) -> bool {
        self.kill_rx.try_recv().is_ok()
    }
}

#[async_trait]
impl DataSource for ScriptedSession {
    async fn next_record(&mut self) -> Result<Option<MarketDataRecord>, StreamError> {
        if self.closed {
            return Ok(None);
        }
        if self.pacing.is_zero() {
            tokio::task::yield_now().await;
        } else {
            tokio::time::sleep(self.pacing).await;
        }
        if self.killed() {
            return Err(StreamError::connection(
                &self.exchange,
                "session killed by controller",
            ));
        }

        if self.cursor >= self.records.len() {
            match &self.tail {
                Tail::Cycle if !self.records.is_empty() => self.cursor = 0,
                // An empty cycle has nothing to repeat; keep the session open.
                Tail::Cycle => return std::future::pending().await,
                Tail::End => return Ok(None),
                Tail::Fail(e) => return Err(e.clone()),
            }
        }
        let record = self.records[self.cursor].clone();
        self.cursor += 1;
        Ok(Some(record))
    }

    async fn close(&mut self) {
        self.closed = true;
    }
}
