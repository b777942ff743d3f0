use std::fmt;
use std::sync::Arc;

use futures::future::join_all;
use marketstream_core::{
    EntryPoint, MultiStreamReport, StopSignal, StopTrigger, StreamError, StreamHandle,
    UnitOutcome, join_error, stop_channel,
};

/// Handle to a spawned [`MultiStream`] run.
pub type MultiStreamHandle = StreamHandle<MultiStreamReport>;

/// Runs several decorated streams concurrently and independently.
///
/// Behavior and trade-offs:
/// - Every unit runs on its own Tokio task; a failing unit never cancels its
///   siblings, and the aggregate report lists one outcome per unit in the
///   order the units were added.
/// - Units share nothing but the stop signal. Cancelling (or dropping the
///   `run` future) asks every unit to stop after its in-flight handler call.
/// - A panicking unit is reported as `StreamError::Other` rather than
///   tearing down the whole run.
#[derive(Clone, Default)]
pub struct MultiStream {
    units: Vec<Arc<dyn EntryPoint>>,
}

impl fmt::Debug for MultiStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultiStream")
            .field("units", &self.units.iter().map(|u| u.name()).collect::<Vec<_>>())
            .finish()
    }
}

impl MultiStream {
    /// Create an empty orchestrator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a unit.
    #[must_use]
    pub fn with_stream(self, unit: impl EntryPoint + 'static) -> Self {
        self.with_entry(Arc::new(unit))
    }

    /// Add an already shared unit.
    #[must_use]
    pub fn with_entry(mut self, unit: Arc<dyn EntryPoint>) -> Self {
        self.units.push(unit);
        self
    }

    /// Number of units.
    #[must_use]
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Whether no unit was added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    fn validate(&self) -> Result<(), StreamError> {
        if self.units.is_empty() {
            return Err(StreamError::InvalidArg(
                "at least one stream is required".into(),
            ));
        }
        if let Some(plain) = self.units.iter().find(|u| u.stream_config().is_none()) {
            return Err(StreamError::not_decorated(plain.name()));
        }
        Ok(())
    }

    /// Run every unit to completion.
    ///
    /// # Errors
    /// Returns `StreamError::InvalidArg` when no unit was added and
    /// `StreamError::NotDecorated` when a unit carries no stream
    /// configuration. Unit failures are reported in the aggregate, not here.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(target = "marketstream", skip(self), fields(units = self.units.len()))
    )]
    pub async fn run(&self) -> Result<MultiStreamReport, StreamError> {
        self.validate()?;
        let (trigger, signal) = stop_channel();
        let _guard = CancelOnDrop(trigger);
        Ok(run_units(self.units.clone(), signal).await)
    }

    /// Run every unit on a background task.
    ///
    /// # Errors
    /// Same validation as [`MultiStream::run`].
    pub fn spawn(&self) -> Result<MultiStreamHandle, StreamError> {
        self.validate()?;
        let (trigger, signal) = stop_channel();
        let units = self.units.clone();
        let join = tokio::spawn(async move { Ok(run_units(units, signal).await) });
        Ok(StreamHandle::new(join, trigger))
    }
}

struct CancelOnDrop(StopTrigger);

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.0.stop();
    }
}

async fn run_units(units: Vec<Arc<dyn EntryPoint>>, stop: StopSignal) -> MultiStreamReport {
    let names: Vec<String> = units.iter().map(|u| u.name().to_string()).collect();
    let tasks = units.into_iter().map(|unit| {
        let stop = stop.clone();
        tokio::spawn(async move { unit.run_until(stop).await })
    });
    let joined = join_all(tasks).await;

    let outcomes = names
        .into_iter()
        .zip(joined)
        .map(|(name, res)| {
            let result = res.map_err(join_error).and_then(|r| r);
            #[cfg(feature = "tracing")]
            if let Err(e) = &result {
                tracing::warn!(unit = %name, error = %e, "stream unit failed");
            }
            UnitOutcome { name, result }
        })
        .collect();
    MultiStreamReport { outcomes }
}
