use marketstream_core::{EntryPoint, StreamConfig, StreamError};
use serde_json::{Map, Value};

/// Configuration attached to a decorated entry point, if any.
#[must_use]
pub fn stream_config<E: EntryPoint + ?Sized>(entry: &E) -> Option<&StreamConfig> {
    entry.stream_config()
}

/// Effective stream options of a decorated entry point, keyed by option name.
///
/// # Errors
/// Returns `StreamError::NotDecorated` when `entry` carries no stream
/// configuration.
pub fn describe<E: EntryPoint + ?Sized>(entry: &E) -> Result<Map<String, Value>, StreamError> {
    entry
        .stream_config()
        .map(StreamConfig::to_options_map)
        .ok_or_else(|| StreamError::not_decorated(entry.name()))
}
