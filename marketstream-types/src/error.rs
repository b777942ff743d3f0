use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unified error type for the marketstream workspace.
///
/// Configuration problems surface while a stream is being decorated, connection
/// failures are retried by the runner according to its reconnect policy, and
/// handler failures are propagated untouched to whoever awaits the stream.
#[derive(Debug, Error, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum StreamError {
    /// An option failed validation while building a stream configuration.
    #[error("invalid configuration for `{field}`: {reason}")]
    Configuration {
        /// Name of the offending option (e.g. "symbols").
        field: String,
        /// Human-readable description of the problem.
        reason: String,
    },

    /// The feed could not be connected or dropped while producing a record.
    #[error("connection to {exchange} failed: {msg}")]
    Connection {
        /// Exchange identifier the connection was made for.
        exchange: String,
        /// Human-readable error message.
        msg: String,
    },

    /// Reconnection was attempted up to the configured bound without success.
    #[error("{exchange}: giving up after {attempts} reconnect attempts: {last}")]
    ReconnectsExhausted {
        /// Exchange identifier of the failed stream.
        exchange: String,
        /// Number of reconnect attempts performed before giving up.
        attempts: u32,
        /// The connection error that triggered the final failure.
        last: Box<StreamError>,
    },

    /// A record handler reported a failure.
    #[error("handler failed: {0}")]
    Handler(String),

    /// An entry point without stream metadata was passed where one is required.
    #[error("not a decorated stream: {name}")]
    NotDecorated {
        /// Name of the offending entry point.
        name: String,
    },

    /// Invalid input argument.
    #[error("invalid argument: {0}")]
    InvalidArg(String),

    /// Unknown/opaque error.
    #[error("unknown error: {0}")]
    Other(String),
}

impl StreamError {
    /// Helper: build a `Configuration` error for an option name and reason.
    pub fn configuration(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Configuration {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Helper: build a `Connection` error with the exchange and message.
    pub fn connection(exchange: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Connection {
            exchange: exchange.into(),
            msg: msg.into(),
        }
    }

    /// Helper: build a `Handler` error from a message.
    pub fn handler(msg: impl Into<String>) -> Self {
        Self::Handler(msg.into())
    }

    /// Helper: build a `NotDecorated` error for the given entry point name.
    pub fn not_decorated(name: impl Into<String>) -> Self {
        Self::NotDecorated { name: name.into() }
    }

    /// Returns true for transient feed failures the reconnect policy may retry.
    #[must_use]
    pub const fn is_connection(&self) -> bool {
        matches!(self, Self::Connection { .. })
    }

    /// Returns true if this error is a terminal failure after exhausting retries.
    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        matches!(self, Self::ReconnectsExhausted { .. })
    }
}
