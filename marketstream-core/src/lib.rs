//! marketstream-core
//!
//! Core traits and task plumbing shared across the marketstream ecosystem.
//!
//! - `source`: the `FeedConnector` and `DataSource` traits every feed implements.
//! - `handler`: the `RecordHandler` trait and the `Flow` a handler returns.
//! - `entry`: the type-erased `EntryPoint` the orchestrator and introspection work with.
//! - `stream`: cooperative stop signals and the `StreamHandle` for spawned streams.
//!
//! Async runtime (Tokio)
//! ---------------------
//! `stream::StreamHandle` wraps `tokio::task::JoinHandle` and stop signals are
//! carried over `tokio::sync::watch`, so streams must run under a Tokio 1.x
//! runtime.
#![warn(missing_docs)]

/// Type-erased runnable stream units.
pub mod entry;
/// Record handler trait and flow control.
pub mod handler;
/// Feed connector and connection traits.
pub mod source;
/// Stop signals and handles for spawned streams.
pub mod stream;
pub mod types;

pub use entry::EntryPoint;
pub use handler::{Flow, IntoFlow, RecordHandler};
pub use source::{DataSource, FeedConnector};
pub use stream::{StopSignal, StopTrigger, StreamHandle, join_error, stop_channel};
pub use types::*;
