//! Stand-in feeds for marketstream.
//!
//! - [`SyntheticConnector`] produces an endless pseudo-random walk per symbol and
//!   is the default feed for decorated streams.
//! - [`ScriptedConnector`] plays back per-connection scripts driven by a
//!   [`ScriptController`], for tests that need exact control over connection
//!   outcomes.
#![warn(missing_docs)]

mod scripted;
mod synthetic;

pub use scripted::{ScriptController, ScriptedConnector, SessionScript};
pub use synthetic::{PRICE_FLOOR, SyntheticConnector, SyntheticFeed, base_price};
