use std::sync::Arc;
use std::time::Duration;

use marketstream::{FeedConnector, SyntheticConnector};

/// Return a feed for demos.
///
/// With `MARKETSTREAM_DEMOS_FAST` set the synthetic feed emits records every
/// few milliseconds from a fixed seed, so demos finish quickly and
/// reproducibly in CI. Otherwise it paces records from the timeframe.
#[must_use]
pub fn get_connector() -> Arc<dyn FeedConnector> {
    if fast_mode() {
        println!("--- (Using fast synthetic feed for CI) ---");
        Arc::new(
            SyntheticConnector::new()
                .with_pacing(Duration::from_millis(5))
                .with_seed(42),
        )
    } else {
        Arc::new(SyntheticConnector::new())
    }
}

/// Whether demos run against the fast feed.
#[must_use]
pub fn fast_mode() -> bool {
    std::env::var("MARKETSTREAM_DEMOS_FAST").is_ok()
}

/// Scale a wall-clock wait down when running in fast mode.
#[must_use]
pub fn demo_wait(normal: Duration) -> Duration {
    if fast_mode() { normal / 100 } else { normal }
}

/// Install a fmt subscriber filtered by `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .try_init();
}
