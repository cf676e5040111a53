//! Shared helpers for `buildpipe` integration tests.

pub mod fixture;

pub use fixture::ProjectFixture;

use std::future::Future;
use std::sync::Once;
use std::time::Duration;

use tracing_subscriber::{EnvFilter, fmt};

static INIT: Once = Once::new();

/// Default budget for a single awaited pipeline operation.
pub const TEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Install a test-writer subscriber once per test binary.
///
/// Filter directives come from `BUILDPIPE_LOG`, then `RUST_LOG`, falling
/// back to `info`. Output is captured by the harness and shown only for
/// failing tests unless run with `--nocapture`.
pub fn init_tracing() {
    INIT.call_once(|| {
        let directives = std::env::var("BUILDPIPE_LOG")
            .or_else(|_| std::env::var("RUST_LOG"))
            .unwrap_or_else(|_| "info".to_string());
        let filter = EnvFilter::try_new(&directives).unwrap_or_else(|_| EnvFilter::new("info"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .init();
    });
}

/// Await `f`, panicking if it takes longer than [`TEST_TIMEOUT`].
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: Future<Output = T>,
{
    with_timeout_of(TEST_TIMEOUT, f).await
}

/// Await `f`, panicking if it takes longer than `limit`.
pub async fn with_timeout_of<F, T>(limit: Duration, f: F) -> T
where
    F: Future<Output = T>,
{
    match tokio::time::timeout(limit, f).await {
        Ok(value) => value,
        Err(_) => panic!("test operation timed out after {limit:?}"),
    }
}
