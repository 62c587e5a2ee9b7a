//! Shared helpers for unit tests.
//!
//! - Consistent tracing-based logging initialization (`Once`-guarded)
//! - Blocking outcome waiters for asserting on terminal states
//!
//! Test-only: not part of the public API surface. Integration tests have
//! their own copy of the logging setup in `tests/common`.

use crate::task::Task;
use crate::types::Outcome;
use std::sync::mpsc;
use std::sync::Once;
use std::time::Duration;

static INIT_LOGGING: Once = Once::new();

/// Initialize test logging with trace-level output.
///
/// Safe to call multiple times; only initializes once.
#[cfg(test)]
pub fn init_test_logging() {
    INIT_LOGGING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(true)
            .with_ansi(false)
            .try_init();
    });
}

/// No-op outside the crate's own test build.
#[cfg(not(test))]
pub fn init_test_logging() {
    INIT_LOGGING.call_once(|| {});
}

/// Blocks the calling thread until `task` reaches a terminal state.
///
/// Test-only by design: production code must never block on a task; it
/// registers listeners instead.
///
/// # Panics
///
/// Panics if the task does not complete within `timeout`.
pub fn wait_for<T: Clone + Send + 'static>(task: &Task<T>, timeout: Duration) -> Outcome<T> {
    let (tx, rx) = mpsc::channel();
    task.on_completed(move |outcome| {
        let _ = tx.send(outcome.clone());
    });
    rx.recv_timeout(timeout)
        .expect("task did not complete within the test timeout")
}
