//! Error observation: see a failure without altering its propagation.
//!
//! # Semantics
//!
//! `source.inspect_err(handler, lane)` derives a pass-through task:
//!
//! - `Succeeded(v)` forwards unchanged; the handler never runs
//! - `Cancelled` forwards unchanged; the handler never runs
//! - `Failed(c)` still forwards `c` downstream, and the handler is
//!   dispatched exactly once with the cause on the *requested* lane
//!
//! The two lanes are genuinely distinct here: `Lane::Affinity` hands the
//! handler to the serialized interactive thread, `Lane::Background` to
//! the pool. Propagation does not wait for the handler; the failure
//! reaches downstream listeners concurrently with (or before) the
//! handler running. Callers that need ordering must sequence it in the
//! handler itself.

use crate::error::Error;
use crate::executor::Lane;
use crate::task::Task;
use crate::types::Outcome;
use tracing::trace;

impl<T: Clone + Send + 'static> Task<T> {
    /// Derives a pass-through task that observes a failure cause on the
    /// given lane while the failure keeps propagating downstream.
    #[must_use = "a derived task does nothing until submitted"]
    pub fn inspect_err<F>(&self, handler: F, lane: Lane) -> Task<T>
    where
        F: FnOnce(&Error) + Send + 'static,
    {
        let source = self.clone();
        Task::from_launch(
            None,
            Box::new(move |exec, derived| {
                let dispatch_exec = exec.clone();
                source.on_completed_boxed(Box::new(move |outcome| {
                    if let Outcome::Failed(cause) = outcome {
                        trace!(lane = %lane, "dispatching failure observer");
                        let cause = cause.clone();
                        dispatch_exec.execute(lane, Box::new(move || handler(&cause)));
                    }
                    derived.complete(outcome.clone());
                }));
                source.submit(&exec);
            }),
        )
    }
}
