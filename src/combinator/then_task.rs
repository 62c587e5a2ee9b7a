//! Task continuation: derive a task from a factory producing a follow-up
//! task.
//!
//! # Semantics
//!
//! `source.then_task(factory)`:
//!
//! 1. Submitting the derived task submits `source` first
//! 2. On `Succeeded(v)`, the factory runs exactly once with `v`; the
//!    inner task it returns is submitted to the same executor, and its
//!    eventual outcome (all three variants) is forwarded to the derived
//!    task
//! 3. On `Failed(c)` / `Cancelled`, the factory never runs and the
//!    outcome short-circuits exactly as in
//!    [`then`](crate::Task::then)
//!
//! At most one inner task is created and submitted per outer submission:
//! the factory is `FnOnce` and the launch slot is one-shot. A factory
//! panic fails the derived task.

use crate::error::Error;
use crate::task::Task;
use crate::types::Outcome;
use std::panic::{catch_unwind, AssertUnwindSafe};
use tracing::trace;

impl<T: Clone + Send + 'static> Task<T> {
    /// Derives a task that, on success, runs `factory` to obtain a
    /// follow-up task and adopts its outcome.
    #[must_use = "a derived task does nothing until submitted"]
    pub fn then_task<E, F>(&self, factory: F) -> Task<E>
    where
        E: Clone + Send + 'static,
        F: FnOnce(T) -> Task<E> + Send + 'static,
    {
        let source = self.clone();
        Task::from_launch(
            None,
            Box::new(move |exec, derived| {
                let inner_exec = exec.clone();
                source.on_completed_boxed(Box::new(move |outcome| match outcome {
                    Outcome::Succeeded(value) => {
                        // Cancelled while waiting on the source: the
                        // factory must not run.
                        if !derived.begin_running() {
                            return;
                        }
                        let value = value.clone();
                        match catch_unwind(AssertUnwindSafe(move || factory(value))) {
                            Ok(inner) => {
                                trace!("submitting inner task produced by factory");
                                let forward = derived.clone();
                                inner.on_completed_boxed(Box::new(move |inner_outcome| {
                                    forward.complete(inner_outcome.clone());
                                }));
                                inner.submit(&inner_exec);
                            }
                            Err(payload) => derived
                                .complete(Outcome::Failed(Error::panicked(payload.as_ref()))),
                        }
                    }
                    Outcome::Cancelled => derived.complete(Outcome::Cancelled),
                    Outcome::Failed(cause) => derived.complete(Outcome::Failed(cause.clone())),
                }));
                source.submit(&exec);
            }),
        )
    }
}
