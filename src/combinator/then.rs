//! Value continuation: derive a task by transforming the source value.
//!
//! # Semantics
//!
//! `source.then(op, run_in_background)`:
//!
//! 1. Submitting the derived task submits `source` first
//! 2. On `Succeeded(v)`, the operation runs exactly once with `v`
//! 3. On `Failed(c)`, the operation never runs; the derived task fails
//!    with the *same* cause `c`
//! 4. On `Cancelled`, the operation never runs; the derived task is
//!    cancelled
//!
//! With `run_in_background == false` the operation runs the instant the
//! source completes, on whichever thread delivered completion (commonly
//! the affinity thread). With `true` it is dispatched to the background
//! lane regardless of where the source completed.
//!
//! An operation error or panic becomes a `Failed` outcome on the derived
//! task. In the inline case this still holds: the cause is captured by
//! the completion dispatch and never unwinds into the `submit` caller.

use crate::error::Error;
use crate::executor::Lane;
use crate::task::Task;
use crate::types::Outcome;
use tracing::trace;

impl<T: Clone + Send + 'static> Task<T> {
    /// Derives a task that applies `op` to this task's success value.
    ///
    /// See the module docs for the propagation rules and the meaning of
    /// `run_in_background`.
    #[must_use = "a derived task does nothing until submitted"]
    pub fn then<E, F>(&self, op: F, run_in_background: bool) -> Task<E>
    where
        E: Clone + Send + 'static,
        F: FnOnce(T) -> Result<E, Error> + Send + 'static,
    {
        let source = self.clone();
        Task::from_launch(
            None,
            Box::new(move |exec, derived| {
                let dispatch_exec = exec.clone();
                source.on_completed_boxed(Box::new(move |outcome| match outcome {
                    Outcome::Succeeded(value) => {
                        let value = value.clone();
                        if run_in_background {
                            trace!("dispatching continuation to background lane");
                            let derived = derived.clone();
                            dispatch_exec.execute(
                                Lane::Background,
                                Box::new(move || derived.run_operation(op, value)),
                            );
                        } else {
                            derived.run_operation(op, value);
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
