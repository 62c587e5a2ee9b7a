//! Fan-in / grouping: await a set of member tasks under one name.
//!
//! # Semantics
//!
//! `source.wrap(name, members)` derives a *named* task that submits its
//! source and every member, waits for all of them, and then yields the
//! source's own (by then already-known) value. The name exists purely to
//! give the group a human-readable identity for progress reporting.
//!
//! # Join contract
//!
//! - Succeeds, with the source value, only when the source and every
//!   member have succeeded
//! - The first observed failure decides the join: the wrapped task fails
//!   with that cause
//! - The first observed cancellation cancels the join
//! - Later signals are ignored; a decided join never changes
//!
//! The success value is delivered only after every participant is
//! terminal. Members are heterogeneous: any task becomes a participant
//! through [`Task::member`], which erases its value type.

use crate::error::Error;
use crate::executor::ExecutorHandle;
use crate::task::Task;
use crate::types::Outcome;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, trace};

type MemberListener = Box<dyn FnOnce(&Outcome<()>) + Send>;

/// A type-erased join participant for [`Task::wrap`].
///
/// Obtained from any task via [`Task::member`]. Attaching a member to a
/// join registers a completion listener on the underlying task and
/// submits it; the member's value is dropped, only its terminal signal
/// feeds the join.
pub struct Member {
    attach: Box<dyn FnOnce(ExecutorHandle, MemberListener) + Send>,
}

impl Member {
    pub(crate) fn attach(self, exec: ExecutorHandle, listener: MemberListener) {
        (self.attach)(exec, listener);
    }
}

impl std::fmt::Debug for Member {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Member").finish_non_exhaustive()
    }
}

/// What a join decides to do after absorbing one participant signal.
enum JoinAction<T> {
    Deliver(T),
    Cancel,
    Fail(Error),
}

struct JoinProgress<T> {
    remaining: usize,
    decided: bool,
    value: Option<T>,
}

impl<T> JoinProgress<T> {
    /// Absorbs one erased participant signal. The source value, when it
    /// arrives, is recorded by the caller before this runs.
    fn absorb(&mut self, signal: &Outcome<()>) -> Option<JoinAction<T>> {
        if self.decided {
            return None;
        }
        match signal {
            Outcome::Succeeded(()) => {
                self.remaining -= 1;
                if self.remaining == 0 {
                    self.decided = true;
                    self.value.take().map(JoinAction::Deliver)
                } else {
                    None
                }
            }
            Outcome::Cancelled => {
                self.decided = true;
                Some(JoinAction::Cancel)
            }
            Outcome::Failed(cause) => {
                self.decided = true;
                Some(JoinAction::Fail(cause.clone()))
            }
        }
    }
}

impl<T: Clone + Send + 'static> Task<T> {
    /// Erases this task into a join participant for [`Task::wrap`].
    ///
    /// The resulting member is submitted by the join; do not submit the
    /// task separately.
    #[must_use]
    pub fn member(&self) -> Member {
        let task = self.clone();
        Member {
            attach: Box::new(move |exec, listener| {
                task.on_completed_boxed(Box::new(move |outcome| {
                    let erased = match outcome {
                        Outcome::Succeeded(_) => Outcome::Succeeded(()),
                        Outcome::Cancelled => Outcome::Cancelled,
                        Outcome::Failed(cause) => Outcome::Failed(cause.clone()),
                    };
                    listener(&erased);
                }));
                task.submit(&exec);
            }),
        }
    }

    /// Derives a named fan-in task over this task and `members`.
    ///
    /// See the module docs for the join contract. Submitting the wrapped
    /// task submits this task and every member on the same executor.
    #[must_use = "a derived task does nothing until submitted"]
    pub fn wrap(&self, name: impl Into<String>, members: Vec<Member>) -> Task<T> {
        let source = self.clone();
        let name = name.into();
        let log_name = name.clone();
        Task::from_launch(
            Some(name),
            Box::new(move |exec, derived| {
                let join = Arc::new(Mutex::new(JoinProgress {
                    // Every member plus the source itself.
                    remaining: members.len() + 1,
                    decided: false,
                    value: None,
                }));
                debug!(
                    group = log_name.as_str(),
                    members = members.len(),
                    "starting fan-in"
                );

                for member in members {
                    let join = Arc::clone(&join);
                    let derived = derived.clone();
                    member.attach(
                        exec.clone(),
                        Box::new(move |signal| {
                            let action = join.lock().absorb(signal);
                            apply(&derived, action);
                        }),
                    );
                }

                let join_for_source = Arc::clone(&join);
                let derived_for_source = derived.clone();
                source.on_completed_boxed(Box::new(move |outcome| {
                    let action = {
                        let mut progress = join_for_source.lock();
                        if let Outcome::Succeeded(value) = outcome {
                            progress.value = Some(value.clone());
                        }
                        let erased = match outcome {
                            Outcome::Succeeded(_) => Outcome::Succeeded(()),
                            Outcome::Cancelled => Outcome::Cancelled,
                            Outcome::Failed(cause) => Outcome::Failed(cause.clone()),
                        };
                        progress.absorb(&erased)
                    };
                    apply(&derived_for_source, action);
                }));
                source.submit(&exec);
            }),
        )
    }
}

/// Completes the wrapped task according to the join's decision. Runs
/// outside the join lock: completion dispatches listeners, which may
/// submit further tasks.
fn apply<T: Clone + Send + 'static>(derived: &Task<T>, action: Option<JoinAction<T>>) {
    match action {
        Some(JoinAction::Deliver(value)) => derived.complete(Outcome::Succeeded(value)),
        Some(JoinAction::Cancel) => {
            trace!("fan-in cancelled by a member");
            derived.complete(Outcome::Cancelled);
        }
        Some(JoinAction::Fail(cause)) => {
            trace!(%cause, "fan-in failed by a member");
            derived.complete(Outcome::Failed(cause));
        }
        None => {}
    }
}
