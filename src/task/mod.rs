//! The task lifecycle primitive.
//!
//! A [`Task`] is a named, single-use unit of deferred work. It moves
//! through `Created → Scheduled → Running → Terminal` and delivers exactly
//! one [`Outcome`] to its listeners. Terminal state is sticky: duplicate
//! internal dispatch against a terminal task is a no-op.
//!
//! # Listeners
//!
//! Listeners registered before the terminal event fire exactly once, in
//! registration order. For a submitted task the dispatch is marshaled to
//! the affinity lane, so completion of a background body is observed on
//! the interactive thread, the way a UI toolkit delivers events.
//! Listeners registered *after* the terminal event replay the
//! already-known outcome immediately on the registering thread, so a
//! fast source cannot be missed.
//!
//! # Submission
//!
//! `submit` consumes the task's one-shot launch action. Submitting a
//! derived task registers a completion listener on its source and submits
//! the source first; the derived body never runs before the source is
//! terminal. `submit` is not idempotent: a second call is a logged no-op.
//!
//! # Cancellation
//!
//! Cancellation is cooperative and strictly downstream. Cancelling a task
//! that has not started running completes it as `Cancelled` and its body
//! is skipped. Once the body is running, the request flag is set and the
//! body's own completion decides the terminal state; the first terminal
//! write wins, so a cancelled task never also reports failure.

use crate::error::Error;
use crate::executor::{ExecutorHandle, Lane};
use crate::types::{Outcome, Phase};
use parking_lot::Mutex;
use smallvec::SmallVec;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, trace};

/// A boxed completion listener.
pub(crate) type CompletionListener<T> = Box<dyn FnOnce(&Outcome<T>) + Send>;

/// The one-shot action performed by `submit`.
pub(crate) type Launch<T> = Box<dyn FnOnce(ExecutorHandle, Task<T>) + Send>;

struct TaskState<T> {
    phase: Phase,
    outcome: Option<Outcome<T>>,
    listeners: SmallVec<[CompletionListener<T>; 2]>,
}

struct TaskInner<T> {
    name: Option<String>,
    cancel_requested: AtomicBool,
    state: Mutex<TaskState<T>>,
    launch: Mutex<Option<Launch<T>>>,
    /// Set at submit time; completion dispatch targets its affinity lane.
    executor: Mutex<Option<ExecutorHandle>>,
}

/// A named, single-use, typed unit of deferred work with a terminal
/// outcome.
///
/// `Task` is a cheap `Arc`-backed handle; clones observe the same
/// underlying task. The value type must be `Clone` because one outcome
/// fans out to every listener and derived task.
pub struct Task<T> {
    inner: Arc<TaskInner<T>>,
}

impl<T> Clone for Task<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> std::fmt::Debug for Task<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let st = self.inner.state.lock();
        f.debug_struct("Task")
            .field("name", &self.inner.name)
            .field("phase", &st.phase)
            .field("outcome", &st.outcome.as_ref().map(Outcome::label))
            .finish()
    }
}

impl<T: Clone + Send + 'static> Task<T> {
    pub(crate) fn from_launch(name: Option<String>, launch: Launch<T>) -> Self {
        Self {
            inner: Arc::new(TaskInner {
                name,
                cancel_requested: AtomicBool::new(false),
                state: Mutex::new(TaskState {
                    phase: Phase::Created,
                    outcome: None,
                    listeners: SmallVec::new(),
                }),
                launch: Mutex::new(Some(launch)),
                executor: Mutex::new(None),
            }),
        }
    }

    /// Creates an unnamed task whose body runs on `lane` when submitted.
    pub fn new<F>(lane: Lane, body: F) -> Self
    where
        F: FnOnce() -> Result<T, Error> + Send + 'static,
    {
        Self::build(None, lane, body)
    }

    /// Creates a named task whose body runs on `lane` when submitted.
    ///
    /// The name is display-only, used for progress reporting and logs.
    pub fn named<F>(name: impl Into<String>, lane: Lane, body: F) -> Self
    where
        F: FnOnce() -> Result<T, Error> + Send + 'static,
    {
        Self::build(Some(name.into()), lane, body)
    }

    fn build<F>(name: Option<String>, lane: Lane, body: F) -> Self
    where
        F: FnOnce() -> Result<T, Error> + Send + 'static,
    {
        Self::from_launch(
            name,
            Box::new(move |exec, task| {
                exec.execute(
                    lane,
                    Box::new(move || task.run_operation(move |()| body(), ())),
                );
            }),
        )
    }

    /// Creates a task that succeeds with `value` as soon as it is
    /// submitted, without touching any lane.
    pub fn ready(value: T) -> Self {
        Self::from_launch(
            None,
            Box::new(move |_exec, task| task.complete(Outcome::Succeeded(value))),
        )
    }

    /// Creates a task that fails with `cause` as soon as it is submitted.
    pub fn failed(cause: Error) -> Self {
        Self::from_launch(
            None,
            Box::new(move |_exec, task| task.complete(Outcome::Failed(cause))),
        )
    }

    /// Submits this task to `executor` and returns a clone of the handle.
    ///
    /// Submitting the same task twice is a logged no-op; the body can
    /// never run twice.
    pub fn submit(&self, executor: &ExecutorHandle) -> Self {
        let Some(launch) = self.inner.launch.lock().take() else {
            debug!(task = self.display_name(), "duplicate submit ignored");
            return self.clone();
        };
        {
            let mut st = self.inner.state.lock();
            if st.phase == Phase::Created {
                st.phase = Phase::Scheduled;
            }
        }
        *self.inner.executor.lock() = Some(Arc::clone(executor));
        trace!(task = self.display_name(), "submitted");
        launch(Arc::clone(executor), self.clone());
        self.clone()
    }

    /// Requests cancellation.
    ///
    /// If the body has not started, the task completes as `Cancelled` and
    /// the body is skipped. If the body is already running, the request
    /// flag is set and the body's completion decides the terminal state.
    /// Cancellation never propagates upstream to a source task.
    pub fn cancel(&self) {
        self.inner.cancel_requested.store(true, Ordering::Release);
        let eager = {
            let st = self.inner.state.lock();
            matches!(st.phase, Phase::Created | Phase::Scheduled)
        };
        if eager {
            trace!(task = self.display_name(), "cancelled before running");
            self.complete(Outcome::Cancelled);
        }
    }

    /// Returns the display name, if one was given.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.inner.name.as_deref()
    }

    /// Returns the current lifecycle phase.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.inner.state.lock().phase
    }

    /// Returns the success value. `Some` only once the task has succeeded.
    #[must_use]
    pub fn result(&self) -> Option<T> {
        match &self.inner.state.lock().outcome {
            Some(Outcome::Succeeded(v)) => Some(v.clone()),
            _ => None,
        }
    }

    /// Returns the failure cause. `Some` only once the task has failed.
    #[must_use]
    pub fn failure(&self) -> Option<Error> {
        match &self.inner.state.lock().outcome {
            Some(Outcome::Failed(e)) => Some(e.clone()),
            _ => None,
        }
    }

    /// Returns true if the task terminated as `Cancelled`.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self.inner.state.lock().outcome, Some(Outcome::Cancelled))
    }

    /// Returns true if cancellation has been requested, whether or not the
    /// task has observed it yet.
    #[must_use]
    pub fn is_cancel_requested(&self) -> bool {
        self.inner.cancel_requested.load(Ordering::Acquire)
    }

    /// Returns the terminal outcome, once there is one.
    #[must_use]
    pub fn outcome(&self) -> Option<Outcome<T>> {
        self.inner.state.lock().outcome.clone()
    }

    /// Registers a listener for any terminal outcome.
    ///
    /// Fires exactly once. Registration after completion replays the
    /// outcome immediately on the registering thread.
    pub fn on_completed(&self, f: impl FnOnce(&Outcome<T>) + Send + 'static) -> &Self {
        self.on_completed_boxed(Box::new(f));
        self
    }

    /// Registers a listener fired only on `Succeeded`, with the value.
    pub fn on_succeeded(&self, f: impl FnOnce(&T) + Send + 'static) -> &Self {
        self.on_completed(move |outcome| {
            if let Outcome::Succeeded(v) = outcome {
                f(v);
            }
        })
    }

    /// Registers a listener fired only on `Cancelled`.
    pub fn on_cancelled(&self, f: impl FnOnce() + Send + 'static) -> &Self {
        self.on_completed(move |outcome| {
            if outcome.is_cancelled() {
                f();
            }
        })
    }

    /// Registers a listener fired only on `Failed`, with the cause.
    pub fn on_failed(&self, f: impl FnOnce(&Error) + Send + 'static) -> &Self {
        self.on_completed(move |outcome| {
            if let Outcome::Failed(e) = outcome {
                f(e);
            }
        })
    }

    pub(crate) fn on_completed_boxed(&self, listener: CompletionListener<T>) {
        let outcome = {
            let mut st = self.inner.state.lock();
            if !st.phase.is_terminal() {
                st.listeners.push(listener);
                return;
            }
            st.outcome.clone()
        };
        if let Some(outcome) = outcome {
            trace!(
                task = self.display_name(),
                outcome = outcome.label(),
                "replaying terminal outcome to late listener"
            );
            listener(&outcome);
        }
    }

    /// Writes the terminal outcome exactly once and dispatches listeners.
    ///
    /// Idempotent: a second write against a terminal task is ignored.
    /// The outcome is captured before any listener can observe it. For a
    /// submitted task, listener dispatch is marshaled onto the affinity
    /// lane in registration order; a task completed without ever being
    /// submitted dispatches on the completing thread. Listeners run
    /// outside the state lock either way, so a listener may submit or
    /// derive further tasks without deadlocking.
    pub(crate) fn complete(&self, outcome: Outcome<T>) {
        let listeners = {
            let mut st = self.inner.state.lock();
            if st.phase.is_terminal() {
                trace!(
                    task = self.display_name(),
                    dropped = outcome.label(),
                    "duplicate terminal dispatch ignored"
                );
                return;
            }
            st.phase = Phase::Terminal;
            st.outcome = Some(outcome.clone());
            std::mem::take(&mut st.listeners)
        };
        debug!(
            task = self.display_name(),
            outcome = outcome.label(),
            "task completed"
        );
        if listeners.is_empty() {
            return;
        }
        let executor = self.inner.executor.lock().clone();
        match executor {
            Some(executor) => executor.execute(
                Lane::Affinity,
                Box::new(move || {
                    for listener in listeners {
                        listener(&outcome);
                    }
                }),
            ),
            None => {
                for listener in listeners {
                    listener(&outcome);
                }
            }
        }
    }

    /// Marks the task `Running`. Returns false if the task is already
    /// terminal (cancelled while queued), in which case the body must be
    /// skipped.
    pub(crate) fn begin_running(&self) -> bool {
        let mut st = self.inner.state.lock();
        if st.phase.is_terminal() {
            return false;
        }
        st.phase = Phase::Running;
        true
    }

    /// Runs a fallible operation as this task's body: catches panics,
    /// honors a pending cancellation request, and completes the task.
    pub(crate) fn run_operation<I, F>(&self, op: F, input: I)
    where
        F: FnOnce(I) -> Result<T, Error>,
    {
        if !self.begin_running() {
            trace!(task = self.display_name(), "body skipped, already terminal");
            return;
        }
        if self.inner.cancel_requested.load(Ordering::Acquire) {
            self.complete(Outcome::Cancelled);
            return;
        }
        let outcome = match catch_unwind(AssertUnwindSafe(move || op(input))) {
            Ok(Ok(value)) => Outcome::Succeeded(value),
            Ok(Err(cause)) => Outcome::Failed(cause),
            Err(payload) => Outcome::Failed(Error::panicked(payload.as_ref())),
        };
        self.complete(outcome);
    }

    fn display_name(&self) -> &str {
        self.inner.name.as_deref().unwrap_or("<anonymous>")
    }
}
