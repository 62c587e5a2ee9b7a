//! The two-lane execution contract.
//!
//! An [`Executor`] accepts jobs for one of two lanes:
//!
//! - [`Lane::Affinity`]: exactly one thread, strict submission-order
//!   serialization. All interactive continuations and affinity-destined
//!   listener dispatches run here, in enqueue order.
//! - [`Lane::Background`]: a worker pool with no cross-job ordering; one
//!   job runs start-to-finish on a single thread.
//!
//! The executor is injected at every [`Task::submit`](crate::Task::submit)
//! call; there is no ambient singleton. `execute` must never block the
//! caller: combinators submit from inside completion listeners, and a
//! blocking `execute` would deadlock the affinity lane.

pub mod two_lane;

use core::fmt;

pub use two_lane::{TwoLaneConfig, TwoLaneExecutor};

use std::sync::Arc;

/// A unit of work handed to an executor lane.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// A shared handle to an executor.
pub type ExecutorHandle = Arc<dyn Executor>;

/// The execution lane a job is destined for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lane {
    /// The single serialized interactive thread.
    Affinity,
    /// The parallel worker pool.
    Background,
}

impl fmt::Display for Lane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Affinity => write!(f, "affinity"),
            Self::Background => write!(f, "background"),
        }
    }
}

/// The two-lane scheduling service task bodies run on.
///
/// # Contract
///
/// - `execute` enqueues and returns; it never runs `job` inline and never
///   blocks on lane capacity
/// - every accepted job eventually runs (until shutdown)
/// - affinity jobs run on one thread in `execute`-call order
/// - reentrant calls from inside a running job are permitted on both lanes
pub trait Executor: Send + Sync {
    /// Enqueues `job` on `lane`.
    fn execute(&self, lane: Lane, job: Job);
}
