//! Taskline: two-lane deferred-task chaining with exactly-once completion.
//!
//! # Overview
//!
//! Taskline is built around a single primitive: a [`Task`] is a named,
//! single-use unit of deferred work with a terminal outcome. Tasks are
//! chained with combinators and submitted to an [`Executor`] with two
//! lanes: one *affinity* thread that serializes every interactive
//! continuation in submission order, and a *background* pool for parallel
//! work.
//!
//! # Core Guarantees
//!
//! - **Exactly-once completion**: every task delivers exactly one terminal
//!   outcome (`Succeeded`, `Cancelled`, or `Failed`); terminal states are
//!   sticky and duplicate internal dispatch is a no-op
//! - **No blocking waits**: combinators wait by registering completion
//!   listeners, never by occupying a thread; the affinity lane cannot be
//!   deadlocked by a chained continuation
//! - **Strict downstream propagation**: a failed or cancelled source
//!   short-circuits every derived task without invoking user operations
//! - **No silent drops**: an operation error or panic becomes a `Failed`
//!   outcome, never a swallowed exception and never a synchronous unwind
//!   into the submitter
//! - **No ambient authority**: the executor is injected at every
//!   submission; there is no global scheduler singleton
//!
//! # Module Structure
//!
//! - [`types`]: completion vocabulary ([`Outcome`], [`Phase`])
//! - [`error`]: cloneable failure causes
//! - [`task`]: the [`Task`] lifecycle primitive
//! - [`executor`]: the two-lane execution contract and [`TwoLaneExecutor`]
//! - [`combinator`]: `then`, `then_task`, `inspect_err`, `wrap`
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use taskline::{ExecutorHandle, Lane, Task, TwoLaneExecutor};
//!
//! let executor: ExecutorHandle = Arc::new(TwoLaneExecutor::default());
//! let chain = Task::named("sum", Lane::Background, || Ok(2 + 2))
//!     .then(|v: i32| Ok(v * 10), false);
//! chain.on_succeeded(|v| assert_eq!(*v, 40));
//! chain.submit(&executor);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod combinator;
pub mod error;
pub mod executor;
pub mod task;
pub mod types;

#[doc(hidden)]
pub mod test_utils;

pub use combinator::Member;
pub use error::{Error, ErrorKind};
pub use executor::{Executor, ExecutorHandle, Job, Lane, TwoLaneConfig, TwoLaneExecutor};
pub use task::Task;
pub use types::{Outcome, Phase};
