//! Combinators for chaining tasks.
//!
//! This module provides the derivation operators:
//!
//! - [`then`](crate::Task::then): transform the source value with a
//!   fallible function, inline or on the background lane
//! - [`then_task`](crate::Task::then_task): produce a whole follow-up
//!   task from the source value and forward its outcome
//! - [`inspect_err`](crate::Task::inspect_err): observe a failure on a
//!   chosen lane without altering its propagation
//! - [`wrap`](crate::Task::wrap): fan-in on a set of member tasks and
//!   attach a human-readable identity to the join
//!
//! All combinators share one mechanism: a derived task stores a one-shot
//! launch closure; submitting it registers a completion listener on the
//! source and submits the source first. No combinator ever blocks a
//! thread waiting for another task, and a failed or cancelled source
//! short-circuits the derived task without invoking the user operation.

pub mod inspect_err;
pub mod then;
pub mod then_task;
pub mod wrap;

pub use wrap::Member;
