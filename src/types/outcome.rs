//! Three-valued outcome type and the task lifecycle phase.
//!
//! The outcome type is the terminal vocabulary of a task:
//!
//! - `Succeeded(T)`: the body or continuation produced a value
//! - `Cancelled`: cancellation was observed before or instead of a value
//! - `Failed(Error)`: the body or continuation produced (or was handed) a
//!   failure cause
//!
//! Exactly one outcome is delivered per task. Listeners receive it through
//! a plain callback registration, keeping the vocabulary independent of any
//! UI toolkit's event objects.

use crate::error::Error;
use core::fmt;

/// The terminal outcome of a task.
///
/// All variants are terminal: once a task carries an `Outcome` it never
/// transitions again.
#[derive(Debug, Clone)]
pub enum Outcome<T> {
    /// The task produced a value.
    Succeeded(T),
    /// The task was cancelled before producing a value.
    Cancelled,
    /// The task failed with a cause.
    Failed(Error),
}

impl<T> Outcome<T> {
    /// Returns true if this outcome is `Succeeded`.
    #[must_use]
    pub const fn is_succeeded(&self) -> bool {
        matches!(self, Self::Succeeded(_))
    }

    /// Returns true if this outcome is `Cancelled`.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Returns true if this outcome is `Failed`.
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// A short static label for log output.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Succeeded(_) => "succeeded",
            Self::Cancelled => "cancelled",
            Self::Failed(_) => "failed",
        }
    }

    /// Maps the success value, leaving the other variants untouched.
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Outcome<U> {
        match self {
            Self::Succeeded(v) => Outcome::Succeeded(f(v)),
            Self::Cancelled => Outcome::Cancelled,
            Self::Failed(e) => Outcome::Failed(e),
        }
    }

    /// Converts to a `Result`, folding cancellation into an `Error`.
    ///
    /// Useful at the boundary to code that has no cancellation channel.
    pub fn into_result(self) -> Result<T, Error> {
        match self {
            Self::Succeeded(v) => Ok(v),
            Self::Cancelled => Err(Error::cancelled()),
            Self::Failed(e) => Err(e),
        }
    }

    /// Returns the success value, or `None` for the other variants.
    pub fn succeeded(self) -> Option<T> {
        match self {
            Self::Succeeded(v) => Some(v),
            _ => None,
        }
    }
}

impl<T> From<Result<T, Error>> for Outcome<T> {
    fn from(result: Result<T, Error>) -> Self {
        match result {
            Ok(v) => Self::Succeeded(v),
            Err(e) => Self::Failed(e),
        }
    }
}

/// The lifecycle phase of a task.
///
/// A task moves `Created → Scheduled → Running → Terminal`; the terminal
/// phase is sticky. Exposed read-only for diagnostics and progress display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Built but not yet submitted.
    Created,
    /// Submitted; waiting for its lane (or its source) to run it.
    Scheduled,
    /// Its body is executing on a lane thread.
    Running,
    /// It has delivered its outcome.
    Terminal,
}

impl Phase {
    /// Returns true if this phase is [`Phase::Terminal`].
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Terminal)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::Scheduled => write!(f, "scheduled"),
            Self::Running => write!(f, "running"),
            Self::Terminal => write!(f, "terminal"),
        }
    }
}
