//! Failure causes carried through task chains.
//!
//! Error handling follows these principles:
//!
//! - A cause is cloned cheaply (`Arc`-backed) so one failure can fan out to
//!   every derived task and listener without copying the payload
//! - A derived task that fails because its source failed carries the *same*
//!   cause value, never a re-wrap
//! - Panics inside a body or continuation are caught and converted into a
//!   [`ErrorKind::Panicked`] cause; they never unwind into an executor lane
//! - Cancellation is a distinct terminal outcome, not an error; the
//!   [`ErrorKind::Cancelled`] kind exists only for the boundary conversion
//!   in [`Outcome::into_result`](crate::Outcome::into_result)

use std::any::Any;
use std::sync::Arc;

/// The classification of a failure cause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A task body or continuation returned an error.
    Operation,
    /// A task body or continuation panicked; the payload is preserved as
    /// the message.
    Panicked,
    /// An arbitrary foreign error wrapped into a cause.
    Source,
    /// Cancellation folded into an error at a `Result` boundary.
    Cancelled,
}

impl ErrorKind {
    /// A short static label for log output.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Operation => "operation",
            Self::Panicked => "panicked",
            Self::Source => "source",
            Self::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug)]
struct ErrorInner {
    kind: ErrorKind,
    message: String,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

/// A cloneable failure cause.
///
/// Clones share one payload, so `Error` values compare by content only
/// through their kind and message; identity across a chain is preserved by
/// the shared `Arc`.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{}", .inner.message)]
pub struct Error {
    inner: Arc<ErrorInner>,
}

impl Error {
    fn from_parts(
        kind: ErrorKind,
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self {
            inner: Arc::new(ErrorInner {
                kind,
                message,
                source,
            }),
        }
    }

    /// A cause for an operation that reported an error message directly.
    #[must_use]
    pub fn operation(message: impl Into<String>) -> Self {
        Self::from_parts(ErrorKind::Operation, message.into(), None)
    }

    /// Wraps a foreign error as a cause, preserving it as `source()`.
    #[must_use]
    pub fn wrap(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        let message = source.to_string();
        Self::from_parts(ErrorKind::Source, message, Some(Box::new(source)))
    }

    /// Converts a caught panic payload into a cause.
    ///
    /// String payloads are preserved; anything else is reported opaquely.
    #[must_use]
    pub fn panicked(payload: &(dyn Any + Send)) -> Self {
        let message = payload.downcast_ref::<&str>().map_or_else(
            || {
                payload
                    .downcast_ref::<String>()
                    .cloned()
                    .unwrap_or_else(|| "non-string panic payload".to_string())
            },
            |s| (*s).to_string(),
        );
        Self::from_parts(ErrorKind::Panicked, message, None)
    }

    /// The cause used when cancellation is folded into a `Result`.
    #[must_use]
    pub fn cancelled() -> Self {
        Self::from_parts(ErrorKind::Cancelled, "task cancelled".to_string(), None)
    }

    /// Returns the classification of this cause.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        self.inner.kind
    }

    /// Returns the human-readable message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.inner.message
    }

    /// Returns true if `other` is a clone of this cause (same payload).
    ///
    /// Used by tests to verify that a failure propagated verbatim rather
    /// than being re-wrapped along the way.
    #[must_use]
    pub fn same_cause(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Returns the wrapped foreign error, if any.
    #[must_use]
    pub fn source_error(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        self.inner.source.as_deref()
    }
}
