//! Error taxonomy shared by every fallible operation in the crate.

use std::fmt;

/// Errors produced by the event-loop core.
///
/// Task-level failures (the error type a submitted callable returns) are
/// carried separately as the failure variant of [`crate::future::Future`];
/// this enum covers only errors the loop itself raises.
#[derive(thiserror::Error, Debug)]
pub enum LoopError {
    /// An operation isn't implemented by this concrete loop.
    #[error("operation not supported by this event loop")]
    UnsupportedOperation,

    /// A scheduled task was cancelled before it ran.
    #[error("task was cancelled before it ran")]
    Cancelled,

    /// Submission or resolution was attempted on a loop past its open window,
    /// or a task was still pending when the loop terminated.
    #[error("event loop is shutting down or has already shut down")]
    Shutdown,

    /// `closeGently` was invoked on a loop that isn't `open`.
    #[error("close requested on a loop that is not open")]
    AlreadyClosed,

    /// Group-level shutdown could not complete cleanly for every loop.
    #[error("event loop group failed to shut down cleanly")]
    ShutdownFailed(#[source] Option<Box<LoopError>>),

    /// The Selector reported an I/O error while registering, waiting, or
    /// closing. Benign wakeup artifacts are filtered out before reaching here.
    #[error("selector error: {0}")]
    Selector(#[from] std::io::Error),
}

impl PartialEq for LoopError {
    fn eq(&self, other: &Self) -> bool {
        matches!(
            (self, other),
            (Self::UnsupportedOperation, Self::UnsupportedOperation)
                | (Self::Cancelled, Self::Cancelled)
                | (Self::Shutdown, Self::Shutdown)
                | (Self::AlreadyClosed, Self::AlreadyClosed)
                | (Self::ShutdownFailed(_), Self::ShutdownFailed(_))
        )
    }
}

/// A boxed, type-erased task error.
///
/// Submitted callables are generic over their own error type; once that
/// error crosses into a [`crate::future::Future`]'s failure callback chain it
/// no longer needs to be downcast, so it's stored behind this alias instead
/// of threading a type parameter through the whole callback graph. `Sync` is
/// required alongside `Send` because a [`crate::future::Future`]'s resolved
/// outcome is shared across threads behind an `Arc` (see that module's
/// broadcast callback model), and `Arc<T>` is itself only `Send`/`Sync` when
/// `T` is both.
pub type TaskError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Wraps a concrete error in a [`TaskError`].
pub fn task_error<E>(error: E) -> TaskError
where
    E: std::error::Error + Send + Sync + 'static,
{
    Box::new(error)
}

/// A lightweight string error for call sites that don't have a richer type
/// handy (mirrors what a submitted closure might return via `anyhow`-style
/// ad-hoc errors, without pulling in that dependency for a single-field enum).
#[derive(Debug)]
pub struct Message(pub String);

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for Message {}

impl From<&str> for Message {
    fn from(value: &str) -> Self {
        Message(value.to_owned())
    }
}
