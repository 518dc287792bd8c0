//! Error types for cancellation operations.

use thiserror::Error;

/// Error raised when a mutating operation is invoked on an entity that has
/// already been disposed.
///
/// Read-only queries and `dispose` itself never raise this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("entity has already been disposed")]
pub struct DisposedError;

/// Error raised when a delayed cancellation is given an interval that cannot
/// be scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
#[error("cancellation interval must be a non-negative number of seconds, got {seconds}")]
pub struct IntervalError {
    /// The rejected interval, in seconds.
    pub seconds: f64,
}

impl IntervalError {
    /// Creates a new interval error for the rejected value.
    #[must_use]
    pub fn new(seconds: f64) -> Self {
        Self { seconds }
    }
}

/// Errors surfaced by scheduling a delayed cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum CancelAfterError {
    /// The token was already disposed.
    #[error("{0}")]
    Disposed(#[from] DisposedError),

    /// The interval was negative or not representable as a duration.
    #[error("{0}")]
    Interval(#[from] IntervalError),
}
