//! The owning, initiating side of a cancellation token.

use crate::errors::{CancelAfterError, DisposedError};
use crate::token::CancellationToken;

/// The exclusive owner of one [`CancellationToken`] and the only public
/// entry point through which cancellation is initiated.
///
/// The source creates its token at construction and hands out clones of the
/// handle; consumers can observe cancellation but never request it.
pub struct CancellationTokenSource {
    token: CancellationToken,
}

impl CancellationTokenSource {
    /// Creates a new source with a fresh token.
    #[must_use]
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
        }
    }

    /// Returns a handle to the owned token.
    #[must_use]
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Returns whether cancellation has been requested on the owned token.
    #[must_use]
    pub fn is_cancellation_requested(&self) -> bool {
        self.token.cancellation_requested()
    }

    /// Requests cancellation, notifying every live registration exactly
    /// once in registration order on the calling thread.
    ///
    /// Idempotent after the first successful call. Fails with
    /// [`DisposedError`] once the source has been disposed, or when a
    /// registration is disposed concurrently with the notification pass —
    /// in the latter case the flag is already set and the remaining
    /// registrations are left unnotified. An observer panic likewise aborts
    /// the pass and unwinds to the caller.
    pub fn cancel(&self) -> Result<(), DisposedError> {
        self.token.cancel()
    }

    /// Schedules cancellation after `seconds`, replacing any pending
    /// delayed cancellation.
    ///
    /// An interval of zero cancels immediately. Negative and
    /// non-representable intervals fail with
    /// [`IntervalError`](crate::errors::IntervalError) before any state is
    /// touched. Non-zero intervals are scheduled on the ambient tokio
    /// runtime, which supplies the timer.
    pub fn cancel_after(&self, seconds: f64) -> Result<(), CancelAfterError> {
        self.token.cancel_after(seconds)
    }

    /// Disposes the owned token, clearing every live registration.
    ///
    /// Idempotent and infallible. After disposal, `cancel` and
    /// `cancel_after` fail with [`DisposedError`], registering new
    /// observers yields `None`, and `is_cancellation_requested` keeps
    /// reporting its last value.
    pub fn dispose(&self) {
        self.token.dispose();
    }
}

impl Default for CancellationTokenSource {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CancellationTokenSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancellationTokenSource")
            .field("token", &self.token)
            .finish()
    }
}
