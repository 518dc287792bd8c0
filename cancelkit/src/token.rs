//! Shared cancellation state and observer fan-out.

use crate::errors::{CancelAfterError, DisposedError, IntervalError};
use crate::registration::{CancellationTokenRegistration, RegistrationInner};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

/// Shared cancellation state: a monotonic flag plus an ordered registry of
/// observers to notify when it flips.
///
/// Handles are cheap to clone and usable from any thread. A token only ever
/// observes cancellation; it is initiated through the owning
/// [`CancellationTokenSource`](crate::source::CancellationTokenSource).
#[derive(Clone)]
pub struct CancellationToken {
    inner: Arc<TokenInner>,
}

impl CancellationToken {
    pub(crate) fn new() -> Self {
        Self {
            inner: Arc::new(TokenInner {
                state: Mutex::new(TokenState {
                    cancellation_requested: false,
                    disposed: false,
                    registrations: Vec::new(),
                    pending_delayed_cancel: None,
                }),
            }),
        }
    }

    /// Returns whether cancellation has been requested.
    ///
    /// Remains readable after disposal and keeps its last value.
    #[must_use]
    pub fn cancellation_requested(&self) -> bool {
        self.inner.state.lock().cancellation_requested
    }

    /// Registers an observer to be invoked once if cancellation occurs.
    ///
    /// Returns `None` if the token has been disposed. Registering the same
    /// observer twice yields two independent registrations, and both fire.
    ///
    /// Observers registered after cancellation has already been requested
    /// are kept in the registry but never invoked: notification happens
    /// once, at the instant cancellation is requested, against the
    /// registrations present at that moment.
    pub fn register_cancellation_observer<F>(
        &self,
        observer: F,
    ) -> Option<CancellationTokenRegistration>
    where
        F: Fn() + Send + Sync + 'static,
    {
        let registration = {
            let mut state = self.inner.state.lock();
            if state.disposed {
                return None;
            }
            let registration =
                RegistrationInner::new(Arc::downgrade(&self.inner), Arc::new(observer));
            state.registrations.push(registration.clone());
            registration
        };
        Some(CancellationTokenRegistration::new(registration))
    }

    pub(crate) fn cancel(&self) -> Result<(), DisposedError> {
        self.inner.cancel()
    }

    pub(crate) fn cancel_after(&self, seconds: f64) -> Result<(), CancelAfterError> {
        self.inner.cancel_after(seconds)
    }

    pub(crate) fn dispose(&self) {
        self.inner.dispose();
    }
}

impl std::fmt::Debug for CancellationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("CancellationToken")
            .field("cancellation_requested", &state.cancellation_requested)
            .field("disposed", &state.disposed)
            .field("registrations", &state.registrations.len())
            .finish()
    }
}

pub(crate) struct TokenInner {
    state: Mutex<TokenState>,
}

struct TokenState {
    cancellation_requested: bool,
    disposed: bool,
    /// Insertion order is notification order. Duplicates by identity are
    /// kept as-is.
    registrations: Vec<Arc<RegistrationInner>>,
    /// At most one outstanding scheduled cancellation.
    pending_delayed_cancel: Option<JoinHandle<()>>,
}

impl TokenInner {
    /// Flips the flag and notifies the registrations snapshotted at that
    /// instant, in insertion order, on the calling thread.
    ///
    /// The lock is released before any observer runs, so observers may call
    /// back into the token. A registration disposed after the snapshot but
    /// before its turn fails the pass with [`DisposedError`], leaving later
    /// registrations unnotified; observer panics abort the pass the same
    /// way. The flag stays set in either case.
    pub(crate) fn cancel(&self) -> Result<(), DisposedError> {
        let (stale_timer, registrations) = {
            let mut state = self.state.lock();
            if state.disposed {
                return Err(DisposedError);
            }
            if state.cancellation_requested {
                return Ok(());
            }
            state.cancellation_requested = true;
            (
                state.pending_delayed_cancel.take(),
                state.registrations.clone(),
            )
        };
        if let Some(timer) = stale_timer {
            timer.abort();
        }
        for registration in registrations {
            registration.notify()?;
        }
        Ok(())
    }

    /// Schedules a `cancel` after `seconds`, replacing any pending timer.
    ///
    /// A second call before the first fires replaces the pending timer, so
    /// only one is ever outstanding. If cancellation has already been
    /// requested the call clears any stale timer and schedules nothing.
    pub(crate) fn cancel_after(self: &Arc<Self>, seconds: f64) -> Result<(), CancelAfterError> {
        let Ok(interval) = Duration::try_from_secs_f64(seconds) else {
            return Err(IntervalError::new(seconds).into());
        };
        if interval.is_zero() {
            return self.cancel().map_err(CancelAfterError::from);
        }

        let stale_timer = {
            let mut state = self.state.lock();
            if state.disposed {
                return Err(DisposedError.into());
            }
            let stale = state.pending_delayed_cancel.take();
            if !state.cancellation_requested {
                let token = Arc::downgrade(self);
                state.pending_delayed_cancel = Some(tokio::spawn(async move {
                    tokio::time::sleep(interval).await;
                    let Some(token) = token.upgrade() else {
                        return;
                    };
                    // The token may have been disposed while the timer was
                    // pending; there is no caller left to observe that.
                    if token.cancel().is_err() {
                        trace!("delayed cancellation fired against a disposed token");
                    }
                }));
                debug!(seconds, "scheduled delayed cancellation");
            }
            stale
        };
        if let Some(timer) = stale_timer {
            timer.abort();
        }
        Ok(())
    }

    /// Removes `registration` from the registry by identity.
    ///
    /// Silent no-op when the registration is not present.
    pub(crate) fn unregister(
        &self,
        registration: &Arc<RegistrationInner>,
    ) -> Result<(), DisposedError> {
        let mut state = self.state.lock();
        if state.disposed {
            return Err(DisposedError);
        }
        if let Some(index) = state
            .registrations
            .iter()
            .position(|other| Arc::ptr_eq(other, registration))
        {
            state.registrations.remove(index);
        }
        Ok(())
    }

    /// Tears the token down, disposing every live registration.
    ///
    /// Idempotent. The registry is cleared before the registrations are
    /// disposed, so their own unregister attempt finds nothing to remove.
    /// A pending delayed cancellation is left running; its eventual
    /// `cancel` fails against the disposed token and is swallowed by the
    /// timer task.
    pub(crate) fn dispose(&self) {
        let registrations = {
            let mut state = self.state.lock();
            if state.disposed {
                return;
            }
            std::mem::take(&mut state.registrations)
        };
        for registration in &registrations {
            registration.dispose();
        }
        self.state.lock().disposed = true;
    }
}
