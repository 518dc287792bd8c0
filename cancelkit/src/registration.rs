//! Registration handles for cancellation observers.

use crate::errors::DisposedError;
use crate::token::TokenInner;
use parking_lot::Mutex;
use std::sync::{Arc, Weak};

/// The callback invoked when cancellation occurs.
pub(crate) type Observer = Arc<dyn Fn() + Send + Sync>;

/// A disposable handle representing one observer's interest in a token's
/// cancellation event.
///
/// Disposing the registration removes the observer before cancellation can
/// reach it. Disposal is explicit and idempotent; dropping the handle does
/// not dispose it, and the owning token keeps the underlying entry alive
/// until it is disposed or the token is torn down.
#[derive(Clone)]
pub struct CancellationTokenRegistration {
    inner: Arc<RegistrationInner>,
}

impl CancellationTokenRegistration {
    pub(crate) fn new(inner: Arc<RegistrationInner>) -> Self {
        Self { inner }
    }

    /// Disposes this registration, clearing its observer and removing it
    /// from the owning token.
    ///
    /// Idempotent. Removal from a token that has itself already been
    /// disposed is moot and is silently skipped.
    pub fn dispose(&self) {
        self.inner.dispose();
    }
}

impl std::fmt::Debug for CancellationTokenRegistration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancellationTokenRegistration")
            .field("disposed", &self.inner.is_disposed())
            .finish()
    }
}

pub(crate) struct RegistrationInner {
    state: Mutex<RegistrationState>,
}

struct RegistrationState {
    disposed: bool,
    observer: Option<Observer>,
    token: Weak<TokenInner>,
}

impl RegistrationInner {
    pub(crate) fn new(token: Weak<TokenInner>, observer: Observer) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(RegistrationState {
                disposed: false,
                observer: Some(observer),
                token,
            }),
        })
    }

    /// Marks the registration disposed exactly once, then unregisters from
    /// the owning token if it is still alive.
    pub(crate) fn dispose(self: &Arc<Self>) {
        let token = {
            let mut state = self.state.lock();
            if state.disposed {
                return;
            }
            state.disposed = true;
            state.observer = None;
            std::mem::take(&mut state.token)
        };
        if let Some(token) = token.upgrade() {
            // Removal from an already-disposed token is moot.
            let _ = token.unregister(self);
        }
    }

    /// Invokes the observer, called only by the owning token during a
    /// cancellation pass.
    ///
    /// Fails if the registration was disposed after the token snapshotted
    /// it but before its turn in the pass. The observer is invoked with no
    /// lock held, so it may freely call back into the registration or the
    /// token.
    pub(crate) fn notify(&self) -> Result<(), DisposedError> {
        let observer = {
            let state = self.state.lock();
            if state.disposed {
                return Err(DisposedError);
            }
            state.observer.clone()
        };
        if let Some(observer) = observer {
            observer();
        }
        Ok(())
    }

    fn is_disposed(&self) -> bool {
        self.state.lock().disposed
    }
}
