//! One-shot completion values with mutually exclusive settle paths.

use parking_lot::Mutex;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::oneshot;

/// The final state of a [`Completion`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome<T> {
    /// The completion resolved successfully.
    Resolved(T),
    /// The completion was cancelled before it could resolve.
    Cancelled,
}

impl<T> Outcome<T> {
    /// Returns whether this outcome is [`Outcome::Cancelled`].
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// The settling side of a completion.
///
/// `try_set` and `try_cancel` are each idempotent and mutually exclusive:
/// the first call of either wins the settle, and every later call of either
/// reports that it lost. Clones share the same settle slot.
pub struct CompletionSource<T> {
    slot: Arc<Mutex<Option<oneshot::Sender<Outcome<T>>>>>,
}

impl<T> CompletionSource<T> {
    /// Creates a source together with the completion it settles.
    #[must_use]
    pub fn pair() -> (Self, Completion<T>) {
        let (sender, receiver) = oneshot::channel();
        (
            Self {
                slot: Arc::new(Mutex::new(Some(sender))),
            },
            Completion { receiver },
        )
    }

    /// Resolves the completion with `value`.
    ///
    /// Returns `true` if this call won the settle, `false` if the
    /// completion was already resolved or cancelled.
    pub fn try_set(&self, value: T) -> bool {
        self.settle(Outcome::Resolved(value))
    }

    /// Cancels the completion.
    ///
    /// Returns `true` if this call won the settle, `false` if the
    /// completion was already resolved or cancelled.
    pub fn try_cancel(&self) -> bool {
        self.settle(Outcome::Cancelled)
    }

    /// Returns whether the completion has been settled through any handle.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.slot.lock().is_none()
    }

    fn settle(&self, outcome: Outcome<T>) -> bool {
        let Some(sender) = self.slot.lock().take() else {
            return false;
        };
        // The receiver may already be gone; the settle still counts.
        let _ = sender.send(outcome);
        true
    }
}

impl<T> Clone for CompletionSource<T> {
    fn clone(&self) -> Self {
        Self {
            slot: self.slot.clone(),
        }
    }
}

impl<T> std::fmt::Debug for CompletionSource<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionSource")
            .field("settled", &self.is_settled())
            .finish()
    }
}

/// A completion that resolves exactly once to an [`Outcome`].
///
/// If every [`CompletionSource`] handle is dropped without settling, the
/// completion observes [`Outcome::Cancelled`].
pub struct Completion<T> {
    receiver: oneshot::Receiver<Outcome<T>>,
}

impl<T> Future for Completion<T> {
    type Output = Outcome<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.receiver)
            .poll(cx)
            .map(|settled| settled.unwrap_or(Outcome::Cancelled))
    }
}

impl<T> std::fmt::Debug for Completion<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Completion").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tokio_test::{assert_pending, assert_ready_eq};

    #[tokio::test]
    async fn test_try_set_resolves() {
        let (source, completion) = CompletionSource::pair();

        assert!(source.try_set(7));
        assert_eq!(completion.await, Outcome::Resolved(7));
    }

    #[tokio::test]
    async fn test_try_cancel_cancels() {
        let (source, completion) = CompletionSource::<u32>::pair();

        assert!(source.try_cancel());
        assert_eq!(completion.await, Outcome::Cancelled);
    }

    #[tokio::test]
    async fn test_first_settle_wins_both_directions() {
        let (source, completion) = CompletionSource::pair();

        assert!(source.try_set(1));
        assert!(!source.try_cancel());
        assert!(!source.try_set(2));
        assert_eq!(completion.await, Outcome::Resolved(1));

        let (source, completion) = CompletionSource::<u32>::pair();
        assert!(source.try_cancel());
        assert!(!source.try_set(3));
        assert!(!source.try_cancel());
        assert_eq!(completion.await, Outcome::Cancelled);
    }

    #[tokio::test]
    async fn test_clones_share_the_settle() {
        let (source, completion) = CompletionSource::pair();
        let clone = source.clone();

        assert!(clone.try_set(42));
        assert!(!source.try_set(43));
        assert!(source.is_settled());
        assert_eq!(completion.await, Outcome::Resolved(42));
    }

    #[tokio::test]
    async fn test_dropped_source_observes_cancelled() {
        let (source, completion) = CompletionSource::<u32>::pair();

        drop(source);
        assert_eq!(completion.await, Outcome::Cancelled);
    }

    #[test]
    fn test_pending_until_settled() {
        let (source, completion) = CompletionSource::pair();
        let mut completion = tokio_test::task::spawn(completion);

        assert_pending!(completion.poll());

        assert!(source.try_set(5));
        assert!(completion.is_woken());
        assert_ready_eq!(completion.poll(), Outcome::Resolved(5));
    }
}
