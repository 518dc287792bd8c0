//! Delayed completions that can be cut short by a cancellation token.

use crate::completion::{Completion, CompletionSource};
use crate::token::CancellationToken;
use std::time::Duration;
use tracing::trace;

/// Produces a completion that resolves after `seconds` unless `token` is
/// cancelled first.
///
/// Without a token the completion always resolves. With a token that is
/// already cancelled the completion is cancelled immediately and nothing is
/// scheduled. Otherwise the outcome is decided by whichever comes first:
/// the timer firing resolves it, the token cancelling cancels it — the
/// timer abort is best-effort, so a fire already in flight re-checks the
/// token itself, and the completion's own mutual exclusion guarantees that
/// exactly one outcome wins.
///
/// Delays that a [`Duration`] cannot represent (negative, NaN, infinite)
/// fire immediately. Must be called from within a tokio runtime, which
/// supplies the timer.
pub fn delayed_completion(
    seconds: f64,
    token: Option<&CancellationToken>,
) -> Completion<()> {
    let delay = Duration::try_from_secs_f64(seconds).unwrap_or(Duration::ZERO);
    let (source, completion) = CompletionSource::pair();

    let Some(token) = token else {
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            source.try_set(());
        });
        return completion;
    };

    if token.cancellation_requested() {
        source.try_cancel();
        return completion;
    }

    let timer = {
        let source = source.clone();
        let token = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if token.cancellation_requested() {
                source.try_cancel();
            } else {
                source.try_set(());
            }
        })
    };

    if token
        .register_cancellation_observer(move || {
            timer.abort();
            source.try_cancel();
        })
        .is_none()
    {
        // The token was disposed between the cancellation check and the
        // registration; the timer will still settle the completion.
        trace!("token disposed while arming a delayed completion");
    }
    completion
}
