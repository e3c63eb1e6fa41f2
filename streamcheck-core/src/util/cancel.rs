//! Scenario deadlines as cancellation tokens.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// A child token of a parent that also cancels itself after a timeout.
///
/// Cancelling the deadline early (the scenario finished) is not an expiry.
#[derive(Debug, Clone)]
pub struct Deadline {
    token: CancellationToken,
    expired: Arc<AtomicBool>,
}

impl Deadline {
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// True when the timeout, rather than the caller, cancelled the token.
    pub fn is_expired(&self) -> bool {
        self.expired.load(Ordering::SeqCst)
    }
}

/// Derives a token from `parent` that is cancelled after `timeout`.
///
/// Must be called inside a tokio runtime.
pub fn cancel_after(parent: &CancellationToken, timeout: Duration) -> Deadline {
    let token = parent.child_token();
    let expired = Arc::new(AtomicBool::new(false));

    let timer_token = token.clone();
    let timer_expired = expired.clone();
    tokio::spawn(async move {
        tokio::select! {
            _ = timer_token.cancelled() => {}
            _ = tokio::time::sleep(timeout) => {
                log::debug!("Deadline of {:?} reached", timeout);
                timer_expired.store(true, Ordering::SeqCst);
                timer_token.cancel();
            }
        }
    });

    Deadline { token, expired }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_deadline_expires() {
        let parent = CancellationToken::new();
        let deadline = cancel_after(&parent, Duration::from_secs(5));
        assert!(!deadline.is_cancelled());

        deadline.token().cancelled().await;
        assert!(deadline.is_expired());
        assert!(!parent.is_cancelled());
    }

    #[tokio::test]
    async fn test_early_cancel_is_not_expiry() {
        let parent = CancellationToken::new();
        let deadline = cancel_after(&parent, Duration::from_secs(60));
        deadline.cancel();
        assert!(deadline.is_cancelled());
        assert!(!deadline.is_expired());
    }

    #[tokio::test]
    async fn test_parent_cancel_propagates() {
        let parent = CancellationToken::new();
        let deadline = cancel_after(&parent, Duration::from_secs(60));
        parent.cancel();
        assert!(deadline.is_cancelled());
        assert!(!deadline.is_expired());
    }
}
