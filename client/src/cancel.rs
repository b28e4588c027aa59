//! Cooperative cancellation for in-flight requests.

use std::sync::Arc;
use tokio::sync::watch;

/// Cancellation token for one in-flight request.
///
/// The lifecycle controller creates a fresh token per call and never
/// reuses one; clones share the same signal. The transport adapter races
/// its exchange against [`CancelToken::cancelled`] and re-checks
/// [`CancelToken::is_cancelled`] after settlement so a late cancellation
/// never surfaces stale data.
#[derive(Debug, Clone)]
pub struct CancelToken {
    sender: Arc<watch::Sender<bool>>,
}

impl CancelToken {
    /// Fresh, uncancelled token.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _receiver) = watch::channel(false);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Signal cancellation. Idempotent.
    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }

    /// Whether cancellation has been signalled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.sender.borrow()
    }

    /// Resolve once cancellation is signalled.
    pub async fn cancelled(&self) {
        let mut receiver = self.sender.subscribe();
        // wait_for returns immediately when the token is already
        // cancelled; the sender cannot drop while `self` is borrowed.
        let _ = receiver.wait_for(|cancelled| *cancelled).await;
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}
