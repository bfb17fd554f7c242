//! Cooperative cancellation for outbound calls.

use std::sync::Arc;

use tokio::sync::watch;

/// Cloneable cancellation signal. Cancelling any clone cancels all of them.
///
/// ```
/// use xdm_channel::cancel::CancelSignal;
///
/// let signal = CancelSignal::new();
/// let other = signal.clone();
/// other.cancel();
/// assert!(signal.is_cancelled());
/// ```
#[derive(Debug, Clone)]
pub struct CancelSignal {
    tx: Arc<watch::Sender<bool>>,
}

impl Default for CancelSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelSignal {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    /// Completes once `cancel` has been called on any clone.
    pub async fn cancelled(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives in `self`, so this only returns once cancelled.
        let _ = rx.wait_for(|c| *c).await;
    }
}
