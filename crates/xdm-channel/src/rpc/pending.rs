//! In-flight outbound calls awaiting a correlated response.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use serde_json::Value as Json;
use tokio::sync::oneshot;

use xdm_core::error::{Result, XdmError};

use crate::cancel::CancelSignal;

/// Raw wire outcome of a call: `Ok(result)` or `Err(error payload)`.
pub type Outcome = std::result::Result<Json, Json>;

/// Pending calls keyed by message id. Each entry resolves at most once.
#[derive(Default)]
pub struct PendingCalls {
    calls: DashMap<u64, oneshot::Sender<Outcome>>,
    closed: AtomicBool,
}

impl PendingCalls {
    pub fn new() -> Self {
        Self {
            calls: DashMap::new(),
            closed: AtomicBool::new(false),
        }
    }

    pub fn register(&self, id: u64) -> oneshot::Receiver<Outcome> {
        let (tx, rx) = oneshot::channel();
        self.calls.insert(id, tx);
        // Registered after close: drop the sender so the caller sees ChannelClosed.
        if self.closed.load(Ordering::SeqCst) {
            self.calls.remove(&id);
        }
        rx
    }

    /// Remove and fulfil call `id`. Returns false when no such call is pending.
    pub fn resolve(&self, id: u64, outcome: Outcome) -> bool {
        match self.calls.remove(&id) {
            Some((_, tx)) => {
                // Receiver gone means the caller already gave up.
                let _ = tx.send(outcome);
                true
            }
            None => false,
        }
    }

    pub fn remove(&self, id: u64) -> bool {
        self.calls.remove(&id).is_some()
    }

    pub fn contains(&self, id: u64) -> bool {
        self.calls.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    /// Drop every pending call; their callers observe `ChannelClosed`.
    pub fn clear(&self) {
        self.calls.clear();
    }

    /// Clear and refuse further calls. Used once the peer is gone.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.calls.clear();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Wait for call `id`, giving up on cancellation or timeout.
    ///
    /// A call given up locally is removed from the map; a late response for it
    /// is then treated as unknown.
    pub async fn wait(
        &self,
        id: u64,
        rx: oneshot::Receiver<Outcome>,
        timeout: Option<Duration>,
        cancel: Option<&CancelSignal>,
    ) -> Result<Outcome> {
        let cancelled = async {
            match cancel {
                Some(c) => c.cancelled().await,
                None => std::future::pending().await,
            }
        };
        let expired = async {
            match timeout {
                Some(d) => tokio::time::sleep(d).await,
                None => std::future::pending().await,
            }
        };

        let out = tokio::select! {
            r = rx => r.map_err(|_| XdmError::ChannelClosed),
            _ = cancelled => Err(XdmError::Cancelled),
            _ = expired => Err(XdmError::Timeout),
        };

        if out.is_err() {
            self.remove(id);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn resolves_exactly_once() {
        let pending = PendingCalls::new();
        let rx = pending.register(1);

        assert!(pending.resolve(1, Ok(json!(5))));
        assert!(!pending.resolve(1, Ok(json!(6))));
        assert!(pending.is_empty());

        let out = pending.wait(1, rx, None, None).await;
        assert_eq!(out.ok(), Some(Ok(json!(5))));
    }

    #[tokio::test]
    async fn timeout_removes_the_entry() {
        let pending = PendingCalls::new();
        let rx = pending.register(4);
        let out = pending.wait(4, rx, Some(Duration::from_millis(10)), None).await;
        assert!(matches!(out, Err(XdmError::Timeout)));
        assert!(!pending.contains(4));
    }

    #[tokio::test]
    async fn cancel_removes_the_entry() {
        let pending = PendingCalls::new();
        let rx = pending.register(2);
        let cancel = CancelSignal::new();
        cancel.cancel();

        let out = pending.wait(2, rx, None, Some(&cancel)).await;
        assert!(matches!(out, Err(XdmError::Cancelled)));
        assert!(!pending.contains(2));
    }

    #[tokio::test]
    async fn cleared_calls_observe_channel_closed() {
        let pending = PendingCalls::new();
        let rx = pending.register(3);
        pending.clear();
        let out = pending.wait(3, rx, None, None).await;
        assert!(matches!(out, Err(XdmError::ChannelClosed)));
    }

    #[tokio::test]
    async fn calls_registered_after_close_fail_fast() {
        let pending = PendingCalls::new();
        pending.close();
        assert!(pending.is_closed());

        let rx = pending.register(5);
        assert!(!pending.contains(5));
        let out = pending.wait(5, rx, None, None).await;
        assert!(matches!(out, Err(XdmError::ChannelClosed)));
    }
}
