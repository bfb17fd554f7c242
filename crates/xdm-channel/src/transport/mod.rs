//! Transport collaborators.
//!
//! The core only needs `send_envelope`; how envelopes physically cross between
//! contexts is up to the implementation. `MpscTransport` is an in-process pair
//! used by tests and the loopback demo.

pub mod codec;
pub mod mpsc;

use async_trait::async_trait;

use xdm_core::error::Result;
use xdm_core::protocol::JsonRpcMessage;

pub use self::mpsc::{Inbox, MpscTransport};

/// Delivers envelopes to the remote side.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send_envelope(&self, envelope: JsonRpcMessage) -> Result<()>;
}
