//! RPC channel: outbound calls, response correlation, inbound dispatch.

pub mod channel;
pub mod pending;
pub mod proxy_registry;

pub use channel::{Channel, Disposition};
pub use pending::{Outcome, PendingCalls};
pub use proxy_registry::{ProxyHandle, ProxyRegistry};
