//! xdm channel library entry.
//!
//! This crate wires the graph serializer from `xdm-core` to a transport, a
//! pending-call table, and a request dispatcher. It is consumed by the
//! loopback binary (`main.rs`) and by integration tests.

pub mod cancel;
pub mod config;
pub mod dispatch;
pub mod rpc;
pub mod transport;

pub use cancel::CancelSignal;
pub use config::{ChannelConfig, ChannelSection};
pub use dispatch::{ObjectRegistry, StaticObjectRegistry};
pub use rpc::{Channel, Disposition};
pub use transport::{Inbox, MpscTransport, Transport};
