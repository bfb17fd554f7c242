//! Wire protocol modules.
//!
//! - `envelope`: the JSON-RPC style message exchanged between two channels.
//! - `wire`: the special node shapes the graph serializer emits (dates,
//!   proxy functions, circular references, errors).
//!
//! Decoders never panic: malformed input is reported as `XdmError` so the
//! dispatch loop survives hostile or stale traffic.

pub mod envelope;
pub mod wire;

pub use envelope::{JsonRpcMessage, SerializationSettings};
