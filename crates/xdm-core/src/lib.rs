//! xdm core: graph serialization primitives, wire envelope, and error types.
//!
//! This crate turns arbitrary, possibly cyclic, function-bearing object graphs
//! into finite JSON trees (and back). It carries no transport or runtime
//! dependencies so it can be reused by any channel implementation.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! All fallible paths must surface as `XdmError`/`Result` so a dispatch loop
//! does not crash on malformed input.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod classify;
pub mod de;
pub mod error;
pub mod host;
pub mod protocol;
pub mod ser;
pub mod value;

/// Default recursion bound for both serialization and deserialization.
pub const MAX_DEPTH: usize = 100;

pub use classify::{classify, TypeGroup};
pub use de::GraphDeserializer;
pub use error::{ErrorCode, Result, XdmError};
pub use host::{DetachedHost, ProxyHost};
pub use protocol::{JsonRpcMessage, SerializationSettings};
pub use ser::GraphSerializer;
pub use value::{ErrorValue, Invocable, Invocation, Method, Record, Value, XdmObject};
