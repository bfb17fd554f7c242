//! Top-level facade crate for xdm.
//!
//! Re-exports the graph serializer primitives and the RPC channel so users can
//! depend on a single crate.

pub mod core {
    pub use xdm_core::*;
}

pub mod channel {
    pub use xdm_channel::*;
}
