//! Inbound request dispatch.
//!
//! Re-exports the dispatcher and the object registry collaborator so
//! downstream consumers can depend on this module directly.

pub mod dispatcher;
pub mod objects;

pub use dispatcher::Dispatcher;
pub use objects::{ObjectRegistry, StaticObjectRegistry};
