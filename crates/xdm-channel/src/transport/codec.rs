//! Decode-once codec for the transport layer.
//!
//! Envelopes travel as UTF-8 JSON frames (`Bytes`). Oversized or malformed
//! frames are rejected before any dispatch work happens.

use bytes::Bytes;
use xdm_core::{
    error::{Result, XdmError},
    protocol::JsonRpcMessage,
};

/// Largest accepted frame.
pub const MAX_FRAME_BYTES: usize = 16 * 1024 * 1024;

pub fn encode(envelope: &JsonRpcMessage) -> Result<Bytes> {
    let frame = envelope.to_bytes()?;
    if frame.len() > MAX_FRAME_BYTES {
        return Err(XdmError::BadRequest(format!(
            "envelope {} too large: {} bytes",
            envelope.id,
            frame.len()
        )));
    }
    Ok(frame)
}

pub fn decode(frame: &Bytes) -> Result<JsonRpcMessage> {
    if frame.len() > MAX_FRAME_BYTES {
        return Err(XdmError::BadRequest(format!(
            "frame too large: {} bytes",
            frame.len()
        )));
    }
    JsonRpcMessage::from_slice(frame)
}
