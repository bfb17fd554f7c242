//! RPC envelope (JSON).
//!
//! One struct covers requests and responses. Every field is always present on
//! the wire; absent values are encoded as `null`.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

use crate::error::{Result, XdmError};

/// Per-request serialization switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SerializationSettings {
    /// When false, members whose name starts with `_` are not emitted.
    pub include_underscore_properties: bool,
}

impl Default for SerializationSettings {
    fn default() -> Self {
        Self {
            include_underscore_properties: true,
        }
    }
}

/// RPC envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct JsonRpcMessage {
    /// Message id, unique per sending channel. Responses reuse the request id.
    pub id: u64,
    /// Target registered object (requests only).
    #[serde(default)]
    pub instance_id: Option<String>,
    /// Opaque lookup context for the target.
    #[serde(default)]
    pub instance_context: Option<Json>,
    /// Method to invoke; absent means "return the object itself".
    #[serde(default)]
    pub method_name: Option<String>,
    /// Serialized positional arguments.
    #[serde(default)]
    pub params: Option<Vec<Json>>,
    /// Serialized result (successful responses).
    #[serde(default)]
    pub result: Option<Json>,
    /// Serialized error (failed responses).
    #[serde(default)]
    pub error: Option<Json>,
    pub handshake_token: String,
    #[serde(default)]
    pub serialization_settings: Option<SerializationSettings>,
}

impl JsonRpcMessage {
    pub fn request(
        id: u64,
        instance_id: impl Into<String>,
        instance_context: Option<Json>,
        method_name: Option<String>,
        params: Vec<Json>,
        handshake_token: impl Into<String>,
        serialization_settings: Option<SerializationSettings>,
    ) -> Self {
        Self {
            id,
            instance_id: Some(instance_id.into()),
            instance_context,
            method_name,
            params: Some(params),
            result: None,
            error: None,
            handshake_token: handshake_token.into(),
            serialization_settings,
        }
    }

    /// Successful response to `request`; echoes its id and token.
    pub fn success(request: &JsonRpcMessage, result: Json) -> Self {
        Self::response(request, Some(result), None)
    }

    /// Error response to `request`; echoes its id and token.
    pub fn failure(request: &JsonRpcMessage, error: Json) -> Self {
        Self::response(request, None, Some(error))
    }

    fn response(request: &JsonRpcMessage, result: Option<Json>, error: Option<Json>) -> Self {
        Self {
            id: request.id,
            instance_id: None,
            instance_context: None,
            method_name: None,
            params: None,
            result,
            error,
            handshake_token: request.handshake_token.clone(),
            serialization_settings: None,
        }
    }

    /// Responses carry no instance id.
    pub fn is_response(&self) -> bool {
        self.instance_id
            .as_deref()
            .map_or(true, |s| s.trim().is_empty())
    }

    pub fn to_bytes(&self) -> Result<Bytes> {
        serde_json::to_vec(self)
            .map(Bytes::from)
            .map_err(|e| XdmError::Internal(format!("envelope encode failed: {e}")))
    }

    pub fn from_slice(buf: &[u8]) -> Result<Self> {
        serde_json::from_slice(buf)
            .map_err(|e| XdmError::BadRequest(format!("invalid envelope json: {e}")))
    }
}
