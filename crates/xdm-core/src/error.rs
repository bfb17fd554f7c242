//! Shared error type across xdm crates.

use thiserror::Error;

use crate::value::ErrorValue;

/// Stable error codes (wire and log facing).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Serializer met a value it cannot classify.
    UnsupportedType,
    /// Remote invoked a proxy id with no registration.
    ProxyNotFound,
    /// Requested method absent or not callable.
    MethodNotFound,
    /// Target method is asynchronous and async dispatch is disabled.
    UnsupportedAsyncMethod,
    /// Invoked target raised an error.
    RemoteInvocation,
    /// Caller received an error envelope.
    Remote,
    /// Invalid input / malformed message.
    BadRequest,
    /// Call given up locally.
    Cancelled,
    /// Call exceeded the configured timeout.
    Timeout,
    /// Transport or dispatch loop is gone.
    ChannelClosed,
    /// Transport collaborator failed.
    Transport,
    /// Unsupported config/protocol version.
    UnsupportedVersion,
    /// Internal error.
    Internal,
}

impl ErrorCode {
    /// String representation used in logs and error payloads.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::UnsupportedType => "UNSUPPORTED_TYPE",
            ErrorCode::ProxyNotFound => "PROXY_NOT_FOUND",
            ErrorCode::MethodNotFound => "METHOD_NOT_FOUND",
            ErrorCode::UnsupportedAsyncMethod => "UNSUPPORTED_ASYNC_METHOD",
            ErrorCode::RemoteInvocation => "REMOTE_INVOCATION",
            ErrorCode::Remote => "REMOTE",
            ErrorCode::BadRequest => "BAD_REQUEST",
            ErrorCode::Cancelled => "CANCELLED",
            ErrorCode::Timeout => "TIMEOUT",
            ErrorCode::ChannelClosed => "CHANNEL_CLOSED",
            ErrorCode::Transport => "TRANSPORT",
            ErrorCode::UnsupportedVersion => "UNSUPPORTED_VERSION",
            ErrorCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, XdmError>;

/// Unified error type used by core and channel.
#[derive(Debug, Clone, Error)]
pub enum XdmError {
    #[error("unsupported type: {0}")]
    UnsupportedType(String),
    #[error("proxy function not found: {0}")]
    ProxyNotFound(u64),
    #[error("RPC method not found: {0}")]
    MethodNotFound(String),
    #[error("Can't support async methods yet: {0}")]
    UnsupportedAsyncMethod(String),
    #[error("{message}")]
    RemoteInvocation {
        message: String,
        stack: Option<String>,
    },
    #[error("{}", .0.message)]
    Remote(ErrorValue),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("call cancelled")]
    Cancelled,
    #[error("call timed out")]
    Timeout,
    #[error("channel closed")]
    ChannelClosed,
    #[error("transport: {0}")]
    Transport(String),
    #[error("unsupported version")]
    UnsupportedVersion,
    #[error("internal: {0}")]
    Internal(String),
}

impl XdmError {
    /// Map an error to its stable code.
    pub fn code(&self) -> ErrorCode {
        match self {
            XdmError::UnsupportedType(_) => ErrorCode::UnsupportedType,
            XdmError::ProxyNotFound(_) => ErrorCode::ProxyNotFound,
            XdmError::MethodNotFound(_) => ErrorCode::MethodNotFound,
            XdmError::UnsupportedAsyncMethod(_) => ErrorCode::UnsupportedAsyncMethod,
            XdmError::RemoteInvocation { .. } => ErrorCode::RemoteInvocation,
            XdmError::Remote(_) => ErrorCode::Remote,
            XdmError::BadRequest(_) => ErrorCode::BadRequest,
            XdmError::Cancelled => ErrorCode::Cancelled,
            XdmError::Timeout => ErrorCode::Timeout,
            XdmError::ChannelClosed => ErrorCode::ChannelClosed,
            XdmError::Transport(_) => ErrorCode::Transport,
            XdmError::UnsupportedVersion => ErrorCode::UnsupportedVersion,
            XdmError::Internal(_) => ErrorCode::Internal,
        }
    }

    /// Shorthand for an error raised by user code inside an invoked target.
    pub fn invocation(message: impl Into<String>) -> Self {
        XdmError::RemoteInvocation {
            message: message.into(),
            stack: None,
        }
    }

    /// Exception payload reported back over the channel.
    ///
    /// A received remote error is forwarded as-is so nested calls keep the
    /// original message and stack.
    pub fn to_error_value(&self) -> ErrorValue {
        match self {
            XdmError::Remote(v) => v.clone(),
            XdmError::RemoteInvocation { message, stack } => ErrorValue {
                message: message.clone(),
                stack: stack.clone(),
            },
            other => ErrorValue {
                message: other.to_string(),
                stack: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_not_found_message_is_exact() {
        let e = XdmError::MethodNotFound("frobnicate".into());
        assert_eq!(e.to_string(), "RPC method not found: frobnicate");
        assert_eq!(e.code().as_str(), "METHOD_NOT_FOUND");
    }

    #[test]
    fn remote_error_round_trips_its_payload() {
        let payload = ErrorValue {
            message: "boom".into(),
            stack: Some("at add".into()),
        };
        let e = XdmError::Remote(payload.clone());
        assert_eq!(e.to_string(), "boom");
        assert_eq!(e.to_error_value(), payload);
    }
}
