//! Channel config loader (strict parsing).
//!
//! The loopback binary reads [`DEFAULT_CONFIG_PATH`] unless a path is given.
//! Only the `channel` section is consumed; a missing section means defaults.

pub mod schema;

use std::fs;

use xdm_core::error::{Result, XdmError};

pub use schema::{ChannelConfig, ChannelSection};

pub const DEFAULT_CONFIG_PATH: &str = "xdm.yaml";

pub fn load_from_file(path: &str) -> Result<ChannelConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| XdmError::Internal(format!("read config {path} failed: {e}")))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<ChannelConfig> {
    let cfg: ChannelConfig = serde_yaml::from_str(s)
        .map_err(|e| XdmError::BadRequest(format!("invalid channel yaml: {e}")))?;
    cfg.validate()?;
    tracing::debug!(
        max_depth = cfg.channel.max_depth,
        call_timeout_ms = cfg.channel.call_timeout_ms,
        "channel config loaded"
    );
    Ok(cfg)
}
