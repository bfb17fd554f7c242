use std::time::Duration;

use serde::Deserialize;
use xdm_core::error::{Result, XdmError};
use xdm_core::MAX_DEPTH;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChannelConfig {
    pub version: u32,

    #[serde(default)]
    pub channel: ChannelSection,
}

impl ChannelConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(XdmError::UnsupportedVersion);
        }

        self.channel.validate()?;

        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChannelSection {
    /// Fixed channel id; a process-unique id is allocated when absent.
    #[serde(default)]
    pub channel_id: Option<u64>,

    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// 0 disables the per-call timeout.
    #[serde(default)]
    pub call_timeout_ms: u64,

    #[serde(default = "default_true")]
    pub allow_async_methods: bool,

    #[serde(default = "default_true")]
    pub include_underscore_properties: bool,

    #[serde(default = "default_true")]
    pub validate_handshake: bool,

    #[serde(default = "default_inbox_capacity")]
    pub inbox_capacity: usize,
}

impl Default for ChannelSection {
    fn default() -> Self {
        Self {
            channel_id: None,
            max_depth: default_max_depth(),
            call_timeout_ms: 0,
            allow_async_methods: true,
            include_underscore_properties: true,
            validate_handshake: true,
            inbox_capacity: default_inbox_capacity(),
        }
    }
}

impl ChannelSection {
    pub fn validate(&self) -> Result<()> {
        if !(1..=1000).contains(&self.max_depth) {
            return Err(XdmError::BadRequest(
                "channel.max_depth must be between 1 and 1000".into(),
            ));
        }
        if self.call_timeout_ms != 0 && !(10..=600000).contains(&self.call_timeout_ms) {
            return Err(XdmError::BadRequest(
                "channel.call_timeout_ms must be 0 or between 10 and 600000".into(),
            ));
        }
        if !(1..=65536).contains(&self.inbox_capacity) {
            return Err(XdmError::BadRequest(
                "channel.inbox_capacity must be between 1 and 65536".into(),
            ));
        }
        Ok(())
    }

    pub fn call_timeout(&self) -> Option<Duration> {
        (self.call_timeout_ms > 0).then(|| Duration::from_millis(self.call_timeout_ms))
    }
}

fn default_max_depth() -> usize {
    MAX_DEPTH
}
fn default_true() -> bool {
    true
}
fn default_inbox_capacity() -> usize {
    256
}
