//! Session configuration.

use crate::constants::*;
use crate::error::{CmriError, CmriResult};
use crate::types::NodeType;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Which revision of the protocol the attached nodes speak.
///
/// The two revisions are not wire-compatible supersets of each other, so a
/// session commits to one of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProtocolVariant {
    /// SMINI only.
    Legacy,
    /// SMINI, MAXI24, MAXI32 and CPNODE.
    #[default]
    Extended,
}

impl ProtocolVariant {
    /// Whether `node_type` can be initialized under this variant.
    pub fn supports(self, node_type: NodeType) -> bool {
        match self {
            ProtocolVariant::Legacy => node_type == NodeType::Smini,
            ProtocolVariant::Extended => true,
        }
    }
}

impl fmt::Display for ProtocolVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolVariant::Legacy => write!(f, "legacy"),
            ProtocolVariant::Extended => write!(f, "extended"),
        }
    }
}

/// Configuration fixed for the lifetime of a [`NodeSession`](crate::NodeSession).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Receive attempts before a byte read times out.
    pub max_tries: u32,
    /// Buffered input bytes tolerated before an overrun is reported.
    pub max_buf: usize,
    /// Inter-byte delay the node should use when replying. Sent at init,
    /// never enforced locally.
    pub delay: u16,
    /// Protocol revision spoken by the nodes.
    pub variant: ProtocolVariant,
    /// Payload bytes in a poll response.
    pub input_bytes: usize,
    /// Pause between receive attempts, in microseconds. Zero busy-polls.
    pub attempt_pause_us: u64,
    /// Pause between pending-write checks while draining, in milliseconds.
    pub drain_pause_ms: u64,
    /// Give up after this many full re-polls caused by a wrong address.
    /// `None` keeps re-polling until a receive times out.
    pub max_repolls: Option<u32>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            max_tries: DEFAULT_MAX_TRIES,
            max_buf: DEFAULT_MAX_BUF,
            delay: DEFAULT_DELAY,
            variant: ProtocolVariant::default(),
            input_bytes: DEFAULT_INPUT_BYTES,
            attempt_pause_us: 0,
            drain_pause_ms: DEFAULT_DRAIN_PAUSE_MS,
            max_repolls: None,
        }
    }
}

impl SessionConfig {
    /// Check every field against its contractual range.
    pub fn validate(&self) -> CmriResult<()> {
        if self.max_tries == 0 {
            return Err(invalid("max_tries", "must be at least 1".to_string()));
        }
        if self.max_buf == 0 || self.max_buf > MAX_MAX_BUF {
            return Err(invalid(
                "max_buf",
                format!("{} is outside 1-{}", self.max_buf, MAX_MAX_BUF),
            ));
        }
        if self.input_bytes == 0 || self.input_bytes > MAX_INPUT_BYTES {
            return Err(invalid(
                "input_bytes",
                format!("{} is outside 1-{}", self.input_bytes, MAX_INPUT_BYTES),
            ));
        }
        Ok(())
    }

    /// Pause between receive attempts.
    pub fn attempt_pause(&self) -> Duration {
        Duration::from_micros(self.attempt_pause_us)
    }

    /// Pause between pending-write checks.
    pub fn drain_pause(&self) -> Duration {
        Duration::from_millis(self.drain_pause_ms)
    }
}

fn invalid(field: &'static str, reason: String) -> CmriError {
    CmriError::InvalidConfig { field, reason }
}
