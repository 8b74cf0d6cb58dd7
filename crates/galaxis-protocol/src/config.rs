//! Protocol limits.

use serde::{Deserialize, Serialize};

/// Largest payload accepted from a header unless configured otherwise.
///
/// Full galaxy snapshots in late-game turns are the biggest messages on
/// the wire and stay well below this.
pub const DEFAULT_MAX_PAYLOAD_LEN: usize = 64 * 1024 * 1024;

/// How many payload bytes the diagnostic renderer shows by default.
pub const DEFAULT_PREVIEW_LEN: usize = 256;

/// Limits applied when decoding untrusted input.
///
/// Both ends of a connection may run with different limits; a peer that
/// sends more than the receiver allows gets its header rejected before
/// any payload memory is allocated.
///
/// `#[serde(default)]` lets a config file set only the fields it cares
/// about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolLimits {
    /// Maximum payload length, in bytes, a header may announce.
    pub max_payload_len: usize,

    /// Number of payload bytes included when rendering an envelope.
    pub preview_len: usize,
}

impl Default for ProtocolLimits {
    fn default() -> Self {
        Self {
            max_payload_len: DEFAULT_MAX_PAYLOAD_LEN,
            preview_len: DEFAULT_PREVIEW_LEN,
        }
    }
}
