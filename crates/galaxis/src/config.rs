//! Server configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use galaxis_protocol::ProtocolLimits;
use serde::{Deserialize, Serialize};

/// Configuration for a [`GalaxisServer`](crate::GalaxisServer).
///
/// Every field has a default, so a config file only needs the keys it
/// changes:
///
/// ```json
/// { "bind_addr": "0.0.0.0:12346", "limits": { "max_payload_len": 1048576 } }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the listener binds to.
    pub bind_addr: String,

    /// Frame limits applied to every connection.
    pub limits: ProtocolLimits,

    /// Seconds a connection may stay silent before it is dropped.
    /// 0 disables the timeout; turn-based clients can idle for a long
    /// time between turns.
    pub idle_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:12346".to_string(),
            limits: ProtocolLimits::default(),
            idle_timeout_secs: 0,
        }
    }
}

impl ServerConfig {
    /// Parses a JSON config.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads and parses a JSON config file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json_str(&json)?;
        tracing::debug!(path = %path.display(), "loaded server config");
        Ok(config)
    }

    /// The idle timeout, if enabled.
    pub fn idle_timeout(&self) -> Option<Duration> {
        (self.idle_timeout_secs > 0).then(|| Duration::from_secs(self.idle_timeout_secs))
    }
}

/// Errors loading a [`ServerConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}
