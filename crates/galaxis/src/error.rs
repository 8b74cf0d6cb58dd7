//! Unified error type for the Galaxis server.

use galaxis_protocol::{PlayerId, ProtocolError};
use galaxis_transport::TransportError;

use crate::config::ConfigError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant lets `?` convert sub-crate
/// errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum GalaxisError {
    /// A transport-level error (i/o, framing, mid-frame close).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol error severe enough to end the connection.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The server configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A handler assigned an id that another connection already holds.
    #[error("player id {0} is already connected")]
    PlayerIdTaken(PlayerId),
}

#[cfg(test)]
mod tests {
    use super::*;
    use galaxis_protocol::HeaderFault;

    #[test]
    fn test_from_transport_error() {
        let err = TransportError::Closed { buffered: 3 };
        let galaxis_err: GalaxisError = err.into();
        assert!(matches!(galaxis_err, GalaxisError::Transport(_)));
        assert!(galaxis_err.to_string().contains("3 bytes"));
    }

    #[test]
    fn test_from_protocol_error() {
        let err = ProtocolError::from(HeaderFault::NegativeLength(-1));
        let galaxis_err: GalaxisError = err.into();
        assert!(matches!(galaxis_err, GalaxisError::Protocol(_)));
    }

    #[test]
    fn test_from_config_error() {
        let err = ConfigError::Parse(serde_json::from_str::<u8>("x").unwrap_err());
        let galaxis_err: GalaxisError = err.into();
        assert!(matches!(galaxis_err, GalaxisError::Config(_)));
    }

    #[test]
    fn test_player_id_taken_display() {
        let err = GalaxisError::PlayerIdTaken(PlayerId::HOST);
        assert_eq!(err.to_string(), "player id 0(host) is already connected");
    }
}
