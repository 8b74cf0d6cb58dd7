//! Error types for the protocol layer.
//!
//! Failures are split by where they happen, because the caller reacts
//! differently to each:
//!
//! - a bad **header** means the byte stream can no longer be framed, so
//!   the connection has to go;
//! - a bad **payload** only spoils one message, which is logged and
//!   dropped while the session carries on;
//! - a **wrong kind** is a dispatch bug on our side of the wire.

use crate::types::MessageKind;

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// The fixed-size header could not be turned into a valid envelope
    /// description. Framing is lost after this.
    #[error("malformed header: {0}")]
    HeaderMalformed(#[from] HeaderFault),

    /// A builder could not serialize one of its domain values.
    ///
    /// No envelope is produced in this case; a half-written payload
    /// never escapes a builder.
    #[error("failed to encode {kind} payload: {source}")]
    PayloadEncode {
        kind: MessageKind,
        #[source]
        source: CodecError,
    },

    /// An extractor could not parse the payload bytes (truncated,
    /// corrupt, or written by an incompatible codec).
    #[error("failed to decode {kind} payload: {source}")]
    PayloadDecode {
        kind: MessageKind,
        #[source]
        source: CodecError,
    },

    /// An extractor was handed an envelope of a kind it does not read.
    #[error("extractor `{extractor}` cannot read {actual} messages")]
    WrongKind {
        extractor: &'static str,
        actual: MessageKind,
    },
}

impl ProtocolError {
    /// Returns `true` if the connection that produced this error can no
    /// longer be trusted to stay in sync.
    ///
    /// Only header faults qualify. Everything else is scoped to a single
    /// message.
    pub fn is_fatal_to_connection(&self) -> bool {
        matches!(self, Self::HeaderMalformed(_))
    }
}

/// The specific reason a header was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum HeaderFault {
    /// The kind field is not one of the known message kinds.
    #[error("unknown message kind {0}")]
    UnknownKind(i32),

    /// The module field is not one of the known receiver modules.
    #[error("unknown module {0}")]
    UnknownModule(i32),

    /// The payload length field is negative.
    #[error("negative payload length {0}")]
    NegativeLength(i32),

    /// The payload length is larger than the configured maximum.
    #[error("payload length {len} exceeds limit of {max} bytes")]
    LengthExceedsLimit { len: usize, max: usize },

    /// Fewer bytes than a full header were supplied.
    #[error("header truncated: got {len} bytes")]
    Truncated { len: usize },
}

/// Errors produced while turning payload bytes into values or back.
///
/// Each codec backend gets its own variant so the original error is kept
/// as the `source`. Text payloads (names, chat lines, decimal ids) are
/// parsed without a codec and report through `Utf8` / `Integer`.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[cfg(feature = "json")]
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    #[cfg(feature = "bincode")]
    #[error("bincode: {0}")]
    Bincode(#[from] bincode::Error),

    #[error("payload is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("payload is not an integer: {0}")]
    Integer(#[from] std::num::ParseIntError),

    /// For codecs implemented outside this crate.
    #[error("{0}")]
    Custom(String),
}

/// Shorthand used throughout the protocol crate.
pub type Result<T> = std::result::Result<T, ProtocolError>;
