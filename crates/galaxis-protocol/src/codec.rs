//! Payload codecs.
//!
//! Structured payloads (lobby settings, order sets, galaxy snapshots) are
//! turned into bytes by a [`Codec`]. The protocol only fixes *which*
//! values go into a payload and in what order; how they become bytes is
//! up to the codec both ends agree on.
//!
//! Two codecs ship with the crate:
//! - [`BincodeCodec`]: compact binary, what production builds use
//! - [`JsonCodec`]: readable, handy when sniffing traffic during
//!   development

use serde::{Serialize, de::DeserializeOwned};

use crate::error::CodecError;

/// Encodes values to payload bytes and decodes them back.
///
/// `Send + Sync + 'static` so one codec instance can be shared by every
/// connection task.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns a [`CodecError`] if the value cannot be represented in
    /// this format.
    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>, CodecError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns a [`CodecError`] if the bytes are malformed, truncated,
    /// or don't match `T`.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, CodecError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// This is behind the `json` feature flag (enabled by default).
///
/// ## Example
///
/// ```rust
/// use galaxis_protocol::{Codec, JsonCodec, TurnProgressPhase};
///
/// let codec = JsonCodec;
/// let bytes = codec.encode(&TurnProgressPhase::Combat).unwrap();
/// assert_eq!(bytes, b"\"Combat\"");
///
/// let phase: TurnProgressPhase = codec.decode(&bytes).unwrap();
/// assert_eq!(phase, TurnProgressPhase::Combat);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>, CodecError> {
        Ok(serde_json::to_vec(value)?)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, CodecError> {
        Ok(serde_json::from_slice(data)?)
    }
}

// ---------------------------------------------------------------------------
// BincodeCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses `bincode` with fixed-width integers.
///
/// Decoding is strict: the read is capped at the payload length, and
/// trailing bytes after the value are an error rather than silently
/// ignored.
///
/// This is behind the `bincode` feature flag (enabled by default).
#[cfg(feature = "bincode")]
#[derive(Debug, Clone, Copy, Default)]
pub struct BincodeCodec;

#[cfg(feature = "bincode")]
impl BincodeCodec {
    fn options() -> impl bincode::Options {
        use bincode::Options;
        bincode::DefaultOptions::new().with_fixint_encoding()
    }
}

#[cfg(feature = "bincode")]
impl Codec for BincodeCodec {
    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>, CodecError> {
        use bincode::Options;
        Ok(Self::options().serialize(value)?)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, CodecError> {
        use bincode::Options;
        Ok(Self::options()
            .with_limit(data.len() as u64)
            .deserialize(data)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Fleet {
        name: String,
        ships: Vec<u32>,
        flagship: Option<u32>,
    }

    fn fleet() -> Fleet {
        Fleet {
            name: "Home Guard".into(),
            ships: vec![4, 8, 15],
            flagship: Some(8),
        }
    }

    #[test]
    fn test_json_round_trip() {
        let bytes = JsonCodec.encode(&fleet()).unwrap();
        let decoded: Fleet = JsonCodec.decode(&bytes).unwrap();
        assert_eq!(decoded, fleet());
    }

    #[test]
    fn test_json_garbage_is_an_error() {
        let result: Result<Fleet, _> = JsonCodec.decode(b"not json at all");
        assert!(matches!(result, Err(CodecError::Json(_))));
    }

    #[test]
    fn test_bincode_round_trip() {
        let bytes = BincodeCodec.encode(&fleet()).unwrap();
        let decoded: Fleet = BincodeCodec.decode(&bytes).unwrap();
        assert_eq!(decoded, fleet());
    }

    #[test]
    fn test_bincode_option_writes_presence_flag_first() {
        let some = BincodeCodec.encode(&Some(7u32)).unwrap();
        assert_eq!(some, vec![1, 7, 0, 0, 0]);
        let none = BincodeCodec.encode(&None::<u32>).unwrap();
        assert_eq!(none, vec![0]);
    }

    #[test]
    fn test_bincode_truncated_input_is_an_error() {
        let bytes = BincodeCodec.encode(&fleet()).unwrap();
        let result: Result<Fleet, _> = BincodeCodec.decode(&bytes[..bytes.len() - 3]);
        assert!(matches!(result, Err(CodecError::Bincode(_))));
    }

    #[test]
    fn test_bincode_trailing_bytes_are_an_error() {
        let mut bytes = BincodeCodec.encode(&7u32).unwrap();
        bytes.push(0);
        let result: Result<u32, _> = BincodeCodec.decode(&bytes);
        assert!(result.is_err());
    }

    #[test]
    fn test_bincode_huge_length_prefix_is_rejected() {
        // A Vec length prefix claiming 2^40 elements in a 9-byte payload.
        let mut bytes = (1u64 << 40).to_le_bytes().to_vec();
        bytes.push(0);
        let result: Result<Vec<u8>, _> = BincodeCodec.decode(&bytes);
        assert!(result.is_err());
    }
}
