//! Fixed-size binary header.
//!
//! Every message on the wire is a header followed by exactly
//! `payload_len` payload bytes:
//!
//! ```text
//! offset  size  field
//!      0     4  kind          (i32, big-endian)
//!      4     4  sender        (i32, big-endian)
//!      8     4  receiver      (i32, big-endian)
//!     12     4  module        (i32, big-endian)
//!     16     4  payload_len   (i32, big-endian)
//!     20     …  payload
//! ```
//!
//! Decoding validates every field before anything is allocated:
//! - never index the input; read through `Buf` after a length check,
//! - unknown kinds/modules and bad lengths become [`HeaderFault`]s.

use bytes::{Buf, BufMut};

use crate::config::ProtocolLimits;
use crate::envelope::Envelope;
use crate::error::{HeaderFault, ProtocolError, Result};
use crate::types::{MessageKind, Module, PlayerId};

/// Number of integer fields in a header.
pub const HEADER_FIELDS: usize = 5;

/// Size of an encoded header in bytes.
pub const HEADER_LEN: usize = HEADER_FIELDS * 4;

/// Version of the header layout above. Bumped on any change to field
/// order, width or byte order.
pub const WIRE_VERSION: u32 = 1;

/// The metadata of an envelope, without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub kind: MessageKind,
    pub sender: PlayerId,
    pub receiver: PlayerId,
    pub module: Module,
    pub payload_len: usize,
}

impl Header {
    /// Computes the header describing `envelope`.
    pub fn of(envelope: &Envelope) -> Self {
        Self {
            kind: envelope.kind(),
            sender: envelope.sender(),
            receiver: envelope.receiver(),
            module: envelope.module(),
            payload_len: envelope.payload_len(),
        }
    }

    /// The five header integers in wire order.
    ///
    /// # Errors
    /// `HeaderMalformed` if the payload is too long to be described by a
    /// 32-bit length field.
    pub fn to_fields(&self) -> Result<[i32; HEADER_FIELDS]> {
        let len = i32::try_from(self.payload_len).map_err(|_| {
            HeaderFault::LengthExceedsLimit {
                len: self.payload_len,
                max: i32::MAX as usize,
            }
        })?;
        Ok([
            self.kind.wire(),
            self.sender.0,
            self.receiver.0,
            self.module.wire(),
            len,
        ])
    }

    /// Parses and validates the five header integers.
    ///
    /// # Errors
    /// `HeaderMalformed` for an unknown kind or module, a negative length,
    /// or a length above `limits.max_payload_len`.
    pub fn from_fields(
        fields: [i32; HEADER_FIELDS],
        limits: &ProtocolLimits,
    ) -> Result<Self> {
        let [kind, sender, receiver, module, len] = fields;

        let kind = MessageKind::try_from(kind)?;
        let module = Module::try_from(module)?;
        let payload_len = usize::try_from(len)
            .map_err(|_| HeaderFault::NegativeLength(len))?;
        if payload_len > limits.max_payload_len {
            return Err(HeaderFault::LengthExceedsLimit {
                len: payload_len,
                max: limits.max_payload_len,
            }
            .into());
        }

        Ok(Self {
            kind,
            sender: PlayerId(sender),
            receiver: PlayerId(receiver),
            module,
            payload_len,
        })
    }

    /// Encodes the header into its 20-byte wire form.
    pub fn to_bytes(&self) -> Result<[u8; HEADER_LEN]> {
        let fields = self.to_fields()?;
        let mut out = [0u8; HEADER_LEN];
        let mut cursor = &mut out[..];
        for field in fields {
            cursor.put_i32(field);
        }
        Ok(out)
    }

    /// Decodes and validates a header from the front of `buf`.
    ///
    /// Only the first [`HEADER_LEN`] bytes are read; anything after them
    /// (the payload) is left alone.
    pub fn from_bytes(mut buf: &[u8], limits: &ProtocolLimits) -> Result<Self> {
        if buf.remaining() < HEADER_LEN {
            return Err(ProtocolError::HeaderMalformed(HeaderFault::Truncated {
                len: buf.remaining(),
            }));
        }

        let mut fields = [0i32; HEADER_FIELDS];
        for field in &mut fields {
            *field = buf.get_i32();
        }
        Self::from_fields(fields, limits)
    }
}

/// Returns the header integers for `envelope` in wire order:
/// `{kind, sender, receiver, module, payload_len}`.
pub fn encode_header(envelope: &Envelope) -> Result<[i32; HEADER_FIELDS]> {
    Header::of(envelope).to_fields()
}

/// Validates header integers read from the wire.
///
/// The returned [`Header`] turns into an envelope with
/// [`Envelope::from_header`]; the caller then reads exactly
/// `payload_len` bytes into it.
pub fn decode_header(
    fields: [i32; HEADER_FIELDS],
    limits: &ProtocolLimits,
) -> Result<Header> {
    Header::from_fields(fields, limits)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chat() -> Envelope {
        Envelope::new(
            MessageKind::HumanPlayerChat,
            PlayerId(3),
            PlayerId::SERVER,
            Module::Core,
            "hello",
        )
    }

    #[test]
    fn test_encode_header_field_order() {
        let fields = encode_header(&chat()).unwrap();
        assert_eq!(fields, [21, 3, -1, 0, 5]);
    }

    #[test]
    fn test_header_round_trip_through_fields() {
        let env = Envelope::new(
            MessageKind::DispatchNewObjectId,
            PlayerId::SERVER,
            PlayerId::HOST,
            Module::ClientSynchronousResponse,
            "77",
        );
        let fields = encode_header(&env).unwrap();
        let header = decode_header(fields, &ProtocolLimits::default()).unwrap();
        assert_eq!(header, Header::of(&env));
        assert_eq!(header.payload_len, 2);
    }

    #[test]
    fn test_header_bytes_are_big_endian() {
        let bytes = Header::of(&chat()).to_bytes().unwrap();
        assert_eq!(
            bytes,
            [
                0, 0, 0, 21, // kind
                0, 0, 0, 3, // sender
                0xff, 0xff, 0xff, 0xff, // receiver -1
                0, 0, 0, 0, // module
                0, 0, 0, 5, // payload_len
            ]
        );
    }

    #[test]
    fn test_from_bytes_ignores_trailing_payload() {
        let env = chat();
        let mut wire = Header::of(&env).to_bytes().unwrap().to_vec();
        wire.extend_from_slice(env.payload());

        let header = Header::from_bytes(&wire, &ProtocolLimits::default()).unwrap();
        assert_eq!(header, Header::of(&env));
    }

    #[test]
    fn test_rejects_unknown_kind() {
        let err = decode_header([99, 1, -1, 0, 0], &ProtocolLimits::default())
            .unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::HeaderMalformed(HeaderFault::UnknownKind(99))
        ));
    }

    #[test]
    fn test_rejects_undefined_kind_zero() {
        let err = decode_header([0, 1, -1, 0, 0], &ProtocolLimits::default())
            .unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::HeaderMalformed(HeaderFault::UnknownKind(0))
        ));
    }

    #[test]
    fn test_rejects_unknown_module() {
        let err = decode_header([21, 1, -1, 9, 0], &ProtocolLimits::default())
            .unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::HeaderMalformed(HeaderFault::UnknownModule(9))
        ));
    }

    #[test]
    fn test_rejects_negative_length() {
        let err = decode_header([21, 1, -1, 0, -4], &ProtocolLimits::default())
            .unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::HeaderMalformed(HeaderFault::NegativeLength(-4))
        ));
    }

    #[test]
    fn test_rejects_length_over_limit() {
        let limits = ProtocolLimits {
            max_payload_len: 16,
            ..ProtocolLimits::default()
        };
        assert!(decode_header([21, 1, -1, 0, 16], &limits).is_ok());

        let err = decode_header([21, 1, -1, 0, 17], &limits).unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::HeaderMalformed(HeaderFault::LengthExceedsLimit {
                len: 17,
                max: 16
            })
        ));
    }

    #[test]
    fn test_rejects_truncated_bytes() {
        let err = Header::from_bytes(&[0, 0, 0, 21, 0, 0], &ProtocolLimits::default())
            .unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::HeaderMalformed(HeaderFault::Truncated { len: 6 })
        ));
    }

    #[test]
    fn test_sentinel_ids_survive() {
        let env = Envelope::new(
            MessageKind::JoinGame,
            PlayerId::SERVER,
            PlayerId::SERVER,
            Module::Core,
            "",
        );
        let header = decode_header(
            encode_header(&env).unwrap(),
            &ProtocolLimits::default(),
        )
        .unwrap();
        assert_eq!(header.sender, PlayerId::SERVER);
        assert_eq!(header.receiver, PlayerId::SERVER);
        assert_eq!(header.payload_len, 0);
    }
}
