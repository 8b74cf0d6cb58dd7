//! The envelope: routing metadata plus an owned payload.

use crate::header::Header;
use crate::types::{MessageKind, Module, PlayerId};

/// The unit of exchange between client and server.
///
/// ```text
/// ┌──────────────────────────────────────┐
/// │ kind:     TURN_ORDERS                │  ← what it is / payload shape
/// │ sender:   2                          │  ← who sent it
/// │ receiver: -1 (server)                │  ← who it is for
/// │ module:   CORE                       │  ← which handler on arrival
/// │ ┌──────────────────────────────────┐ │
/// │ │ payload: [...opaque bytes...]    │ │
/// │ └──────────────────────────────────┘ │
/// └──────────────────────────────────────┘
/// ```
///
/// The payload is a plain `Vec<u8>` owned by the envelope. Its length is
/// the only length there is, so the header's length field is always
/// computed from it rather than stored next to it. Cloning copies the
/// bytes; two envelopes never share a buffer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Envelope {
    kind: MessageKind,
    sender: PlayerId,
    receiver: PlayerId,
    module: Module,
    payload: Vec<u8>,
}

impl Envelope {
    /// Creates an envelope, taking ownership of (or copying) `payload`.
    ///
    /// The payload is not inspected.
    pub fn new(
        kind: MessageKind,
        sender: PlayerId,
        receiver: PlayerId,
        module: Module,
        payload: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            kind,
            sender,
            receiver,
            module,
            payload: payload.into(),
        }
    }

    /// Creates the envelope a decoded header describes, with a zero-filled
    /// payload of exactly `header.payload_len` bytes.
    ///
    /// The reader is expected to fill [`payload_mut`](Self::payload_mut)
    /// from the stream before handing the envelope on. The header has
    /// already been checked against the configured size limit, so this
    /// allocation is bounded.
    pub fn from_header(header: &Header) -> Self {
        Self {
            kind: header.kind,
            sender: header.sender,
            receiver: header.receiver,
            module: header.module,
            payload: vec![0; header.payload_len],
        }
    }

    pub fn kind(&self) -> MessageKind {
        self.kind
    }

    pub fn sender(&self) -> PlayerId {
        self.sender
    }

    pub fn receiver(&self) -> PlayerId {
        self.receiver
    }

    pub fn module(&self) -> Module {
        self.module
    }

    /// Payload length in bytes.
    pub fn payload_len(&self) -> usize {
        self.payload.len()
    }

    /// Read-only view of the payload bytes.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Mutable view of the payload bytes, for filling after
    /// [`from_header`](Self::from_header) or [`resize`](Self::resize).
    ///
    /// The length cannot change through this slice.
    pub fn payload_mut(&mut self) -> &mut [u8] {
        &mut self.payload
    }

    /// The payload interpreted as text, replacing invalid UTF-8.
    pub fn text(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.payload)
    }

    /// Throws the current payload away and replaces it with `len` zero
    /// bytes.
    pub fn resize(&mut self, len: usize) {
        self.payload = vec![0; len];
    }

    /// Consumes the envelope and returns its payload.
    pub fn into_payload(self) -> Vec<u8> {
        self.payload
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Envelope {
        Envelope::new(
            MessageKind::HumanPlayerChat,
            PlayerId(3),
            PlayerId::SERVER,
            Module::Core,
            "hello",
        )
    }

    #[test]
    fn test_new_copies_fields() {
        let env = sample();
        assert_eq!(env.kind(), MessageKind::HumanPlayerChat);
        assert_eq!(env.sender(), PlayerId(3));
        assert_eq!(env.receiver(), PlayerId::SERVER);
        assert_eq!(env.module(), Module::Core);
        assert_eq!(env.payload(), b"hello");
        assert_eq!(env.payload_len(), 5);
        assert_eq!(env.text(), "hello");
    }

    #[test]
    fn test_clone_is_independent() {
        let original = sample();
        let mut copy = original.clone();
        assert_eq!(original, copy);

        copy.payload_mut()[0] = b'j';
        assert_eq!(copy.text(), "jello");
        assert_eq!(original.text(), "hello");
        assert_ne!(original, copy);

        copy.resize(0);
        assert_eq!(original.payload_len(), 5);
    }

    #[test]
    fn test_equality_covers_every_field() {
        let base = sample();
        let other_kind = Envelope::new(
            MessageKind::LobbyChat,
            PlayerId(3),
            PlayerId::SERVER,
            Module::Core,
            "hello",
        );
        let other_module = Envelope::new(
            MessageKind::HumanPlayerChat,
            PlayerId(3),
            PlayerId::SERVER,
            Module::ClientLobby,
            "hello",
        );
        let other_receiver = Envelope::new(
            MessageKind::HumanPlayerChat,
            PlayerId(3),
            PlayerId(4),
            Module::Core,
            "hello",
        );
        assert_ne!(base, other_kind);
        assert_ne!(base, other_module);
        assert_ne!(base, other_receiver);
    }

    #[test]
    fn test_resize_zero_fills() {
        let mut env = sample();
        env.resize(8);
        assert_eq!(env.payload_len(), 8);
        assert!(env.payload().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_from_header_allocates_declared_length() {
        let header = Header {
            kind: MessageKind::TurnOrders,
            sender: PlayerId(2),
            receiver: PlayerId::SERVER,
            module: Module::Core,
            payload_len: 12,
        };
        let mut env = Envelope::from_header(&header);
        assert_eq!(env.kind(), MessageKind::TurnOrders);
        assert_eq!(env.payload_len(), 12);

        env.payload_mut().copy_from_slice(b"twelve bytes");
        assert_eq!(env.text(), "twelve bytes");
    }

    #[test]
    fn test_empty_payload() {
        let env = Envelope::new(
            MessageKind::LobbyExit,
            PlayerId::HOST,
            PlayerId::SERVER,
            Module::Core,
            Vec::new(),
        );
        assert_eq!(env.payload_len(), 0);
        assert_eq!(env.text(), "");
    }
}
