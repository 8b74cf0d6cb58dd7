use galaxis_protocol::ProtocolError;

/// Errors that can occur in the transport layer.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Reading from or writing to the underlying stream failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// An incoming header was malformed. The stream is out of sync and
    /// must be closed.
    #[error("framing error: {0}")]
    Protocol(#[from] ProtocolError),

    /// An outgoing envelope is larger than this connection may send.
    /// Nothing was written.
    #[error("payload of {len} bytes exceeds the {max} byte frame limit")]
    PayloadTooLarge { len: usize, max: usize },

    /// The peer closed the stream in the middle of a frame.
    #[error("connection closed mid-frame ({buffered} bytes buffered)")]
    Closed { buffered: usize },

    /// Binding or accepting connections failed.
    #[error("accept failed: {0}")]
    AcceptFailed(#[source] std::io::Error),
}

impl TransportError {
    /// Returns `true` if the connection can no longer be used.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::PayloadTooLarge { .. })
    }
}
