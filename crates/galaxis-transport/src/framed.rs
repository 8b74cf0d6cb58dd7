//! Header-then-payload framing over an async byte stream.

use std::fmt;

use bytes::{Buf, BytesMut};
use galaxis_protocol::{Envelope, HEADER_LEN, Header, ProtocolLimits};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, ReadHalf, WriteHalf};
use tokio::sync::Mutex;

use crate::{Connection, ConnectionId, Result, TransportError};

const INITIAL_READ_CAPACITY: usize = 8 * 1024;

struct Reader<S> {
    half: ReadHalf<S>,
    buf: BytesMut,
}

/// An envelope connection over any tokio byte stream.
///
/// The read and write halves are locked separately, so a pending
/// [`recv`](Self::recv) never blocks a [`send`](Self::send).
///
/// `recv` is cancel-safe: bytes read before a cancellation stay buffered
/// and the next call picks up where the last one stopped. `send` is not;
/// a cancelled send may leave half a frame on the wire.
pub struct FramedConnection<S> {
    id: ConnectionId,
    limits: ProtocolLimits,
    reader: Mutex<Reader<S>>,
    writer: Mutex<WriteHalf<S>>,
}

impl<S> FramedConnection<S>
where
    S: AsyncRead + AsyncWrite,
{
    /// Wraps `stream`. Incoming headers are checked against `limits`
    /// before any payload memory is reserved.
    pub fn new(stream: S, limits: ProtocolLimits) -> Self {
        let (read, write) = tokio::io::split(stream);
        Self {
            id: ConnectionId::next(),
            limits,
            reader: Mutex::new(Reader {
                half: read,
                buf: BytesMut::with_capacity(INITIAL_READ_CAPACITY),
            }),
            writer: Mutex::new(write),
        }
    }

    pub fn limits(&self) -> &ProtocolLimits {
        &self.limits
    }

    /// Writes `envelope` as one frame and flushes the stream.
    ///
    /// Envelopes larger than the connection's own limit are refused with
    /// [`TransportError::PayloadTooLarge`] before anything is written, so
    /// this end never emits a frame it would reject itself.
    pub async fn send(&self, envelope: &Envelope) -> Result<()> {
        let len = envelope.payload_len();
        if len > self.limits.max_payload_len {
            return Err(TransportError::PayloadTooLarge {
                len,
                max: self.limits.max_payload_len,
            });
        }
        let header = Header::of(envelope)
            .to_bytes()
            .map_err(|_| TransportError::PayloadTooLarge {
                len,
                max: i32::MAX as usize,
            })?;

        let mut writer = self.writer.lock().await;
        writer.write_all(&header).await?;
        writer.write_all(envelope.payload()).await?;
        writer.flush().await?;

        tracing::debug!(
            conn = %self.id,
            kind = %envelope.kind(),
            receiver = %envelope.receiver(),
            len,
            "sent envelope"
        );
        Ok(())
    }

    /// Reads the next envelope.
    ///
    /// Returns `Ok(None)` on a clean close between frames. A close in the
    /// middle of a frame is [`TransportError::Closed`]; a malformed header
    /// is [`TransportError::Protocol`]. After either error the stream is
    /// out of sync and the connection should be dropped.
    pub async fn recv(&self) -> Result<Option<Envelope>> {
        let mut reader = self.reader.lock().await;
        let Reader { half, buf } = &mut *reader;

        loop {
            match parse_frame(buf, &self.limits) {
                Ok(Some(envelope)) => {
                    tracing::debug!(
                        conn = %self.id,
                        kind = %envelope.kind(),
                        sender = %envelope.sender(),
                        len = envelope.payload_len(),
                        "received envelope"
                    );
                    return Ok(Some(envelope));
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(conn = %self.id, error = %e, "malformed frame header");
                    return Err(e);
                }
            }

            if half.read_buf(buf).await? == 0 {
                if buf.is_empty() {
                    tracing::trace!(conn = %self.id, "peer closed between frames");
                    return Ok(None);
                }
                return Err(TransportError::Closed {
                    buffered: buf.len(),
                });
            }
        }
    }

    /// Shuts down the write half. The peer sees a clean close once it has
    /// read every frame sent before this.
    pub async fn close(&self) -> Result<()> {
        self.writer.lock().await.shutdown().await?;
        Ok(())
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Returns the underlying stream. Bytes already read but not yet
    /// returned as an envelope are discarded.
    pub fn into_inner(self) -> S
    where
        S: Unpin,
    {
        let reader = self.reader.into_inner();
        reader.half.unsplit(self.writer.into_inner())
    }
}

/// Splits one complete frame off the front of `buf`.
///
/// The header is validated as soon as its 20 bytes are present, which is
/// what keeps a hostile length from growing the buffer.
fn parse_frame(buf: &mut BytesMut, limits: &ProtocolLimits) -> Result<Option<Envelope>> {
    if buf.len() < HEADER_LEN {
        return Ok(None);
    }
    let header = Header::from_bytes(&buf[..HEADER_LEN], limits)?;

    let frame_len = HEADER_LEN + header.payload_len;
    if buf.len() < frame_len {
        buf.reserve(frame_len - buf.len());
        return Ok(None);
    }

    buf.advance(HEADER_LEN);
    let payload = buf.split_to(header.payload_len);
    let mut envelope = Envelope::from_header(&header);
    envelope.payload_mut().copy_from_slice(&payload);
    Ok(Some(envelope))
}

impl<S> Connection for FramedConnection<S>
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    async fn send(&self, envelope: &Envelope) -> Result<()> {
        FramedConnection::send(self, envelope).await
    }

    async fn recv(&self) -> Result<Option<Envelope>> {
        FramedConnection::recv(self).await
    }

    async fn close(&self) -> Result<()> {
        FramedConnection::close(self).await
    }

    fn id(&self) -> ConnectionId {
        self.id
    }
}

impl<S> fmt::Debug for FramedConnection<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FramedConnection")
            .field("id", &self.id)
            .field("limits", &self.limits)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use galaxis_protocol::{HeaderFault, ProtocolError, build, PlayerId};

    fn frame(envelope: &Envelope) -> Vec<u8> {
        let mut bytes = Header::of(envelope).to_bytes().unwrap().to_vec();
        bytes.extend_from_slice(envelope.payload());
        bytes
    }

    #[test]
    fn test_parse_waits_for_full_header() {
        let bytes = frame(&build::chat(PlayerId(1), "hi"));
        let mut buf = BytesMut::from(&bytes[..HEADER_LEN - 1]);
        assert!(parse_frame(&mut buf, &ProtocolLimits::default()).unwrap().is_none());
        assert_eq!(buf.len(), HEADER_LEN - 1);
    }

    #[test]
    fn test_parse_reserves_for_announced_payload() {
        let env = build::debug(PlayerId(1), PlayerId(2), &"z".repeat(100));
        let bytes = frame(&env);
        let mut buf = BytesMut::from(&bytes[..HEADER_LEN + 10]);
        assert!(parse_frame(&mut buf, &ProtocolLimits::default()).unwrap().is_none());
        assert!(buf.capacity() >= HEADER_LEN + 100);
    }

    #[test]
    fn test_parse_splits_back_to_back_frames() {
        let first = build::chat(PlayerId(1), "one");
        let second = build::request_new_object_id(PlayerId(2));
        let mut buf = BytesMut::from(&frame(&first)[..]);
        buf.extend_from_slice(&frame(&second));

        let limits = ProtocolLimits::default();
        assert_eq!(parse_frame(&mut buf, &limits).unwrap(), Some(first));
        assert_eq!(parse_frame(&mut buf, &limits).unwrap(), Some(second));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_parse_rejects_oversized_header_without_reserving() {
        let limits = ProtocolLimits {
            max_payload_len: 16,
            ..ProtocolLimits::default()
        };
        let mut bytes = frame(&build::chat(PlayerId(1), ""));
        bytes[16..20].copy_from_slice(&1_000_000i32.to_be_bytes());
        let mut buf = BytesMut::from(&bytes[..]);
        let before = buf.capacity();

        let err = parse_frame(&mut buf, &limits).unwrap_err();
        assert!(matches!(
            err,
            TransportError::Protocol(ProtocolError::HeaderMalformed(
                HeaderFault::LengthExceedsLimit { len: 1_000_000, max: 16 }
            ))
        ));
        assert_eq!(buf.capacity(), before);
    }
}
