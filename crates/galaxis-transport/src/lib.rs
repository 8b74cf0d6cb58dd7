//! Envelope transport for Galaxis.
//!
//! Frames [`Envelope`]s on a reliable byte stream as
//!
//! ```text
//! [ 20-byte header: kind, sender, receiver, module, payload_len ][ payload ]
//! ```
//!
//! and provides the [`Transport`] and [`Connection`] traits the server is
//! written against. [`FramedConnection`] works over any tokio
//! `AsyncRead + AsyncWrite` stream; the `tcp` feature (on by default)
//! adds [`FramedListener`] and [`connect`].

#![allow(async_fn_in_trait)]

mod error;
mod framed;
#[cfg(feature = "tcp")]
mod tcp;

pub use error::TransportError;
pub use framed::FramedConnection;
#[cfg(feature = "tcp")]
pub use tcp::{FramedListener, TcpConnection, connect};

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use galaxis_protocol::Envelope;

/// Result alias for transport operations.
pub type Result<T> = std::result::Result<T, TransportError>;

/// Process-unique handle for one accepted or dialed stream.
///
/// A [`PlayerId`](galaxis_protocol::PlayerId) only exists once a client
/// has joined; this id exists from the first byte, so logs can follow a
/// connection through its handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

static LAST_CONNECTION: AtomicU64 = AtomicU64::new(0);

impl ConnectionId {
    pub(crate) fn next() -> Self {
        Self(LAST_CONNECTION.fetch_add(1, Ordering::Relaxed) + 1)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Server side of a transport: a source of new connections.
pub trait Transport: Send + Sync + 'static {
    type Connection: Connection;

    /// Resolves once a client has connected.
    async fn accept(&mut self) -> Result<Self::Connection>;
}

/// One peer, exchanging whole envelopes.
///
/// Every method takes `&self`: one task may sit in
/// [`recv`](Connection::recv) while others send on the same connection.
pub trait Connection: Send + Sync + 'static {
    /// Writes one envelope as a frame and flushes it.
    async fn send(&self, envelope: &Envelope) -> Result<()>;

    /// Reads the next complete envelope.
    ///
    /// Returns `Ok(None)` when the peer closed the stream cleanly between
    /// frames.
    async fn recv(&self) -> Result<Option<Envelope>>;

    /// Shuts down the write side of the connection.
    async fn close(&self) -> Result<()>;

    fn id(&self) -> ConnectionId;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_ids_increase() {
        let a = ConnectionId::next();
        let b = ConnectionId::next();
        assert!(b > a);
        assert!(a.get() >= 1);
    }

    #[test]
    fn test_connection_id_display() {
        assert_eq!(ConnectionId(7).to_string(), "conn-7");
    }
}
