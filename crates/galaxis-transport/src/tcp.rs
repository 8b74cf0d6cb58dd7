//! TCP listener and client for framed envelope connections.

use std::net::SocketAddr;

use galaxis_protocol::ProtocolLimits;
use tokio::net::{TcpListener, TcpStream, ToSocketAddrs};

use crate::{FramedConnection, Result, Transport, TransportError};

/// A framed connection over TCP.
pub type TcpConnection = FramedConnection<TcpStream>;

/// Listens for clients and hands out one [`TcpConnection`] per accept.
#[derive(Debug)]
pub struct FramedListener {
    listener: TcpListener,
    limits: ProtocolLimits,
}

impl FramedListener {
    /// Binds to `addr`. Every accepted connection enforces `limits`.
    pub async fn bind(addr: impl ToSocketAddrs, limits: ProtocolLimits) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(TransportError::AcceptFailed)?;
        if let Ok(local) = listener.local_addr() {
            tracing::info!(%local, "framed transport listening");
        }
        Ok(Self { listener, limits })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Waits for the next client.
    pub async fn accept(&mut self) -> Result<(TcpConnection, SocketAddr)> {
        let (stream, peer) = self
            .listener
            .accept()
            .await
            .map_err(TransportError::AcceptFailed)?;
        // Turn messages are small and latency matters more than batching.
        stream.set_nodelay(true)?;
        let conn = FramedConnection::new(stream, self.limits.clone());
        tracing::debug!(id = %conn.id(), %peer, "accepted connection");
        Ok((conn, peer))
    }
}

impl Transport for FramedListener {
    type Connection = TcpConnection;

    async fn accept(&mut self) -> Result<Self::Connection> {
        FramedListener::accept(self).await.map(|(conn, _)| conn)
    }
}

/// Connects to a server at `addr`.
pub async fn connect(addr: impl ToSocketAddrs, limits: ProtocolLimits) -> Result<TcpConnection> {
    let stream = TcpStream::connect(addr).await?;
    stream.set_nodelay(true)?;
    let conn = FramedConnection::new(stream, limits);
    tracing::debug!(id = %conn.id(), "connected");
    Ok(conn)
}
