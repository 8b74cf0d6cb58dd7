//! Per-connection handler: receive, dispatch, deliver replies.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Receive an envelope (optionally under the idle timeout)
//!   2. Dispatch it as the player the connection is bound to
//!   3. Bind the connection when a reply assigns it a player id
//!   4. Send each reply to the connection of its receiver

use std::sync::Arc;

use galaxis_protocol::{Envelope, MessageKind, PlayerId, build, extract};
use galaxis_transport::{ConnectionId, TcpConnection};

use crate::GalaxisError;
use crate::dispatch::Outcome;
use crate::server::ServerState;

/// Drop guard that unregisters a player when the handler exits.
///
/// Normal exits call [`release`](Self::release), which unregisters before
/// the connection is closed. If the task is aborted instead, `Drop` spawns
/// the removal. Either way the entry is only removed if it still belongs
/// to this connection.
struct PeerGuard {
    player: PlayerId,
    conn_id: ConnectionId,
    state: Option<Arc<ServerState>>,
}

impl PeerGuard {
    async fn release(mut self) {
        if let Some(state) = self.state.take() {
            unregister(&state, self.player, self.conn_id).await;
        }
    }
}

impl Drop for PeerGuard {
    fn drop(&mut self) {
        if let Some(state) = self.state.take() {
            let (player, conn_id) = (self.player, self.conn_id);
            tokio::spawn(async move { unregister(&state, player, conn_id).await });
        }
    }
}

async fn unregister(state: &ServerState, player: PlayerId, conn_id: ConnectionId) {
    let mut peers = state.peers.lock().await;
    if peers.get(&player).is_some_and(|c| c.id() == conn_id) {
        peers.remove(&player);
        tracing::info!(%player, %conn_id, "player disconnected");
    }
}

/// Handles a single connection from accept to close.
///
/// The player binding is released before the stream is shut down, so a
/// client that sees the close can rejoin under the same id at once.
pub(crate) async fn handle_connection(
    conn: Arc<TcpConnection>,
    state: Arc<ServerState>,
) -> Result<(), GalaxisError> {
    let conn_id = conn.id();
    tracing::debug!(%conn_id, "handling new connection");

    let mut binding: Option<PeerGuard> = None;
    let result = serve(&conn, &state, &mut binding).await;

    if let Some(guard) = binding.take() {
        guard.release().await;
    }
    if let Err(GalaxisError::PlayerIdTaken(player)) = &result {
        // The client never got its ack; tell it the game is over for it.
        let refusal = build::end_game(PlayerId::SERVER, PlayerId::SERVER);
        if let Err(e) = conn.send(&refusal).await {
            tracing::debug!(%conn_id, %player, error = %e, "could not send refusal");
        }
    }
    if let Err(e) = conn.close().await {
        tracing::debug!(%conn_id, error = %e, "close failed");
    }
    result
}

/// The receive/dispatch/deliver loop. Returns when the peer closes, goes
/// idle for too long, or breaks the protocol.
async fn serve(
    conn: &Arc<TcpConnection>,
    state: &Arc<ServerState>,
    binding: &mut Option<PeerGuard>,
) -> Result<(), GalaxisError> {
    let conn_id = conn.id();
    let mut origin = PlayerId::SERVER;

    loop {
        let received = match state.idle_timeout {
            Some(limit) => match tokio::time::timeout(limit, conn.recv()).await {
                Ok(result) => result,
                Err(_) => {
                    tracing::info!(%conn_id, player = %origin, "connection timed out");
                    return Ok(());
                }
            },
            None => conn.recv().await,
        };

        let envelope = match received {
            Ok(Some(envelope)) => envelope,
            Ok(None) => {
                tracing::info!(%conn_id, player = %origin, "connection closed cleanly");
                return Ok(());
            }
            Err(e) => {
                tracing::warn!(%conn_id, player = %origin, error = %e, "closing connection");
                return Err(e.into());
            }
        };

        let replies = match state.dispatcher.dispatch(origin, envelope)? {
            Outcome::Replies(replies) => replies,
            Outcome::Dropped(_) => continue,
        };

        for reply in replies {
            if origin.is_server() {
                if let Some(player) = assigned_player(&reply) {
                    *binding = Some(bind_player(state, conn, player).await?);
                    origin = player;
                    tracing::info!(%conn_id, %player, "player joined");
                }
            }
            deliver(state, conn, origin, &reply).await?;
        }
    }
}

/// The player id a server reply hands to a connection that has none yet:
/// a join acknowledgement, or the acknowledgement of a host request.
fn assigned_player(reply: &Envelope) -> Option<PlayerId> {
    if !reply.sender().is_server() {
        return None;
    }
    match reply.kind() {
        MessageKind::JoinGame => extract::joined_player_id(reply).ok(),
        MessageKind::HostSinglePlayerGame | MessageKind::HostMultiplayerGame => {
            extract::is_ack(reply)
                .ok()
                .filter(|ack| *ack)
                .map(|_| reply.receiver())
        }
        _ => None,
    }
}

async fn bind_player(
    state: &Arc<ServerState>,
    conn: &Arc<TcpConnection>,
    player: PlayerId,
) -> Result<PeerGuard, GalaxisError> {
    let mut peers = state.peers.lock().await;
    if peers.contains_key(&player) {
        return Err(GalaxisError::PlayerIdTaken(player));
    }
    peers.insert(player, Arc::clone(conn));
    Ok(PeerGuard {
        player,
        conn_id: conn.id(),
        state: Some(Arc::clone(state)),
    })
}

/// Sends `reply` to its receiver.
///
/// Replies to this connection's own player (or, before it has joined, to
/// the server sentinel) go straight back on `conn`. Anything else is
/// looked up among the joined players; a failure there is that player's
/// problem and does not end this connection.
async fn deliver(
    state: &ServerState,
    conn: &TcpConnection,
    origin: PlayerId,
    reply: &Envelope,
) -> Result<(), GalaxisError> {
    let receiver = reply.receiver();

    if receiver == origin {
        return match conn.send(reply).await {
            Err(e) if !e.is_fatal() => {
                tracing::warn!(%receiver, kind = %reply.kind(), error = %e, "reply not sent");
                Ok(())
            }
            result => result.map_err(Into::into),
        };
    }

    let Some(peer) = state.peer(receiver).await else {
        tracing::warn!(%receiver, kind = %reply.kind(), "no connection for receiver, dropping reply");
        return Ok(());
    };
    if let Err(e) = peer.send(reply).await {
        tracing::warn!(%receiver, kind = %reply.kind(), error = %e, "forwarding failed");
    }
    Ok(())
}
