//! Which sender may send which kind.
//!
//! The protocol crate only describes messages; deciding whether a
//! particular client is allowed to send one is the server's job. A
//! [`SenderPolicy`] runs before any handler sees the envelope.

use galaxis_protocol::{Envelope, MessageKind, PlayerId};

/// Which way a message kind travels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Only clients send it.
    ToServer,
    /// Only the server sends it.
    FromServer,
    /// Clients send a request; the server answers with the same kind.
    Both,
}

impl Direction {
    pub fn of(kind: MessageKind) -> Self {
        use MessageKind::*;
        match kind {
            StartMultiplayerGame | TurnOrders | ClientSaveData | RequestNewObjectId => {
                Self::ToServer
            }
            ServerDying | GameStart | TurnUpdate | TurnProgress | CombatStart
            | CombatRoundUpdate | CombatEnd | PlayerEliminated | PlayerExit
            | DispatchNewObjectId | RenamePlayer => Self::FromServer,
            Debug | HostSinglePlayerGame | HostMultiplayerGame | JoinGame | LobbyUpdate
            | LobbyChat | LobbyHostAbort | LobbyExit | SaveGame | LoadGame
            | HumanPlayerChat | EndGame => Self::Both,
        }
    }

    pub fn client_may_send(self) -> bool {
        !matches!(self, Self::FromServer)
    }
}

/// Kinds a client may send before it has been assigned a player id.
pub fn allowed_before_join(kind: MessageKind) -> bool {
    matches!(
        kind,
        MessageKind::HostSinglePlayerGame | MessageKind::HostMultiplayerGame | MessageKind::JoinGame
    )
}

/// Kinds only the host may send.
pub fn host_only(kind: MessageKind) -> bool {
    matches!(
        kind,
        MessageKind::LobbyHostAbort
            | MessageKind::StartMultiplayerGame
            | MessageKind::SaveGame
            | MessageKind::LoadGame
    )
}

/// Kinds whose client form is always addressed to the server.
///
/// Chat, debug text and `END_GAME` may name another player as receiver.
pub fn addressed_to_server(kind: MessageKind) -> bool {
    !matches!(
        kind,
        MessageKind::LobbyChat
            | MessageKind::HumanPlayerChat
            | MessageKind::Debug
            | MessageKind::EndGame
    )
}

/// Why a policy refused an envelope.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PolicyViolation {
    #[error("clients may not send {0}")]
    ServerOnly(MessageKind),

    #[error("envelope claims sender {claimed} on a connection bound to {actual}")]
    SpoofedSender { claimed: PlayerId, actual: PlayerId },

    #[error("{0} requires a joined player")]
    NotJoined(MessageKind),

    #[error("only the host may send {kind} (sender {sender})")]
    HostOnly { kind: MessageKind, sender: PlayerId },

    #[error("{kind} must be addressed to the server, not {receiver}")]
    Misaddressed { kind: MessageKind, receiver: PlayerId },
}

/// Decides whether the connection bound to `origin` may deliver
/// `envelope`.
///
/// `origin` is [`PlayerId::SERVER`] until the connection has been
/// assigned an id.
pub trait SenderPolicy: Send + Sync + 'static {
    fn check(&self, origin: PlayerId, envelope: &Envelope) -> Result<(), PolicyViolation>;
}

/// The server's default policy.
///
/// - only kinds whose [`Direction`] allows clients to send them
/// - the envelope's sender must be the connection's own id
/// - before joining, only host and join requests
/// - lobby aborts, game start, save and load from the host only
/// - requests addressed to the server where the kind demands it
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectionPolicy;

impl SenderPolicy for DirectionPolicy {
    fn check(&self, origin: PlayerId, envelope: &Envelope) -> Result<(), PolicyViolation> {
        let kind = envelope.kind();
        if !Direction::of(kind).client_may_send() {
            return Err(PolicyViolation::ServerOnly(kind));
        }
        if envelope.sender() != origin {
            return Err(PolicyViolation::SpoofedSender {
                claimed: envelope.sender(),
                actual: origin,
            });
        }
        if origin.is_server() && !allowed_before_join(kind) {
            return Err(PolicyViolation::NotJoined(kind));
        }
        if host_only(kind) && !origin.is_host() {
            return Err(PolicyViolation::HostOnly {
                kind,
                sender: origin,
            });
        }
        if addressed_to_server(kind) && !envelope.receiver().is_server() {
            return Err(PolicyViolation::Misaddressed {
                kind,
                receiver: envelope.receiver(),
            });
        }
        Ok(())
    }
}

/// Accepts every envelope. Suitable for the client side, where the only
/// peer is the server.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl SenderPolicy for AllowAll {
    fn check(&self, _origin: PlayerId, _envelope: &Envelope) -> Result<(), PolicyViolation> {
        Ok(())
    }
}
