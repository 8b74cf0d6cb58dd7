//! Identity types and the closed message taxonomy.
//!
//! Everything in here has a pinned numeric wire value. The numbers are
//! part of the compatibility contract between client and server builds,
//! so variants are only ever appended, never renumbered.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::HeaderFault;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A player id as it appears in the sender/receiver header fields.
///
/// Ids are handed out by the session manager when a player connects.
/// Two values are reserved:
///
/// - [`PlayerId::SERVER`] (`-1`): the server itself, or "unknown" when a
///   client has not been assigned an id yet. As a receiver it also means
///   "broadcast / let the server decide".
/// - [`PlayerId::HOST`] (`0`): the hosting player.
///
/// `#[serde(transparent)]` keeps it a bare integer inside payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub i32);

impl PlayerId {
    /// The server, or an id that is not known yet.
    pub const SERVER: PlayerId = PlayerId(-1);

    /// The player hosting the game.
    pub const HOST: PlayerId = PlayerId(0);

    /// Returns `true` for the server/unknown sentinel.
    pub fn is_server(self) -> bool {
        self == Self::SERVER
    }

    /// Returns `true` for the host sentinel.
    pub fn is_host(self) -> bool {
        self == Self::HOST
    }

    /// Annotation used by diagnostics next to the raw number.
    pub fn annotation(self) -> &'static str {
        match self {
            Self::SERVER => "(server/unknown)",
            Self::HOST => "(host)",
            _ => "",
        }
    }
}

/// Renders the raw id followed by the sentinel annotation, if any:
/// `-1(server/unknown)`, `0(host)`, `3`.
impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.0, self.annotation())
    }
}

impl From<i32> for PlayerId {
    fn from(id: i32) -> Self {
        Self(id)
    }
}

/// An empire id. Used as the encoding viewpoint for galaxy snapshots:
/// the empire a snapshot is being filtered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmpireId(pub i32);

impl fmt::Display for EmpireId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// MessageKind
// ---------------------------------------------------------------------------

/// Declares the closed kind enum together with its wire numbers and
/// canonical names, so the three can never drift apart.
macro_rules! message_kinds {
    ($( $(#[$doc:meta])* $variant:ident = $wire:literal => $name:literal, )+) => {
        /// What a message is, and therefore how its payload is shaped.
        ///
        /// Wire value `0` is unused. It was the "undefined"
        /// placeholder of older builds and is rejected on decode.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(i32)]
        pub enum MessageKind {
            $( $(#[$doc])* $variant = $wire, )+
        }

        impl MessageKind {
            /// Every kind, in wire order.
            pub const ALL: &'static [MessageKind] = &[$(MessageKind::$variant,)+];

            /// The canonical SCREAMING_SNAKE name used in logs.
            pub fn as_str(self) -> &'static str {
                match self {
                    $( MessageKind::$variant => $name, )+
                }
            }
        }

        impl TryFrom<i32> for MessageKind {
            type Error = HeaderFault;

            fn try_from(value: i32) -> Result<Self, Self::Error> {
                match value {
                    $( $wire => Ok(MessageKind::$variant), )+
                    other => Err(HeaderFault::UnknownKind(other)),
                }
            }
        }
    };
}

message_kinds! {
    /// Free-form diagnostic text.
    Debug = 1 => "DEBUG",
    /// The server is about to shut down.
    ServerDying = 2 => "SERVER_DYING",
    /// Host a single-player game (request carries setup data, reply is an ack).
    HostSinglePlayerGame = 3 => "HOST_SP_GAME",
    /// Host a multiplayer game (request carries the host's name).
    HostMultiplayerGame = 4 => "HOST_MP_GAME",
    /// Join a hosted game (request carries the name, reply the new id).
    JoinGame = 5 => "JOIN_GAME",
    /// Multiplayer lobby settings changed.
    LobbyUpdate = 6 => "LOBBY_UPDATE",
    /// Chat line sent while in the lobby.
    LobbyChat = 7 => "LOBBY_CHAT",
    /// The host closed the lobby.
    LobbyHostAbort = 8 => "LOBBY_HOST_ABORT",
    /// A player left the lobby.
    LobbyExit = 9 => "LOBBY_EXIT",
    /// The host asks the server to start the multiplayer game.
    StartMultiplayerGame = 10 => "START_MP_GAME",
    /// Save request / save progress.
    SaveGame = 11 => "SAVE_GAME",
    /// Load request / restored per-player data.
    LoadGame = 12 => "LOAD_GAME",
    /// Initial galaxy snapshot for one player.
    GameStart = 13 => "GAME_START",
    /// Post-turn galaxy snapshot for one player.
    TurnUpdate = 14 => "TURN_UPDATE",
    /// A player's orders for the current turn.
    TurnOrders = 15 => "TURN_ORDERS",
    /// Server-side turn processing progress.
    TurnProgress = 16 => "TURN_PROGRESS",
    /// Per-client state the server needs to write a save file.
    ClientSaveData = 17 => "CLIENT_SAVE_DATA",
    /// Combat began; payload is opaque to the protocol.
    CombatStart = 18 => "COMBAT_START",
    /// One combat round resolved; payload is opaque to the protocol.
    CombatRoundUpdate = 19 => "COMBAT_ROUND_UPDATE",
    /// Combat finished; payload is opaque to the protocol.
    CombatEnd = 20 => "COMBAT_END",
    /// In-game chat between players.
    HumanPlayerChat = 21 => "HUMAN_PLAYER_CHAT",
    /// An empire was eliminated.
    PlayerEliminated = 22 => "PLAYER_ELIMINATED",
    /// A player disconnected.
    PlayerExit = 23 => "PLAYER_EXIT",
    /// A client needs a fresh object id.
    RequestNewObjectId = 24 => "REQUEST_NEW_OBJECT_ID",
    /// The server answers with a fresh object id.
    DispatchNewObjectId = 25 => "DISPATCH_NEW_OBJECT_ID",
    /// The game is over for the receiver.
    EndGame = 26 => "END_GAME",
    /// The server changed a player's name (e.g. to resolve a clash).
    RenamePlayer = 27 => "RENAME_PLAYER",
}

impl MessageKind {
    /// The numeric value written into the header.
    pub fn wire(self) -> i32 {
        self as i32
    }

    /// Returns `true` for the three combat reporting kinds.
    pub fn is_combat(self) -> bool {
        matches!(
            self,
            Self::CombatStart | Self::CombatRoundUpdate | Self::CombatEnd
        )
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Module
// ---------------------------------------------------------------------------

/// Which subsystem on the receiving side should handle a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(i32)]
pub enum Module {
    /// The main dispatcher.
    #[default]
    Core = 0,
    /// The client's multiplayer lobby screen.
    ClientLobby = 1,
    /// The client's combat view.
    ClientCombat = 2,
    /// A client call blocked waiting for this exact answer.
    ClientSynchronousResponse = 3,
}

impl Module {
    /// Every module, in wire order.
    pub const ALL: &'static [Module] = &[
        Module::Core,
        Module::ClientLobby,
        Module::ClientCombat,
        Module::ClientSynchronousResponse,
    ];

    /// The numeric value written into the header.
    pub fn wire(self) -> i32 {
        self as i32
    }

    /// The canonical name used in logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Core => "CORE",
            Self::ClientLobby => "CLIENT_LOBBY_MODULE",
            Self::ClientCombat => "CLIENT_COMBAT_MODULE",
            Self::ClientSynchronousResponse => "CLIENT_SYNCHRONOUS_RESPONSE",
        }
    }
}

impl TryFrom<i32> for Module {
    type Error = HeaderFault;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Core),
            1 => Ok(Self::ClientLobby),
            2 => Ok(Self::ClientCombat),
            3 => Ok(Self::ClientSynchronousResponse),
            other => Err(HeaderFault::UnknownModule(other)),
        }
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// TurnProgressPhase
// ---------------------------------------------------------------------------

/// What the server is doing while a turn is being processed.
///
/// Carried inside `TURN_PROGRESS` payloads, so unlike the header enums it
/// travels through the payload codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TurnProgressPhase {
    FleetMovement,
    Combat,
    EmpireProduction,
    WaitingForPlayers,
    ProcessingOrders,
    Downloading,
}

impl fmt::Display for TurnProgressPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::FleetMovement => "FLEET_MOVEMENT",
            Self::Combat => "COMBAT",
            Self::EmpireProduction => "EMPIRE_PRODUCTION",
            Self::WaitingForPlayers => "WAITING_FOR_PLAYERS",
            Self::ProcessingOrders => "PROCESSING_ORDERS",
            Self::Downloading => "DOWNLOADING",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // =====================================================================
    // PlayerId
    // =====================================================================

    #[test]
    fn test_player_id_sentinels() {
        assert!(PlayerId::SERVER.is_server());
        assert!(PlayerId::HOST.is_host());
        assert!(!PlayerId(3).is_server());
        assert!(!PlayerId(3).is_host());
    }

    #[test]
    fn test_player_id_display_annotates_sentinels() {
        assert_eq!(PlayerId(-1).to_string(), "-1(server/unknown)");
        assert_eq!(PlayerId(0).to_string(), "0(host)");
        assert_eq!(PlayerId(7).to_string(), "7");
    }

    #[test]
    fn test_player_id_serializes_as_plain_number() {
        let json = serde_json::to_string(&PlayerId(42)).unwrap();
        assert_eq!(json, "42");
    }

    // =====================================================================
    // MessageKind
    // =====================================================================

    #[test]
    fn test_every_kind_survives_its_wire_value() {
        for &kind in MessageKind::ALL {
            assert_eq!(MessageKind::try_from(kind.wire()), Ok(kind));
        }
    }

    #[test]
    fn test_wire_values_are_dense_from_one() {
        let wires: Vec<i32> = MessageKind::ALL.iter().map(|k| k.wire()).collect();
        let expected: Vec<i32> = (1..=MessageKind::ALL.len() as i32).collect();
        assert_eq!(wires, expected);
    }

    #[test]
    fn test_out_of_range_kind_is_rejected() {
        assert_eq!(MessageKind::try_from(0), Err(HeaderFault::UnknownKind(0)));
        assert_eq!(MessageKind::try_from(-5), Err(HeaderFault::UnknownKind(-5)));
        assert_eq!(
            MessageKind::try_from(1000),
            Err(HeaderFault::UnknownKind(1000))
        );
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(MessageKind::HumanPlayerChat.to_string(), "HUMAN_PLAYER_CHAT");
        assert_eq!(MessageKind::HostSinglePlayerGame.as_str(), "HOST_SP_GAME");
        assert_eq!(
            MessageKind::DispatchNewObjectId.as_str(),
            "DISPATCH_NEW_OBJECT_ID"
        );
    }

    #[test]
    fn test_combat_kinds() {
        let combat: Vec<_> = MessageKind::ALL
            .iter()
            .copied()
            .filter(|k| k.is_combat())
            .collect();
        assert_eq!(
            combat,
            vec![
                MessageKind::CombatStart,
                MessageKind::CombatRoundUpdate,
                MessageKind::CombatEnd
            ]
        );
    }

    // =====================================================================
    // Module
    // =====================================================================

    #[test]
    fn test_every_module_survives_its_wire_value() {
        for &module in Module::ALL {
            assert_eq!(Module::try_from(module.wire()), Ok(module));
        }
        assert_eq!(Module::try_from(4), Err(HeaderFault::UnknownModule(4)));
        assert_eq!(Module::try_from(-1), Err(HeaderFault::UnknownModule(-1)));
    }

    #[test]
    fn test_module_default_is_core() {
        assert_eq!(Module::default(), Module::Core);
        assert_eq!(Module::ClientLobby.to_string(), "CLIENT_LOBBY_MODULE");
    }

    #[test]
    fn test_turn_progress_phase_display() {
        assert_eq!(
            TurnProgressPhase::WaitingForPlayers.to_string(),
            "WAITING_FOR_PLAYERS"
        );
    }
}
