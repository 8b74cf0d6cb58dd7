//! Builders: one function per message.
//!
//! Naming follows the direction of travel. A plain name (`lobby_update`)
//! is the client → server form; a `server_` prefix marks the reply the
//! server sends out for the same kind. Where only one direction exists
//! the prefix is left off.
//!
//! Text payloads (names, chat lines, filenames, decimal ids) are copied
//! in as UTF-8 and cannot fail. Structured payloads go through a
//! [`Codec`] and return `Result`; a codec failure becomes
//! [`ProtocolError::PayloadEncode`] and no envelope is produced.

use serde::Serialize;

use crate::codec::Codec;
use crate::envelope::Envelope;
use crate::error::{ProtocolError, Result};
use crate::schema::{GameStart, Redact, SaveData, TurnProgress, TurnUpdate};
use crate::types::{EmpireId, MessageKind, Module, PlayerId, TurnProgressPhase};

/// Literal payload of acknowledgement replies.
pub const ACK: &str = "ACK";

/// Literal payload of an `END_GAME` that announces a win.
pub const VICTORY: &str = "VICTORY";

fn encoded<C: Codec, T: Serialize + ?Sized>(
    codec: &C,
    kind: MessageKind,
    value: &T,
) -> Result<Vec<u8>> {
    let bytes = codec
        .encode(value)
        .map_err(|source| ProtocolError::PayloadEncode { kind, source })?;
    tracing::trace!(%kind, len = bytes.len(), "encoded payload");
    Ok(bytes)
}

fn to_server(kind: MessageKind, sender: PlayerId, payload: impl Into<Vec<u8>>) -> Envelope {
    Envelope::new(kind, sender, PlayerId::SERVER, Module::Core, payload)
}

fn from_server(
    kind: MessageKind,
    receiver: PlayerId,
    module: Module,
    payload: impl Into<Vec<u8>>,
) -> Envelope {
    Envelope::new(kind, PlayerId::SERVER, receiver, module, payload)
}

// ---------------------------------------------------------------------------
// Session establishment
// ---------------------------------------------------------------------------

/// Asks the server to host a single-player game with `setup`.
pub fn host_sp_game<C: Codec, S: Serialize>(
    codec: &C,
    player: PlayerId,
    setup: &S,
) -> Result<Envelope> {
    let kind = MessageKind::HostSinglePlayerGame;
    let payload = encoded(codec, kind, setup)?;
    Ok(to_server(kind, player, payload))
}

/// Server acknowledges a single-player host request.
pub fn host_sp_ack(player: PlayerId) -> Envelope {
    from_server(MessageKind::HostSinglePlayerGame, player, Module::Core, ACK)
}

/// Asks the server to host a multiplayer game under `host_name`.
pub fn host_mp_game(player: PlayerId, host_name: &str) -> Envelope {
    to_server(MessageKind::HostMultiplayerGame, player, host_name)
}

/// Server acknowledges a multiplayer host request.
pub fn host_mp_ack(player: PlayerId) -> Envelope {
    from_server(MessageKind::HostMultiplayerGame, player, Module::Core, ACK)
}

/// Asks to join the hosted game. The client has no id yet, so both ends
/// of the routing are the server sentinel.
pub fn join_game(player_name: &str) -> Envelope {
    Envelope::new(
        MessageKind::JoinGame,
        PlayerId::SERVER,
        PlayerId::SERVER,
        Module::Core,
        player_name,
    )
}

/// Server accepts a join and tells the client its assigned id.
pub fn join_ack(player: PlayerId) -> Envelope {
    from_server(
        MessageKind::JoinGame,
        player,
        Module::Core,
        player.0.to_string(),
    )
}

/// Server renames a player, e.g. because the requested name was taken.
pub fn rename_player(player: PlayerId, new_name: &str) -> Envelope {
    from_server(MessageKind::RenamePlayer, player, Module::Core, new_name)
}

// ---------------------------------------------------------------------------
// Lobby
// ---------------------------------------------------------------------------

/// A client changed the lobby settings.
pub fn lobby_update<C: Codec, L: Serialize>(
    codec: &C,
    sender: PlayerId,
    lobby: &L,
) -> Result<Envelope> {
    let kind = MessageKind::LobbyUpdate;
    Ok(to_server(kind, sender, encoded(codec, kind, lobby)?))
}

/// Server pushes the current lobby settings to a client's lobby screen.
pub fn server_lobby_update<C: Codec, L: Serialize>(
    codec: &C,
    receiver: PlayerId,
    lobby: &L,
) -> Result<Envelope> {
    let kind = MessageKind::LobbyUpdate;
    let payload = encoded(codec, kind, lobby)?;
    Ok(from_server(kind, receiver, Module::ClientLobby, payload))
}

/// A lobby chat line from `sender` addressed to `receiver`.
pub fn lobby_chat(sender: PlayerId, receiver: PlayerId, text: &str) -> Envelope {
    Envelope::new(MessageKind::LobbyChat, sender, receiver, Module::Core, text)
}

/// Server forwards a lobby chat line, keeping the original sender.
pub fn server_lobby_chat(sender: PlayerId, receiver: PlayerId, text: &str) -> Envelope {
    Envelope::new(
        MessageKind::LobbyChat,
        sender,
        receiver,
        Module::ClientLobby,
        text,
    )
}

/// The host abandons the lobby.
pub fn lobby_host_abort(sender: PlayerId) -> Envelope {
    to_server(MessageKind::LobbyHostAbort, sender, Vec::new())
}

/// Server tells a client that the host abandoned the lobby.
pub fn server_lobby_host_abort(receiver: PlayerId) -> Envelope {
    from_server(
        MessageKind::LobbyHostAbort,
        receiver,
        Module::ClientLobby,
        Vec::new(),
    )
}

/// A client leaves the lobby.
pub fn lobby_exit(sender: PlayerId) -> Envelope {
    to_server(MessageKind::LobbyExit, sender, Vec::new())
}

/// Server tells `receiver` that `sender` left the lobby.
pub fn server_lobby_exit(sender: PlayerId, receiver: PlayerId) -> Envelope {
    Envelope::new(
        MessageKind::LobbyExit,
        sender,
        receiver,
        Module::ClientLobby,
        Vec::new(),
    )
}

/// The host starts the multiplayer game.
pub fn start_mp_game(player: PlayerId) -> Envelope {
    to_server(MessageKind::StartMultiplayerGame, player, Vec::new())
}

// ---------------------------------------------------------------------------
// Turn lifecycle
// ---------------------------------------------------------------------------

/// Sends the opening snapshot to `player`, redacted for `empire_id`.
pub fn game_start<C, E, U>(
    codec: &C,
    player: PlayerId,
    single_player: bool,
    empire_id: EmpireId,
    current_turn: i32,
    empires: &E,
    universe: &U,
) -> Result<Envelope>
where
    C: Codec,
    E: Redact + Serialize,
    U: Redact + Serialize,
{
    let kind = MessageKind::GameStart;
    tracing::debug!(%player, viewpoint = %empire_id, "encoding game start snapshot");
    let empires = empires.redact_for(empire_id);
    let universe = universe.redact_for(empire_id);
    let payload = encoded(
        codec,
        kind,
        &GameStart {
            single_player,
            empire_id,
            current_turn,
            empires: &*empires,
            universe: &*universe,
        },
    )?;
    Ok(from_server(kind, player, Module::Core, payload))
}

/// Sends the post-turn snapshot to `player`, redacted for `empire_id`.
pub fn turn_update<C, E, U>(
    codec: &C,
    player: PlayerId,
    empire_id: EmpireId,
    current_turn: i32,
    empires: &E,
    universe: &U,
) -> Result<Envelope>
where
    C: Codec,
    E: Redact + Serialize,
    U: Redact + Serialize,
{
    let kind = MessageKind::TurnUpdate;
    tracing::debug!(%player, viewpoint = %empire_id, current_turn, "encoding turn update snapshot");
    let empires = empires.redact_for(empire_id);
    let universe = universe.redact_for(empire_id);
    let payload = encoded(
        codec,
        kind,
        &TurnUpdate {
            empire_id,
            current_turn,
            empires: &*empires,
            universe: &*universe,
        },
    )?;
    Ok(from_server(kind, player, Module::Core, payload))
}

/// A player submits their orders for the turn.
pub fn turn_orders<C: Codec, O: Serialize + ?Sized>(
    codec: &C,
    sender: PlayerId,
    orders: &O,
) -> Result<Envelope> {
    let kind = MessageKind::TurnOrders;
    Ok(to_server(kind, sender, encoded(codec, kind, orders)?))
}

/// Server reports which phase of turn processing `empire_id` is in.
pub fn turn_progress<C: Codec>(
    codec: &C,
    player: PlayerId,
    phase: TurnProgressPhase,
    empire_id: EmpireId,
) -> Result<Envelope> {
    let kind = MessageKind::TurnProgress;
    let payload = encoded(codec, kind, &TurnProgress { phase, empire_id })?;
    Ok(from_server(kind, player, Module::Core, payload))
}

/// A client hands the server what it needs to write a save file.
pub fn client_save_data<C: Codec, O: Serialize, U: Serialize>(
    codec: &C,
    sender: PlayerId,
    orders: &O,
    ui_data: Option<&U>,
) -> Result<Envelope> {
    let kind = MessageKind::ClientSaveData;
    let payload = encoded(codec, kind, &SaveData { orders, ui_data })?;
    Ok(to_server(kind, sender, payload))
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

/// The host asks the server to save to `filename`.
pub fn host_save_game(sender: PlayerId, filename: &str) -> Envelope {
    to_server(MessageKind::SaveGame, sender, filename)
}

/// Server save notification. While saving it asks the client for its
/// save data on the core module; once `done`, it answers the client's
/// blocked save call on the synchronous-response module.
pub fn server_save_game(receiver: PlayerId, done: bool) -> Envelope {
    let module = if done {
        Module::ClientSynchronousResponse
    } else {
        Module::Core
    };
    from_server(MessageKind::SaveGame, receiver, module, Vec::new())
}

/// The host asks the server to load `filename`.
pub fn host_load_game(sender: PlayerId, filename: &str) -> Envelope {
    to_server(MessageKind::LoadGame, sender, filename)
}

/// Server returns the orders and UI state restored from a save file.
pub fn server_load_game<C: Codec, O: Serialize, U: Serialize>(
    codec: &C,
    receiver: PlayerId,
    orders: &O,
    ui_data: Option<&U>,
) -> Result<Envelope> {
    let kind = MessageKind::LoadGame;
    let payload = encoded(codec, kind, &SaveData { orders, ui_data })?;
    Ok(from_server(kind, receiver, Module::Core, payload))
}

// ---------------------------------------------------------------------------
// Combat reporting
// ---------------------------------------------------------------------------

fn combat(kind: MessageKind, receiver: PlayerId, report: &[u8]) -> Envelope {
    from_server(kind, receiver, Module::ClientCombat, report)
}

/// Combat began. `report` is passed through untouched.
pub fn combat_start(receiver: PlayerId, report: &[u8]) -> Envelope {
    combat(MessageKind::CombatStart, receiver, report)
}

/// A combat round resolved. `report` is passed through untouched.
pub fn combat_round_update(receiver: PlayerId, report: &[u8]) -> Envelope {
    combat(MessageKind::CombatRoundUpdate, receiver, report)
}

/// Combat finished. `report` is passed through untouched.
pub fn combat_end(receiver: PlayerId, report: &[u8]) -> Envelope {
    combat(MessageKind::CombatEnd, receiver, report)
}

// ---------------------------------------------------------------------------
// Social
// ---------------------------------------------------------------------------

/// A chat line for everyone.
pub fn chat(sender: PlayerId, text: &str) -> Envelope {
    to_server(MessageKind::HumanPlayerChat, sender, text)
}

/// A chat line for one player.
pub fn chat_to(sender: PlayerId, receiver: PlayerId, text: &str) -> Envelope {
    Envelope::new(
        MessageKind::HumanPlayerChat,
        sender,
        receiver,
        Module::Core,
        text,
    )
}

/// Tells `receiver` that the empire called `empire_name` was eliminated.
pub fn player_eliminated(receiver: PlayerId, empire_name: &str) -> Envelope {
    from_server(MessageKind::PlayerEliminated, receiver, Module::Core, empire_name)
}

/// Tells `receiver` that `player_name` disconnected.
pub fn player_exit(receiver: PlayerId, player_name: &str) -> Envelope {
    from_server(MessageKind::PlayerExit, receiver, Module::Core, player_name)
}

// ---------------------------------------------------------------------------
// Object id allocation
// ---------------------------------------------------------------------------

/// A client asks for a fresh object id.
pub fn request_new_object_id(sender: PlayerId) -> Envelope {
    to_server(MessageKind::RequestNewObjectId, sender, Vec::new())
}

/// Server answers an id request; the client is blocked waiting for it.
pub fn dispatch_new_object_id(player: PlayerId, new_id: i32) -> Envelope {
    from_server(
        MessageKind::DispatchNewObjectId,
        player,
        Module::ClientSynchronousResponse,
        new_id.to_string(),
    )
}

// ---------------------------------------------------------------------------
// Termination and diagnostics
// ---------------------------------------------------------------------------

/// Ends the game for `receiver`.
pub fn end_game(sender: PlayerId, receiver: PlayerId) -> Envelope {
    Envelope::new(MessageKind::EndGame, sender, receiver, Module::Core, Vec::new())
}

/// Ends the game for `receiver`, who won.
pub fn victory(receiver: PlayerId) -> Envelope {
    from_server(MessageKind::EndGame, receiver, Module::Core, VICTORY)
}

/// The server is shutting down.
pub fn server_dying(receiver: PlayerId) -> Envelope {
    from_server(MessageKind::ServerDying, receiver, Module::Core, Vec::new())
}

/// Free-form diagnostic text.
pub fn debug(sender: PlayerId, receiver: PlayerId, text: &str) -> Envelope {
    Envelope::new(MessageKind::Debug, sender, receiver, Module::Core, text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::JsonCodec;
    use crate::error::CodecError;

    /// A value every codec refuses to encode.
    struct Unencodable;

    impl Serialize for Unencodable {
        fn serialize<S: serde::Serializer>(&self, _: S) -> std::result::Result<S::Ok, S::Error> {
            Err(serde::ser::Error::custom("refused"))
        }
    }

    #[test]
    fn test_text_builders_route_to_server() {
        let env = chat(PlayerId(3), "hello");
        assert_eq!(env.kind(), MessageKind::HumanPlayerChat);
        assert_eq!(env.sender(), PlayerId(3));
        assert_eq!(env.receiver(), PlayerId::SERVER);
        assert_eq!(env.module(), Module::Core);
        assert_eq!(env.payload(), b"hello");
    }

    #[test]
    fn test_acks_carry_literal_payload() {
        for env in [host_sp_ack(PlayerId(1)), host_mp_ack(PlayerId(1))] {
            assert_eq!(env.sender(), PlayerId::SERVER);
            assert_eq!(env.receiver(), PlayerId(1));
            assert_eq!(env.text(), "ACK");
        }
    }

    #[test]
    fn test_join_game_uses_server_sentinel_both_ways() {
        let env = join_game("Ana");
        assert_eq!(env.sender(), PlayerId::SERVER);
        assert_eq!(env.receiver(), PlayerId::SERVER);
        assert_eq!(env.text(), "Ana");

        let ack = join_ack(PlayerId(5));
        assert_eq!(ack.receiver(), PlayerId(5));
        assert_eq!(ack.text(), "5");
    }

    #[test]
    fn test_lobby_server_forms_target_lobby_module() {
        assert_eq!(server_lobby_chat(PlayerId(1), PlayerId(2), "hi").module(), Module::ClientLobby);
        assert_eq!(server_lobby_exit(PlayerId(1), PlayerId(2)).module(), Module::ClientLobby);
        assert_eq!(server_lobby_host_abort(PlayerId(2)).module(), Module::ClientLobby);
        assert_eq!(lobby_chat(PlayerId(1), PlayerId(2), "hi").module(), Module::Core);
        assert_eq!(lobby_exit(PlayerId(1)).payload_len(), 0);
    }

    #[test]
    fn test_server_save_game_module_depends_on_done() {
        assert_eq!(server_save_game(PlayerId(1), false).module(), Module::Core);
        assert_eq!(
            server_save_game(PlayerId(1), true).module(),
            Module::ClientSynchronousResponse
        );
    }

    #[test]
    fn test_combat_reports_target_combat_module() {
        let env = combat_round_update(PlayerId(2), &[1, 2, 3]);
        assert_eq!(env.kind(), MessageKind::CombatRoundUpdate);
        assert_eq!(env.module(), Module::ClientCombat);
        assert_eq!(env.payload(), &[1, 2, 3]);
    }

    #[test]
    fn test_victory_payload() {
        let env = victory(PlayerId(4));
        assert_eq!(env.kind(), MessageKind::EndGame);
        assert_eq!(env.text(), VICTORY);
        assert_eq!(end_game(PlayerId::SERVER, PlayerId(4)).payload_len(), 0);
    }

    #[test]
    fn test_encode_failure_produces_no_envelope() {
        let err = turn_orders(&JsonCodec, PlayerId(2), &Unencodable).unwrap_err();
        match err {
            ProtocolError::PayloadEncode { kind, source } => {
                assert_eq!(kind, MessageKind::TurnOrders);
                assert!(matches!(source, CodecError::Json(_)));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
