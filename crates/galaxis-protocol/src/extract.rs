//! Extractors: the inverse of [`build`](crate::build).
//!
//! Every extractor checks the envelope's kind itself before touching the
//! payload, so a dispatch mistake shows up as
//! [`ProtocolError::WrongKind`] instead of a confusing decode error.
//! Payload problems come back as [`ProtocolError::PayloadDecode`]; the
//! caller logs and drops that one message.
//!
//! Text extractors borrow from the envelope instead of copying.

use serde::de::DeserializeOwned;

use crate::build::{ACK, VICTORY};
use crate::codec::Codec;
use crate::envelope::Envelope;
use crate::error::{CodecError, ProtocolError, Result};
use crate::schema::{GameStart, SaveData, TurnProgress, TurnUpdate};
use crate::types::{MessageKind, Module, PlayerId};

fn expect_kind(
    envelope: &Envelope,
    extractor: &'static str,
    accepted: &[MessageKind],
) -> Result<()> {
    let actual = envelope.kind();
    if accepted.contains(&actual) {
        return Ok(());
    }
    tracing::error!(
        extractor,
        %actual,
        sender = %envelope.sender(),
        "extractor invoked on wrong message kind"
    );
    Err(ProtocolError::WrongKind { extractor, actual })
}

fn decoded<C: Codec, T: DeserializeOwned>(
    codec: &C,
    envelope: &Envelope,
    extractor: &'static str,
    kind: MessageKind,
) -> Result<T> {
    expect_kind(envelope, extractor, &[kind])?;
    codec
        .decode(envelope.payload())
        .map_err(|source| ProtocolError::PayloadDecode { kind, source })
}

fn text<'a>(
    envelope: &'a Envelope,
    extractor: &'static str,
    accepted: &[MessageKind],
) -> Result<&'a str> {
    expect_kind(envelope, extractor, accepted)?;
    std::str::from_utf8(envelope.payload()).map_err(|e| ProtocolError::PayloadDecode {
        kind: envelope.kind(),
        source: CodecError::Utf8(e),
    })
}

fn integer(
    envelope: &Envelope,
    extractor: &'static str,
    kind: MessageKind,
) -> Result<i32> {
    text(envelope, extractor, &[kind])?
        .parse()
        .map_err(|e| ProtocolError::PayloadDecode {
            kind,
            source: CodecError::Integer(e),
        })
}

// ---------------------------------------------------------------------------
// Session establishment
// ---------------------------------------------------------------------------

/// Setup data of a single-player host request.
pub fn host_sp_setup<C: Codec, S: DeserializeOwned>(codec: &C, envelope: &Envelope) -> Result<S> {
    decoded(codec, envelope, "host_sp_setup", MessageKind::HostSinglePlayerGame)
}

/// Returns `true` if a host reply is the server's acknowledgement.
pub fn is_ack(envelope: &Envelope) -> Result<bool> {
    expect_kind(
        envelope,
        "is_ack",
        &[MessageKind::HostSinglePlayerGame, MessageKind::HostMultiplayerGame],
    )?;
    Ok(envelope.payload() == ACK.as_bytes())
}

/// Name of the player hosting a multiplayer game.
pub fn host_player_name(envelope: &Envelope) -> Result<&str> {
    text(envelope, "host_player_name", &[MessageKind::HostMultiplayerGame])
}

/// Name of a player asking to join.
pub fn joining_player_name(envelope: &Envelope) -> Result<&str> {
    text(envelope, "joining_player_name", &[MessageKind::JoinGame])
}

/// The id the server assigned in a join acknowledgement.
pub fn joined_player_id(envelope: &Envelope) -> Result<PlayerId> {
    integer(envelope, "joined_player_id", MessageKind::JoinGame).map(PlayerId)
}

/// The name the server assigned in a rename.
pub fn new_player_name(envelope: &Envelope) -> Result<&str> {
    text(envelope, "new_player_name", &[MessageKind::RenamePlayer])
}

// ---------------------------------------------------------------------------
// Lobby
// ---------------------------------------------------------------------------

/// Lobby settings from either direction of `LOBBY_UPDATE`.
pub fn lobby_data<C: Codec, L: DeserializeOwned>(codec: &C, envelope: &Envelope) -> Result<L> {
    decoded(codec, envelope, "lobby_data", MessageKind::LobbyUpdate)
}

/// Text of a lobby chat line.
pub fn lobby_chat_text(envelope: &Envelope) -> Result<&str> {
    text(envelope, "lobby_chat_text", &[MessageKind::LobbyChat])
}

// ---------------------------------------------------------------------------
// Turn lifecycle
// ---------------------------------------------------------------------------

/// The opening snapshot.
pub fn game_start<C, E, U>(codec: &C, envelope: &Envelope) -> Result<GameStart<E, U>>
where
    C: Codec,
    E: DeserializeOwned,
    U: DeserializeOwned,
{
    decoded(codec, envelope, "game_start", MessageKind::GameStart)
}

/// A post-turn snapshot.
pub fn turn_update<C, E, U>(codec: &C, envelope: &Envelope) -> Result<TurnUpdate<E, U>>
where
    C: Codec,
    E: DeserializeOwned,
    U: DeserializeOwned,
{
    decoded(codec, envelope, "turn_update", MessageKind::TurnUpdate)
}

/// A player's orders.
pub fn turn_orders<C: Codec, O: DeserializeOwned>(codec: &C, envelope: &Envelope) -> Result<O> {
    decoded(codec, envelope, "turn_orders", MessageKind::TurnOrders)
}

/// Turn processing phase and the empire it concerns.
pub fn turn_progress<C: Codec>(codec: &C, envelope: &Envelope) -> Result<TurnProgress> {
    decoded(codec, envelope, "turn_progress", MessageKind::TurnProgress)
}

/// Orders and, if the client sent any, UI state.
pub fn client_save_data<C, O, U>(codec: &C, envelope: &Envelope) -> Result<SaveData<O, U>>
where
    C: Codec,
    O: DeserializeOwned,
    U: DeserializeOwned,
{
    decoded(codec, envelope, "client_save_data", MessageKind::ClientSaveData)
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

/// Filename of a host save request.
pub fn save_game_filename(envelope: &Envelope) -> Result<&str> {
    text(envelope, "save_game_filename", &[MessageKind::SaveGame])
}

/// Returns `true` if a server save notification reports completion.
pub fn save_completed(envelope: &Envelope) -> Result<bool> {
    expect_kind(envelope, "save_completed", &[MessageKind::SaveGame])?;
    Ok(envelope.module() == Module::ClientSynchronousResponse)
}

/// Filename of a host load request.
pub fn load_game_filename(envelope: &Envelope) -> Result<&str> {
    text(envelope, "load_game_filename", &[MessageKind::LoadGame])
}

/// Orders and UI state restored by the server.
pub fn load_game_data<C, O, U>(codec: &C, envelope: &Envelope) -> Result<SaveData<O, U>>
where
    C: Codec,
    O: DeserializeOwned,
    U: DeserializeOwned,
{
    decoded(codec, envelope, "load_game_data", MessageKind::LoadGame)
}

// ---------------------------------------------------------------------------
// Combat, social, ids, termination
// ---------------------------------------------------------------------------

/// The opaque report carried by any of the combat kinds.
pub fn combat_report(envelope: &Envelope) -> Result<&[u8]> {
    expect_kind(
        envelope,
        "combat_report",
        &[
            MessageKind::CombatStart,
            MessageKind::CombatRoundUpdate,
            MessageKind::CombatEnd,
        ],
    )?;
    Ok(envelope.payload())
}

/// Text of an in-game chat line.
pub fn chat_text(envelope: &Envelope) -> Result<&str> {
    text(envelope, "chat_text", &[MessageKind::HumanPlayerChat])
}

/// Name of the eliminated empire.
pub fn eliminated_empire(envelope: &Envelope) -> Result<&str> {
    text(envelope, "eliminated_empire", &[MessageKind::PlayerEliminated])
}

/// Name of the player who left.
pub fn exited_player(envelope: &Envelope) -> Result<&str> {
    text(envelope, "exited_player", &[MessageKind::PlayerExit])
}

/// The object id handed out by the server.
pub fn new_object_id(envelope: &Envelope) -> Result<i32> {
    integer(envelope, "new_object_id", MessageKind::DispatchNewObjectId)
}

/// Returns `true` if an `END_GAME` announces a win.
pub fn is_victory(envelope: &Envelope) -> Result<bool> {
    expect_kind(envelope, "is_victory", &[MessageKind::EndGame])?;
    Ok(envelope.payload() == VICTORY.as_bytes())
}

/// Diagnostic text.
pub fn debug_text(envelope: &Envelope) -> Result<&str> {
    text(envelope, "debug_text", &[MessageKind::Debug])
}
