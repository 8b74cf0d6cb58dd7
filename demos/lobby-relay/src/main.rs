use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

use galaxis::prelude::*;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Lobby types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seat {
    pub id: i32,
    pub name: String,
}

/// What every lobby screen shows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LobbyView {
    pub seats: Vec<Seat>,
    /// Game settings as the host last sent them.
    pub settings: serde_json::Value,
}

#[derive(Default)]
struct LobbyState {
    players: BTreeMap<PlayerId, String>,
    settings: serde_json::Value,
    next_player: i32,
    next_object: i32,
}

impl LobbyState {
    fn view(&self) -> LobbyView {
        LobbyView {
            seats: self
                .players
                .iter()
                .map(|(id, name)| Seat { id: id.0, name: name.clone() })
                .collect(),
            settings: self.settings.clone(),
        }
    }

    /// `name`, or `name_<id>` if someone already uses it. Further
    /// `_<n>` suffixes are added until the result is free.
    fn unique_name(&self, name: &str, id: PlayerId) -> String {
        let taken = |candidate: &str| self.players.values().any(|n| n == candidate);
        if !taken(name) {
            return name.to_string();
        }
        let base = format!("{name}_{}", id.0);
        let mut candidate = base.clone();
        let mut n = 2;
        while taken(&candidate) {
            candidate = format!("{base}_{n}");
            n += 1;
        }
        candidate
    }

    fn others(&self, player: PlayerId) -> impl Iterator<Item = PlayerId> + '_ {
        self.players.keys().copied().filter(move |p| *p != player)
    }

    /// `text` from `sender` to `receiver`, or to everyone else when the
    /// receiver is the server.
    fn relay(
        &self,
        sender: PlayerId,
        receiver: PlayerId,
        text: &str,
        make: fn(PlayerId, PlayerId, &str) -> Envelope,
    ) -> Vec<Envelope> {
        if receiver.is_server() {
            self.others(sender).map(|p| make(sender, p, text)).collect()
        } else if self.players.contains_key(&receiver) {
            vec![make(sender, receiver, text)]
        } else {
            tracing::debug!(%sender, %receiver, "chat for unknown player dropped");
            Vec::new()
        }
    }

    fn broadcast_view(&self) -> Result<Vec<Envelope>, ProtocolError> {
        let view = self.view();
        self.players
            .keys()
            .map(|p| build::server_lobby_update(&JsonCodec, *p, &view))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Lobby logic
// ---------------------------------------------------------------------------

/// A multiplayer lobby: one host, any number of joiners, chat between
/// them, and object id allocation once the game is running.
pub struct Lobby {
    state: Mutex<LobbyState>,
}

impl Lobby {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(LobbyState {
                next_player: 1,
                ..LobbyState::default()
            }),
        }
    }
}

impl ModuleHandler for Lobby {
    fn handle(&self, envelope: Envelope) -> HandlerResult {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let sender = envelope.sender();

        match envelope.kind() {
            MessageKind::HostMultiplayerGame => {
                if state.players.contains_key(&PlayerId::HOST) {
                    tracing::warn!("second host request ignored");
                    return Ok(Vec::new());
                }
                let name = extract::host_player_name(&envelope)?.to_string();
                tracing::info!(%name, "lobby opened");
                state.players.insert(PlayerId::HOST, name);
                let mut replies = vec![build::host_mp_ack(PlayerId::HOST)];
                replies.extend(state.broadcast_view()?);
                Ok(replies)
            }
            MessageKind::JoinGame => {
                if !state.players.contains_key(&PlayerId::HOST) {
                    tracing::warn!("join before any host, ignored");
                    return Ok(Vec::new());
                }
                let requested = extract::joining_player_name(&envelope)?;
                let id = PlayerId(state.next_player);
                state.next_player += 1;
                let name = state.unique_name(requested, id);

                let mut replies = vec![build::join_ack(id)];
                if name != requested {
                    replies.push(build::rename_player(id, &name));
                }
                tracing::info!(player = %id, %name, "player joined lobby");
                state.players.insert(id, name);
                replies.extend(state.broadcast_view()?);
                Ok(replies)
            }
            MessageKind::LobbyUpdate => {
                if !sender.is_host() {
                    tracing::debug!(%sender, "lobby settings from non-host ignored");
                    return Ok(Vec::new());
                }
                state.settings = extract::lobby_data(&JsonCodec, &envelope)?;
                state.broadcast_view()
            }
            MessageKind::LobbyChat => {
                let text = extract::lobby_chat_text(&envelope)?;
                Ok(state.relay(sender, envelope.receiver(), text, build::server_lobby_chat))
            }
            MessageKind::HumanPlayerChat => {
                let text = extract::chat_text(&envelope)?;
                Ok(state.relay(sender, envelope.receiver(), text, build::chat_to))
            }
            MessageKind::LobbyExit => {
                state.players.remove(&sender);
                let mut replies: Vec<_> = state
                    .others(sender)
                    .map(|p| build::server_lobby_exit(sender, p))
                    .collect();
                replies.extend(state.broadcast_view()?);
                Ok(replies)
            }
            MessageKind::LobbyHostAbort => {
                let replies: Vec<_> = state
                    .others(PlayerId::HOST)
                    .map(build::server_lobby_host_abort)
                    .collect();
                tracing::info!("host closed the lobby");
                *state = LobbyState {
                    next_player: 1,
                    ..LobbyState::default()
                };
                Ok(replies)
            }
            MessageKind::RequestNewObjectId => {
                let id = state.next_object;
                state.next_object += 1;
                Ok(vec![build::dispatch_new_object_id(sender, id)])
            }
            other => {
                tracing::debug!(kind = %other, %sender, "not handled by the lobby");
                Ok(Vec::new())
            }
        }
    }
}

impl Default for Lobby {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Server bootstrap
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => ServerConfig::from_json_file(path)?,
        None => ServerConfig::default(),
    };

    let server = GalaxisServer::builder()
        .config(config)
        .handler(Module::Core, Lobby::new())
        .build()
        .await?;
    tracing::info!(addr = %server.local_addr()?, "lobby relay listening");

    server
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "cannot listen for ctrl-c");
            }
        })
        .await?;
    Ok(())
}
