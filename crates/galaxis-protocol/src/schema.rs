//! Payload schemas for structured messages.
//!
//! Each multi-value payload is declared exactly once, as a struct whose
//! field order *is* the wire order. Builders serialize the struct with
//! borrowed fields (`GameStart<&E, &U>`), extractors deserialize the same
//! struct with owned fields (`GameStart<E, U>`). A builder and its
//! extractor therefore cannot disagree about what comes first.
//!
//! Optional values use one convention everywhere: an `Option<T>` field,
//! which every codec writes as a presence marker followed by the value.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::types::{EmpireId, TurnProgressPhase};

/// Shared simulation state whose serialized form depends on who receives
/// it.
///
/// Galaxy snapshots are personalised per recipient: an empire must not
/// learn about objects it cannot see. Builders of `GAME_START` and
/// `TURN_UPDATE` call [`redact_for`](Redact::redact_for) with the
/// receiving empire before handing the value to the codec.
///
/// The default implementation sends the state unchanged.
pub trait Redact: Clone {
    /// Returns the view of `self` that `viewpoint` is allowed to see.
    fn redact_for(&self, viewpoint: EmpireId) -> Cow<'_, Self> {
        let _ = viewpoint;
        Cow::Borrowed(self)
    }
}

/// `GAME_START` payload: the first snapshot a player receives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameStart<E, U> {
    pub single_player: bool,
    /// The receiving player's empire; also the viewpoint the snapshot
    /// was redacted for.
    pub empire_id: EmpireId,
    pub current_turn: i32,
    pub empires: E,
    pub universe: U,
}

/// `TURN_UPDATE` payload: the snapshot after a turn was processed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnUpdate<E, U> {
    /// Viewpoint the snapshot was redacted for.
    pub empire_id: EmpireId,
    pub current_turn: i32,
    pub empires: E,
    pub universe: U,
}

/// `TURN_PROGRESS` payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnProgress {
    pub phase: TurnProgressPhase,
    pub empire_id: EmpireId,
}

/// Orders plus optional UI state, as sent in `CLIENT_SAVE_DATA` and
/// returned by the server in `LOAD_GAME`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveData<O, U> {
    pub orders: O,
    pub ui_data: Option<U>,
}
