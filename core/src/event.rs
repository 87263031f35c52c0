//! Change notifications.
//!
//! The engine is the single owner of game state. Hosts observe it by
//! subscribing a listener; every accepted action, race start/finish and
//! rejected action is reported here, synchronously, in order.

use crate::{
    state::GameState,
    types::{HorseId, Round},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    RosterGenerated {
        horses: usize,
    },
    ScheduleGenerated {
        rounds: usize,
    },
    RaceStarted {
        round:    Round,
        distance: u32,
    },
    RaceFinished {
        round:  Round,
        winner: Option<HorseId>,
    },
    Paused,
    Resumed,
    GameCompleted {
        rounds: usize,
    },
    GameReset,
    Restored {
        state: GameState,
    },
    ActionIgnored {
        action: String,
        state:  GameState,
    },
}

/// A subscriber callback.
pub type Listener = Box<dyn FnMut(&GameEvent)>;
