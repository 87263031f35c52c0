//! Game-wide lifecycle state.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Exactly one is live at a time; it decides which actions are legal.
///
/// IDLE → HORSES_READY → SCHEDULE_READY → RACING ⇄ PAUSED → COMPLETED
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameState {
    #[default]
    Idle,
    HorsesReady,
    ScheduleReady,
    Racing,
    Paused,
    Completed,
}

impl GameState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle          => "IDLE",
            Self::HorsesReady   => "HORSES_READY",
            Self::ScheduleReady => "SCHEDULE_READY",
            Self::Racing        => "RACING",
            Self::Paused        => "PAUSED",
            Self::Completed     => "COMPLETED",
        }
    }

    /// States that only exist while a race is animating. They cannot
    /// survive a reload.
    pub fn is_mid_race(&self) -> bool {
        matches!(self, Self::Racing | Self::Paused)
    }

    /// States that are only reachable once a schedule exists.
    pub fn needs_schedule(&self) -> bool {
        matches!(
            self,
            Self::ScheduleReady | Self::Racing | Self::Paused | Self::Completed
        )
    }

    /// The state a persisted game resumes in.
    pub fn on_restore(self) -> Self {
        if self.is_mid_race() {
            Self::ScheduleReady
        } else {
            self
        }
    }
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialises_as_screaming_snake_case() {
        assert_eq!(
            serde_json::to_string(&GameState::ScheduleReady).unwrap(),
            "\"SCHEDULE_READY\""
        );
        let s: GameState = serde_json::from_str("\"HORSES_READY\"").unwrap();
        assert_eq!(s, GameState::HorsesReady);
        assert_eq!(GameState::Paused.to_string(), "PAUSED");
    }

    #[test]
    fn only_mid_race_states_are_coerced() {
        assert_eq!(GameState::Racing.on_restore(), GameState::ScheduleReady);
        assert_eq!(GameState::Paused.on_restore(), GameState::ScheduleReady);
        assert_eq!(GameState::Completed.on_restore(), GameState::Completed);
        assert_eq!(GameState::Idle.on_restore(), GameState::Idle);
    }

    #[test]
    fn schedule_required_from_schedule_ready_on() {
        assert!(!GameState::Idle.needs_schedule());
        assert!(!GameState::HorsesReady.needs_schedule());
        assert!(GameState::ScheduleReady.needs_schedule());
        assert!(GameState::Paused.needs_schedule());
        assert!(GameState::Completed.needs_schedule());
    }
}
