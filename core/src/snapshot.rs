//! Persisted game record: the durable subset of engine state.
//!
//! Live participant state is never part of a record. A record taken
//! mid-race is normalised on load: the game comes back at
//! SCHEDULE_READY and the interrupted round is re-run from the gate.

use crate::{
    error::{GameError, GameResult},
    physics::RoundResult,
    roster::{Horse, MAX_CONDITION, MIN_CONDITION, ROSTER_SIZE},
    schedule::{Race, RaceStatus, RACE_DISTANCES, RACE_FIELD_SIZE, ROUND_COUNT},
    state::GameState,
    types::HorseId,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameRecord {
    pub game_state:          GameState,
    pub horses:              Vec<Horse>,
    pub schedule:            Option<Vec<Race>>,
    pub results:             Vec<RoundResult>,
    pub current_round_index: usize,
}

impl GameRecord {
    pub fn to_json(&self) -> GameResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse and validate. Anything that fails either step is malformed.
    pub fn from_json(json: &str) -> GameResult<Self> {
        let record: GameRecord = serde_json::from_str(json)?;
        record.validate()?;
        Ok(record)
    }

    /// Coerce mid-race state back to SCHEDULE_READY and put the
    /// interrupted race back to pending.
    pub fn normalized(mut self) -> Self {
        if self.game_state.is_mid_race() {
            self.game_state = self.game_state.on_restore();
            if let Some(schedule) = self.schedule.as_mut() {
                for race in schedule.iter_mut().filter(|r| r.status == RaceStatus::Running) {
                    race.status = RaceStatus::Pending;
                    race.start_time = None;
                }
            }
        }
        self
    }

    /// Structural and consistency checks. A record failing any of these
    /// is not trusted.
    pub fn validate(&self) -> GameResult<()> {
        self.validate_roster()?;
        let roster: HashSet<HorseId> = self.horses.iter().map(|h| h.id).collect();

        match &self.schedule {
            Some(schedule) => Self::validate_schedule(schedule, &roster)?,
            None if self.game_state.needs_schedule() => {
                return Err(malformed(format!("{} without a schedule", self.game_state)));
            }
            None => {}
        }

        if self.results.len() > ROUND_COUNT {
            return Err(malformed(format!("{} round results recorded", self.results.len())));
        }
        for (i, round) in self.results.iter().enumerate() {
            if round.round_number as usize != i + 1 || round.distance != RACE_DISTANCES[i] {
                return Err(malformed(format!(
                    "result {} is for round {} at {}m",
                    i + 1,
                    round.round_number,
                    round.distance
                )));
            }
        }
        if self.current_round_index != self.results.len() {
            return Err(malformed(format!(
                "round index {} with {} results",
                self.current_round_index,
                self.results.len()
            )));
        }
        if self.game_state == GameState::Completed && self.current_round_index != ROUND_COUNT {
            return Err(malformed(format!(
                "COMPLETED after {} of {ROUND_COUNT} rounds",
                self.current_round_index
            )));
        }
        Ok(())
    }

    fn validate_roster(&self) -> GameResult<()> {
        let expected = if self.game_state == GameState::Idle && self.horses.is_empty() {
            0
        } else {
            ROSTER_SIZE
        };
        if self.horses.len() != expected {
            return Err(malformed(format!(
                "{} roster has {} horses, expected {expected}",
                self.game_state,
                self.horses.len()
            )));
        }

        let ids: HashSet<HorseId> = self.horses.iter().map(|h| h.id).collect();
        if ids.len() != self.horses.len() {
            return Err(malformed("duplicate horse ids in roster"));
        }
        let colors: HashSet<&str> = self.horses.iter().map(|h| h.color.as_str()).collect();
        if colors.len() != self.horses.len() {
            return Err(malformed("duplicate horse colors in roster"));
        }
        if let Some(h) = self
            .horses
            .iter()
            .find(|h| !(MIN_CONDITION..=MAX_CONDITION).contains(&h.condition))
        {
            return Err(malformed(format!("horse {} has condition {}", h.id, h.condition)));
        }
        Ok(())
    }

    fn validate_schedule(schedule: &[Race], roster: &HashSet<HorseId>) -> GameResult<()> {
        if schedule.len() != ROUND_COUNT {
            return Err(malformed(format!(
                "schedule has {} races, expected {ROUND_COUNT}",
                schedule.len()
            )));
        }
        for (i, race) in schedule.iter().enumerate() {
            if race.round_number as usize != i + 1 || race.distance != RACE_DISTANCES[i] {
                return Err(malformed(format!(
                    "race {} is round {} at {}m",
                    i + 1,
                    race.round_number,
                    race.distance
                )));
            }
            let field: HashSet<HorseId> = race.horse_ids.iter().copied().collect();
            if race.horse_ids.len() != RACE_FIELD_SIZE || field.len() != RACE_FIELD_SIZE {
                return Err(malformed(format!(
                    "round {} does not have {RACE_FIELD_SIZE} unique horses",
                    race.round_number
                )));
            }
            if !field.is_subset(roster) {
                return Err(malformed(format!(
                    "round {} references horses outside the roster",
                    race.round_number
                )));
            }
        }
        Ok(())
    }
}

fn malformed(reason: impl Into<String>) -> GameError {
    GameError::MalformedRecord { reason: reason.into() }
}
