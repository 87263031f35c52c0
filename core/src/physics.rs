//! Race physics: speed derivation, per-frame movement, finish detection
//! and ranking.
//!
//! Everything here is a pure function of its inputs. Randomness (the
//! per-frame speed variation) is drawn by the caller and passed in.
//!
//! Movement per frame:
//!   move = speed × variation × (delta_ms / (pacing_divisor × distance_multiplier))
//! Scaling by delta_ms keeps total movement per real second independent
//! of frame rate.

use crate::{
    roster::Horse,
    types::{HorseId, Millis, Round},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

pub const FINISH_LINE: f64 = 100.0;
pub const PACING_DIVISOR: f64 = 50.0;
pub const MIN_SPEED: f64 = 0.5;
pub const MAX_SPEED: f64 = 1.0;

/// Condition assumed when a horse cannot be resolved against the roster.
pub const FALLBACK_CONDITION: u32 = 50;

/// Base speed for a condition: 0.5 at condition 0, 1.0 at condition 100.
pub fn speed_for_condition(condition: f64) -> f64 {
    MIN_SPEED + (condition / 100.0) * (MAX_SPEED - MIN_SPEED)
}

/// 1.0 for the base distance, proportionally more for longer races.
pub fn distance_multiplier(distance: u32, base_distance: f64) -> f64 {
    distance as f64 / base_distance
}

/// Per-race, per-horse live state. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParticipantState {
    pub horse_id:    HorseId,
    /// Percentage of the track covered, [0, 100].
    pub position:    f64,
    /// 1-based, fixed for the race.
    pub lane:        u8,
    pub speed:       f64,
    pub finish_time: Option<Millis>,
}

impl ParticipantState {
    pub fn at_gate(horse_id: HorseId, lane: u8, speed: f64) -> Self {
        Self {
            horse_id,
            position: 0.0,
            lane,
            speed,
            finish_time: None,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.finish_time.is_some()
    }
}

/// Inputs shared by every participant within one frame.
#[derive(Debug, Clone, Copy)]
pub struct FrameInput {
    pub delta_ms:            Millis,
    pub distance_multiplier: f64,
    pub pacing_divisor:      f64,
    /// Current frame timestamp; becomes the finish time on the crossing frame.
    pub now:                 Millis,
}

/// Advance one participant by one frame.
///
/// Finished participants are returned unchanged. `speed_variation` is a
/// fresh draw for this participant and this frame.
pub fn advance(state: &ParticipantState, frame: &FrameInput, speed_variation: f64) -> ParticipantState {
    if state.is_finished() {
        return state.clone();
    }

    let move_amount = state.speed
        * speed_variation
        * (frame.delta_ms / (frame.pacing_divisor * frame.distance_multiplier));
    let new_position = (state.position + move_amount.max(0.0)).min(FINISH_LINE);

    let finish_time = if state.position < FINISH_LINE && new_position >= FINISH_LINE {
        Some(frame.now)
    } else {
        state.finish_time
    };

    ParticipantState {
        position: new_position,
        finish_time,
        ..state.clone()
    }
}

/// True once every participant has a finish time. Vacuously true for an
/// empty field.
pub fn all_finished(participants: &[ParticipantState]) -> bool {
    participants.iter().all(ParticipantState::is_finished)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RaceResultEntry {
    pub horse_id: HorseId,
    /// 1-based finishing position.
    pub position: u32,
    /// Milliseconds from the race's animation start to the finish.
    pub time:     Millis,
    pub horse:    Horse,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundResult {
    pub round_number: Round,
    pub distance:     u32,
    pub results:      Vec<RaceResultEntry>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub completed_at: DateTime<Utc>,
}

impl RoundResult {
    pub fn winner(&self) -> Option<&RaceResultEntry> {
        self.results.first()
    }
}

/// Rank participants by finish time, ascending.
///
/// The sort is stable: equal finish times keep their input order. A
/// participant without a finish time sorts as 0 and its elapsed time
/// falls back to `now`.
pub fn rank<F>(
    participants: &[ParticipantState],
    animation_start: Millis,
    now: Millis,
    mut horse_for: F,
) -> Vec<RaceResultEntry>
where
    F: FnMut(HorseId) -> Horse,
{
    let mut ordered: Vec<&ParticipantState> = participants.iter().collect();
    ordered.sort_by(|a, b| finish_key(a).total_cmp(&finish_key(b)));

    ordered
        .into_iter()
        .enumerate()
        .map(|(i, p)| RaceResultEntry {
            horse_id: p.horse_id,
            position: i as u32 + 1,
            time:     p.finish_time.unwrap_or(now) - animation_start,
            horse:    horse_for(p.horse_id),
        })
        .collect()
}

fn finish_key(p: &ParticipantState) -> f64 {
    p.finish_time.unwrap_or(0.0)
}

/// Participants for display: finishers by finish time first, then the
/// rest by distance covered. Stable on ties.
pub fn standings(participants: &[ParticipantState]) -> Vec<ParticipantState> {
    let mut ordered = participants.to_vec();
    ordered.sort_by(|a, b| match (a.finish_time, b.finish_time) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => b.position.total_cmp(&a.position),
    });
    ordered
}
