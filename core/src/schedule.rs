//! Six-round schedule builder.
//!
//! Distances are fixed and always appear in the same order. Each round
//! independently draws RACE_FIELD_SIZE unique horses from the roster by
//! shuffling the roster ids and taking the prefix.

use crate::{
    roster::Horse,
    rng::RandomSource,
    types::{HorseId, Round},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const RACE_DISTANCES: [u32; 6] = [1200, 1400, 1600, 1800, 2000, 2200];
pub const ROUND_COUNT: usize = RACE_DISTANCES.len();
pub const RACE_FIELD_SIZE: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RaceStatus {
    Pending,
    Running,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Race {
    pub round_number: Round,
    pub distance:     u32,
    pub horse_ids:    Vec<HorseId>,
    pub status:       RaceStatus,
    #[serde(
        default,
        with = "chrono::serde::ts_milliseconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub start_time:   Option<DateTime<Utc>>,
    #[serde(
        default,
        with = "chrono::serde::ts_milliseconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub end_time:     Option<DateTime<Utc>>,
}

impl Race {
    pub fn pending(round_number: Round, distance: u32, horse_ids: Vec<HorseId>) -> Self {
        Self {
            round_number,
            distance,
            horse_ids,
            status: RaceStatus::Pending,
            start_time: None,
            end_time: None,
        }
    }
}

pub struct ScheduleBuilder;

impl ScheduleBuilder {
    /// Build all six rounds for `roster`. Safe to call repeatedly; every
    /// call produces a fresh draw.
    pub fn build<R: RandomSource>(roster: &[Horse], rng: &mut R) -> Vec<Race> {
        let schedule: Vec<Race> = RACE_DISTANCES
            .iter()
            .enumerate()
            .map(|(i, &distance)| {
                let field = Self::draw_field(roster, RACE_FIELD_SIZE, rng);
                Race::pending(i as Round + 1, distance, field)
            })
            .collect();

        log::info!("schedule: built {} rounds from {} horses", schedule.len(), roster.len());
        schedule
    }

    /// Shuffle the roster ids and keep the first `size`.
    pub fn draw_field<R: RandomSource>(roster: &[Horse], size: usize, rng: &mut R) -> Vec<HorseId> {
        let mut ids: Vec<HorseId> = roster.iter().map(|h| h.id).collect();
        rng.shuffle(&mut ids);
        ids.truncate(size);
        ids
    }
}
