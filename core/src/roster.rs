//! Horse roster generation.
//!
//! Every game starts with exactly ROSTER_SIZE horses. Names come from a
//! curated list, conditions are rolled uniformly in [1, 100] and colors
//! are dealt from a shuffled fixed palette, so colors never repeat.

use crate::{rng::RandomSource, types::HorseId};
use serde::{Deserialize, Serialize};

pub const ROSTER_SIZE: usize = 20;
pub const MIN_CONDITION: u32 = 1;
pub const MAX_CONDITION: u32 = 100;

/// Used when the curated list runs out of unique names.
pub const FILLER_NAME: &str = "Mystery Runner";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Horse {
    pub id:        HorseId,
    pub name:      String,
    pub condition: u32,
    pub color:     String,
}

/// Curated horse names.
const HORSE_NAMES: [&str; ROSTER_SIZE] = [
    "Thunder Bolt", "Silver Arrow", "Midnight Star", "Golden Gallop",
    "Storm Chaser", "Desert Wind", "Royal Flush", "Blue Lightning",
    "Wild Spirit", "Iron Hoof", "Crimson Dash", "Shadow Dancer",
    "Lucky Clover", "Northern Light", "Velvet Thunder", "Rocket Man",
    "Sea Biscuit", "Dream Chaser", "Prairie Fire", "Copper Penny",
];

/// Exactly ROSTER_SIZE distinct colors.
const COLOR_PALETTE: [&str; ROSTER_SIZE] = [
    "#E6194B", "#3CB44B", "#FFE119", "#4363D8", "#F58231",
    "#911EB4", "#46F0F0", "#F032E6", "#BCF60C", "#FABEBE",
    "#008080", "#E6BEFF", "#9A6324", "#FFFAC8", "#800000",
    "#AAFFC3", "#808000", "#FFD8B1", "#000075", "#808080",
];

pub struct RosterGenerator;

impl RosterGenerator {
    /// Generate a fresh roster of ROSTER_SIZE horses with ids 1..=20.
    pub fn generate<R: RandomSource>(rng: &mut R) -> Vec<Horse> {
        let names = Self::padded_names(&HORSE_NAMES, ROSTER_SIZE);

        let mut colors: Vec<&str> = COLOR_PALETTE.to_vec();
        rng.shuffle(&mut colors);

        let horses: Vec<Horse> = names
            .into_iter()
            .zip(colors)
            .enumerate()
            .map(|(i, (name, color))| Horse {
                id:        i as HorseId + 1,
                name,
                condition: rng.int_inclusive(MIN_CONDITION, MAX_CONDITION),
                color:     color.to_string(),
            })
            .collect();

        log::info!("roster: generated {} horses", horses.len());
        horses
    }

    /// Unique names from `curated` in order, padded with FILLER_NAME up to
    /// `count`. Padding may repeat the filler; only ids and colors are unique.
    pub fn padded_names(curated: &[&str], count: usize) -> Vec<String> {
        let mut names: Vec<String> = Vec::with_capacity(count);
        for name in curated {
            if names.len() == count {
                break;
            }
            if !names.iter().any(|n| n == name) {
                names.push((*name).to_string());
            }
        }
        while names.len() < count {
            names.push(FILLER_NAME.to_string());
        }
        names
    }
}
