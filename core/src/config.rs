//! Tunable game parameters.
//!
//! The six-round schedule and its distances are fixed and live in
//! schedule.rs. This covers pacing, clock and persistence knobs only.
//! In tests, use GameConfig::default().

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Divisor in the movement formula. Smaller = faster races.
    pub pacing_divisor: f64,
    /// Distance (m) whose multiplier is exactly 1.0.
    pub base_distance: f64,
    /// Upper bound on a single frame delta.
    pub max_frame_delta_ms: f64,
    /// Pause between one race finishing and the next starting.
    pub inter_race_pause_ms: f64,
    pub speed_variation_min: f64,
    pub speed_variation_max: f64,
    /// Key the persisted record is stored under.
    pub storage_key: String,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            pacing_divisor:      50.0,
            base_distance:       1200.0,
            max_frame_delta_ms:  100.0,
            inter_race_pause_ms: 1000.0,
            speed_variation_min: 0.8,
            speed_variation_max: 1.2,
            storage_key:         "horse-racing-game-state".to_string(),
        }
    }
}

impl GameConfig {
    /// Load from a JSON file. Missing keys keep their defaults.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: GameConfig = serde_json::from_str(&content)?;
        if config.pacing_divisor <= 0.0 || config.base_distance <= 0.0 {
            anyhow::bail!("{path}: pacing_divisor and base_distance must be positive");
        }
        if config.speed_variation_min > config.speed_variation_max {
            anyhow::bail!("{path}: speed_variation_min exceeds speed_variation_max");
        }
        Ok(config)
    }
}
