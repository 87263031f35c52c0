//! Shared primitive types used across the entire game.

/// A stable roster identifier. Ids run 1..=20 for a session.
pub type HorseId = u32;

/// Frame-clock time in milliseconds. Used for both timestamps and deltas.
pub type Millis = f64;

/// A 1-based round number (1..=6).
pub type Round = u8;

/// Wall-clock "now" at the millisecond precision records are stored with.
pub fn wall_clock_now() -> chrono::DateTime<chrono::Utc> {
    use chrono::SubsecRound;
    chrono::Utc::now().trunc_subsecs(3)
}
