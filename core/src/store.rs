//! Persistence adapter.
//!
//! RULE: Only store.rs talks to the database.
//! The engine sees persistence through `GamePersistence`, which never
//! fails: errors are logged here and the game carries on in memory.

use crate::{
    error::GameResult,
    snapshot::GameRecord,
};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

/// What the engine needs from a persistence backend.
pub trait GamePersistence {
    /// Store `record`. Failures are swallowed and logged.
    fn save(&mut self, record: &GameRecord);

    /// The last stored record, or None if absent, unreadable or malformed.
    fn load(&mut self) -> Option<GameRecord>;
}

pub struct GameStore {
    conn: Connection,
    key:  String,
}

impl GameStore {
    /// Open (or create) the game database at `path`, storing under `key`.
    pub fn open(path: &str, key: &str) -> GameResult<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        Ok(Self { conn, key: key.to_string() })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory(key: &str) -> GameResult<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn, key: key.to_string() })
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> GameResult<()> {
        self.conn.execute_batch(include_str!("../migrations/001_game_state.sql"))?;
        Ok(())
    }

    pub fn put(&self, key: &str, state_json: &str) -> GameResult<()> {
        self.conn.execute(
            "INSERT INTO game_state (key, state_json, saved_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET
                state_json = excluded.state_json,
                saved_at   = excluded.saved_at",
            params![key, state_json, Utc::now().timestamp_millis()],
        )?;
        Ok(())
    }

    pub fn get(&self, key: &str) -> GameResult<Option<String>> {
        let json = self
            .conn
            .query_row(
                "SELECT state_json FROM game_state WHERE key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(json)
    }

    pub fn delete(&self, key: &str) -> GameResult<()> {
        self.conn
            .execute("DELETE FROM game_state WHERE key = ?1", params![key])?;
        Ok(())
    }

    fn save_record(&self, record: &GameRecord) -> GameResult<()> {
        let json = record.to_json()?;
        self.put(&self.key, &json)
    }

    fn load_record(&self) -> GameResult<Option<GameRecord>> {
        match self.get(&self.key)? {
            Some(json) => Ok(Some(GameRecord::from_json(&json)?)),
            None => Ok(None),
        }
    }
}

impl GamePersistence for GameStore {
    fn save(&mut self, record: &GameRecord) {
        if let Err(e) = self.save_record(record) {
            log::warn!("store: failed to save game under '{}': {e}", self.key);
        }
    }

    fn load(&mut self) -> Option<GameRecord> {
        match self.load_record() {
            Ok(record) => record,
            Err(e) => {
                log::warn!("store: discarding stored game under '{}': {e}", self.key);
                None
            }
        }
    }
}

/// Keeps the last record as JSON in memory. Round-trips through the same
/// serialisation as the database store.
#[derive(Debug, Default, Clone)]
pub struct MemoryPersistence {
    slot: Option<String>,
}

impl MemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw access for tests that plant or inspect stored JSON.
    pub fn raw(&self) -> Option<&str> {
        self.slot.as_deref()
    }

    pub fn set_raw(&mut self, json: impl Into<String>) {
        self.slot = Some(json.into());
    }
}

impl GamePersistence for MemoryPersistence {
    fn save(&mut self, record: &GameRecord) {
        match record.to_json() {
            Ok(json) => self.slot = Some(json),
            Err(e) => log::warn!("store: failed to serialise game: {e}"),
        }
    }

    fn load(&mut self) -> Option<GameRecord> {
        let json = self.slot.as_deref()?;
        match GameRecord::from_json(json) {
            Ok(record) => Some(record),
            Err(e) => {
                log::warn!("store: discarding stored game: {e}");
                None
            }
        }
    }
}
