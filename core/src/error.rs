use thiserror::Error;

#[derive(Error, Debug)]
pub enum GameError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Malformed game record: {reason}")]
    MalformedRecord { reason: String },
}

pub type GameResult<T> = Result<T, GameError>;
