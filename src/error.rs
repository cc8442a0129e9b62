//! Error types for the tutor.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// SQLite errors from the lesson/review store
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed lesson JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Text that is not one of again/hard/good/easy
    #[error("Unrecognized rating: '{0}'")]
    UnrecognizedRating(String),

    /// Lesson parsed but failed validation
    #[error("Invalid lesson: {0}")]
    InvalidLesson(String),

    #[error("Lesson '{0}' already exists")]
    DuplicateLesson(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Stored timestamp outside the representable range
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(i64),

    /// App state value that does not parse as its expected type
    #[error("Corrupt app state '{key}': '{value}'")]
    CorruptState { key: String, value: String },

    /// Another thread panicked while holding the database connection
    #[error("Database connection lock poisoned")]
    StoragePoisoned,

    #[error("GUI error: {0}")]
    Gui(String),
}

pub type Result<T> = std::result::Result<T, Error>;
