use thiserror::Error;

#[derive(Error, Debug)]
pub enum NotesError {
    #[error("Note not found: {0}")]
    NoteNotFound(String),

    #[error("Ambiguous note id '{id}' matches {matches} notes")]
    AmbiguousId { id: String, matches: usize },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Storage quota exceeded: writing '{key}' needs {needed} bytes (limit {limit})")]
    QuotaExceeded {
        key: String,
        needed: usize,
        limit: usize,
    },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, NotesError>;
