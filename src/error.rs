use std::path::PathBuf;

/// Errors raised by the note store and the controllers built on it.
#[derive(Debug, thiserror::Error)]
pub enum NotesError {
    /// The database could not be opened or created.
    #[error("failed to open database at {path}: {source}")]
    Connection {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Schema setup failed or the database was written by a newer schema.
    #[error("database schema error: {0}")]
    Schema(String),

    /// A read, write or delete transaction failed.
    #[error("transaction failed: {0}")]
    Transaction(#[from] rusqlite::Error),

    /// The database never opened, so no storage operation can run.
    #[error("database is not available")]
    Unavailable,
}
