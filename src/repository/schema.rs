//! Fixed schema of the notes database.
//!
//! The schema version lives in SQLite's `user_version` header field. Version 0
//! means the file was just created and still needs the `notes` table.

use rusqlite::Connection;

use crate::error::NotesError;

pub const SCHEMA_VERSION: i32 = 1;

// `AUTOINCREMENT` keeps identifiers from being reused after the newest note is
// deleted. The two indexes are declared for parity with the store layout and
// are not read by any query.
const CREATE_NOTES: &str = r"
CREATE TABLE IF NOT EXISTS notes (
    id     INTEGER PRIMARY KEY AUTOINCREMENT,
    review TEXT NOT NULL,
    date   TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS notes_review ON notes (review);
CREATE INDEX IF NOT EXISTS notes_date ON notes (date);
";

pub fn version(conn: &Connection) -> Result<i32, NotesError> {
    Ok(conn.query_row("PRAGMA user_version", [], |row| row.get(0))?)
}

/// Creates the schema on first use. Returns `true` when the tables were created.
pub fn ensure(conn: &mut Connection) -> Result<bool, NotesError> {
    match version(conn)? {
        SCHEMA_VERSION => Ok(false),
        0 => {
            let tx = conn.transaction()?;
            tx.execute_batch(CREATE_NOTES)?;
            tx.pragma_update(None, "user_version", SCHEMA_VERSION)?;
            tx.commit()?;

            tracing::info!("Database setup complete (schema version {SCHEMA_VERSION})");
            Ok(true)
        }
        other => Err(NotesError::Schema(format!(
            "unsupported schema version {other}, expected {SCHEMA_VERSION}"
        ))),
    }
}
