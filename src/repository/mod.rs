mod schema;

use std::path::Path;

use rusqlite::{Connection, TransactionBehavior, params};

use crate::{
    error::NotesError,
    models::{NewNote, Note, NoteId},
};

/// Handle to the local notes database.
///
/// Every operation runs in its own transaction and returns only after that
/// transaction committed.
pub struct Repository {
    conn: Connection,
}

impl Repository {
    /// Opens the database at `path`, creating the file and schema on first use.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, NotesError> {
        let path = path.as_ref();

        let conn = Connection::open(path).map_err(|source| NotesError::Connection {
            path: path.to_path_buf(),
            source,
        })?;

        let repo = Self::with_connection(conn)?;
        tracing::info!("Database opened successfully at {}", path.display());

        Ok(repo)
    }

    pub fn open_in_memory() -> Result<Self, NotesError> {
        let conn = Connection::open_in_memory().map_err(|source| NotesError::Connection {
            path: ":memory:".into(),
            source,
        })?;

        Self::with_connection(conn)
    }

    fn with_connection(mut conn: Connection) -> Result<Self, NotesError> {
        schema::ensure(&mut conn)?;
        Ok(Self { conn })
    }

    /// Inserts a note in a read-write transaction and returns it with its new id.
    pub fn add_note(&mut self, note: NewNote) -> Result<Note, NotesError> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        tx.execute(
            "INSERT INTO notes (review, date) VALUES (?1, ?2)",
            params![note.review, note.date],
        )?;
        let id = NoteId(tx.last_insert_rowid());

        tx.commit()?;
        tracing::debug!("Transaction completed: note {id} added");

        Ok(Note {
            id,
            review: note.review,
            date: note.date,
        })
    }

    /// Deletes the note with the given id. Returns `false` when no such note
    /// existed, which leaves the store untouched.
    pub fn delete_note(&mut self, id: NoteId) -> Result<bool, NotesError> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let rows = tx.execute("DELETE FROM notes WHERE id = ?1", [id.0])?;

        tx.commit()?;
        tracing::debug!("Transaction completed: note {id} deleted ({rows} row)");

        Ok(rows == 1)
    }

    /// Walks every note from the highest id down, handing each to `visit` as
    /// it is read. Returns the number of notes visited.
    pub fn for_each_note_desc<F>(&mut self, mut visit: F) -> Result<usize, NotesError>
    where
        F: FnMut(Note),
    {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Deferred)?;

        let mut visited = 0;
        {
            let mut stmt = tx.prepare("SELECT id, review, date FROM notes ORDER BY id DESC")?;
            let cursor = stmt.query_map([], |row| {
                Ok(Note {
                    id: NoteId(row.get("id")?),
                    review: row.get("review")?,
                    date: row.get("date")?,
                })
            })?;

            for note in cursor {
                visit(note?);
                visited += 1;
            }
        }

        tx.commit()?;
        Ok(visited)
    }

    pub fn get_all_notes(&mut self) -> Result<Vec<Note>, NotesError> {
        let mut notes = Vec::new();
        self.for_each_note_desc(|note| notes.push(note))?;
        Ok(notes)
    }

    #[cfg(test)]
    fn count_notes(&self) -> Result<u64, NotesError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM notes", [], |row| row.get(0))?;
        Ok(u64::try_from(count).unwrap_or_default())
    }
}
