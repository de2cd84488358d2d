use std::fmt;

use serde::{Deserialize, Serialize};

/// Store-assigned note identifier. Never supplied by callers and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteId(pub i64);

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note {
    pub id: NoteId,
    pub review: String,
    /// Display-only creation timestamp, already formatted.
    pub date: String,
}

/// A note that has not been written yet.
#[derive(Debug, Clone)]
pub struct NewNote {
    pub review: String,
    pub date: String,
}
