use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::Note;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NoteResponse {
    /// Note ID, assigned by the store
    pub id: i64,
    /// Review text exactly as submitted
    pub review: String,
    /// Display timestamp captured at submission
    pub date: String,
}

impl From<Note> for NoteResponse {
    fn from(note: Note) -> Self {
        Self {
            id: note.id.0,
            review: note.review,
            date: note.date,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateNoteRequest {
    /// Review text
    pub review: String,
}

/// Body of the page's submit form.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitForm {
    #[serde(default)]
    pub review: String,
}
