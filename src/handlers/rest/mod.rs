use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_macros::debug_handler;
use utoipa::OpenApi;

use std::sync::Arc;

use crate::{
    dto::{CreateNoteRequest, NoteResponse},
    error::NotesError,
    models::NoteId,
    service::NoteService,
};

#[derive(OpenApi)]
#[openapi(
    paths(get_all_notes, create_note, delete_note),
    components(schemas(NoteResponse, CreateNoteRequest)),
    tags(
        (name = "notes", description = "Review notes API")
    )
)]
pub struct ApiDoc;

fn error_response(err: &NotesError, message: &'static str) -> Response {
    tracing::error!("{message}: {err}");
    let status = match err {
        NotesError::Unavailable | NotesError::Connection { .. } => StatusCode::SERVICE_UNAVAILABLE,
        NotesError::Schema(_) | NotesError::Transaction(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, message).into_response()
}

#[utoipa::path(
    get,
    path = "/api/notes",
    responses(
        (status = 200, description = "All notes, newest first", body = Vec<NoteResponse>),
        (status = 503, description = "Database is not available"),
        (status = 500, description = "Internal server error")
    ),
    tag = "notes"
)]
#[debug_handler]
pub async fn get_all_notes(State(service): State<Arc<NoteService>>) -> Response {
    match service.get_all_notes().await {
        Ok(notes) => {
            let notes: Vec<NoteResponse> = notes.into_iter().map(NoteResponse::from).collect();
            (StatusCode::OK, Json(notes)).into_response()
        }
        Err(e) => error_response(&e, "Failed to get all notes"),
    }
}

#[utoipa::path(
    post,
    path = "/api/notes",
    request_body = CreateNoteRequest,
    responses(
        (status = 201, description = "Note created successfully", body = NoteResponse),
        (status = 503, description = "Database is not available"),
        (status = 500, description = "Internal server error")
    ),
    tag = "notes"
)]
#[debug_handler]
pub async fn create_note(
    State(service): State<Arc<NoteService>>,
    Json(payload): Json<CreateNoteRequest>,
) -> Response {
    match service.submit(payload.review).await {
        Ok(note) => (StatusCode::CREATED, Json(NoteResponse::from(note))).into_response(),
        Err(e) => error_response(&e, "Failed to create note"),
    }
}

#[utoipa::path(
    delete,
    path = "/api/notes/{id}",
    params(
        ("id" = i64, Path, description = "Note ID")
    ),
    responses(
        (status = 204, description = "Note deleted successfully"),
        (status = 404, description = "Note not found"),
        (status = 503, description = "Database is not available"),
        (status = 500, description = "Internal server error")
    ),
    tag = "notes"
)]
#[debug_handler]
pub async fn delete_note(State(service): State<Arc<NoteService>>, Path(id): Path<i64>) -> Response {
    match service.delete_note(NoteId(id), None).await {
        Ok(true) => StatusCode::NO_CONTENT.into_response(),
        Ok(false) => (StatusCode::NOT_FOUND, "Note not found").into_response(),
        Err(e) => error_response(&e, "Failed to delete note"),
    }
}

pub async fn openapi() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
