pub mod page;
pub mod rest;

use axum::{
    Router,
    routing::{delete, get, post},
};
use tower_http::trace::TraceLayer;

use std::sync::Arc;

use crate::service::NoteService;

pub fn router(service: Arc<NoteService>) -> Router {
    Router::new()
        .route("/", get(page::index))
        .route("/notes", post(page::submit_note))
        .route("/entries/{handle}/delete", post(page::delete_entry))
        .route(
            "/api/notes",
            get(rest::get_all_notes).post(rest::create_note),
        )
        .route("/api/notes/{id}", delete(rest::delete_note))
        .route("/api-doc/openapi.json", get(rest::openapi))
        .with_state(service)
        .layer(TraceLayer::new_for_http())
}
