//! HTML page: the list, the submit form and the per-entry delete controls.
//!
//! Failures here are only logged; the browser is always sent back to the page.

use axum::{
    Form,
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_macros::debug_handler;

use std::sync::Arc;

use crate::{dto::SubmitForm, service::NoteService, view::ElementHandle};

#[debug_handler]
pub async fn index(State(service): State<Arc<NoteService>>) -> Response {
    match service.page_html().await {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            tracing::error!("failed to render page: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to render page").into_response()
        }
    }
}

#[debug_handler]
pub async fn submit_note(
    State(service): State<Arc<NoteService>>,
    Form(form): Form<SubmitForm>,
) -> Redirect {
    // Errors are logged by the service and the input keeps the text.
    let _ = service.submit(form.review).await;
    Redirect::to("/")
}

#[debug_handler]
pub async fn delete_entry(
    State(service): State<Arc<NoteService>>,
    Path(handle): Path<ElementHandle>,
) -> Redirect {
    let _ = service.delete_element(handle).await;
    Redirect::to("/")
}
