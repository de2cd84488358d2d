use std::sync::Arc;

use review_notes::{config, handlers, logging, service::NoteService};

#[tokio::main]
async fn main() {
    // Load config
    let (cfg, source) = config::load_config().expect("failed to locate or load config");

    // Log setup, then report where the config came from
    logging::init(&cfg.log_level);
    source.log();

    // Open the database; a failure leaves the page up without storage
    let service = NoteService::open(&cfg);
    if service.has_storage() {
        // Errors are logged by the renderer
        let _ = service.render().await;
    }
    if service.admin_mode().is_on() {
        tracing::info!("Admin mode enabled, delete controls are shown");
    }

    let router = handlers::router(Arc::new(service));

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", cfg.port))
        .await
        .expect("failed to bind to address");
    let addr = listener.local_addr().expect("listener has no local address");

    tracing::info!("Notes page starting, listening on {}", addr);
    tracing::info!("Open {}", cfg.page_url);

    axum::serve(listener, router)
        .await
        .expect("failed to start server");
}
