use axum::{routing::get, Json, Router};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;

use huntlog_backend::api::{self, AppState};
use huntlog_backend::catalog::CatalogClient;
use huntlog_backend::config::Config;
use huntlog_backend::db::Database;
use huntlog_backend::flow::SelectionFlow;
use huntlog_backend::metrics;
use huntlog_backend::session::{self, SessionStore};

async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok", "service": "huntlog-backend" }))
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();
    metrics::register_metrics();

    let config = Config::load();

    let db = Database::new(&config.database_url)
        .await
        .expect("Failed to initialize database");
    let db = Arc::new(db);

    let sessions = SessionStore::new(Duration::from_secs(config.session_ttl_secs));
    // Sweep abandoned selections so the map stays bounded
    session::spawn_eviction_task(sessions.clone(), Duration::from_secs(60));

    let catalog = CatalogClient::new(
        config.catalog_base_url.clone(),
        config.localized_catalog_base_url.clone(),
    );

    let flow = SelectionFlow::new(
        db.clone(),
        catalog.clone(),
        sessions,
        config.menu_option_cap,
    );

    let state = AppState {
        db,
        catalog,
        flow,
        menu_option_cap: config.menu_option_cap,
    };

    let app = Router::new()
        .route("/health", get(health_check))
        .merge(api::router(state))
        .layer(CorsLayer::permissive());

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind port");

    tracing::info!("Huntlog backend listening on port {}", config.port);
    axum::serve(listener, app)
        .await
        .expect("Failed to start server");
}
