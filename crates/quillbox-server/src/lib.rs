//! Quillbox: a personal notes service.
//!
//! Users authenticate with an email and password, then create, edit,
//! search, and tag short text notes over a JSON API. Sessions are a single
//! signed token in an HTTP-only cookie, verified statelessly on every
//! request; every resource row is scoped to its owner.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::{header::CONTENT_TYPE, Method},
    routing::{get, post, put},
    Json, Router,
};
use tokio::{net::TcpListener, signal};
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use migration::{Migrator, MigratorTrait};

pub mod config;
pub mod crypto;
pub mod db;
pub mod error;
pub mod handlers;
pub mod state;
pub mod token;
pub mod util;

use config::Config;
use error::AppError;
use state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/auth/register", post(handlers::accounts::register))
        .route("/api/auth/login", post(handlers::accounts::login))
        .route("/api/auth/logout", post(handlers::accounts::logout))
        .route("/api/auth/me", get(handlers::accounts::me))
        .route(
            "/api/notes",
            get(handlers::notes::list_notes).post(handlers::notes::create_note),
        )
        .route(
            "/api/notes/{id}",
            get(handlers::notes::get_note)
                .put(handlers::notes::update_note)
                .delete(handlers::notes::delete_note),
        )
        .route(
            "/api/tags",
            get(handlers::tags::list_tags).post(handlers::tags::create_tag),
        )
        .route(
            "/api/tags/{id}",
            put(handlers::tags::update_tag).delete(handlers::tags::delete_tag),
        )
        .route("/api/dashboard", get(handlers::dashboard::overview))
        .with_state(state)
}

async fn health(
    State(state): State<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.db.ping().await?;

    Ok(Json(serde_json::json!({
        "ok": true,
        "service": "quillbox",
    })))
}

pub async fn start_server() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let config = Config::load();

    info!("Connecting to {}", config.database_url);
    let db = db::connect(&config.database_url)
        .await
        .expect("Failed to open database connection");

    Migrator::up(&db, None).await.expect("Migrations failed");

    let state = AppState::new(config, db);

    info!("Starting server...");

    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    let app = router(state.clone()).layer(cors);

    let address = format!("0.0.0.0:{}", state.config.port);
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address).await.unwrap();
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .unwrap();

    println!("Server shutting down...");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("Failed to install Ctrl+C handler");

        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;

        info!("Received terminate signal, shutting down");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
