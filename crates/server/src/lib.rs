//! Linkline Server Library
//!
//! Connection requests between users (pending / accepted / ignored), suggested
//! users, and a direct-message relay that persists every message and pushes
//! it live to recipients who are online.

pub mod config;
pub mod connections;
pub mod error;
pub mod handlers;
pub mod models;
pub mod presence;
pub mod relay;
pub mod store;

use anyhow::Context;
use axum::{
    routing::{get, post, put},
    Router,
};
use http::{header, HeaderValue, Method};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use config::{AppState, ServerConfig};
use handlers::{
    create_user, delete_user, get_messages, get_presence, get_user_by_email, list_all_users,
    list_invitations, list_users, my_connections, patch_user, post_message,
    respond_to_invitation, send_connection_request, session_ws, suggested_users, update_user,
};
use store::Database;

/// Routes of the API, without CORS or tracing layers.
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        // Connections
        .route("/connections", post(send_connection_request))
        .route("/connections/invitations", get(list_invitations))
        .route("/connections/invitation/{id}", post(respond_to_invitation))
        .route("/connections/suggested", get(suggested_users))
        .route("/connections/my-connections", get(my_connections))
        // Messages
        .route("/messages", get(get_messages).post(post_message))
        // User directory
        .route("/users", get(list_users).post(create_user))
        .route("/allUsers", get(list_all_users))
        .route("/users/email/{email}", get(get_user_by_email))
        // PUT takes an email, PATCH and DELETE take a store id
        .route(
            "/users/{user}",
            put(update_user).patch(patch_user).delete(delete_user),
        )
        // Presence and live sessions
        .route("/presence", get(get_presence))
        .route("/ws", get(session_ws));

    Router::new()
        .route("/", get(health_check))
        .route("/health", get(health_check))
        .nest("/v1", api)
        .with_state(state)
}

pub async fn run() -> anyhow::Result<()> {
    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        // Already set, ignore
    }

    let config = ServerConfig::from_env();

    info!("=== Linkline Server ===");
    info!("Database: {}", config.database_url);

    let db = Database::open(&config.database_url, config.max_connections)
        .await
        .context("Failed to open database")?;

    let cors = CorsLayer::new()
        .allow_origin(
            config
                .cors_origin
                .parse::<HeaderValue>()
                .context("Invalid CORS_ORIGIN")?,
        )
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true);

    let addr = config.bind_addr;
    let state = AppState::new(config, &db);

    let app = router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server running on http://{}", addr);
    axum::serve(listener, app).await?;

    db.close().await;
    Ok(())
}

async fn health_check() -> &'static str {
    "OK - Linkline Server"
}
