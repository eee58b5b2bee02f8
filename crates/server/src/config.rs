//! Server configuration and shared handler state

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::warn;

use crate::connections::ConnectionManager;
use crate::presence::PresenceRegistry;
use crate::relay::Relay;
use crate::store::{Database, UserStore};

const DEFAULT_PORT: u16 = 5000;

fn env_or(key: &str, fallback: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| fallback.to_string())
}

/// Configuration for the Linkline server
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// SQLite connection string
    pub database_url: String,
    /// Address the HTTP listener binds to
    pub bind_addr: SocketAddr,
    /// Origin allowed by CORS (credentials included)
    pub cors_origin: String,
    /// Upper bound of the SQLite pool
    pub max_connections: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        let host = env_or("HOST", "0.0.0.0");
        let port = std::env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_PORT);
        let bind_addr = format!("{}:{}", host, port).parse().unwrap_or_else(|e| {
            warn!("Invalid HOST {:?} ({}), binding all interfaces", host, e);
            SocketAddr::from(([0, 0, 0, 0], port))
        });

        Self {
            database_url: env_or("DATABASE_URL", "sqlite:linkline.sqlite"),
            bind_addr,
            cors_origin: env_or("CORS_ORIGIN", "http://localhost:3000"),
            max_connections: std::env::var("DB_MAX_CONNECTIONS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(5),
        }
    }
}

impl ServerConfig {
    /// Load `.env` if there is one, then read the environment.
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();
        Self::default()
    }

    /// Config pointing at a specific database, everything else default
    pub fn with_database_url(url: impl Into<String>) -> Self {
        Self {
            database_url: url.into(),
            ..Self::default()
        }
    }
}

/// App state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: ServerConfig,
    pub users: UserStore,
    pub connections: ConnectionManager,
    pub relay: Arc<Relay>,
    pub presence: Arc<PresenceRegistry>,
}

impl AppState {
    /// Wire the stores, the connection manager and the relay around a fresh
    /// (empty) presence registry.
    pub fn new(config: ServerConfig, db: &Database) -> Self {
        let presence = Arc::new(PresenceRegistry::new());
        let relay = Arc::new(Relay::new(db.messages(), presence.clone()));

        Self {
            config,
            users: db.users(),
            connections: ConnectionManager::new(db.connections(), db.users()),
            relay,
            presence,
        }
    }
}
