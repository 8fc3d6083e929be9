//! Application settings and configuration structures.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::time::Duration;

/// Root configuration structure containing all application settings.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Server configuration (host, port)
    pub server: ServerSettings,

    /// Database configuration (PostgreSQL)
    pub database: DatabaseSettings,

    /// JWT authentication settings
    pub jwt: JwtSettings,

    /// CORS configuration
    pub cors: CorsSettings,

    /// Real-time connection configuration
    pub websocket: WebSocketSettings,

    /// Log output format ("pretty" or "json")
    pub log_format: String,

    /// Current environment (development, staging, production)
    pub environment: String,
}

/// Server binding configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    /// Host address to bind to (e.g., "0.0.0.0")
    pub host: String,

    /// Port number to listen on
    pub port: u16,
}

/// PostgreSQL database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    /// Database connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections to maintain
    pub min_connections: u32,

    /// Connection acquire timeout in seconds
    pub acquire_timeout: u64,

    /// Upper bound for a single transaction, in milliseconds
    pub tx_timeout_ms: u64,
}

/// JWT authentication configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtSettings {
    /// Secret key for signing access tokens
    pub secret: String,

    /// Access token expiry in minutes
    pub access_token_expiry_minutes: i64,
}

/// CORS configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CorsSettings {
    /// Allowed origins (comma-separated in env)
    pub allowed_origins: Vec<String>,
}

/// Real-time connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct WebSocketSettings {
    /// Capacity of each connection's outbound queue. A full queue evicts the
    /// connection.
    pub outbound_queue_capacity: usize,

    /// Maximum inbound message size in bytes
    pub max_message_size: usize,

    /// Interval between server pings in milliseconds
    pub ping_interval_ms: u64,

    /// Number of ping intervals without inbound traffic tolerated before the
    /// connection is closed
    pub missed_pong_threshold: u32,

    /// Broadcast chat messages and transcripts even when persisting them failed
    pub broadcast_on_persist_failure: bool,

    /// Keep call rooms registered while empty until the call ends
    pub retain_empty_call_rooms: bool,
}

impl Default for WebSocketSettings {
    fn default() -> Self {
        Self {
            outbound_queue_capacity: 256,
            max_message_size: 65536,
            ping_interval_ms: 30_000,
            missed_pong_threshold: 2,
            broadcast_on_persist_failure: false,
            retain_empty_call_rooms: false,
        }
    }
}

impl WebSocketSettings {
    /// Interval between keepalive pings.
    pub fn ping_interval(&self) -> Duration {
        Duration::from_millis(self.ping_interval_ms)
    }

    /// How long a connection may stay silent before it is considered dead.
    pub fn idle_timeout(&self) -> Duration {
        self.ping_interval()
            .saturating_mul(self.missed_pong_threshold.saturating_add(1))
    }
}

/// Upper bound for `websocket.ping_interval_ms` (one hour).
pub const MAX_PING_INTERVAL_MS: u64 = 3_600_000;

/// Upper bound for `websocket.missed_pong_threshold`.
pub const MAX_MISSED_PONG_THRESHOLD: u32 = 100;

/// Minimum required length for JWT secret (256 bits = 32 bytes)
pub const MIN_JWT_SECRET_LENGTH: usize = 32;

impl Settings {
    /// Load settings from environment variables and configuration files.
    ///
    /// The loading order is:
    /// 1. config/default.toml (base configuration)
    /// 2. config/{RUN_ENV}.toml (environment-specific overrides)
    /// 3. Environment variables (highest priority)
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if configuration cannot be loaded or parsed,
    /// or if JWT secret is too short.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let environment = std::env::var("RUN_ENV").unwrap_or_else(|_| "development".into());

        Config::builder()
            .set_default("environment", environment.clone())?
            .set_default("log_format", "pretty")?
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("database.acquire_timeout", 30)?
            .set_default("database.tx_timeout_ms", 10_000_i64)?
            .set_default("jwt.access_token_expiry_minutes", 60)?
            .set_default("cors.allowed_origins", vec!["http://localhost:3000"])?
            .set_default("websocket.outbound_queue_capacity", 256_i64)?
            .set_default("websocket.max_message_size", 65536_i64)? // 64KB
            .set_default("websocket.ping_interval_ms", 30_000_i64)?
            .set_default("websocket.missed_pong_threshold", 2_i64)?
            .set_default("websocket.broadcast_on_persist_failure", false)?
            .set_default("websocket.retain_empty_call_rooms", false)?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // APP__SERVER__PORT=8080 -> server.port = 8080
            .add_source(
                Environment::default()
                    .prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("server.host", std::env::var("SERVER_HOST").ok())?
            .set_override_option("server.port", std::env::var("SERVER_PORT").ok())?
            .set_override_option("database.url", std::env::var("DATABASE_URL").ok())?
            .set_override_option("jwt.secret", std::env::var("JWT_SECRET").ok())?
            .build()?
            .try_deserialize()
            .and_then(|settings: Self| settings.validate())
    }

    /// Reject configurations the server cannot run safely with.
    pub fn validate(self) -> Result<Self, ConfigError> {
        if self.jwt.secret.len() < MIN_JWT_SECRET_LENGTH {
            return Err(ConfigError::Message(format!(
                "JWT secret must be at least {} characters for security. Current length: {}",
                MIN_JWT_SECRET_LENGTH,
                self.jwt.secret.len()
            )));
        }
        if self.websocket.outbound_queue_capacity == 0 {
            return Err(ConfigError::Message(
                "websocket.outbound_queue_capacity must be greater than zero".into(),
            ));
        }
        if self.websocket.ping_interval_ms == 0
            || self.websocket.ping_interval_ms > MAX_PING_INTERVAL_MS
        {
            return Err(ConfigError::Message(format!(
                "websocket.ping_interval_ms must be between 1 and {}",
                MAX_PING_INTERVAL_MS
            )));
        }
        if self.websocket.missed_pong_threshold > MAX_MISSED_PONG_THRESHOLD {
            return Err(ConfigError::Message(format!(
                "websocket.missed_pong_threshold must be at most {}",
                MAX_MISSED_PONG_THRESHOLD
            )));
        }
        Ok(self)
    }

    /// Get the full server address as a string.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl DatabaseSettings {
    /// Transaction timeout as a duration.
    pub fn tx_timeout(&self) -> Duration {
        Duration::from_millis(self.tx_timeout_ms)
    }
}
