//! # Configuration Module
//!
//! Settings are layered, later sources overriding earlier ones:
//! - built-in defaults
//! - `config/default.toml`, then `config/{RUN_ENV}.toml`
//! - `APP__`-prefixed environment variables (`APP__WEBSOCKET__PING_INTERVAL_MS`)
//! - `SERVER_HOST`, `SERVER_PORT`, `DATABASE_URL` and `JWT_SECRET`
//!
//! A `.env` file is read first when present.
//!
//! ```rust,ignore
//! use platform_service::config::Settings;
//!
//! let settings = Settings::load()?;
//! let queue = settings.websocket.outbound_queue_capacity;
//! ```

mod settings;

pub use settings::*;
