//! Repository Implementations
//!
//! PostgreSQL implementations of the domain repository traits. Together they
//! form the persistence gateway of the messaging subsystem.
//!
//! ## Available Repositories
//!
//! - **ChatRepository** - Chats, participants and messages
//! - **CallRepository** - Calls, participants and transcripts
//! - **ProfileRepository** - Profile display fields
//!
//! ## Usage Example
//!
//! ```rust,ignore
//! use platform_service::infrastructure::database::TransactionManager;
//! use platform_service::infrastructure::repositories::Repositories;
//!
//! let tx = TransactionManager::new(pool, settings.database.tx_timeout());
//! let repos = Repositories::postgres(tx);
//! ```

pub mod call_repository;
pub mod chat_repository;
pub mod profile_repository;

use std::sync::Arc;

use crate::domain::{CallRepository, ChatRepository, ProfileRepository};
use crate::infrastructure::database::TransactionManager;

pub use call_repository::PgCallRepository;
pub use chat_repository::PgChatRepository;
pub use profile_repository::PgProfileRepository;

/// Repository handles shared by services and the real-time layer.
#[derive(Clone)]
pub struct Repositories {
    pub chats: Arc<dyn ChatRepository>,
    pub calls: Arc<dyn CallRepository>,
    pub profiles: Arc<dyn ProfileRepository>,
}

impl Repositories {
    /// Build the PostgreSQL-backed repositories.
    pub fn postgres(tx: TransactionManager) -> Self {
        Self {
            chats: Arc::new(PgChatRepository::new(tx.clone())),
            calls: Arc::new(PgCallRepository::new(tx.clone())),
            profiles: Arc::new(PgProfileRepository::new(tx)),
        }
    }
}
