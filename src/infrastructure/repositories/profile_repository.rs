//! Profile Repository Implementation
//!
//! Read-only access to the profile display fields.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Profile, ProfileRepository};
use crate::infrastructure::database::TransactionManager;
use crate::shared::error::AppError;

/// PostgreSQL profile repository implementation.
pub struct PgProfileRepository {
    tx: TransactionManager,
}

impl PgProfileRepository {
    pub fn new(tx: TransactionManager) -> Self {
        Self { tx }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ProfileRow {
    guid: Uuid,
    description: String,
    avatar: Option<String>,
}

#[async_trait]
impl ProfileRepository for PgProfileRepository {
    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<Profile>, AppError> {
        self.tx
            .run(|tx| {
                Box::pin(async move {
                    let row = sqlx::query_as::<_, ProfileRow>(
                        "SELECT guid, description, avatar FROM profiles WHERE guid = $1",
                    )
                    .bind(user_id)
                    .fetch_optional(&mut **tx)
                    .await?;

                    Ok(row.map(|r| Profile {
                        id: r.guid,
                        description: r.description,
                        avatar: r.avatar,
                    }))
                })
            })
            .await
    }
}
