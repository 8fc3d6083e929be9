//! Chat Repository Implementation
//!
//! PostgreSQL implementation of chat and message persistence. Every
//! operation runs inside its own read-committed transaction.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgConnection;
use uuid::Uuid;

use crate::domain::{Chat, ChatRepository, ChatWithLastMessage, Message};
use crate::infrastructure::database::TransactionManager;
use crate::shared::error::AppError;

/// PostgreSQL chat repository implementation.
pub struct PgChatRepository {
    tx: TransactionManager,
}

impl PgChatRepository {
    /// Creates a new PgChatRepository on top of a transaction manager.
    pub fn new(tx: TransactionManager) -> Self {
        Self { tx }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ChatRow {
    id: Uuid,
    users: Vec<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ChatRow {
    fn into_chat(self) -> Chat {
        Chat {
            id: self.id,
            users: self.users,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Chat row joined with its latest message (if any).
#[derive(Debug, sqlx::FromRow)]
struct ChatListRow {
    id: Uuid,
    users: Vec<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    message_id: Option<Uuid>,
    message_user_id: Option<Uuid>,
    message_text: Option<String>,
    message_created_at: Option<DateTime<Utc>>,
}

impl ChatListRow {
    fn into_chat_with_last_message(self) -> ChatWithLastMessage {
        let last_message = match (
            self.message_id,
            self.message_user_id,
            self.message_text,
            self.message_created_at,
        ) {
            (Some(id), Some(user_id), Some(text), Some(created_at)) => Some(Message {
                id,
                chat_id: self.id,
                user_id,
                text,
                created_at,
            }),
            _ => None,
        };

        ChatWithLastMessage {
            chat: Chat {
                id: self.id,
                users: self.users,
                created_at: self.created_at,
                updated_at: self.updated_at,
            },
            last_message,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct MessageRow {
    id: Uuid,
    chat_id: Uuid,
    user_id: Uuid,
    text: String,
    created_at: DateTime<Utc>,
}

impl MessageRow {
    fn into_message(self) -> Message {
        Message {
            id: self.id,
            chat_id: self.chat_id,
            user_id: self.user_id,
            text: self.text,
            created_at: self.created_at,
        }
    }
}

async fn ensure_chat_exists(conn: &mut PgConnection, chat_id: Uuid) -> Result<(), AppError> {
    let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM chats WHERE id = $1)")
        .bind(chat_id)
        .fetch_one(conn)
        .await?;

    if exists {
        Ok(())
    } else {
        Err(AppError::NotFound(format!("Chat {} not found", chat_id)))
    }
}

#[async_trait]
impl ChatRepository for PgChatRepository {
    async fn create_chat(&self, user_ids: &[Uuid]) -> Result<Chat, AppError> {
        let user_ids = user_ids.to_vec();

        self.tx
            .run(|tx| {
                Box::pin(async move {
                    let id = sqlx::query_scalar::<_, Uuid>(
                        "INSERT INTO chats DEFAULT VALUES RETURNING id",
                    )
                    .fetch_one(&mut **tx)
                    .await?;

                    for user_id in &user_ids {
                        sqlx::query(
                            r#"
                            INSERT INTO chat_users (chat_id, user_id)
                            VALUES ($1, $2)
                            ON CONFLICT DO NOTHING
                            "#,
                        )
                        .bind(id)
                        .bind(user_id)
                        .execute(&mut **tx)
                        .await?;
                    }

                    let row = sqlx::query_as::<_, ChatRow>(
                        r#"
                        SELECT c.id, c.created_at, c.updated_at,
                               ARRAY(SELECT cu.user_id FROM chat_users cu
                                     WHERE cu.chat_id = c.id ORDER BY cu.user_id) AS users
                        FROM chats c
                        WHERE c.id = $1
                        "#,
                    )
                    .bind(id)
                    .fetch_one(&mut **tx)
                    .await?;

                    Ok(row.into_chat())
                })
            })
            .await
    }

    async fn find_user_chats(&self, user_id: Uuid) -> Result<Vec<ChatWithLastMessage>, AppError> {
        self.tx
            .run(|tx| {
                Box::pin(async move {
                    let rows = sqlx::query_as::<_, ChatListRow>(
                        r#"
                        SELECT c.id, c.created_at, c.updated_at,
                               ARRAY(SELECT cu2.user_id FROM chat_users cu2
                                     WHERE cu2.chat_id = c.id ORDER BY cu2.user_id) AS users,
                               m.id AS message_id,
                               m.user_id AS message_user_id,
                               m.text AS message_text,
                               m.created_at AS message_created_at
                        FROM chats c
                        JOIN chat_users cu ON cu.chat_id = c.id
                        LEFT JOIN LATERAL (
                            SELECT id, user_id, text, created_at
                            FROM messages
                            WHERE chat_id = c.id
                            ORDER BY created_at DESC
                            LIMIT 1
                        ) m ON TRUE
                        WHERE cu.user_id = $1
                        ORDER BY c.updated_at DESC
                        "#,
                    )
                    .bind(user_id)
                    .fetch_all(&mut **tx)
                    .await?;

                    Ok(rows
                        .into_iter()
                        .map(ChatListRow::into_chat_with_last_message)
                        .collect())
                })
            })
            .await
    }

    async fn create_message(&self, chat_id: Uuid, user_id: Uuid, text: &str) -> Result<Message, AppError> {
        let text = text.to_owned();

        self.tx
            .run(|tx| {
                Box::pin(async move {
                    ensure_chat_exists(&mut **tx, chat_id).await?;

                    let row = sqlx::query_as::<_, MessageRow>(
                        r#"
                        INSERT INTO messages (chat_id, user_id, text)
                        VALUES ($1, $2, $3)
                        RETURNING id, chat_id, user_id, text, created_at
                        "#,
                    )
                    .bind(chat_id)
                    .bind(user_id)
                    .bind(&text)
                    .fetch_one(&mut **tx)
                    .await?;

                    sqlx::query("UPDATE chats SET updated_at = NOW() WHERE id = $1")
                        .bind(chat_id)
                        .execute(&mut **tx)
                        .await?;

                    Ok(row.into_message())
                })
            })
            .await
    }

    async fn find_messages(&self, chat_id: Uuid, limit: i64, offset: i64) -> Result<Vec<Message>, AppError> {
        self.tx
            .run(|tx| {
                Box::pin(async move {
                    ensure_chat_exists(&mut **tx, chat_id).await?;

                    let rows = sqlx::query_as::<_, MessageRow>(
                        r#"
                        SELECT id, chat_id, user_id, text, created_at
                        FROM messages
                        WHERE chat_id = $1
                        ORDER BY created_at DESC, id DESC
                        LIMIT $2 OFFSET $3
                        "#,
                    )
                    .bind(chat_id)
                    .bind(limit)
                    .bind(offset)
                    .fetch_all(&mut **tx)
                    .await?;

                    Ok(rows.into_iter().map(MessageRow::into_message).collect())
                })
            })
            .await
    }

    async fn find_participants(&self, chat_id: Uuid) -> Result<Vec<Uuid>, AppError> {
        self.tx
            .run(|tx| {
                Box::pin(async move {
                    ensure_chat_exists(&mut **tx, chat_id).await?;

                    let users = sqlx::query_scalar::<_, Uuid>(
                        "SELECT user_id FROM chat_users WHERE chat_id = $1 ORDER BY user_id",
                    )
                    .bind(chat_id)
                    .fetch_all(&mut **tx)
                    .await?;

                    Ok(users)
                })
            })
            .await
    }
}
