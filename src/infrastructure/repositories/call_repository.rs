//! Call Repository Implementation
//!
//! PostgreSQL implementation of calls, participants and transcripts.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgConnection;
use uuid::Uuid;

use crate::domain::{
    Call, CallParticipant, CallRepository, CallStatus, CallWithTranscript, TranscriptEntry,
};
use crate::infrastructure::database::TransactionManager;
use crate::shared::error::AppError;

/// PostgreSQL call repository implementation.
pub struct PgCallRepository {
    tx: TransactionManager,
}

impl PgCallRepository {
    pub fn new(tx: TransactionManager) -> Self {
        Self { tx }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CallRow {
    id: Uuid,
    status: String,
    created_at: DateTime<Utc>,
    ended_at: Option<DateTime<Utc>>,
}

impl CallRow {
    fn into_call(self, participants: Vec<CallParticipant>) -> Call {
        Call {
            id: self.id,
            participants,
            created_at: self.created_at,
            ended_at: self.ended_at,
            status: CallStatus::from_str(&self.status),
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ParticipantRow {
    user_id: Uuid,
    description: String,
    avatar: Option<String>,
}

impl ParticipantRow {
    fn into_participant(self) -> CallParticipant {
        CallParticipant {
            id: self.user_id,
            description: self.description,
            avatar: self.avatar,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct TranscriptRow {
    user_id: Uuid,
    description: String,
    avatar: Option<String>,
    text: String,
    created_at: DateTime<Utc>,
}

impl TranscriptRow {
    fn into_entry(self) -> TranscriptEntry {
        TranscriptEntry {
            user: CallParticipant {
                id: self.user_id,
                description: self.description,
                avatar: self.avatar,
            },
            text: self.text,
            timestamp: self.created_at,
        }
    }
}

async fn ensure_call_exists(conn: &mut PgConnection, call_id: Uuid) -> Result<(), AppError> {
    let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM calls WHERE id = $1)")
        .bind(call_id)
        .fetch_one(conn)
        .await?;

    if exists {
        Ok(())
    } else {
        Err(AppError::NotFound(format!("Call {} not found", call_id)))
    }
}

async fn load_participants(
    conn: &mut PgConnection,
    call_id: Uuid,
) -> Result<Vec<CallParticipant>, AppError> {
    let rows = sqlx::query_as::<_, ParticipantRow>(
        r#"
        SELECT cp.user_id, COALESCE(p.description, '') AS description, p.avatar
        FROM call_participants cp
        LEFT JOIN profiles p ON p.guid = cp.user_id
        WHERE cp.call_id = $1
        ORDER BY cp.user_id
        "#,
    )
    .bind(call_id)
    .fetch_all(conn)
    .await?;

    Ok(rows.into_iter().map(ParticipantRow::into_participant).collect())
}

async fn load_transcript(
    conn: &mut PgConnection,
    call_id: Uuid,
) -> Result<Vec<TranscriptEntry>, AppError> {
    let rows = sqlx::query_as::<_, TranscriptRow>(
        r#"
        SELECT t.user_id, COALESCE(p.description, '') AS description, p.avatar,
               t.text, t.created_at
        FROM call_transcripts t
        LEFT JOIN profiles p ON p.guid = t.user_id
        WHERE t.call_id = $1
        ORDER BY t.created_at ASC
        "#,
    )
    .bind(call_id)
    .fetch_all(conn)
    .await?;

    Ok(rows.into_iter().map(TranscriptRow::into_entry).collect())
}

#[async_trait]
impl CallRepository for PgCallRepository {
    async fn create_call(&self, participant_ids: &[Uuid]) -> Result<Call, AppError> {
        let participant_ids = participant_ids.to_vec();

        self.tx
            .run(|tx| {
                Box::pin(async move {
                    let row = sqlx::query_as::<_, CallRow>(
                        r#"
                        INSERT INTO calls (status) VALUES ('active')
                        RETURNING id, status, created_at, ended_at
                        "#,
                    )
                    .fetch_one(&mut **tx)
                    .await?;

                    for user_id in &participant_ids {
                        sqlx::query(
                            r#"
                            INSERT INTO call_participants (call_id, user_id)
                            VALUES ($1, $2)
                            ON CONFLICT DO NOTHING
                            "#,
                        )
                        .bind(row.id)
                        .bind(user_id)
                        .execute(&mut **tx)
                        .await?;
                    }

                    let participants = load_participants(&mut **tx, row.id).await?;
                    Ok(row.into_call(participants))
                })
            })
            .await
    }

    async fn find_participants(&self, call_id: Uuid) -> Result<Vec<CallParticipant>, AppError> {
        self.tx
            .run(|tx| {
                Box::pin(async move {
                    ensure_call_exists(&mut **tx, call_id).await?;
                    load_participants(&mut **tx, call_id).await
                })
            })
            .await
    }

    async fn add_transcript(&self, call_id: Uuid, user_id: Uuid, text: &str) -> Result<(), AppError> {
        let text = text.to_owned();

        self.tx
            .run(|tx| {
                Box::pin(async move {
                    ensure_call_exists(&mut **tx, call_id).await?;

                    sqlx::query(
                        "INSERT INTO call_transcripts (call_id, user_id, text) VALUES ($1, $2, $3)",
                    )
                    .bind(call_id)
                    .bind(user_id)
                    .bind(&text)
                    .execute(&mut **tx)
                    .await?;

                    Ok(())
                })
            })
            .await
    }

    async fn end_call(&self, call_id: Uuid) -> Result<(), AppError> {
        self.tx
            .run(|tx| {
                Box::pin(async move {
                    let result = sqlx::query(
                        r#"
                        UPDATE calls
                        SET status = 'ended', ended_at = COALESCE(ended_at, NOW())
                        WHERE id = $1
                        "#,
                    )
                    .bind(call_id)
                    .execute(&mut **tx)
                    .await?;

                    if result.rows_affected() == 0 {
                        return Err(AppError::NotFound(format!("Call {} not found", call_id)));
                    }

                    Ok(())
                })
            })
            .await
    }

    async fn find_call_history(
        &self,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<CallWithTranscript>, AppError> {
        self.tx
            .run(|tx| {
                Box::pin(async move {
                    let calls = sqlx::query_as::<_, CallRow>(
                        r#"
                        SELECT c.id, c.status, c.created_at, c.ended_at
                        FROM calls c
                        JOIN call_participants cp ON cp.call_id = c.id
                        WHERE cp.user_id = $1
                        ORDER BY c.created_at DESC
                        LIMIT $2 OFFSET $3
                        "#,
                    )
                    .bind(user_id)
                    .bind(limit)
                    .bind(offset)
                    .fetch_all(&mut **tx)
                    .await?;

                    let mut history = Vec::with_capacity(calls.len());
                    for row in calls {
                        let participants = load_participants(&mut **tx, row.id).await?;
                        let transcript = load_transcript(&mut **tx, row.id).await?;
                        history.push(CallWithTranscript {
                            call: row.into_call(participants),
                            transcript,
                        });
                    }

                    Ok(history)
                })
            })
            .await
    }
}
