//! Unit of Work Pattern Implementation
//!
//! Provides transactional boundaries for database operations.
//! Every unit runs at READ COMMITTED isolation and is bounded by a fixed
//! timeout; the transaction rolls back when the unit fails or times out.

use std::time::Duration;

use futures::future::BoxFuture;
use sqlx::{PgPool, Postgres, Transaction};

use crate::shared::error::AppError;

/// Transaction handle passed to units of work.
pub type Tx = Transaction<'static, Postgres>;

/// Runs closures inside timeout-bounded, read-committed transactions.
#[derive(Clone)]
pub struct TransactionManager {
    pool: PgPool,
    timeout: Duration,
}

impl TransactionManager {
    /// Create a new transaction manager.
    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }

    /// Get the underlying pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Execute a closure within a transaction.
    ///
    /// Commits when the closure succeeds. When it fails, or the whole unit
    /// exceeds the configured timeout, the transaction is dropped and
    /// therefore rolled back.
    ///
    /// # Example
    /// ```ignore
    /// let message = tx_manager.run(|tx| Box::pin(async move {
    ///     let row = sqlx::query_as::<_, MessageRow>("INSERT ... RETURNING *")
    ///         .bind(chat_id)
    ///         .fetch_one(&mut **tx)
    ///         .await?;
    ///     Ok(row.into_message())
    /// })).await?;
    /// ```
    pub async fn run<F, T>(&self, f: F) -> Result<T, AppError>
    where
        F: for<'c> FnOnce(&'c mut Tx) -> BoxFuture<'c, Result<T, AppError>> + Send,
        T: Send,
    {
        let unit = async {
            let mut tx = self.pool.begin().await?;
            sqlx::query("SET TRANSACTION ISOLATION LEVEL READ COMMITTED")
                .execute(&mut *tx)
                .await?;

            let result = f(&mut tx).await?;

            tx.commit().await?;
            Ok(result)
        };

        match tokio::time::timeout(self.timeout, unit).await {
            Ok(result) => result,
            Err(_) => Err(AppError::Timeout(format!(
                "transaction exceeded {} ms",
                self.timeout.as_millis()
            ))),
        }
    }
}
