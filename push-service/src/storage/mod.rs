//! Persistence collaborators.
//!
//! The engine reads destinations, evicts the ones a push service reports
//! gone, and appends one log row per dispatch. Schema ownership lives with
//! the registration subsystem; this module only issues the queries the
//! engine needs, behind traits so tests can substitute an in-memory store.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{Destination, DispatchRecord};

/// Read and evict registered destinations.
#[async_trait]
pub trait DestinationStore: Send + Sync {
    /// All registered destinations.
    async fn list_all(&self) -> Result<Vec<Destination>>;

    /// The destination owned by one user, if any (test sends).
    async fn find_for_user(&self, user_id: Uuid) -> Result<Option<Destination>>;

    /// Remove destinations confirmed dead. Returns the number removed.
    async fn delete_by_ids(&self, ids: &[Uuid]) -> Result<u64>;
}

/// Append-only log of dispatch outcomes.
#[async_trait]
pub trait DispatchLog: Send + Sync {
    async fn record(&self, record: &DispatchRecord) -> Result<()>;
}

/// Postgres-backed store for destinations and the dispatch log.
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl DestinationStore for PgStore {
    async fn list_all(&self) -> Result<Vec<Destination>> {
        let destinations = sqlx::query_as::<_, Destination>(
            r#"
            SELECT id, user_id, endpoint, p256dh, auth, created_at
            FROM push_destinations
            ORDER BY created_at
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(destinations)
    }

    async fn find_for_user(&self, user_id: Uuid) -> Result<Option<Destination>> {
        let destination = sqlx::query_as::<_, Destination>(
            r#"
            SELECT id, user_id, endpoint, p256dh, auth, created_at
            FROM push_destinations
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(destination)
    }

    async fn delete_by_ids(&self, ids: &[Uuid]) -> Result<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let result = sqlx::query("DELETE FROM push_destinations WHERE id = ANY($1)")
            .bind(ids)
            .execute(&self.db)
            .await?;

        tracing::info!(
            removed = result.rows_affected(),
            "evicted dead push destinations"
        );
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl DispatchLog for PgStore {
    async fn record(&self, record: &DispatchRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO push_dispatch_log (
                title, body, successful, failed, total, sent_by, is_test, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(&record.title)
        .bind(&record.body)
        .bind(record.successful)
        .bind(record.failed)
        .bind(record.total)
        .bind(record.sent_by)
        .bind(record.is_test)
        .bind(record.created_at)
        .execute(&self.db)
        .await
        .map_err(AppError::from)?;

        Ok(())
    }
}
