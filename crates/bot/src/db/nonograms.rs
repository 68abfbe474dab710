//! Postgres-backed [`NonogramRepository`].
//!
//! Status changes are compare-and-swap updates guarded by
//! `status = 'pending'`; approval runs the update and the approved insert in
//! one transaction so two concurrent reviewers cannot both win.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use nonogram_relay_core::{
    ApprovedFields, ApprovedNonogram, NewApprovedNonogram, NonogramFields, NonogramStatus,
    PendingNonogram, PuzzleId,
};
use serde_json::Value;
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use tracing::{debug, instrument};

use super::{NonogramRepository, RepositoryError};

/// Repository over the `pending_nonograms` and `approved_nonograms` tables.
#[derive(Debug, Clone)]
pub struct PgNonogramRepository {
    pool: PgPool,
}

impl PgNonogramRepository {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Current status of a pending record, used to explain a guard miss.
    async fn status_of(&self, id: &PuzzleId) -> Result<Option<NonogramStatus>, RepositoryError> {
        let row = sqlx::query("SELECT status FROM pending_nonograms WHERE id = $1")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| parse_status(&row)).transpose()
    }

    async fn guard_miss(&self, id: &PuzzleId) -> RepositoryError {
        match self.status_of(id).await {
            Ok(Some(status)) => RepositoryError::NotPending(status),
            Ok(None) => RepositoryError::NotFound,
            Err(e) => e,
        }
    }
}

#[async_trait]
impl NonogramRepository for PgNonogramRepository {
    #[instrument(skip(self), fields(puzzle_id = %id))]
    async fn get_pending(&self, id: &PuzzleId) -> Result<Option<PendingNonogram>, RepositoryError> {
        let row = sqlx::query("SELECT status, data FROM pending_nonograms WHERE id = $1")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| {
            let data: Json<Value> = row.try_get("data")?;
            let fields = NonogramFields::from_document(data.0)
                .map_err(|e| RepositoryError::DataCorruption(format!("pending {id}: {e}")))?;

            Ok(PendingNonogram {
                id: id.clone(),
                status: parse_status(&row)?,
                fields,
            })
        })
        .transpose()
    }

    #[instrument(skip(self), fields(puzzle_id = %id))]
    async fn get_approved(
        &self,
        id: &PuzzleId,
    ) -> Result<Option<ApprovedNonogram>, RepositoryError> {
        let row = sqlx::query("SELECT data, approved_at FROM approved_nonograms WHERE id = $1")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| {
            let data: Json<Value> = row.try_get("data")?;
            let fields: ApprovedFields = serde_json::from_value(data.0)
                .map_err(|e| RepositoryError::DataCorruption(format!("approved {id}: {e}")))?;
            let approved_at: DateTime<Utc> = row.try_get("approved_at")?;

            Ok(ApprovedNonogram {
                id: id.clone(),
                fields,
                approved_at,
            })
        })
        .transpose()
    }

    #[instrument(skip(self, approved), fields(puzzle_id = %approved.id))]
    async fn approve(
        &self,
        approved: NewApprovedNonogram,
    ) -> Result<ApprovedNonogram, RepositoryError> {
        let document = approved
            .fields
            .to_document()
            .map_err(|e| RepositoryError::DataCorruption(e.to_string()))?;

        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            r"
            UPDATE pending_nonograms
            SET status = 'approved', updated_at = now()
            WHERE id = $1 AND status = 'pending'
            ",
        )
        .bind(approved.id.as_str())
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(self.guard_miss(&approved.id).await);
        }

        let row = sqlx::query(
            r"
            INSERT INTO approved_nonograms (id, data)
            VALUES ($1, $2)
            RETURNING approved_at
            ",
        )
        .bind(approved.id.as_str())
        .bind(Json(&document))
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                RepositoryError::Conflict(format!("approved copy of {} already exists", approved.id))
            }
            other => RepositoryError::Database(other),
        })?;
        let approved_at: DateTime<Utc> = row.try_get("approved_at")?;

        tx.commit().await?;

        debug!("Nonogram approved in store");

        Ok(ApprovedNonogram {
            id: approved.id,
            fields: approved.fields,
            approved_at,
        })
    }

    #[instrument(skip(self), fields(puzzle_id = %id))]
    async fn reject(&self, id: &PuzzleId) -> Result<(), RepositoryError> {
        let updated = sqlx::query(
            r"
            UPDATE pending_nonograms
            SET status = 'rejected', updated_at = now()
            WHERE id = $1 AND status = 'pending'
            ",
        )
        .bind(id.as_str())
        .execute(&self.pool)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(self.guard_miss(id).await);
        }

        debug!("Nonogram rejected in store");

        Ok(())
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

fn parse_status(row: &PgRow) -> Result<NonogramStatus, RepositoryError> {
    let status: String = row.try_get("status")?;
    status
        .parse()
        .map_err(|_| RepositoryError::DataCorruption(format!("unknown status {status:?}")))
}
