//! Repository for the `work_order_evidence` table.

use fleetcare_core::types::DbId;
use sqlx::PgPool;

use crate::models::work_order_evidence::{CreateWorkOrderEvidence, WorkOrderEvidence};

const COLUMNS: &str = "id, work_order_id, file_url, description, created_at, updated_at";

/// Provides CRUD operations for evidence attachments.
pub struct WorkOrderEvidenceRepo;

impl WorkOrderEvidenceRepo {
    pub async fn create(
        pool: &PgPool,
        work_order_id: DbId,
        input: &CreateWorkOrderEvidence,
    ) -> Result<WorkOrderEvidence, sqlx::Error> {
        let query = format!(
            "INSERT INTO work_order_evidence (work_order_id, file_url, description) \
             VALUES ($1, $2, $3) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, WorkOrderEvidence>(&query)
            .bind(work_order_id)
            .bind(&input.file_url)
            .bind(&input.description)
            .fetch_one(pool)
            .await
    }

    /// Insert one evidence item only while the order holds fewer than `max`.
    ///
    /// The parent row is locked first so concurrent inserts for the same
    /// order count one at a time. Returns `None` when the order is already
    /// at the cap, and `RowNotFound` when the order does not exist.
    pub async fn create_capped(
        pool: &PgPool,
        work_order_id: DbId,
        input: &CreateWorkOrderEvidence,
        max: usize,
    ) -> Result<Option<WorkOrderEvidence>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query_scalar::<_, DbId>("SELECT id FROM work_orders WHERE id = $1 FOR UPDATE")
            .bind(work_order_id)
            .fetch_one(&mut *tx)
            .await?;

        let held: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM work_order_evidence WHERE work_order_id = $1")
                .bind(work_order_id)
                .fetch_one(&mut *tx)
                .await?;
        if held >= max as i64 {
            return Ok(None);
        }

        let query = format!(
            "INSERT INTO work_order_evidence (work_order_id, file_url, description) \
             VALUES ($1, $2, $3) \
             RETURNING {COLUMNS}"
        );
        let created = sqlx::query_as::<_, WorkOrderEvidence>(&query)
            .bind(work_order_id)
            .bind(&input.file_url)
            .bind(&input.description)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(created))
    }

    pub async fn list_for_work_order(
        pool: &PgPool,
        work_order_id: DbId,
    ) -> Result<Vec<WorkOrderEvidence>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM work_order_evidence WHERE work_order_id = $1 ORDER BY id"
        );
        sqlx::query_as::<_, WorkOrderEvidence>(&query)
            .bind(work_order_id)
            .fetch_all(pool)
            .await
    }

    pub async fn delete(pool: &PgPool, work_order_id: DbId, id: DbId) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("DELETE FROM work_order_evidence WHERE id = $1 AND work_order_id = $2")
                .bind(id)
                .bind(work_order_id)
                .execute(pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn delete_for_work_order(
        pool: &PgPool,
        work_order_id: DbId,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM work_order_evidence WHERE work_order_id = $1")
            .bind(work_order_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
