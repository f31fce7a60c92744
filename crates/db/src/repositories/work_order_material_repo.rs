//! Repository for the `work_order_materials` table.
//!
//! Callers pass a [`MaterialLine`] whose `total` was computed by the cost
//! ledger; the repository never derives or accepts a total on its own.

use fleetcare_core::types::DbId;
use sqlx::PgPool;

use crate::guard::Guarded;
use crate::models::work_order_material::{MaterialLine, WorkOrderMaterial};

const COLUMNS: &str = "\
    id, work_order_id, description, quantity_needed, unit_cost, total, \
    approved, approved_by, approved_at, created_at, updated_at";

/// Provides CRUD and approval for material lines.
pub struct WorkOrderMaterialRepo;

impl WorkOrderMaterialRepo {
    /// Insert an unapproved material line.
    pub async fn create(
        pool: &PgPool,
        work_order_id: DbId,
        line: &MaterialLine,
    ) -> Result<WorkOrderMaterial, sqlx::Error> {
        let query = format!(
            "INSERT INTO work_order_materials \
                (work_order_id, description, quantity_needed, unit_cost, total, approved) \
             VALUES ($1, $2, $3, $4, $5, FALSE) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, WorkOrderMaterial>(&query)
            .bind(work_order_id)
            .bind(&line.description)
            .bind(line.quantity_needed)
            .bind(line.unit_cost)
            .bind(line.total)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<WorkOrderMaterial>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM work_order_materials WHERE id = $1");
        sqlx::query_as::<_, WorkOrderMaterial>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list_for_work_order(
        pool: &PgPool,
        work_order_id: DbId,
    ) -> Result<Vec<WorkOrderMaterial>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM work_order_materials WHERE work_order_id = $1 ORDER BY id"
        );
        sqlx::query_as::<_, WorkOrderMaterial>(&query)
            .bind(work_order_id)
            .fetch_all(pool)
            .await
    }

    /// Overwrite a material line and clear its approval.
    pub async fn update(
        pool: &PgPool,
        work_order_id: DbId,
        id: DbId,
        line: &MaterialLine,
    ) -> Result<Option<WorkOrderMaterial>, sqlx::Error> {
        let query = format!(
            "UPDATE work_order_materials SET \
                description = $3, quantity_needed = $4, unit_cost = $5, total = $6, \
                approved = FALSE, approved_by = NULL, approved_at = NULL \
             WHERE id = $1 AND work_order_id = $2 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, WorkOrderMaterial>(&query)
            .bind(id)
            .bind(work_order_id)
            .bind(&line.description)
            .bind(line.quantity_needed)
            .bind(line.unit_cost)
            .bind(line.total)
            .fetch_optional(pool)
            .await
    }

    /// Approve a material line that is not yet approved.
    pub async fn approve(
        pool: &PgPool,
        id: DbId,
        approver_id: DbId,
    ) -> Result<Guarded<WorkOrderMaterial>, sqlx::Error> {
        let query = format!(
            "UPDATE work_order_materials SET \
                approved = TRUE, approved_by = $2, approved_at = NOW() \
             WHERE id = $1 AND NOT approved \
             RETURNING {COLUMNS}"
        );
        let applied = sqlx::query_as::<_, WorkOrderMaterial>(&query)
            .bind(id)
            .bind(approver_id)
            .fetch_optional(pool)
            .await?;
        if let Some(material) = applied {
            return Ok(Guarded::Applied(material));
        }
        let current = Self::find_by_id(pool, id).await?;
        Ok(Guarded::from_attempt(None, current))
    }

    pub async fn delete(pool: &PgPool, work_order_id: DbId, id: DbId) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("DELETE FROM work_order_materials WHERE id = $1 AND work_order_id = $2")
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
        let result = sqlx::query("DELETE FROM work_order_materials WHERE work_order_id = $1")
            .bind(work_order_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
