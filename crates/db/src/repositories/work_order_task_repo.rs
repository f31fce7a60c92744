//! Repository for the `work_order_tasks` table.

use fleetcare_core::types::DbId;
use sqlx::PgPool;

use crate::models::work_order_task::{CreateWorkOrderTask, UpdateWorkOrderTask, WorkOrderTask};

const COLUMNS: &str = "\
    id, work_order_id, description, assigned_employee_id, \
    estimated_hours, is_completed, created_at, updated_at";

/// Provides CRUD operations for work order tasks.
pub struct WorkOrderTaskRepo;

impl WorkOrderTaskRepo {
    pub async fn create(
        pool: &PgPool,
        work_order_id: DbId,
        input: &CreateWorkOrderTask,
    ) -> Result<WorkOrderTask, sqlx::Error> {
        let query = format!(
            "INSERT INTO work_order_tasks \
                (work_order_id, description, assigned_employee_id, estimated_hours, is_completed) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, WorkOrderTask>(&query)
            .bind(work_order_id)
            .bind(&input.description)
            .bind(input.assigned_employee_id)
            .bind(input.estimated_hours)
            .bind(input.is_completed)
            .fetch_one(pool)
            .await
    }

    pub async fn list_for_work_order(
        pool: &PgPool,
        work_order_id: DbId,
    ) -> Result<Vec<WorkOrderTask>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM work_order_tasks WHERE work_order_id = $1 ORDER BY id"
        );
        sqlx::query_as::<_, WorkOrderTask>(&query)
            .bind(work_order_id)
            .fetch_all(pool)
            .await
    }

    /// Patch a task that belongs to `work_order_id`.
    pub async fn update(
        pool: &PgPool,
        work_order_id: DbId,
        id: DbId,
        input: &UpdateWorkOrderTask,
    ) -> Result<Option<WorkOrderTask>, sqlx::Error> {
        let query = format!(
            "UPDATE work_order_tasks SET \
                description = COALESCE($3, description), \
                assigned_employee_id = COALESCE($4, assigned_employee_id), \
                estimated_hours = COALESCE($5, estimated_hours), \
                is_completed = COALESCE($6, is_completed) \
             WHERE id = $1 AND work_order_id = $2 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, WorkOrderTask>(&query)
            .bind(id)
            .bind(work_order_id)
            .bind(&input.description)
            .bind(input.assigned_employee_id)
            .bind(input.estimated_hours)
            .bind(input.is_completed)
            .fetch_optional(pool)
            .await
    }

    pub async fn delete(pool: &PgPool, work_order_id: DbId, id: DbId) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("DELETE FROM work_order_tasks WHERE id = $1 AND work_order_id = $2")
                .bind(id)
                .bind(work_order_id)
                .execute(pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Remove every task of a work order ahead of a wholesale replace.
    pub async fn delete_for_work_order(
        pool: &PgPool,
        work_order_id: DbId,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM work_order_tasks WHERE work_order_id = $1")
            .bind(work_order_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
