//! Repository for the append-only `work_order_history` table.

use fleetcare_core::types::DbId;
use fleetcare_core::work_order::WorkOrderStatus;
use sqlx::{PgConnection, PgPool};

use crate::models::work_order_history::WorkOrderHistoryEntry;

/// Provides writes and reads for work order transition history.
pub struct WorkOrderHistoryRepo;

impl WorkOrderHistoryRepo {
    /// Append one history row inside the caller's transaction.
    pub async fn record(
        conn: &mut PgConnection,
        work_order_id: DbId,
        action: &str,
        from_status: Option<WorkOrderStatus>,
        to_status: WorkOrderStatus,
        actor_user_id: Option<DbId>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO work_order_history \
                (work_order_id, action, from_status_id, to_status_id, actor_user_id) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(work_order_id)
        .bind(action)
        .bind(from_status.map(WorkOrderStatus::id))
        .bind(to_status.id())
        .bind(actor_user_id)
        .execute(conn)
        .await?;
        Ok(())
    }

    /// List the history of one work order, oldest first.
    pub async fn list_for_work_order(
        pool: &PgPool,
        work_order_id: DbId,
    ) -> Result<Vec<WorkOrderHistoryEntry>, sqlx::Error> {
        sqlx::query_as::<_, WorkOrderHistoryEntry>(
            "SELECT h.id, h.work_order_id, h.action, \
                    fs.name AS from_status, ts.name AS to_status, \
                    h.actor_user_id, h.created_at \
             FROM work_order_history h \
             LEFT JOIN work_order_statuses fs ON fs.id = h.from_status_id \
             JOIN work_order_statuses ts ON ts.id = h.to_status_id \
             WHERE h.work_order_id = $1 \
             ORDER BY h.created_at ASC, h.id ASC",
        )
        .bind(work_order_id)
        .fetch_all(pool)
        .await
    }
}
