//! Work order transition history model.

use fleetcare_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from `work_order_history`, joined with status names.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct WorkOrderHistoryEntry {
    pub id: DbId,
    pub work_order_id: DbId,
    pub action: String,
    pub from_status: Option<String>,
    pub to_status: String,
    pub actor_user_id: Option<DbId>,
    pub created_at: Timestamp,
}
