//! Work order task model and DTOs.

use fleetcare_core::types::{DbId, Timestamp};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A row from the `work_order_tasks` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct WorkOrderTask {
    pub id: DbId,
    pub work_order_id: DbId,
    pub description: String,
    pub assigned_employee_id: Option<DbId>,
    pub estimated_hours: Option<Decimal>,
    pub is_completed: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for adding a task to a work order.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateWorkOrderTask {
    #[validate(length(min = 1, message = "must not be empty"))]
    pub description: String,
    #[serde(alias = "assignedEmployeeId")]
    pub assigned_employee_id: Option<DbId>,
    #[serde(alias = "estimatedHours")]
    pub estimated_hours: Option<Decimal>,
    #[serde(default, alias = "isCompleted")]
    pub is_completed: bool,
}

/// DTO for patching a task.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateWorkOrderTask {
    pub description: Option<String>,
    #[serde(alias = "assignedEmployeeId")]
    pub assigned_employee_id: Option<DbId>,
    #[serde(alias = "estimatedHours")]
    pub estimated_hours: Option<Decimal>,
    #[serde(alias = "isCompleted")]
    pub is_completed: Option<bool>,
}
