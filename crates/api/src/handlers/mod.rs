//! Request handlers for the maintenance workflow.
//!
//! Handlers check referenced rows exist, delegate to the repositories in
//! `fleetcare_db`, turn [`Guarded`] outcomes into 404/409 errors and
//! publish workflow events once the underlying transaction has committed.
//!
//! [`Guarded`]: fleetcare_db::Guarded

pub mod diagnostics;
pub mod reports;
pub mod work_order_children;
pub mod work_orders;

use fleetcare_core::error::CoreError;
use fleetcare_core::types::DbId;
use fleetcare_core::work_order::edit_locked;
use fleetcare_db::models::work_order::WorkOrder;
use fleetcare_db::repositories::{EmployeeRepo, UserRepo, VehicleRepo, WorkOrderRepo};
use sqlx::PgPool;

use crate::error::{AppError, AppResult};

/// Fail with 404 unless an active user with `id` exists.
pub(crate) async fn ensure_user(pool: &PgPool, id: DbId) -> AppResult<()> {
    if UserRepo::exists_active(pool, id).await? {
        Ok(())
    } else {
        Err(AppError::Core(CoreError::NotFound { entity: "User", id }))
    }
}

/// Fail with 404 unless the employee exists and is linked to an active user.
pub(crate) async fn ensure_employee(pool: &PgPool, id: DbId) -> AppResult<()> {
    if EmployeeRepo::is_linked_to_active_user(pool, id).await? {
        Ok(())
    } else {
        Err(AppError::Core(CoreError::NotFound {
            entity: "Employee",
            id,
        }))
    }
}

pub(crate) async fn ensure_vehicle(pool: &PgPool, id: DbId) -> AppResult<()> {
    if VehicleRepo::exists(pool, id).await? {
        Ok(())
    } else {
        Err(AppError::Core(CoreError::NotFound {
            entity: "Vehicle",
            id,
        }))
    }
}

/// Load a work order that still accepts child edits.
pub(crate) async fn editable_order(pool: &PgPool, id: DbId) -> AppResult<WorkOrder> {
    let order = find_order(pool, id).await?;
    if !order.status.is_editable() {
        return Err(AppError::Core(edit_locked(id, order.status)));
    }
    Ok(order)
}

pub(crate) async fn find_order(pool: &PgPool, id: DbId) -> AppResult<WorkOrder> {
    WorkOrderRepo::find_by_id(pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "WorkOrder",
            id,
        }))
}
