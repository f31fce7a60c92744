//! Repository for the `work_orders` table.
//!
//! Status changes go through [`WorkOrderRepo::transition`]: the row is locked,
//! the move is applied with a conditional `UPDATE ... WHERE status_id =
//! ANY(...)`, and a history row is appended, all in one transaction.

use fleetcare_core::types::DbId;
use fleetcare_core::vehicle::VehicleStatus;
use fleetcare_core::work_order::{WorkOrderStatus, WorkOrderTransition, EDIT_LOCKED};
use sqlx::{PgConnection, PgPool};

use crate::child_ledger::{self, ChildBatch};
use crate::guard::Guarded;
use crate::models::work_order::{
    NewWorkOrder, UpdateWorkOrder, VehicleActivation, WorkOrder, WorkOrderWriteOutcome,
};
use crate::repositories::{VehicleRepo, WorkOrderHistoryRepo};

/// Column list for `work_orders` queries.
const COLUMNS: &str = "\
    id, diagnostic_id, vehicle_id, assigned_to_employee_id, description, \
    status_id, priority_id, estimated_cost, actual_cost, \
    approved_by, approved_at, start_date, completed_date, \
    validated_by, validated_at, activated_at, created_at, updated_at";

/// History action recorded when an order is inserted.
pub const ACTION_CREATE: &str = "create";

/// History action recorded when an order's vehicle is reactivated.
pub const ACTION_ACTIVATE_VEHICLE: &str = "activate_vehicle";

/// Provides persistence and guarded transitions for work orders.
pub struct WorkOrderRepo;

impl WorkOrderRepo {
    /// Insert the parent row and its `create` history entry inside the
    /// caller's transaction.
    pub async fn insert(
        conn: &mut PgConnection,
        input: &NewWorkOrder,
        actor_user_id: Option<DbId>,
    ) -> Result<WorkOrder, sqlx::Error> {
        let query = format!(
            "INSERT INTO work_orders \
                (diagnostic_id, vehicle_id, assigned_to_employee_id, description, \
                 status_id, priority_id, estimated_cost) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {COLUMNS}"
        );
        let order = sqlx::query_as::<_, WorkOrder>(&query)
            .bind(input.diagnostic_id)
            .bind(input.vehicle_id)
            .bind(input.assigned_to_employee_id)
            .bind(&input.description)
            .bind(input.status.id())
            .bind(input.priority.id())
            .bind(input.estimated_cost)
            .fetch_one(&mut *conn)
            .await?;

        WorkOrderHistoryRepo::record(
            conn,
            order.id,
            ACTION_CREATE,
            None,
            order.status,
            actor_user_id,
        )
        .await?;
        Ok(order)
    }

    /// Create a work order and then write its children best-effort.
    ///
    /// The parent commits first. Child failures are reported in the outcome
    /// and never roll the parent back.
    pub async fn create_with_children(
        pool: &PgPool,
        input: &NewWorkOrder,
        batch: ChildBatch<'_>,
    ) -> Result<WorkOrderWriteOutcome, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let order = Self::insert(&mut *tx, input, None).await?;
        tx.commit().await?;

        tracing::info!(
            work_order_id = order.id,
            vehicle_id = order.vehicle_id,
            status = %order.status,
            "Work order created",
        );
        Ok(child_ledger::write_children(pool, order, batch).await)
    }

    /// Patch an editable order's scalar fields, then replace every child
    /// collection present in `batch`.
    ///
    /// Returns `Blocked` with the stored order when it is validated or
    /// cancelled.
    pub async fn update_with_children(
        pool: &PgPool,
        id: DbId,
        input: &UpdateWorkOrder,
        batch: ChildBatch<'_>,
    ) -> Result<Guarded<WorkOrderWriteOutcome, WorkOrder>, sqlx::Error> {
        let query = format!(
            "UPDATE work_orders SET \
                description = COALESCE($2, description), \
                priority_id = COALESCE($3, priority_id), \
                assigned_to_employee_id = COALESCE($4, assigned_to_employee_id), \
                estimated_cost = COALESCE($5, estimated_cost), \
                actual_cost = COALESCE($6, actual_cost) \
             WHERE id = $1 AND NOT (status_id = ANY($7)) \
             RETURNING {COLUMNS}"
        );
        let applied = sqlx::query_as::<_, WorkOrder>(&query)
            .bind(id)
            .bind(&input.description)
            .bind(input.priority.map(|p| p.id()))
            .bind(input.assigned_to_employee_id)
            .bind(input.estimated_cost)
            .bind(input.actual_cost)
            .bind(WorkOrderStatus::ids(EDIT_LOCKED))
            .fetch_optional(pool)
            .await?;

        match applied {
            Some(order) => {
                let outcome = child_ledger::write_children(pool, order, batch).await;
                Ok(Guarded::Applied(outcome))
            }
            None => {
                let current = Self::find_by_id(pool, id).await?;
                Ok(Guarded::from_attempt(None, current))
            }
        }
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<WorkOrder>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM work_orders WHERE id = $1");
        sqlx::query_as::<_, WorkOrder>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List work orders with optional status and vehicle filters, newest first.
    pub async fn list_filtered(
        pool: &PgPool,
        status: Option<WorkOrderStatus>,
        vehicle_id: Option<DbId>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<WorkOrder>, sqlx::Error> {
        let mut conditions: Vec<String> = Vec::new();
        let mut param_idx: usize = 1;

        if status.is_some() {
            conditions.push(format!("status_id = ${param_idx}"));
            param_idx += 1;
        }
        if vehicle_id.is_some() {
            conditions.push(format!("vehicle_id = ${param_idx}"));
            param_idx += 1;
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let query = format!(
            "SELECT {COLUMNS} FROM work_orders {where_clause} \
             ORDER BY created_at DESC, id DESC \
             LIMIT ${param_idx} OFFSET ${}",
            param_idx + 1
        );

        let mut q = sqlx::query_as::<_, WorkOrder>(&query);
        if let Some(s) = status {
            q = q.bind(s.id());
        }
        if let Some(vid) = vehicle_id {
            q = q.bind(vid);
        }
        q.bind(limit).bind(offset).fetch_all(pool).await
    }

    /// Delete a work order; children and history cascade.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM work_orders WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Apply a guarded status transition.
    ///
    /// `actor_user_id` is stamped as approver or validator for the
    /// transitions that carry one and is recorded in history for all.
    /// Approving also puts the order's vehicle in the shop.
    pub async fn transition(
        pool: &PgPool,
        id: DbId,
        transition: WorkOrderTransition,
        actor_user_id: Option<DbId>,
    ) -> Result<Guarded<WorkOrder>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let current = match Self::lock(&mut *tx, id).await? {
            None => return Ok(Guarded::Missing),
            Some(order) if !transition.applies_to(order.status) => {
                return Ok(Guarded::Blocked(order));
            }
            Some(order) => order,
        };

        let (assignments, stamps_actor) = match transition {
            WorkOrderTransition::Submit | WorkOrderTransition::Cancel => ("status_id = $2", false),
            WorkOrderTransition::Approve => (
                "status_id = $2, approved_by = $4, approved_at = NOW(), start_date = NOW()",
                true,
            ),
            WorkOrderTransition::Complete => (
                "status_id = $2, completed_date = COALESCE(completed_date, NOW())",
                false,
            ),
            WorkOrderTransition::Validate => (
                "status_id = $2, validated_by = $4, validated_at = NOW()",
                true,
            ),
        };
        let query = format!(
            "UPDATE work_orders SET {assignments} \
             WHERE id = $1 AND status_id = ANY($3) \
             RETURNING {COLUMNS}"
        );
        let mut q = sqlx::query_as::<_, WorkOrder>(&query)
            .bind(id)
            .bind(transition.target().id())
            .bind(transition.source_ids());
        if stamps_actor {
            q = q.bind(actor_user_id);
        }
        let Some(order) = q.fetch_optional(&mut *tx).await? else {
            return Ok(Guarded::Blocked(current));
        };

        if transition == WorkOrderTransition::Approve {
            VehicleRepo::set_status(&mut *tx, order.vehicle_id, VehicleStatus::InShop).await?;
        }

        WorkOrderHistoryRepo::record(
            &mut *tx,
            id,
            transition.name(),
            Some(current.status),
            order.status,
            actor_user_id,
        )
        .await?;

        tx.commit().await?;
        Ok(Guarded::Applied(order))
    }

    /// Reactivate the vehicle of a validated order exactly once.
    ///
    /// The one-time marker `activated_at` is set by a conditional update in
    /// the same transaction that flips the vehicle, so a second call finds
    /// the marker set and returns `Blocked`.
    pub async fn activate_vehicle(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Guarded<VehicleActivation, WorkOrder>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "UPDATE work_orders SET activated_at = NOW() \
             WHERE id = $1 AND status_id = $2 AND activated_at IS NULL \
             RETURNING {COLUMNS}"
        );
        let applied = sqlx::query_as::<_, WorkOrder>(&query)
            .bind(id)
            .bind(WorkOrderStatus::Validated.id())
            .fetch_optional(&mut *tx)
            .await?;
        let Some(work_order) = applied else {
            drop(tx);
            let current = Self::find_by_id(pool, id).await?;
            return Ok(Guarded::from_attempt(None, current));
        };

        let vehicle =
            VehicleRepo::set_status(&mut *tx, work_order.vehicle_id, VehicleStatus::Active)
                .await?
                .ok_or(sqlx::Error::RowNotFound)?;

        WorkOrderHistoryRepo::record(
            &mut *tx,
            id,
            ACTION_ACTIVATE_VEHICLE,
            Some(work_order.status),
            work_order.status,
            None,
        )
        .await?;

        tx.commit().await?;
        Ok(Guarded::Applied(VehicleActivation { work_order, vehicle }))
    }

    async fn lock(conn: &mut PgConnection, id: DbId) -> Result<Option<WorkOrder>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM work_orders WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, WorkOrder>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }
}
