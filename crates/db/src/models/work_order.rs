//! Work order entity model, DTOs and the child-write outcome.

use fleetcare_core::cost;
use fleetcare_core::error::CoreError;
use fleetcare_core::types::{DbId, Timestamp};
use fleetcare_core::work_order::{
    failed_collections, ChildCollection, ChildFailure, WorkOrderPriority, WorkOrderStatus,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::models::reference::Vehicle;
use crate::models::work_order_evidence::{CreateWorkOrderEvidence, WorkOrderEvidence};
use crate::models::work_order_material::{CreateWorkOrderMaterial, WorkOrderMaterial};
use crate::models::work_order_task::{CreateWorkOrderTask, WorkOrderTask};

/// A row from the `work_orders` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct WorkOrder {
    pub id: DbId,
    pub diagnostic_id: Option<DbId>,
    pub vehicle_id: DbId,
    pub assigned_to_employee_id: Option<DbId>,
    pub description: String,
    #[sqlx(rename = "status_id", try_from = "i16")]
    pub status: WorkOrderStatus,
    #[sqlx(rename = "priority_id", try_from = "i16")]
    pub priority: WorkOrderPriority,
    pub estimated_cost: Option<Decimal>,
    pub actual_cost: Option<Decimal>,
    pub approved_by: Option<DbId>,
    pub approved_at: Option<Timestamp>,
    pub start_date: Option<Timestamp>,
    pub completed_date: Option<Timestamp>,
    pub validated_by: Option<DbId>,
    pub validated_at: Option<Timestamp>,
    pub activated_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a work order directly, with its child collections.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateWorkOrder {
    #[serde(alias = "vehicleId")]
    pub vehicle_id: DbId,
    #[serde(alias = "diagnosticId")]
    pub diagnostic_id: Option<DbId>,
    #[serde(alias = "assignedToEmployeeId")]
    pub assigned_to_employee_id: Option<DbId>,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub description: String,
    pub priority: Option<WorkOrderPriority>,
    #[serde(alias = "estimatedCost")]
    pub estimated_cost: Option<Decimal>,
    #[serde(default)]
    pub tasks: Vec<CreateWorkOrderTask>,
    #[serde(default)]
    pub materials: Vec<CreateWorkOrderMaterial>,
    #[serde(default)]
    pub evidence: Vec<CreateWorkOrderEvidence>,
}

/// Fully resolved values for inserting a `work_orders` row.
#[derive(Debug, Clone)]
pub struct NewWorkOrder {
    pub diagnostic_id: Option<DbId>,
    pub vehicle_id: DbId,
    pub assigned_to_employee_id: Option<DbId>,
    pub description: String,
    pub status: WorkOrderStatus,
    pub priority: WorkOrderPriority,
    pub estimated_cost: Option<Decimal>,
}

/// DTO for editing a work order.
///
/// Scalar fields are patched (`None` keeps the stored value). Each child
/// collection that is present replaces the stored collection wholesale.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateWorkOrder {
    pub description: Option<String>,
    pub priority: Option<WorkOrderPriority>,
    #[serde(alias = "assignedToEmployeeId")]
    pub assigned_to_employee_id: Option<DbId>,
    #[serde(alias = "estimatedCost")]
    pub estimated_cost: Option<Decimal>,
    #[serde(alias = "actualCost")]
    pub actual_cost: Option<Decimal>,
    pub tasks: Option<Vec<CreateWorkOrderTask>>,
    pub materials: Option<Vec<CreateWorkOrderMaterial>>,
    pub evidence: Option<Vec<CreateWorkOrderEvidence>>,
}

/// Body for `PUT /work-orders/{id}/status`.
#[derive(Debug, Clone, Deserialize)]
pub struct SetWorkOrderStatus {
    pub status: WorkOrderStatus,
}

/// Query parameters for listing work orders.
#[derive(Debug, Deserialize)]
pub struct WorkOrderListParams {
    pub status: Option<WorkOrderStatus>,
    pub vehicle_id: Option<DbId>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// A work order together with its child ledgers and material total.
#[derive(Debug, Clone, Serialize)]
pub struct WorkOrderDetail {
    #[serde(flatten)]
    pub order: WorkOrder,
    pub tasks: Vec<WorkOrderTask>,
    pub materials: Vec<WorkOrderMaterial>,
    pub evidence: Vec<WorkOrderEvidence>,
    pub materials_total: Decimal,
}

impl WorkOrderDetail {
    /// Combine an order with its children, totalling materials through the
    /// cost ledger rather than trusting stored line totals.
    pub fn assemble(
        order: WorkOrder,
        tasks: Vec<WorkOrderTask>,
        materials: Vec<WorkOrderMaterial>,
        evidence: Vec<WorkOrderEvidence>,
    ) -> Result<Self, CoreError> {
        let materials_total =
            cost::materials_total(materials.iter().map(|m| (m.quantity_needed, m.unit_cost)))?;
        Ok(Self {
            order,
            tasks,
            materials,
            evidence,
            materials_total,
        })
    }
}

/// Result of reactivating the vehicle behind a validated work order.
#[derive(Debug, Clone, Serialize)]
pub struct VehicleActivation {
    pub work_order: WorkOrder,
    pub vehicle: Vehicle,
}

/// Structured result of writing a work order and its children.
///
/// The parent row is committed before any child is written; child writes
/// are independent and a failed child never rolls back the parent or its
/// siblings. `failures` lists what the caller must repair.
#[derive(Debug, Clone, Serialize)]
pub struct WorkOrderWriteOutcome {
    pub order: WorkOrder,
    pub created_tasks: Vec<WorkOrderTask>,
    pub created_materials: Vec<WorkOrderMaterial>,
    pub created_evidence: Vec<WorkOrderEvidence>,
    /// Evidence items beyond the per-order cap that were not written.
    pub evidence_dropped: usize,
    pub failures: Vec<ChildFailure>,
}

impl WorkOrderWriteOutcome {
    /// An outcome with no child writes at all.
    pub fn parent_only(order: WorkOrder) -> Self {
        Self {
            order,
            created_tasks: Vec::new(),
            created_materials: Vec::new(),
            created_evidence: Vec::new(),
            evidence_dropped: 0,
            failures: Vec::new(),
        }
    }

    /// Whether every submitted child was written.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Distinct collections that had at least one failure.
    pub fn failed_collections(&self) -> Vec<ChildCollection> {
        failed_collections(&self.failures)
    }
}
