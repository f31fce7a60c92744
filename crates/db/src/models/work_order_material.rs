//! Work order material model and DTOs.
//!
//! `total` is never accepted from a client: it is recomputed with the cost
//! ledger on every insert and update.

use fleetcare_core::cost;
use fleetcare_core::error::CoreError;
use fleetcare_core::types::{DbId, Timestamp};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A row from the `work_order_materials` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct WorkOrderMaterial {
    pub id: DbId,
    pub work_order_id: DbId,
    pub description: String,
    pub quantity_needed: Decimal,
    pub unit_cost: Decimal,
    pub total: Decimal,
    pub approved: bool,
    pub approved_by: Option<DbId>,
    pub approved_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for adding a material line to a work order.
///
/// A client-supplied `total` is accepted for compatibility and ignored.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateWorkOrderMaterial {
    #[validate(length(min = 1, message = "must not be empty"))]
    pub description: String,
    #[serde(alias = "quantityNeeded")]
    #[validate(custom(function = "fleetcare_core::cost::validate_quantity"))]
    pub quantity_needed: Decimal,
    #[serde(alias = "unitCost")]
    #[validate(custom(function = "fleetcare_core::cost::validate_amount"))]
    pub unit_cost: Decimal,
    pub total: Option<Decimal>,
}

/// DTO for patching a material line.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateWorkOrderMaterial {
    pub description: Option<String>,
    #[serde(alias = "quantityNeeded")]
    pub quantity_needed: Option<Decimal>,
    #[serde(alias = "unitCost")]
    pub unit_cost: Option<Decimal>,
    pub total: Option<Decimal>,
}

/// Resolved values written for a material line.
#[derive(Debug, Clone)]
pub struct MaterialLine {
    pub description: String,
    pub quantity_needed: Decimal,
    pub unit_cost: Decimal,
    pub total: Decimal,
}

impl MaterialLine {
    /// Validate a new material and compute its total.
    ///
    /// Quantity and unit cost are rounded to their column scales first, so
    /// the stored `total` equals the stored `quantity_needed * unit_cost`.
    pub fn from_create(input: &CreateWorkOrderMaterial) -> Result<Self, CoreError> {
        let rounded = CreateWorkOrderMaterial {
            description: input.description.clone(),
            quantity_needed: cost::round_quantity(input.quantity_needed),
            unit_cost: cost::round_currency(input.unit_cost),
            total: None,
        };
        rounded.validate()?;
        Ok(Self {
            total: cost::line_total(rounded.quantity_needed, rounded.unit_cost)?,
            description: rounded.description,
            quantity_needed: rounded.quantity_needed,
            unit_cost: rounded.unit_cost,
        })
    }

    /// Merge a patch over the stored line, re-validate, and recompute the
    /// total from the merged quantity and unit cost.
    pub fn merged(
        current: &WorkOrderMaterial,
        patch: &UpdateWorkOrderMaterial,
    ) -> Result<Self, CoreError> {
        let merged = CreateWorkOrderMaterial {
            description: patch
                .description
                .clone()
                .unwrap_or_else(|| current.description.clone()),
            quantity_needed: patch.quantity_needed.unwrap_or(current.quantity_needed),
            unit_cost: patch.unit_cost.unwrap_or(current.unit_cost),
            total: None,
        };
        Self::from_create(&merged)
    }
}
