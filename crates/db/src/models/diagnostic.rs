//! Diagnostic entity model and DTOs.

use fleetcare_core::diagnostic::Severity;
use fleetcare_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::models::work_order::WorkOrder;

/// A row from the `diagnostics` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Diagnostic {
    pub id: DbId,
    pub report_id: DbId,
    pub employee_id: DbId,
    pub possible_cause: String,
    pub technical_recommendation: String,
    pub required_materials: Option<String>,
    #[sqlx(rename = "severity_id", try_from = "i16")]
    pub severity: Severity,
    pub approved_by: Option<DbId>,
    pub approved_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Diagnostic {
    pub fn is_approved(&self) -> bool {
        self.approved_by.is_some()
    }
}

/// DTO for recording a diagnosis against a report.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateDiagnostic {
    #[serde(alias = "reportId")]
    pub report_id: DbId,
    #[serde(alias = "employeeId")]
    pub employee_id: DbId,
    #[serde(alias = "possibleCause")]
    #[validate(length(min = 1, message = "must not be empty"))]
    pub possible_cause: String,
    #[serde(alias = "technicalRecommendation")]
    #[validate(length(min = 1, message = "must not be empty"))]
    pub technical_recommendation: String,
    #[serde(alias = "requiredMaterials")]
    pub required_materials: Option<String>,
    pub severity: Severity,
}

/// Result of approving a diagnostic: the stamped diagnostic and the one
/// work order derived from it, committed together.
#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticApproval {
    pub diagnostic: Diagnostic,
    pub work_order: WorkOrder,
}
