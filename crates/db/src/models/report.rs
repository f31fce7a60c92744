//! Failure report entity model and DTOs.

use fleetcare_core::report::ReportStatus;
use fleetcare_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A row from the `reports` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Report {
    pub id: DbId,
    pub vehicle_id: DbId,
    pub reported_by: DbId,
    pub description: String,
    #[sqlx(rename = "status_id", try_from = "i16")]
    pub status: ReportStatus,
    pub assigned_employee_id: Option<DbId>,
    pub assigned_at: Option<Timestamp>,
    pub resolved: bool,
    pub resolved_date: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for report intake.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateReport {
    #[serde(alias = "vehicleId")]
    pub vehicle_id: DbId,
    #[serde(alias = "reportedBy")]
    pub reported_by: DbId,
    #[validate(length(min = 1, max = 5000, message = "must be 1-5000 characters"))]
    pub description: String,
    /// Intake status; defaults to `new`.
    pub status: Option<ReportStatus>,
}

/// Body for `POST /reports/{id}/assign`.
#[derive(Debug, Clone, Deserialize)]
pub struct AssignReport {
    #[serde(alias = "employeeId")]
    pub employee_id: DbId,
}

/// Body for `PUT /reports/{id}/status`.
#[derive(Debug, Clone, Deserialize)]
pub struct TriageReport {
    pub status: ReportStatus,
}

/// Query parameters for listing reports.
#[derive(Debug, Deserialize)]
pub struct ReportListParams {
    pub status: Option<ReportStatus>,
    pub vehicle_id: Option<DbId>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}
