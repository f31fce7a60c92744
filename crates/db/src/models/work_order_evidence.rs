//! Work order evidence model and DTOs.
//!
//! `file_url` is an opaque reference to an uploaded file; only its presence
//! is checked.

use fleetcare_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A row from the `work_order_evidence` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct WorkOrderEvidence {
    pub id: DbId,
    pub work_order_id: DbId,
    pub file_url: String,
    pub description: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for attaching evidence to a work order.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateWorkOrderEvidence {
    #[serde(alias = "fileUrl")]
    #[validate(length(min = 1, message = "must not be empty"))]
    pub file_url: String,
    pub description: Option<String>,
}
