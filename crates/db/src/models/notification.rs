//! Notification entity model.

use fleetcare_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `notifications` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Notification {
    pub id: DbId,
    pub notification_type: String,
    pub title: String,
    pub message: String,
    pub is_read: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A notification to be written to the sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNotification {
    pub notification_type: String,
    pub title: String,
    pub message: String,
}
