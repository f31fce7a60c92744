//! Notification sink fed by the event bus.
//!
//! [`NotificationDispatcher`] subscribes to the bus and writes one
//! `notifications` row per workflow event it recognises. Events it does not
//! map are skipped. Delivery and display of notifications happen elsewhere.

use fleetcare_db::models::notification::NewNotification;
use fleetcare_db::repositories::NotificationRepo;
use fleetcare_db::DbPool;
use tokio::sync::broadcast;

use crate::bus::PlatformEvent;
use crate::event_types;

/// Background service that records notifications for workflow events.
pub struct NotificationDispatcher;

impl NotificationDispatcher {
    /// Run the dispatch loop until the bus is dropped.
    pub async fn run(pool: DbPool, mut receiver: broadcast::Receiver<PlatformEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    let Some(notification) = notification_for(&event) else {
                        continue;
                    };
                    if let Err(e) = NotificationRepo::create(&pool, &notification).await {
                        tracing::error!(
                            error = %e,
                            event_type = %event.event_type,
                            "Failed to record notification"
                        );
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Notification dispatcher lagged, events skipped");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, notification dispatcher shutting down");
                    break;
                }
            }
        }
    }
}

/// Map a workflow event to the notification it produces, if any.
pub fn notification_for(event: &PlatformEvent) -> Option<NewNotification> {
    let id = event.source_entity_id.unwrap_or_default();
    let payload = &event.payload;

    let (notification_type, title, message) = match event.event_type.as_str() {
        event_types::REPORT_ASSIGNED => (
            "report_assigned",
            "Report assigned",
            format!(
                "Report #{id} was assigned to employee #{}",
                payload["employee_id"].as_i64().unwrap_or_default()
            ),
        ),
        event_types::DIAGNOSTIC_APPROVED => (
            "work_order_created",
            "Work order created",
            format!(
                "Diagnostic #{id} was approved; work order #{} was created with {} priority",
                payload["work_order_id"].as_i64().unwrap_or_default(),
                payload["priority"].as_str().unwrap_or("normal")
            ),
        ),
        event_types::WORK_ORDER_PARTIAL_FAILURE => (
            "work_order_partial_failure",
            "Work order needs manual repair",
            format!(
                "Work order #{id} was saved, but some {} could not be written. \
                 Review the order and repair it manually.",
                join_strings(&payload["failed_collections"])
            ),
        ),
        event_types::WORK_ORDER_VALIDATED => (
            "work_order_validated",
            "Work order validated",
            format!("Work order #{id} was validated; its vehicle can be reactivated"),
        ),
        event_types::VEHICLE_ACTIVATED => (
            "vehicle_activated",
            "Vehicle back in service",
            format!(
                "Vehicle {} is active again after work order #{id}",
                payload["license_plate"].as_str().unwrap_or("(unknown)")
            ),
        ),
        _ => return None,
    };

    Some(NewNotification {
        notification_type: notification_type.to_string(),
        title: title.to_string(),
        message,
    })
}

fn join_strings(value: &serde_json::Value) -> String {
    match value.as_array() {
        Some(items) if !items.is_empty() => items
            .iter()
            .filter_map(|v| v.as_str())
            .collect::<Vec<_>>()
            .join(", "),
        _ => "children".to_string(),
    }
}
