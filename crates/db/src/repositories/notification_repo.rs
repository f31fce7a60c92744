//! Repository for the `notifications` table.

use sqlx::PgPool;

use crate::models::notification::{NewNotification, Notification};

const COLUMNS: &str = "id, notification_type, title, message, is_read, created_at, updated_at";

/// Notification sink used by the event dispatcher.
pub struct NotificationRepo;

impl NotificationRepo {
    pub async fn create(
        pool: &PgPool,
        input: &NewNotification,
    ) -> Result<Notification, sqlx::Error> {
        let query = format!(
            "INSERT INTO notifications (notification_type, title, message) \
             VALUES ($1, $2, $3) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Notification>(&query)
            .bind(&input.notification_type)
            .bind(&input.title)
            .bind(&input.message)
            .fetch_one(pool)
            .await
    }

    /// List notifications of one type, oldest first.
    pub async fn list_by_type(
        pool: &PgPool,
        notification_type: &str,
    ) -> Result<Vec<Notification>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM notifications \
             WHERE notification_type = $1 \
             ORDER BY created_at ASC, id ASC"
        );
        sqlx::query_as::<_, Notification>(&query)
            .bind(notification_type)
            .fetch_all(pool)
            .await
    }
}
