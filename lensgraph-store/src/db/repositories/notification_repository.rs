use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::{params_from_iter, OptionalExtension};

use lensgraph_types::{Notification, RecencyWindow};

use super::window_clause;
use crate::db::{date_column, date_to_sql, DbPool};
use crate::error::duplicate_or;

pub struct NotificationRepository {
    pool: DbPool,
}

impl NotificationRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn map_notification(row: &rusqlite::Row<'_>) -> rusqlite::Result<Notification> {
        Ok(Notification {
            id: row.get(0)?,
            created_on: date_column(row, 1)?,
            content: row.get(2)?,
            target_url: row.get(3)?,
        })
    }

    /// Create a notification node; ids are unique
    pub fn create(&self, notification: &Notification) -> Result<()> {
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO notifications (id, created_on, content, target_url) VALUES (?, ?, ?, ?)",
            (
                notification.id,
                date_to_sql(notification.created_on),
                &notification.content,
                &notification.target_url,
            ),
        )
        .map_err(|e| duplicate_or(e, "notification", notification.id))
        .context("Failed to create notification")?;
        Ok(())
    }

    pub fn get_by_id(&self, notification_id: i64) -> Result<Option<Notification>> {
        let conn = self.pool.get()?;
        let notification = conn
            .query_row(
                "SELECT id, created_on, content, target_url FROM notifications WHERE id = ?",
                [notification_id],
                Self::map_notification,
            )
            .optional()
            .context("Failed to get notification")?;
        Ok(notification)
    }

    /// RECEIVED edge: hand an existing notification to a user
    pub fn deliver(&self, username: &str, notification_id: i64) -> Result<bool> {
        let conn = self.pool.get()?;
        let created = conn
            .execute(
                "INSERT OR IGNORE INTO received (user_id, notification_id)
                 SELECT u.id, n.id FROM users u, notifications n
                 WHERE u.username = ? AND n.id = ?",
                (username, notification_id),
            )
            .context("Failed to deliver notification")?;

        if created == 0 {
            tracing::warn!(username, notification_id, "RECEIVED not created");
        }
        Ok(created > 0)
    }

    /// Every notification a user received, newest first
    pub fn for_user(&self, username: &str) -> Result<Vec<Notification>> {
        self.received_where(username, "1 = 1", Vec::new())
    }

    /// Notifications a user received inside `window`
    pub fn recent_for(
        &self,
        username: &str,
        window: &RecencyWindow,
        today: NaiveDate,
    ) -> Result<Vec<Notification>> {
        let (clause, params) = window_clause("n.created_on", &window.ranges(today));
        self.received_where(username, &clause, params)
    }

    fn received_where(
        &self,
        username: &str,
        clause: &str,
        extra_params: Vec<String>,
    ) -> Result<Vec<Notification>> {
        let query = format!(
            "SELECT n.id, n.created_on, n.content, n.target_url
             FROM notifications n
             JOIN received r ON r.notification_id = n.id
             JOIN users u ON r.user_id = u.id
             WHERE u.username = ? AND {}
             ORDER BY n.created_on DESC, n.id",
            clause
        );

        let mut params = vec![username.to_string()];
        params.extend(extra_params);

        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&query)?;
        let notifications = stmt
            .query_map(params_from_iter(params.iter()), Self::map_notification)?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to load notifications")?;
        Ok(notifications)
    }
}
