use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{enum_column, SqliteStore};
use crate::identity::UserId;
use crate::workflows::notifications::{
    NewNotification, Notification, NotificationId, NotificationRepository, NotificationType,
};
use crate::workflows::RepositoryError;

const NOTIFICATION_COLUMNS: &str =
    "id, user_id, title, message, notification_type, is_read, created_at";

fn notification_from_row(row: &Row<'_>) -> rusqlite::Result<Notification> {
    Ok(Notification {
        id: NotificationId(row.get("id")?),
        user: UserId(row.get("user_id")?),
        title: row.get("title")?,
        message: row.get("message")?,
        notification_type: enum_column(row, "notification_type", NotificationType::parse)?,
        is_read: row.get("is_read")?,
        created_at: row.get("created_at")?,
    })
}

/// Insert on whatever connection or transaction the caller holds.
pub(super) fn insert_notification(
    conn: &Connection,
    notification: &NewNotification,
) -> rusqlite::Result<NotificationId> {
    conn.execute(
        "INSERT INTO notifications (user_id, title, message, notification_type, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            notification.user.0,
            notification.title,
            notification.message,
            notification.notification_type.label(),
            Utc::now(),
        ],
    )?;
    Ok(NotificationId(conn.last_insert_rowid()))
}

fn load_notification(
    conn: &Connection,
    user: UserId,
    id: NotificationId,
) -> rusqlite::Result<Option<Notification>> {
    conn.query_row(
        &format!("SELECT {NOTIFICATION_COLUMNS} FROM notifications WHERE id = ?1 AND user_id = ?2"),
        params![id.0, user.0],
        notification_from_row,
    )
    .optional()
}

impl NotificationRepository for SqliteStore {
    fn list_notifications(
        &self,
        user: UserId,
        is_read: Option<bool>,
    ) -> Result<Vec<Notification>, RepositoryError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare_cached(&format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM notifications \
             WHERE user_id = ?1 AND (?2 IS NULL OR is_read = ?2) \
             ORDER BY created_at DESC, id DESC"
        ))?;
        let notifications = stmt
            .query_map(params![user.0, is_read], notification_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(notifications)
    }

    fn fetch_notification(
        &self,
        user: UserId,
        id: NotificationId,
    ) -> Result<Option<Notification>, RepositoryError> {
        let conn = self.lock()?;
        Ok(load_notification(&conn, user, id)?)
    }

    fn mark_read(
        &self,
        user: UserId,
        id: NotificationId,
    ) -> Result<Option<Notification>, RepositoryError> {
        let conn = self.lock()?;
        conn.execute(
            "UPDATE notifications SET is_read = 1 WHERE id = ?1 AND user_id = ?2",
            params![id.0, user.0],
        )?;
        Ok(load_notification(&conn, user, id)?)
    }

    fn mark_all_read(&self, user: UserId) -> Result<u64, RepositoryError> {
        let conn = self.lock()?;
        let changed = conn.execute(
            "UPDATE notifications SET is_read = 1 WHERE user_id = ?1 AND is_read = 0",
            params![user.0],
        )?;
        Ok(changed as u64)
    }

    fn unread_count(&self, user: UserId) -> Result<u64, RepositoryError> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM notifications WHERE user_id = ?1 AND is_read = 0",
            params![user.0],
            |row| row.get(0),
        )?;
        Ok(u64::try_from(count).unwrap_or_default())
    }

    fn delete_notification(
        &self,
        user: UserId,
        id: NotificationId,
    ) -> Result<bool, RepositoryError> {
        let conn = self.lock()?;
        let deleted = conn.execute(
            "DELETE FROM notifications WHERE id = ?1 AND user_id = ?2",
            params![id.0, user.0],
        )?;
        Ok(deleted > 0)
    }
}
