use super::domain::{Notification, NotificationId};
use crate::identity::UserId;
use crate::workflows::RepositoryError;

/// Storage abstraction for notifications. Every lookup is scoped to the owning user,
/// so another user's notification behaves as if it did not exist.
pub trait NotificationRepository: Send + Sync {
    /// Newest first, optionally restricted to read or unread entries.
    fn list_notifications(
        &self,
        user: UserId,
        is_read: Option<bool>,
    ) -> Result<Vec<Notification>, RepositoryError>;
    fn fetch_notification(
        &self,
        user: UserId,
        id: NotificationId,
    ) -> Result<Option<Notification>, RepositoryError>;
    fn mark_read(
        &self,
        user: UserId,
        id: NotificationId,
    ) -> Result<Option<Notification>, RepositoryError>;
    /// Returns how many rows changed.
    fn mark_all_read(&self, user: UserId) -> Result<u64, RepositoryError>;
    fn unread_count(&self, user: UserId) -> Result<u64, RepositoryError>;
    /// `false` when nothing matched.
    fn delete_notification(&self, user: UserId, id: NotificationId)
        -> Result<bool, RepositoryError>;
}
