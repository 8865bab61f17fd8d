use std::sync::Arc;

use super::domain::{Notification, NotificationFilter, NotificationId};
use super::repository::NotificationRepository;
use crate::identity::{Caller, UserId};
use crate::workflows::RepositoryError;

/// Owner-scoped access to the caller's notifications.
pub struct NotificationService<R> {
    repository: Arc<R>,
}

impl<R> NotificationService<R>
where
    R: NotificationRepository + 'static,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    pub fn list(
        &self,
        caller: &Caller,
        filter: &NotificationFilter,
    ) -> Result<Vec<Notification>, NotificationServiceError> {
        let user = owner(caller)?;
        Ok(self
            .repository
            .list_notifications(user, filter.read_state())?)
    }

    pub fn get(
        &self,
        caller: &Caller,
        id: NotificationId,
    ) -> Result<Notification, NotificationServiceError> {
        let user = owner(caller)?;
        self.repository
            .fetch_notification(user, id)?
            .ok_or(NotificationServiceError::NotFound)
    }

    pub fn mark_as_read(
        &self,
        caller: &Caller,
        id: NotificationId,
    ) -> Result<Notification, NotificationServiceError> {
        let user = owner(caller)?;
        self.repository
            .mark_read(user, id)?
            .ok_or(NotificationServiceError::NotFound)
    }

    pub fn mark_all_as_read(&self, caller: &Caller) -> Result<u64, NotificationServiceError> {
        let user = owner(caller)?;
        Ok(self.repository.mark_all_read(user)?)
    }

    pub fn unread_count(&self, caller: &Caller) -> Result<u64, NotificationServiceError> {
        let user = owner(caller)?;
        Ok(self.repository.unread_count(user)?)
    }

    pub fn delete(
        &self,
        caller: &Caller,
        id: NotificationId,
    ) -> Result<(), NotificationServiceError> {
        let user = owner(caller)?;
        if self.repository.delete_notification(user, id)? {
            Ok(())
        } else {
            Err(NotificationServiceError::NotFound)
        }
    }
}

fn owner(caller: &Caller) -> Result<UserId, NotificationServiceError> {
    caller
        .account()
        .map(|account| account.id)
        .ok_or(NotificationServiceError::Unauthenticated)
}

#[derive(Debug, thiserror::Error)]
pub enum NotificationServiceError {
    #[error("authentication credentials were not provided")]
    Unauthenticated,
    #[error("notification not found")]
    NotFound,
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
