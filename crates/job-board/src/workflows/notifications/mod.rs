//! Per-user notifications emitted by application workflow actions.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

pub use domain::{
    NewNotification, Notification, NotificationFilter, NotificationId, NotificationType,
};
pub use repository::NotificationRepository;
pub use router::notification_router;
pub use service::{NotificationService, NotificationServiceError};
