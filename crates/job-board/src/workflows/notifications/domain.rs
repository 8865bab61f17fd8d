use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::identity::UserId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotificationId(pub i64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    ApplicationUpdate,
    NewVacancy,
    System,
}

impl NotificationType {
    pub const fn label(self) -> &'static str {
        match self {
            NotificationType::ApplicationUpdate => "application_update",
            NotificationType::NewVacancy => "new_vacancy",
            NotificationType::System => "system",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "application_update" => Some(Self::ApplicationUpdate),
            "new_vacancy" => Some(Self::NewVacancy),
            "system" => Some(Self::System),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub user: UserId,
    pub title: String,
    pub message: String,
    pub notification_type: NotificationType,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// Notification to be written alongside the state change that caused it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNotification {
    pub user: UserId,
    pub title: String,
    pub message: String,
    pub notification_type: NotificationType,
}

/// Query parameters accepted by `GET /notifications`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotificationFilter {
    pub is_read: Option<String>,
}

impl NotificationFilter {
    /// `true`/`1` and `false`/`0` select read or unread; anything else lists both.
    pub fn read_state(&self) -> Option<bool> {
        match self.is_read.as_deref().map(str::trim) {
            Some(value) if value.eq_ignore_ascii_case("true") || value == "1" => Some(true),
            Some(value) if value.eq_ignore_ascii_case("false") || value == "0" => Some(false),
            _ => None,
        }
    }
}
