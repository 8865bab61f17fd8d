use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::identity::{UserAccount, UserId};
use crate::workflows::catalog::{Skill, SkillId};

/// Public projection of a user nested inside profile representations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserView {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

impl From<&UserAccount> for UserView {
    fn from(account: &UserAccount) -> Self {
        Self {
            id: account.id,
            username: account.username.clone(),
            email: account.email.clone(),
            first_name: account.first_name.clone(),
            last_name: account.last_name.clone(),
        }
    }
}

/// Student profile; `id` is the owning user's key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentProfileView {
    pub id: UserId,
    pub user: UserView,
    pub first_name: String,
    pub last_name: String,
    pub faculty: String,
    pub course: i64,
    pub resume_url: Option<String>,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub skills: Vec<Skill>,
}

/// Employer profile; `id` is the owning user's key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployerProfileView {
    pub id: UserId,
    pub user: UserView,
    pub first_name: String,
    pub last_name: String,
    pub company_name: String,
    pub department: String,
    pub contact_person: String,
    pub phone: String,
    pub description: Option<String>,
}

/// Body of `POST /update-profile`. Fields that do not apply to the caller's
/// profile kind are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdateRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub faculty: Option<String>,
    pub course: Option<Value>,
    pub phone: Option<String>,
    pub resume_url: Option<String>,
    pub company_name: Option<String>,
    pub department: Option<String>,
    pub contact_person: Option<String>,
    pub description: Option<String>,
    /// Single id or list of ids; replaces the full skill set when present.
    pub skills: Option<Value>,
}

/// Validated student changes. `None` leaves the column untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StudentProfileChanges {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub faculty: Option<String>,
    pub course: Option<i64>,
    pub phone: Option<String>,
    pub resume_url: Option<String>,
    pub skills: Option<Vec<SkillId>>,
}

/// Validated employer changes. `None` leaves the column untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmployerProfileChanges {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub company_name: Option<String>,
    pub department: Option<String>,
    pub contact_person: Option<String>,
    pub phone: Option<String>,
    pub description: Option<String>,
}
