use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::identity::{Caller, Role, UserAccount, UserId};
use crate::workflows::profiles::{EmployerProfileView, StudentProfileView};

/// Profile kind chosen at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationRole {
    Student,
    Employer,
}

impl RegistrationRole {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "student" => Some(Self::Student),
            "employer" => Some(Self::Employer),
            _ => None,
        }
    }
}

/// Body of `POST /register`. Profile fields that do not match `role` are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub faculty: Option<String>,
    pub course: Option<Value>,
    pub phone: Option<String>,
    pub company_name: Option<String>,
    pub department: Option<String>,
    pub contact_person: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Profile row created together with a new user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NewProfile {
    Student {
        faculty: String,
        course: i64,
        phone: Option<String>,
    },
    Employer {
        company_name: String,
        department: String,
        contact_person: String,
        phone: String,
        description: Option<String>,
    },
    /// Staff accounts carry no profile.
    None,
}

/// Validated registration, password already hashed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub is_staff: bool,
    pub profile: NewProfile,
}

/// Stored password hash plus the identity it unlocks.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub caller: Caller,
    pub password_hash: String,
}

/// Token issued by register or login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub account: UserAccount,
    pub role: Role,
}

/// Representation returned by `GET /me`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeView {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_profile: Option<StudentProfileView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employer_profile: Option<EmployerProfileView>,
}
