//! Caller identity resolved once per request from the bearer token.
//!
//! The role is derived from which profile row exists for the user, never from a
//! stored role attribute.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{header, HeaderMap};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::workflows::RepositoryError;

/// Surrogate key of a user. Profiles share their owner's key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

/// Credential identity as stored, without secrets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAccount {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip)]
    pub is_staff: bool,
}

/// Who is making the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Caller {
    Anonymous,
    Student(UserAccount),
    Employer(UserAccount),
    /// Staff user without a profile.
    Admin(UserAccount),
    /// Authenticated user with neither profile nor staff flag.
    Unassigned(UserAccount),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Student,
    Employer,
    Admin,
    Unknown,
}

impl Role {
    pub const fn label(self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Employer => "employer",
            Role::Admin => "admin",
            Role::Unknown => "unknown",
        }
    }
}

impl Caller {
    /// Classify an account given which profile relations exist for it.
    pub fn from_relations(account: UserAccount, has_student: bool, has_employer: bool) -> Self {
        if has_student {
            Caller::Student(account)
        } else if has_employer {
            Caller::Employer(account)
        } else if account.is_staff {
            Caller::Admin(account)
        } else {
            Caller::Unassigned(account)
        }
    }

    pub fn account(&self) -> Option<&UserAccount> {
        match self {
            Caller::Anonymous => None,
            Caller::Student(account)
            | Caller::Employer(account)
            | Caller::Admin(account)
            | Caller::Unassigned(account) => Some(account),
        }
    }

    pub fn role(&self) -> Role {
        match self {
            Caller::Student(_) => Role::Student,
            Caller::Employer(_) => Role::Employer,
            Caller::Admin(_) => Role::Admin,
            Caller::Anonymous | Caller::Unassigned(_) => Role::Unknown,
        }
    }

    pub fn student_id(&self) -> Option<UserId> {
        match self {
            Caller::Student(account) => Some(account.id),
            _ => None,
        }
    }

    pub fn employer_id(&self) -> Option<UserId> {
        match self {
            Caller::Employer(account) => Some(account.id),
            _ => None,
        }
    }

    pub fn is_privileged(&self) -> bool {
        matches!(self, Caller::Admin(_))
    }
}

/// Token lookup backing the identity middleware.
pub trait IdentityResolver: Send + Sync {
    fn resolve_token(&self, token: &str) -> Result<Option<Caller>, RepositoryError>;
}

/// Extract the key from `Authorization: Token <key>` or `Bearer <key>`.
///
/// `Ok(None)` means no credentials were offered; other schemes are ignored.
fn token_from_headers(headers: &HeaderMap) -> Result<Option<String>, ApiError> {
    let Some(value) = headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };
    let value = value.to_str().map_err(|_| ApiError::InvalidToken)?;

    let mut parts = value.split_whitespace();
    let scheme = parts.next().unwrap_or_default();
    if !scheme.eq_ignore_ascii_case("token") && !scheme.eq_ignore_ascii_case("bearer") {
        return Ok(None);
    }

    match (parts.next(), parts.next()) {
        (Some(key), None) => Ok(Some(key.to_string())),
        _ => Err(ApiError::InvalidToken),
    }
}

/// Middleware inserting the resolved [`Caller`] into request extensions.
pub async fn resolve_caller<I>(
    State(resolver): State<Arc<I>>,
    mut request: Request,
    next: Next,
) -> Response
where
    I: IdentityResolver + 'static,
{
    let caller = match token_from_headers(request.headers()) {
        Ok(None) => Caller::Anonymous,
        Ok(Some(token)) => match resolver.resolve_token(&token) {
            Ok(Some(caller)) => caller,
            Ok(None) => {
                tracing::warn!(path = %request.uri().path(), "rejected unknown token");
                return ApiError::InvalidToken.into_response();
            }
            Err(err) => return ApiError::from(err).into_response(),
        },
        Err(err) => {
            tracing::warn!(path = %request.uri().path(), "rejected malformed authorization header");
            return err.into_response();
        }
    };

    tracing::debug!(
        role = caller.role().label(),
        user_id = caller.account().map(|account| account.id.0),
        "caller resolved"
    );
    request.extensions_mut().insert(caller);
    next.run(request).await
}
