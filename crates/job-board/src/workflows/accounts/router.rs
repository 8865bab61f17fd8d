use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use serde_json::{json, Value};

use super::domain::{LoginRequest, MeView, RegisterRequest};
use super::repository::AccountRepository;
use super::service::{AccountService, AccountServiceError};
use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::identity::Caller;
use crate::workflows::profiles::ProfileRepository;
use crate::workflows::validation::FieldErrors;

/// Session surface: register, login, and the caller's own identity.
pub fn account_router<R>(service: Arc<AccountService<R>>) -> Router
where
    R: AccountRepository + ProfileRepository + 'static,
{
    Router::new()
        .route("/register", post(register_handler::<R>))
        .route("/login", post(login_handler::<R>))
        .route("/me", get(me_handler::<R>))
        .with_state(service)
}

impl From<AccountServiceError> for ApiError {
    fn from(value: AccountServiceError) -> Self {
        match value {
            AccountServiceError::Unauthenticated => ApiError::Unauthenticated,
            AccountServiceError::InvalidCredentials => ApiError::Validation {
                message: "invalid credentials".to_string(),
                detail: FieldErrors::single("non_field_errors", "invalid credentials"),
            },
            err @ (AccountServiceError::UsernameTaken | AccountServiceError::EmailTaken) => {
                ApiError::conflict(err.to_string())
            }
            AccountServiceError::Validation(errors) => ApiError::validation(errors),
            AccountServiceError::Password(err) => ApiError::Internal(err.to_string()),
            AccountServiceError::Repository(err) => err.into(),
        }
    }
}

pub(crate) async fn register_handler<R>(
    State(service): State<Arc<AccountService<R>>>,
    ApiJson(request): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError>
where
    R: AccountRepository + ProfileRepository + 'static,
{
    let session = service.register(request).await?;
    tracing::info!(
        user_id = session.account.id.0,
        role = session.role.label(),
        "user registered"
    );
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "registration successful",
            "token": session.token,
            "user_id": session.account.id,
            "username": session.account.username,
            "email": session.account.email,
            "role": session.role,
        })),
    ))
}

pub(crate) async fn login_handler<R>(
    State(service): State<Arc<AccountService<R>>>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<Json<Value>, ApiError>
where
    R: AccountRepository + ProfileRepository + 'static,
{
    let session = match service.login(request).await {
        Ok(session) => session,
        Err(err) => {
            if matches!(err, AccountServiceError::InvalidCredentials) {
                tracing::info!("login rejected");
            }
            return Err(err.into());
        }
    };
    tracing::info!(user_id = session.account.id.0, "user logged in");
    Ok(Json(json!({
        "token": session.token,
        "user_id": session.account.id,
        "username": session.account.username,
        "role": session.role,
    })))
}

pub(crate) async fn me_handler<R>(
    State(service): State<Arc<AccountService<R>>>,
    Extension(caller): Extension<Caller>,
) -> Result<Json<MeView>, ApiError>
where
    R: AccountRepository + ProfileRepository + 'static,
{
    Ok(Json(service.me(&caller)?))
}
