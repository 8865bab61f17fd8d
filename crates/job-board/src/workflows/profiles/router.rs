use std::sync::Arc;

use axum::{
    extract::State,
    routing::{get, post},
    Extension, Json, Router,
};
use serde_json::{json, Value};

use super::domain::{ProfileUpdateRequest, StudentProfileView};
use super::repository::ProfileRepository;
use super::service::{ProfileService, ProfileServiceError, ProfileUpdate};
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath};
use crate::identity::{Caller, UserId};
use crate::workflows::catalog::Skill;

/// Router exposing the caller's own profile.
pub fn profile_router<R>(service: Arc<ProfileService<R>>) -> Router
where
    R: ProfileRepository + 'static,
{
    Router::new()
        .route("/student-profiles", get(list_students::<R>))
        .route("/student-profiles/my_skills", get(my_skills::<R>))
        .route("/student-profiles/:profile_id", get(get_student::<R>))
        .route("/update-profile", post(update_profile::<R>))
        .with_state(service)
}

impl From<ProfileServiceError> for ApiError {
    fn from(value: ProfileServiceError) -> Self {
        match value {
            ProfileServiceError::Unauthenticated => ApiError::Unauthenticated,
            ProfileServiceError::Forbidden(message) => ApiError::forbidden(message),
            ProfileServiceError::NotFound => ApiError::not_found("profile not found"),
            ProfileServiceError::NoProfile => ApiError::Validation {
                message: "you do not have a profile".to_string(),
                detail: crate::workflows::validation::FieldErrors::single(
                    "non_field_errors",
                    "you do not have a profile",
                ),
            },
            ProfileServiceError::Validation(errors) => ApiError::validation(errors),
            ProfileServiceError::Repository(err) => err.into(),
        }
    }
}

pub(crate) async fn list_students<R>(
    State(service): State<Arc<ProfileService<R>>>,
    Extension(caller): Extension<Caller>,
) -> Result<Json<Vec<StudentProfileView>>, ApiError>
where
    R: ProfileRepository + 'static,
{
    Ok(Json(service.list_students(&caller)?))
}

pub(crate) async fn get_student<R>(
    State(service): State<Arc<ProfileService<R>>>,
    Extension(caller): Extension<Caller>,
    ApiPath(profile_id): ApiPath<i64>,
) -> Result<Json<StudentProfileView>, ApiError>
where
    R: ProfileRepository + 'static,
{
    Ok(Json(service.get_student(&caller, UserId(profile_id))?))
}

pub(crate) async fn my_skills<R>(
    State(service): State<Arc<ProfileService<R>>>,
    Extension(caller): Extension<Caller>,
) -> Result<Json<Vec<Skill>>, ApiError>
where
    R: ProfileRepository + 'static,
{
    Ok(Json(service.my_skills(&caller)?))
}

pub(crate) async fn update_profile<R>(
    State(service): State<Arc<ProfileService<R>>>,
    Extension(caller): Extension<Caller>,
    ApiJson(request): ApiJson<ProfileUpdateRequest>,
) -> Result<Json<Value>, ApiError>
where
    R: ProfileRepository + 'static,
{
    let payload = match service.update(&caller, request)? {
        ProfileUpdate::Student(profile) => {
            tracing::info!(user_id = profile.id.0, "student profile updated");
            json!({ "message": "student profile updated", "profile": profile })
        }
        ProfileUpdate::Employer(profile) => {
            tracing::info!(user_id = profile.id.0, "employer profile updated");
            json!({ "message": "employer profile updated", "profile": profile })
        }
    };
    Ok(Json(payload))
}
