use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Extension, Json, Router,
};

use super::domain::{Vacancy, VacancyFilter, VacancyId, VacancyPayload};
use super::repository::VacancyRepository;
use super::service::{VacancyService, VacancyServiceError};
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::identity::Caller;

/// Router builder for vacancy CRUD. The `apply` action lives with applications.
pub fn vacancy_router<R>(service: Arc<VacancyService<R>>) -> Router
where
    R: VacancyRepository + 'static,
{
    Router::new()
        .route(
            "/vacancies",
            get(list_handler::<R>).post(create_handler::<R>),
        )
        .route(
            "/vacancies/:vacancy_id",
            get(retrieve_handler::<R>)
                .put(replace_handler::<R>)
                .patch(patch_handler::<R>)
                .delete(delete_handler::<R>),
        )
        .with_state(service)
}

impl From<VacancyServiceError> for ApiError {
    fn from(value: VacancyServiceError) -> Self {
        match value {
            VacancyServiceError::Unauthenticated => ApiError::Unauthenticated,
            VacancyServiceError::Forbidden(message) => ApiError::forbidden(message),
            VacancyServiceError::NotFound => ApiError::not_found("vacancy not found"),
            VacancyServiceError::Validation(errors) => ApiError::validation(errors),
            VacancyServiceError::Repository(err) => err.into(),
        }
    }
}

pub(crate) async fn list_handler<R>(
    State(service): State<Arc<VacancyService<R>>>,
    Extension(caller): Extension<Caller>,
    ApiQuery(filter): ApiQuery<VacancyFilter>,
) -> Result<Json<Vec<Vacancy>>, ApiError>
where
    R: VacancyRepository + 'static,
{
    Ok(Json(service.list(&caller, &filter)?))
}

pub(crate) async fn retrieve_handler<R>(
    State(service): State<Arc<VacancyService<R>>>,
    Extension(caller): Extension<Caller>,
    ApiPath(vacancy_id): ApiPath<i64>,
) -> Result<Json<Vacancy>, ApiError>
where
    R: VacancyRepository + 'static,
{
    Ok(Json(service.get(&caller, VacancyId(vacancy_id))?))
}

pub(crate) async fn create_handler<R>(
    State(service): State<Arc<VacancyService<R>>>,
    Extension(caller): Extension<Caller>,
    ApiJson(payload): ApiJson<VacancyPayload>,
) -> Result<(StatusCode, Json<Vacancy>), ApiError>
where
    R: VacancyRepository + 'static,
{
    let vacancy = service.create(&caller, payload)?;
    tracing::info!(
        vacancy_id = vacancy.id.0,
        employer_id = vacancy.owner().0,
        "vacancy created"
    );
    Ok((StatusCode::CREATED, Json(vacancy)))
}

pub(crate) async fn replace_handler<R>(
    State(service): State<Arc<VacancyService<R>>>,
    Extension(caller): Extension<Caller>,
    ApiPath(vacancy_id): ApiPath<i64>,
    ApiJson(payload): ApiJson<VacancyPayload>,
) -> Result<Json<Vacancy>, ApiError>
where
    R: VacancyRepository + 'static,
{
    let vacancy = service.replace(&caller, VacancyId(vacancy_id), payload)?;
    tracing::info!(vacancy_id, "vacancy replaced");
    Ok(Json(vacancy))
}

pub(crate) async fn patch_handler<R>(
    State(service): State<Arc<VacancyService<R>>>,
    Extension(caller): Extension<Caller>,
    ApiPath(vacancy_id): ApiPath<i64>,
    ApiJson(payload): ApiJson<VacancyPayload>,
) -> Result<Json<Vacancy>, ApiError>
where
    R: VacancyRepository + 'static,
{
    let vacancy = service.patch(&caller, VacancyId(vacancy_id), payload)?;
    tracing::info!(vacancy_id, is_active = vacancy.is_active, "vacancy updated");
    Ok(Json(vacancy))
}

pub(crate) async fn delete_handler<R>(
    State(service): State<Arc<VacancyService<R>>>,
    Extension(caller): Extension<Caller>,
    ApiPath(vacancy_id): ApiPath<i64>,
) -> Result<StatusCode, ApiError>
where
    R: VacancyRepository + 'static,
{
    service.delete(&caller, VacancyId(vacancy_id))?;
    tracing::info!(vacancy_id, "vacancy deleted");
    Ok(StatusCode::NO_CONTENT)
}
