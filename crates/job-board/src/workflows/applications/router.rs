use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, patch, post},
    Extension, Json, Router,
};

use super::domain::{
    Application, ApplicationFilter, ApplicationId, ApplyRequest, CreateApplicationRequest,
    InterviewRequest, Review, ReviewRequest, StatusUpdateRequest,
};
use super::repository::ApplicationRepository;
use super::service::{ApplicationService, ApplicationServiceError};
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::identity::Caller;
use crate::workflows::vacancies::{VacancyId, VacancyRepository};

/// Router builder for applications and the workflow actions on them.
pub fn application_router<R>(service: Arc<ApplicationService<R>>) -> Router
where
    R: ApplicationRepository + VacancyRepository + 'static,
{
    Router::new()
        .route("/vacancies/:vacancy_id/apply", post(apply_handler::<R>))
        .route(
            "/applications",
            get(list_handler::<R>).post(create_handler::<R>),
        )
        .route(
            "/applications/:application_id",
            get(retrieve_handler::<R>).delete(withdraw_handler::<R>),
        )
        .route(
            "/applications/:application_id/update-status",
            patch(status_handler::<R>),
        )
        .route(
            "/applications/:application_id/add-review",
            post(review_handler::<R>),
        )
        .route(
            "/applications/:application_id/schedule-interview",
            post(interview_handler::<R>),
        )
        .with_state(service)
}

impl From<ApplicationServiceError> for ApiError {
    fn from(value: ApplicationServiceError) -> Self {
        match value {
            ApplicationServiceError::Unauthenticated => ApiError::Unauthenticated,
            ApplicationServiceError::Forbidden(message) => ApiError::forbidden(message),
            ApplicationServiceError::VacancyNotFound => ApiError::not_found("vacancy not found"),
            ApplicationServiceError::NotFound => ApiError::not_found("application not found"),
            err @ (ApplicationServiceError::AlreadyApplied
            | ApplicationServiceError::ReviewExists
            | ApplicationServiceError::InterviewExists) => ApiError::conflict(err.to_string()),
            ApplicationServiceError::Validation(errors) => ApiError::validation(errors),
            ApplicationServiceError::Repository(err) => err.into(),
        }
    }
}

pub(crate) async fn apply_handler<R>(
    State(service): State<Arc<ApplicationService<R>>>,
    Extension(caller): Extension<Caller>,
    ApiPath(vacancy_id): ApiPath<i64>,
    ApiJson(request): ApiJson<ApplyRequest>,
) -> Result<(StatusCode, Json<Application>), ApiError>
where
    R: ApplicationRepository + VacancyRepository + 'static,
{
    let application = service.apply(&caller, VacancyId(vacancy_id), request)?;
    tracing::info!(
        application_id = application.id.0,
        vacancy_id,
        student_id = application.applicant().0,
        "application submitted"
    );
    Ok((StatusCode::CREATED, Json(application)))
}

pub(crate) async fn create_handler<R>(
    State(service): State<Arc<ApplicationService<R>>>,
    Extension(caller): Extension<Caller>,
    ApiJson(request): ApiJson<CreateApplicationRequest>,
) -> Result<(StatusCode, Json<Application>), ApiError>
where
    R: ApplicationRepository + VacancyRepository + 'static,
{
    let application = service.create(&caller, request)?;
    tracing::info!(
        application_id = application.id.0,
        vacancy_id = application.vacancy.id.0,
        student_id = application.applicant().0,
        "application submitted"
    );
    Ok((StatusCode::CREATED, Json(application)))
}

pub(crate) async fn list_handler<R>(
    State(service): State<Arc<ApplicationService<R>>>,
    Extension(caller): Extension<Caller>,
    ApiQuery(filter): ApiQuery<ApplicationFilter>,
) -> Result<Json<Vec<Application>>, ApiError>
where
    R: ApplicationRepository + VacancyRepository + 'static,
{
    Ok(Json(service.list(&caller, &filter)?))
}

pub(crate) async fn retrieve_handler<R>(
    State(service): State<Arc<ApplicationService<R>>>,
    Extension(caller): Extension<Caller>,
    ApiPath(application_id): ApiPath<i64>,
) -> Result<Json<Application>, ApiError>
where
    R: ApplicationRepository + VacancyRepository + 'static,
{
    Ok(Json(service.get(&caller, ApplicationId(application_id))?))
}

pub(crate) async fn withdraw_handler<R>(
    State(service): State<Arc<ApplicationService<R>>>,
    Extension(caller): Extension<Caller>,
    ApiPath(application_id): ApiPath<i64>,
) -> Result<StatusCode, ApiError>
where
    R: ApplicationRepository + VacancyRepository + 'static,
{
    service.withdraw(&caller, ApplicationId(application_id))?;
    tracing::info!(application_id, "application withdrawn");
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn status_handler<R>(
    State(service): State<Arc<ApplicationService<R>>>,
    Extension(caller): Extension<Caller>,
    ApiPath(application_id): ApiPath<i64>,
    ApiJson(request): ApiJson<StatusUpdateRequest>,
) -> Result<Json<Application>, ApiError>
where
    R: ApplicationRepository + VacancyRepository + 'static,
{
    let application = service.update_status(&caller, ApplicationId(application_id), request)?;
    tracing::info!(
        application_id,
        status = application.status.label(),
        "application status updated"
    );
    Ok(Json(application))
}

pub(crate) async fn review_handler<R>(
    State(service): State<Arc<ApplicationService<R>>>,
    Extension(caller): Extension<Caller>,
    ApiPath(application_id): ApiPath<i64>,
    ApiJson(request): ApiJson<ReviewRequest>,
) -> Result<(StatusCode, Json<Review>), ApiError>
where
    R: ApplicationRepository + VacancyRepository + 'static,
{
    let review = service.add_review(&caller, ApplicationId(application_id), request)?;
    tracing::info!(application_id, rating = review.rating, "application reviewed");
    Ok((StatusCode::CREATED, Json(review)))
}

pub(crate) async fn interview_handler<R>(
    State(service): State<Arc<ApplicationService<R>>>,
    Extension(caller): Extension<Caller>,
    ApiPath(application_id): ApiPath<i64>,
    ApiJson(request): ApiJson<InterviewRequest>,
) -> Result<(StatusCode, Json<Application>), ApiError>
where
    R: ApplicationRepository + VacancyRepository + 'static,
{
    let application =
        service.schedule_interview(&caller, ApplicationId(application_id), request)?;
    tracing::info!(application_id, "interview scheduled");
    Ok((StatusCode::CREATED, Json(application)))
}
