use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use serde_json::{json, Value};

use super::domain::{Notification, NotificationFilter, NotificationId};
use super::repository::NotificationRepository;
use super::service::{NotificationService, NotificationServiceError};
use crate::error::ApiError;
use crate::extract::{ApiPath, ApiQuery};
use crate::identity::Caller;

pub fn notification_router<R>(service: Arc<NotificationService<R>>) -> Router
where
    R: NotificationRepository + 'static,
{
    Router::new()
        .route("/notifications", get(list_handler::<R>))
        .route("/notifications/unread_count", get(unread_count_handler::<R>))
        .route(
            "/notifications/mark_all_as_read",
            post(mark_all_handler::<R>),
        )
        .route(
            "/notifications/:notification_id",
            get(retrieve_handler::<R>).delete(delete_handler::<R>),
        )
        .route(
            "/notifications/:notification_id/mark_as_read",
            post(mark_handler::<R>),
        )
        .with_state(service)
}

impl From<NotificationServiceError> for ApiError {
    fn from(value: NotificationServiceError) -> Self {
        match value {
            NotificationServiceError::Unauthenticated => ApiError::Unauthenticated,
            NotificationServiceError::NotFound => ApiError::not_found("notification not found"),
            NotificationServiceError::Repository(err) => err.into(),
        }
    }
}

pub(crate) async fn list_handler<R>(
    State(service): State<Arc<NotificationService<R>>>,
    Extension(caller): Extension<Caller>,
    ApiQuery(filter): ApiQuery<NotificationFilter>,
) -> Result<Json<Vec<Notification>>, ApiError>
where
    R: NotificationRepository + 'static,
{
    Ok(Json(service.list(&caller, &filter)?))
}

pub(crate) async fn retrieve_handler<R>(
    State(service): State<Arc<NotificationService<R>>>,
    Extension(caller): Extension<Caller>,
    ApiPath(notification_id): ApiPath<i64>,
) -> Result<Json<Notification>, ApiError>
where
    R: NotificationRepository + 'static,
{
    Ok(Json(service.get(&caller, NotificationId(notification_id))?))
}

pub(crate) async fn delete_handler<R>(
    State(service): State<Arc<NotificationService<R>>>,
    Extension(caller): Extension<Caller>,
    ApiPath(notification_id): ApiPath<i64>,
) -> Result<StatusCode, ApiError>
where
    R: NotificationRepository + 'static,
{
    service.delete(&caller, NotificationId(notification_id))?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn mark_handler<R>(
    State(service): State<Arc<NotificationService<R>>>,
    Extension(caller): Extension<Caller>,
    ApiPath(notification_id): ApiPath<i64>,
) -> Result<Json<Notification>, ApiError>
where
    R: NotificationRepository + 'static,
{
    Ok(Json(
        service.mark_as_read(&caller, NotificationId(notification_id))?,
    ))
}

pub(crate) async fn mark_all_handler<R>(
    State(service): State<Arc<NotificationService<R>>>,
    Extension(caller): Extension<Caller>,
) -> Result<Json<Value>, ApiError>
where
    R: NotificationRepository + 'static,
{
    let updated = service.mark_all_as_read(&caller)?;
    tracing::debug!(updated, "notifications marked as read");
    Ok(Json(json!({ "updated": updated })))
}

pub(crate) async fn unread_count_handler<R>(
    State(service): State<Arc<NotificationService<R>>>,
    Extension(caller): Extension<Caller>,
) -> Result<Json<Value>, ApiError>
where
    R: NotificationRepository + 'static,
{
    let count = service.unread_count(&caller)?;
    Ok(Json(json!({ "count": count })))
}
