//! Composition of every resource router behind the identity middleware.

use std::sync::Arc;

use axum::http::Uri;
use axum::{middleware, Router};

use crate::config::{AuthConfig, WorkflowConfig};
use crate::error::ApiError;
use crate::identity::resolve_caller;
use crate::store::SqliteStore;
use crate::workflows::accounts::{account_router, AccountService};
use crate::workflows::applications::{application_router, ApplicationService};
use crate::workflows::catalog::catalog_router;
use crate::workflows::notifications::{notification_router, NotificationService};
use crate::workflows::profiles::{profile_router, ProfileService};
use crate::workflows::vacancies::{vacancy_router, VacancyService};

/// The public API over one store. Every route sees a resolved `Caller`.
pub fn api_router(store: Arc<SqliteStore>, workflow: WorkflowConfig, auth: AuthConfig) -> Router {
    Router::new()
        .merge(catalog_router(store.clone()))
        .merge(profile_router(Arc::new(ProfileService::new(store.clone()))))
        .merge(vacancy_router(Arc::new(VacancyService::new(store.clone()))))
        .merge(application_router(Arc::new(ApplicationService::new(
            store.clone(),
            workflow,
        ))))
        .merge(notification_router(Arc::new(NotificationService::new(
            store.clone(),
        ))))
        .merge(account_router(Arc::new(AccountService::new(
            store.clone(),
            auth,
        ))))
        .fallback(unknown_route)
        .layer(middleware::from_fn_with_state(
            store,
            resolve_caller::<SqliteStore>,
        ))
}

async fn unknown_route(uri: Uri) -> ApiError {
    ApiError::not_found(format!("no route for {}", uri.path()))
}
