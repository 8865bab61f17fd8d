use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};

use super::domain::{Category, CategoryId, Skill, SkillId};
use super::repository::CatalogRepository;
use crate::error::ApiError;
use crate::extract::ApiPath;

/// Public, read-only routes for categories and skills.
pub fn catalog_router<R>(repository: Arc<R>) -> Router
where
    R: CatalogRepository + 'static,
{
    Router::new()
        .route("/categories", get(list_categories::<R>))
        .route("/categories/:category_id", get(get_category::<R>))
        .route("/skills", get(list_skills::<R>))
        .route("/skills/:skill_id", get(get_skill::<R>))
        .with_state(repository)
}

pub(crate) async fn list_categories<R>(
    State(repository): State<Arc<R>>,
) -> Result<Json<Vec<Category>>, ApiError>
where
    R: CatalogRepository + 'static,
{
    Ok(Json(repository.list_categories()?))
}

pub(crate) async fn get_category<R>(
    State(repository): State<Arc<R>>,
    ApiPath(category_id): ApiPath<i64>,
) -> Result<Json<Category>, ApiError>
where
    R: CatalogRepository + 'static,
{
    repository
        .fetch_category(CategoryId(category_id))?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("category not found"))
}

pub(crate) async fn list_skills<R>(
    State(repository): State<Arc<R>>,
) -> Result<Json<Vec<Skill>>, ApiError>
where
    R: CatalogRepository + 'static,
{
    Ok(Json(repository.list_skills()?))
}

pub(crate) async fn get_skill<R>(
    State(repository): State<Arc<R>>,
    ApiPath(skill_id): ApiPath<i64>,
) -> Result<Json<Skill>, ApiError>
where
    R: CatalogRepository + 'static,
{
    repository
        .fetch_skill(SkillId(skill_id))?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("skill not found"))
}
