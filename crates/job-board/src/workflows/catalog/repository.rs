use super::domain::{Category, CategoryId, Skill, SkillId};
use crate::workflows::RepositoryError;

/// Storage abstraction for the catalog tables.
pub trait CatalogRepository: Send + Sync {
    fn list_categories(&self) -> Result<Vec<Category>, RepositoryError>;
    fn fetch_category(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError>;
    fn list_skills(&self) -> Result<Vec<Skill>, RepositoryError>;
    fn fetch_skill(&self, id: SkillId) -> Result<Option<Skill>, RepositoryError>;
}
