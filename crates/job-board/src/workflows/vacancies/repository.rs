use super::domain::{Vacancy, VacancyDraft, VacancyId, VacancyQuery};
use crate::identity::UserId;
use crate::workflows::catalog::{CategoryId, SkillId};
use crate::workflows::RepositoryError;

/// Storage abstraction for vacancies and their skill links.
pub trait VacancyRepository: Send + Sync {
    /// Vacancies matching the query, newest first.
    fn list_vacancies(&self, query: &VacancyQuery) -> Result<Vec<Vacancy>, RepositoryError>;
    fn fetch_vacancy(&self, id: VacancyId) -> Result<Option<Vacancy>, RepositoryError>;
    fn insert_vacancy(
        &self,
        employer: UserId,
        draft: &VacancyDraft,
    ) -> Result<Vacancy, RepositoryError>;
    /// Overwrite the columns and, when `draft.skill_ids` is present, the skill set.
    fn update_vacancy(&self, id: VacancyId, draft: &VacancyDraft)
        -> Result<Vacancy, RepositoryError>;
    /// Removes the vacancy together with its applications and skill links.
    fn delete_vacancy(&self, id: VacancyId) -> Result<(), RepositoryError>;
    fn category_exists(&self, id: CategoryId) -> Result<bool, RepositoryError>;
    /// Subset of `ids` that exist.
    fn existing_skills(&self, ids: &[SkillId]) -> Result<Vec<SkillId>, RepositoryError>;
}
