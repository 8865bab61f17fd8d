use super::domain::{
    Application, ApplicationId, ApplicationScope, ApplicationStatus, NewApplication,
    NewInterview, NewReview,
};
use crate::identity::UserId;
use crate::workflows::notifications::NewNotification;
use crate::workflows::vacancies::VacancyId;
use crate::workflows::RepositoryError;

/// Storage abstraction for applications and the records hanging off them.
///
/// Workflow writes that notify the student take the notification alongside the
/// change and persist both in one transaction: either both rows land or neither.
pub trait ApplicationRepository: Send + Sync {
    fn application_exists(
        &self,
        student: UserId,
        vacancy: VacancyId,
    ) -> Result<bool, RepositoryError>;
    /// [`RepositoryError::Conflict`] when the (student, vacancy) pair already exists.
    fn insert_application(&self, new: &NewApplication) -> Result<Application, RepositoryError>;
    fn list_applications(
        &self,
        scope: ApplicationScope,
        vacancy: Option<VacancyId>,
    ) -> Result<Vec<Application>, RepositoryError>;
    fn fetch_application(
        &self,
        scope: ApplicationScope,
        id: ApplicationId,
    ) -> Result<Option<Application>, RepositoryError>;
    fn delete_application(&self, id: ApplicationId) -> Result<(), RepositoryError>;
    fn update_status(
        &self,
        id: ApplicationId,
        status: ApplicationStatus,
        notification: &NewNotification,
    ) -> Result<Application, RepositoryError>;
    /// [`RepositoryError::Conflict`] when a review exists, [`RepositoryError::Constraint`]
    /// when the stored rating check rejects the value.
    fn insert_review(
        &self,
        review: &NewReview,
        notification: &NewNotification,
    ) -> Result<Application, RepositoryError>;
    /// [`RepositoryError::Conflict`] when an interview is already scheduled.
    fn insert_interview(
        &self,
        interview: &NewInterview,
        notification: &NewNotification,
    ) -> Result<Application, RepositoryError>;
}
