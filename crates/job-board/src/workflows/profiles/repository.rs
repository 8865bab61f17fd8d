use super::domain::{
    EmployerProfileChanges, EmployerProfileView, StudentProfileChanges, StudentProfileView,
};
use crate::identity::UserId;
use crate::workflows::catalog::Skill;
use crate::workflows::RepositoryError;

/// Storage abstraction for student and employer profiles.
pub trait ProfileRepository: Send + Sync {
    fn fetch_student(&self, id: UserId) -> Result<Option<StudentProfileView>, RepositoryError>;
    fn fetch_employer(&self, id: UserId) -> Result<Option<EmployerProfileView>, RepositoryError>;
    fn student_skills(&self, id: UserId) -> Result<Vec<Skill>, RepositoryError>;
    /// Apply the changes and, when `skills` is present, replace the skill set, atomically.
    fn update_student(
        &self,
        id: UserId,
        changes: &StudentProfileChanges,
    ) -> Result<StudentProfileView, RepositoryError>;
    fn update_employer(
        &self,
        id: UserId,
        changes: &EmployerProfileChanges,
    ) -> Result<EmployerProfileView, RepositoryError>;
}
