use std::sync::Arc;

use serde_json::Value;

use super::domain::{
    EmployerProfileChanges, EmployerProfileView, ProfileUpdateRequest, StudentProfileChanges,
    StudentProfileView,
};
use super::repository::ProfileRepository;
use crate::identity::{Caller, UserId};
use crate::workflows::catalog::{Skill, SkillId};
use crate::workflows::validation::{http_url, short_text, FieldErrors};
use crate::workflows::RepositoryError;

/// Service scoping profile reads and writes to the caller's own profile.
pub struct ProfileService<R> {
    repository: Arc<R>,
}

/// Result of a self-service update, tagged by profile kind.
#[derive(Debug, Clone, PartialEq)]
pub enum ProfileUpdate {
    Student(StudentProfileView),
    Employer(EmployerProfileView),
}

impl<R> ProfileService<R>
where
    R: ProfileRepository + 'static,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// The caller's own student profile as a one-element list, or empty for other roles.
    pub fn list_students(
        &self,
        caller: &Caller,
    ) -> Result<Vec<StudentProfileView>, ProfileServiceError> {
        if caller.account().is_none() {
            return Err(ProfileServiceError::Unauthenticated);
        }
        let Some(student_id) = caller.student_id() else {
            return Ok(Vec::new());
        };
        Ok(self.repository.fetch_student(student_id)?.into_iter().collect())
    }

    /// A student profile is only visible to its owner.
    pub fn get_student(
        &self,
        caller: &Caller,
        id: UserId,
    ) -> Result<StudentProfileView, ProfileServiceError> {
        if caller.account().is_none() {
            return Err(ProfileServiceError::Unauthenticated);
        }
        if caller.student_id() != Some(id) {
            return Err(ProfileServiceError::NotFound);
        }
        self.repository
            .fetch_student(id)?
            .ok_or(ProfileServiceError::NotFound)
    }

    pub fn my_skills(&self, caller: &Caller) -> Result<Vec<Skill>, ProfileServiceError> {
        if caller.account().is_none() {
            return Err(ProfileServiceError::Unauthenticated);
        }
        let student_id = caller
            .student_id()
            .ok_or(ProfileServiceError::Forbidden("you do not have a student profile"))?;
        Ok(self.repository.student_skills(student_id)?)
    }

    /// Partial update of whichever profile the caller owns.
    pub fn update(
        &self,
        caller: &Caller,
        request: ProfileUpdateRequest,
    ) -> Result<ProfileUpdate, ProfileServiceError> {
        match caller {
            Caller::Anonymous => Err(ProfileServiceError::Unauthenticated),
            Caller::Student(account) => {
                let changes = student_changes(request)?;
                let profile = self.repository.update_student(account.id, &changes)?;
                Ok(ProfileUpdate::Student(profile))
            }
            Caller::Employer(account) => {
                let changes = employer_changes(request)?;
                let profile = self.repository.update_employer(account.id, &changes)?;
                Ok(ProfileUpdate::Employer(profile))
            }
            Caller::Admin(_) | Caller::Unassigned(_) => Err(ProfileServiceError::NoProfile),
        }
    }
}

fn parse_id(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number.as_i64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

pub(crate) fn parse_course(errors: &mut FieldErrors, value: &Value) -> Option<i64> {
    match parse_id(value) {
        Some(course) if course >= 1 => Some(course),
        Some(_) => {
            errors.push("course", "Ensure this value is greater than or equal to 1.");
            None
        }
        None => {
            errors.push("course", "A valid integer is required.");
            None
        }
    }
}

fn parse_skills(errors: &mut FieldErrors, value: &Value) -> Option<Vec<SkillId>> {
    let items: Vec<&Value> = match value {
        Value::Array(items) => items.iter().collect(),
        Value::Null => Vec::new(),
        single => vec![single],
    };

    let mut ids = Vec::with_capacity(items.len());
    for item in items {
        match parse_id(item) {
            Some(id) => ids.push(SkillId(id)),
            None => {
                errors.push("skills", "A valid integer is required.");
                return None;
            }
        }
    }
    ids.sort_unstable();
    ids.dedup();
    Some(ids)
}

fn student_changes(
    request: ProfileUpdateRequest,
) -> Result<StudentProfileChanges, ProfileServiceError> {
    let mut errors = FieldErrors::default();

    let course = request
        .course
        .as_ref()
        .and_then(|value| parse_course(&mut errors, value));
    let resume_url = request.resume_url.filter(|url| {
        let url = url.trim();
        url.is_empty() || http_url(&mut errors, "resume_url", url)
    });
    let skills = request
        .skills
        .as_ref()
        .and_then(|value| parse_skills(&mut errors, value));

    let changes = StudentProfileChanges {
        first_name: short_text(&mut errors, "first_name", request.first_name),
        last_name: short_text(&mut errors, "last_name", request.last_name),
        faculty: short_text(&mut errors, "faculty", request.faculty),
        course,
        phone: request.phone.map(|phone| phone.trim().to_string()),
        resume_url: resume_url.map(|url| url.trim().to_string()),
        skills,
    };

    errors.into_result().map_err(ProfileServiceError::Validation)?;
    Ok(changes)
}

fn employer_changes(
    request: ProfileUpdateRequest,
) -> Result<EmployerProfileChanges, ProfileServiceError> {
    let mut errors = FieldErrors::default();

    let changes = EmployerProfileChanges {
        first_name: short_text(&mut errors, "first_name", request.first_name),
        last_name: short_text(&mut errors, "last_name", request.last_name),
        company_name: short_text(&mut errors, "company_name", request.company_name),
        department: short_text(&mut errors, "department", request.department),
        contact_person: short_text(&mut errors, "contact_person", request.contact_person),
        phone: request.phone.map(|phone| phone.trim().to_string()),
        description: request.description,
    };

    errors.into_result().map_err(ProfileServiceError::Validation)?;
    Ok(changes)
}

/// Error raised by the profile service.
#[derive(Debug, thiserror::Error)]
pub enum ProfileServiceError {
    #[error("authentication credentials were not provided")]
    Unauthenticated,
    #[error("{0}")]
    Forbidden(&'static str),
    #[error("profile not found")]
    NotFound,
    #[error("you do not have a profile")]
    NoProfile,
    #[error("invalid profile data: {0}")]
    Validation(FieldErrors),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
