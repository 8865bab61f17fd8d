use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;

use super::domain::{
    Application, ApplicationFilter, ApplicationId, ApplicationScope, ApplicationStatus,
    ApplyRequest, CreateApplicationRequest, InterviewRequest, NewApplication, NewInterview,
    NewReview, Review, ReviewRequest, StatusUpdateRequest,
};
use super::repository::ApplicationRepository;
use crate::config::{ReviewValidation, WorkflowConfig};
use crate::identity::{Caller, UserId};
use crate::workflows::notifications::{NewNotification, NotificationType};
use crate::workflows::vacancies::{VacancyId, VacancyRepository};
use crate::workflows::validation::{
    http_url, min_chars, required_text, FieldErrors, MAX_SHORT_TEXT,
};
use crate::workflows::RepositoryError;

pub const MIN_COVER_LETTER: usize = 10;
pub const MIN_RATING: i64 = 1;
pub const MAX_RATING: i64 = 5;

/// Service driving the apply, status, review, and interview workflow.
pub struct ApplicationService<R> {
    repository: Arc<R>,
    review_validation: ReviewValidation,
}

impl<R> ApplicationService<R>
where
    R: ApplicationRepository + VacancyRepository + 'static,
{
    pub fn new(repository: Arc<R>, config: WorkflowConfig) -> Self {
        Self {
            repository,
            review_validation: config.review_validation,
        }
    }

    /// Apply to a vacancy as the calling student.
    ///
    /// Checks run in a fixed order: authentication, vacancy visibility, student
    /// role, duplicate application, then field validation. Nothing is written
    /// unless every check passes.
    pub fn apply(
        &self,
        caller: &Caller,
        vacancy_id: VacancyId,
        request: ApplyRequest,
    ) -> Result<Application, ApplicationServiceError> {
        if caller.account().is_none() {
            return Err(ApplicationServiceError::Unauthenticated);
        }

        let vacancy = self
            .repository
            .fetch_vacancy(vacancy_id)?
            .filter(|vacancy| vacancy.visible_to(caller))
            .ok_or(ApplicationServiceError::VacancyNotFound)?;

        let student = caller
            .student_id()
            .ok_or(ApplicationServiceError::Forbidden(
                "only students can apply to vacancies",
            ))?;

        if self.repository.application_exists(student, vacancy.id)? {
            return Err(ApplicationServiceError::AlreadyApplied);
        }

        let new = validate_apply(student, vacancy.id, request)?;
        match self.repository.insert_application(&new) {
            Ok(application) => Ok(application),
            Err(RepositoryError::Conflict) => Err(ApplicationServiceError::AlreadyApplied),
            Err(err) => Err(err.into()),
        }
    }

    /// `POST /applications`: the apply workflow with the vacancy taken from the body.
    pub fn create(
        &self,
        caller: &Caller,
        request: CreateApplicationRequest,
    ) -> Result<Application, ApplicationServiceError> {
        if caller.account().is_none() {
            return Err(ApplicationServiceError::Unauthenticated);
        }

        let vacancy = match request.vacancy.as_ref() {
            None | Some(Value::Null) => {
                return Err(ApplicationServiceError::Validation(FieldErrors::single(
                    "vacancy",
                    "This field is required.",
                )))
            }
            Some(value) => parse_pk(value).ok_or_else(|| {
                ApplicationServiceError::Validation(FieldErrors::single(
                    "vacancy",
                    "Incorrect type. Expected pk value.",
                ))
            })?,
        };

        self.apply(
            caller,
            VacancyId(vacancy),
            ApplyRequest {
                resume_url: request.resume_url,
                cover_letter: request.cover_letter,
            },
        )
    }

    pub fn list(
        &self,
        caller: &Caller,
        filter: &ApplicationFilter,
    ) -> Result<Vec<Application>, ApplicationServiceError> {
        let scope = self.scope(caller)?;
        Ok(self
            .repository
            .list_applications(scope, filter.vacancy_id())?)
    }

    pub fn get(
        &self,
        caller: &Caller,
        id: ApplicationId,
    ) -> Result<Application, ApplicationServiceError> {
        let scope = self.scope(caller)?;
        self.repository
            .fetch_application(scope, id)?
            .ok_or(ApplicationServiceError::NotFound)
    }

    /// The applying student withdraws their application.
    pub fn withdraw(&self, caller: &Caller, id: ApplicationId) -> Result<(), ApplicationServiceError> {
        let application = self.get(caller, id)?;
        if caller.student_id() != Some(application.applicant()) {
            return Err(ApplicationServiceError::Forbidden(
                "only the applying student can withdraw an application",
            ));
        }
        Ok(self.repository.delete_application(id)?)
    }

    pub fn update_status(
        &self,
        caller: &Caller,
        id: ApplicationId,
        request: StatusUpdateRequest,
    ) -> Result<Application, ApplicationServiceError> {
        let application =
            self.owned_by_employer(caller, id, "only the vacancy owner can change the status")?;

        let status = match request.status.as_deref() {
            None | Some("") => {
                return Err(ApplicationServiceError::Validation(FieldErrors::single(
                    "status",
                    "This field is required.",
                )))
            }
            Some(raw) => ApplicationStatus::parse(raw).ok_or_else(|| {
                ApplicationServiceError::Validation(FieldErrors::single(
                    "status",
                    format!("\"{raw}\" is not a valid choice."),
                ))
            })?,
        };

        let notification = NewNotification {
            user: application.applicant(),
            title: "Application status updated".to_string(),
            message: format!(
                "Your application for \"{}\" is now \"{}\"",
                application.vacancy.title,
                status.display_name()
            ),
            notification_type: NotificationType::ApplicationUpdate,
        };
        Ok(self.repository.update_status(id, status, &notification)?)
    }

    /// Leave the single employer review allowed per application.
    pub fn add_review(
        &self,
        caller: &Caller,
        id: ApplicationId,
        request: ReviewRequest,
    ) -> Result<Review, ApplicationServiceError> {
        let application =
            self.owned_by_employer(caller, id, "only the vacancy owner can leave a review")?;
        if application.review.is_some() {
            return Err(ApplicationServiceError::ReviewExists);
        }

        let rating = parse_rating(request.rating.as_ref(), self.review_validation)
            .map_err(ApplicationServiceError::Validation)?;

        let review = NewReview {
            application: id,
            rating,
            comment: request.comment.unwrap_or_default().trim().to_string(),
            from_role: "employer",
        };
        let notification = NewNotification {
            user: application.applicant(),
            title: "New review on your application".to_string(),
            message: format!(
                "The employer left a review on your application for \"{}\"",
                application.vacancy.title
            ),
            notification_type: NotificationType::ApplicationUpdate,
        };

        match self.repository.insert_review(&review, &notification) {
            Ok(Application {
                review: Some(review),
                ..
            }) => Ok(review),
            Ok(_) => Err(RepositoryError::NotFound.into()),
            Err(RepositoryError::Conflict) => Err(ApplicationServiceError::ReviewExists),
            Err(RepositoryError::Constraint(reason)) => Err(ApplicationServiceError::Validation(
                FieldErrors::single("rating", reason),
            )),
            Err(err) => Err(err.into()),
        }
    }

    pub fn schedule_interview(
        &self,
        caller: &Caller,
        id: ApplicationId,
        request: InterviewRequest,
    ) -> Result<Application, ApplicationServiceError> {
        let application =
            self.owned_by_employer(caller, id, "only the vacancy owner can schedule interviews")?;
        if application.interview.is_some() {
            return Err(ApplicationServiceError::InterviewExists);
        }

        let interview = validate_interview(id, request)?;
        let notification = NewNotification {
            user: application.applicant(),
            title: "Interview scheduled".to_string(),
            message: format!(
                "An interview for \"{}\" is scheduled for {}",
                application.vacancy.title,
                interview.scheduled_at.format("%Y-%m-%d %H:%M UTC")
            ),
            notification_type: NotificationType::ApplicationUpdate,
        };

        match self.repository.insert_interview(&interview, &notification) {
            Ok(application) => Ok(application),
            Err(RepositoryError::Conflict) => Err(ApplicationServiceError::InterviewExists),
            Err(err) => Err(err.into()),
        }
    }

    fn scope(&self, caller: &Caller) -> Result<ApplicationScope, ApplicationServiceError> {
        if caller.account().is_none() {
            return Err(ApplicationServiceError::Unauthenticated);
        }
        Ok(ApplicationScope::for_caller(caller))
    }

    /// Look the application up in the caller's scope, then require the vacancy owner.
    fn owned_by_employer(
        &self,
        caller: &Caller,
        id: ApplicationId,
        message: &'static str,
    ) -> Result<Application, ApplicationServiceError> {
        let application = self.get(caller, id)?;
        if caller.employer_id() != Some(application.vacancy_owner()) {
            return Err(ApplicationServiceError::Forbidden(message));
        }
        Ok(application)
    }
}

fn parse_pk(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number.as_i64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

fn validate_apply(
    student: UserId,
    vacancy: VacancyId,
    request: ApplyRequest,
) -> Result<NewApplication, ApplicationServiceError> {
    let mut errors = FieldErrors::default();

    let resume_url = required_text(&mut errors, "resume_url", request.resume_url.as_deref(), None)
        .filter(|url| http_url(&mut errors, "resume_url", url));
    let cover_letter = required_text(
        &mut errors,
        "cover_letter",
        request.cover_letter.as_deref(),
        None,
    )
    .filter(|letter| min_chars(&mut errors, "cover_letter", letter, MIN_COVER_LETTER));

    errors
        .into_result()
        .map_err(ApplicationServiceError::Validation)?;

    match (resume_url, cover_letter) {
        (Some(resume_url), Some(cover_letter)) => Ok(NewApplication {
            student,
            vacancy,
            resume_url,
            cover_letter,
        }),
        _ => Err(ApplicationServiceError::Validation(FieldErrors::single(
            "non_field_errors",
            "incomplete application",
        ))),
    }
}

/// Integer rating. The `[1, 5]` range is only checked here under eager validation;
/// deferred validation leaves it to the store.
pub(crate) fn parse_rating(
    raw: Option<&Value>,
    validation: ReviewValidation,
) -> Result<i64, FieldErrors> {
    let rating = match raw {
        None | Some(Value::Null) => {
            return Err(FieldErrors::single("rating", "This field is required."))
        }
        Some(value) => parse_pk(value)
            .ok_or_else(|| FieldErrors::single("rating", "A valid integer is required."))?,
    };

    if validation == ReviewValidation::Eager {
        if rating < MIN_RATING {
            return Err(FieldErrors::single(
                "rating",
                format!("Ensure this value is greater than or equal to {MIN_RATING}."),
            ));
        }
        if rating > MAX_RATING {
            return Err(FieldErrors::single(
                "rating",
                format!("Ensure this value is less than or equal to {MAX_RATING}."),
            ));
        }
    }
    Ok(rating)
}

fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

fn validate_interview(
    application: ApplicationId,
    request: InterviewRequest,
) -> Result<NewInterview, ApplicationServiceError> {
    let mut errors = FieldErrors::default();

    let scheduled_at = required_text(
        &mut errors,
        "scheduled_at",
        request.scheduled_at.as_deref(),
        None,
    )
    .and_then(|raw| match DateTime::parse_from_rfc3339(&raw) {
        Ok(parsed) => Some(parsed.with_timezone(&Utc)),
        Err(_) => {
            errors.push(
                "scheduled_at",
                "Datetime has wrong format. Use RFC 3339, e.g. 2025-03-01T10:00:00Z.",
            );
            None
        }
    });

    let meeting_link = optional_text(request.meeting_link)
        .filter(|link| http_url(&mut errors, "meeting_link", link));

    let location = optional_text(request.location);
    if let Some(location) = &location {
        if location.chars().count() > MAX_SHORT_TEXT {
            errors.push(
                "location",
                format!("Ensure this field has no more than {MAX_SHORT_TEXT} characters."),
            );
        }
    }

    errors
        .into_result()
        .map_err(ApplicationServiceError::Validation)?;

    let scheduled_at = scheduled_at.ok_or_else(|| {
        ApplicationServiceError::Validation(FieldErrors::single(
            "scheduled_at",
            "This field is required.",
        ))
    })?;

    Ok(NewInterview {
        application,
        scheduled_at,
        meeting_link,
        location,
        notes: optional_text(request.notes),
    })
}

/// Error raised by the application workflow.
#[derive(Debug, thiserror::Error)]
pub enum ApplicationServiceError {
    #[error("authentication credentials were not provided")]
    Unauthenticated,
    #[error("{0}")]
    Forbidden(&'static str),
    #[error("vacancy not found")]
    VacancyNotFound,
    #[error("application not found")]
    NotFound,
    #[error("you have already applied to this vacancy")]
    AlreadyApplied,
    #[error("this application already has a review")]
    ReviewExists,
    #[error("an interview is already scheduled for this application")]
    InterviewExists,
    #[error("invalid application data: {0}")]
    Validation(FieldErrors),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
