use std::sync::Arc;

use super::domain::{
    Vacancy, VacancyDraft, VacancyFilter, VacancyId, VacancyPayload, VacancyQuery, VacancyType,
};
use super::repository::VacancyRepository;
use crate::identity::{Caller, UserId};
use crate::workflows::catalog::{CategoryId, SkillId};
use crate::workflows::validation::{required_text, FieldErrors, MAX_SHORT_TEXT};
use crate::workflows::RepositoryError;

/// Salary is stored with at most eight integer digits.
const MAX_SALARY: f64 = 100_000_000.0;

/// Service applying visibility and ownership rules before touching the store.
pub struct VacancyService<R> {
    repository: Arc<R>,
}

impl<R> VacancyService<R>
where
    R: VacancyRepository + 'static,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    pub fn list(
        &self,
        caller: &Caller,
        filter: &VacancyFilter,
    ) -> Result<Vec<Vacancy>, VacancyServiceError> {
        let query = VacancyQuery::new(caller, filter);
        Ok(self.repository.list_vacancies(&query)?)
    }

    /// Fetch a single vacancy. Inactive vacancies the caller may not see are
    /// reported exactly like missing ones.
    pub fn get(&self, caller: &Caller, id: VacancyId) -> Result<Vacancy, VacancyServiceError> {
        self.repository
            .fetch_vacancy(id)?
            .filter(|vacancy| vacancy.visible_to(caller))
            .ok_or(VacancyServiceError::NotFound)
    }

    pub fn create(
        &self,
        caller: &Caller,
        payload: VacancyPayload,
    ) -> Result<Vacancy, VacancyServiceError> {
        let employer = require_employer(caller, "only employers can create vacancies")?;
        let draft = merge_payload(payload, PayloadBase::Fresh)
            .map_err(VacancyServiceError::Validation)?;
        self.check_references(&draft)?;
        Ok(self.repository.insert_vacancy(employer, &draft)?)
    }

    /// Full replacement (`PUT`): every required field must be supplied; omitted
    /// optional fields keep their stored values.
    pub fn replace(
        &self,
        caller: &Caller,
        id: VacancyId,
        payload: VacancyPayload,
    ) -> Result<Vacancy, VacancyServiceError> {
        let existing = self.owned_for_write(caller, id)?;
        let stored = VacancyDraft::from_vacancy(&existing);
        let draft = merge_payload(payload, PayloadBase::Stored(&stored))
            .map_err(VacancyServiceError::Validation)?;
        self.check_references(&draft)?;
        Ok(self.repository.update_vacancy(id, &draft)?)
    }

    /// Partial update (`PATCH`): absent fields keep their stored values.
    pub fn patch(
        &self,
        caller: &Caller,
        id: VacancyId,
        payload: VacancyPayload,
    ) -> Result<Vacancy, VacancyServiceError> {
        let existing = self.owned_for_write(caller, id)?;
        let base = VacancyDraft::from_vacancy(&existing);
        let draft = merge_payload(payload, PayloadBase::Partial(&base))
            .map_err(VacancyServiceError::Validation)?;
        self.check_references(&draft)?;
        Ok(self.repository.update_vacancy(id, &draft)?)
    }

    pub fn delete(&self, caller: &Caller, id: VacancyId) -> Result<(), VacancyServiceError> {
        self.owned_for_write(caller, id)?;
        Ok(self.repository.delete_vacancy(id)?)
    }

    /// Write gate: authenticated, employer, visible, and owned, in that order.
    fn owned_for_write(
        &self,
        caller: &Caller,
        id: VacancyId,
    ) -> Result<Vacancy, VacancyServiceError> {
        let employer = require_employer(caller, "only employers can modify vacancies")?;
        let vacancy = self.get(caller, id)?;
        if vacancy.owner() != employer {
            return Err(VacancyServiceError::Forbidden(
                "you can only modify your own vacancies",
            ));
        }
        Ok(vacancy)
    }

    fn check_references(&self, draft: &VacancyDraft) -> Result<(), VacancyServiceError> {
        let mut errors = FieldErrors::default();

        if let Some(category) = draft.category_id {
            if !self.repository.category_exists(category)? {
                errors.push(
                    "category_id",
                    format!("Invalid pk \"{}\" - object does not exist.", category.0),
                );
            }
        }

        if let Some(skill_ids) = &draft.skill_ids {
            let existing = self.repository.existing_skills(skill_ids)?;
            for id in skill_ids.iter().filter(|id| !existing.contains(id)) {
                errors.push(
                    "skill_ids",
                    format!("Invalid pk \"{}\" - object does not exist.", id.0),
                );
            }
        }

        errors.into_result().map_err(VacancyServiceError::Validation)
    }
}

fn require_employer(caller: &Caller, message: &'static str) -> Result<UserId, VacancyServiceError> {
    if caller.account().is_none() {
        return Err(VacancyServiceError::Unauthenticated);
    }
    caller
        .employer_id()
        .ok_or(VacancyServiceError::Forbidden(message))
}

fn text_field(
    errors: &mut FieldErrors,
    field: &str,
    provided: Option<String>,
    base: Option<&str>,
    max: Option<usize>,
) -> Option<String> {
    match (provided, base) {
        (None, Some(existing)) => Some(existing.to_string()),
        (provided, _) => required_text(errors, field, provided.as_deref(), max),
    }
}

/// What an incoming payload is layered over.
#[derive(Debug, Clone, Copy)]
pub(crate) enum PayloadBase<'a> {
    /// Creation: required fields must be present, optional ones take defaults.
    Fresh,
    /// `PUT`: required fields must be present, absent optional ones are kept.
    Stored(&'a VacancyDraft),
    /// `PATCH`: every absent field is kept.
    Partial(&'a VacancyDraft),
}

impl<'a> PayloadBase<'a> {
    fn required(self) -> Option<&'a VacancyDraft> {
        match self {
            PayloadBase::Partial(draft) => Some(draft),
            PayloadBase::Fresh | PayloadBase::Stored(_) => None,
        }
    }

    fn optional(self) -> Option<&'a VacancyDraft> {
        match self {
            PayloadBase::Stored(draft) | PayloadBase::Partial(draft) => Some(draft),
            PayloadBase::Fresh => None,
        }
    }
}

/// Validate the payload and layer it over `base`.
pub(crate) fn merge_payload(
    payload: VacancyPayload,
    base: PayloadBase<'_>,
) -> Result<VacancyDraft, FieldErrors> {
    let mut errors = FieldErrors::default();
    let stored = base.optional();
    let base = base.required();

    let title = text_field(
        &mut errors,
        "title",
        payload.title,
        base.map(|draft| draft.title.as_str()),
        Some(MAX_SHORT_TEXT),
    );
    let description = text_field(
        &mut errors,
        "description",
        payload.description,
        base.map(|draft| draft.description.as_str()),
        None,
    );
    let requirements = text_field(
        &mut errors,
        "requirements",
        payload.requirements,
        base.map(|draft| draft.requirements.as_str()),
        None,
    );
    let location = text_field(
        &mut errors,
        "location",
        payload.location,
        base.map(|draft| draft.location.as_str()),
        Some(MAX_SHORT_TEXT),
    );

    let vacancy_type = match (payload.vacancy_type, base) {
        (Some(raw), _) => {
            let parsed = VacancyType::parse(raw.trim());
            if parsed.is_none() {
                errors.push("vacancy_type", format!("\"{raw}\" is not a valid choice."));
            }
            parsed
        }
        (None, Some(draft)) => Some(draft.vacancy_type),
        (None, None) => {
            errors.push("vacancy_type", "This field is required.");
            None
        }
    };

    let salary = match payload.salary {
        None => stored.and_then(|draft| draft.salary),
        Some(None) => None,
        Some(Some(value)) => {
            if !value.is_finite() || value < 0.0 {
                errors.push("salary", "Ensure this value is greater than or equal to 0.");
            } else if value >= MAX_SALARY {
                errors.push(
                    "salary",
                    "Ensure that there are no more than 8 digits before the decimal point.",
                );
            }
            Some((value * 100.0).round() / 100.0)
        }
    };

    let is_active = payload
        .is_active
        .or(stored.map(|draft| draft.is_active))
        .unwrap_or(true);

    let category_id = match payload.category_id {
        None => stored.and_then(|draft| draft.category_id),
        Some(None) => None,
        Some(Some(id)) => Some(CategoryId(id)),
    };

    let skill_ids = payload.skill_ids.map(|ids| {
        let mut ids: Vec<SkillId> = ids.into_iter().map(SkillId).collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    });

    errors.into_result()?;

    match (title, description, requirements, vacancy_type, location) {
        (
            Some(title),
            Some(description),
            Some(requirements),
            Some(vacancy_type),
            Some(location),
        ) => Ok(VacancyDraft {
            title,
            description,
            requirements,
            vacancy_type,
            salary,
            location,
            is_active,
            category_id,
            skill_ids,
        }),
        _ => Err(FieldErrors::single(
            "non_field_errors",
            "incomplete vacancy payload",
        )),
    }
}

/// Error raised by the vacancy service.
#[derive(Debug, thiserror::Error)]
pub enum VacancyServiceError {
    #[error("authentication credentials were not provided")]
    Unauthenticated,
    #[error("{0}")]
    Forbidden(&'static str),
    #[error("vacancy not found")]
    NotFound,
    #[error("invalid vacancy: {0}")]
    Validation(FieldErrors),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_payload() -> VacancyPayload {
        VacancyPayload {
            title: Some("Research assistant".to_string()),
            description: Some("Help with lab experiments".to_string()),
            requirements: Some("Python".to_string()),
            vacancy_type: Some("internship".to_string()),
            salary: Some(Some(1500.0)),
            location: Some("Main campus".to_string()),
            ..VacancyPayload::default()
        }
    }

    #[test]
    fn create_payload_requires_core_fields() {
        let errors = merge_payload(VacancyPayload::default(), PayloadBase::Fresh)
            .expect_err("empty payload");
        for field in ["title", "description", "requirements", "vacancy_type", "location"] {
            assert!(errors.contains(field), "missing error for {field}");
        }
    }

    #[test]
    fn create_payload_defaults_to_active_without_skills() {
        let draft = merge_payload(full_payload(), PayloadBase::Fresh).expect("valid payload");
        assert!(draft.is_active);
        assert_eq!(draft.skill_ids, None);
        assert_eq!(draft.vacancy_type, VacancyType::Internship);
    }

    #[test]
    fn unknown_vacancy_type_is_rejected() {
        let payload = VacancyPayload {
            vacancy_type: Some("volunteer".to_string()),
            ..full_payload()
        };
        let errors = merge_payload(payload, PayloadBase::Fresh).expect_err("invalid choice");
        assert!(errors.messages("vacancy_type")[0].contains("volunteer"));
    }

    #[test]
    fn negative_and_oversized_salaries_are_rejected() {
        let negative = VacancyPayload {
            salary: Some(Some(-1.0)),
            ..full_payload()
        };
        assert!(merge_payload(negative, PayloadBase::Fresh)
            .expect_err("negative salary")
            .contains("salary"));

        let huge = VacancyPayload {
            salary: Some(Some(MAX_SALARY)),
            ..full_payload()
        };
        assert!(merge_payload(huge, PayloadBase::Fresh)
            .expect_err("too many digits")
            .contains("salary"));
    }

    #[test]
    fn patch_keeps_unspecified_fields_and_clears_explicit_nulls() {
        let base = VacancyDraft {
            category_id: Some(CategoryId(4)),
            ..merge_payload(full_payload(), PayloadBase::Fresh).expect("base draft")
        };
        let patch = VacancyPayload {
            is_active: Some(false),
            salary: Some(None),
            ..VacancyPayload::default()
        };

        let draft = merge_payload(patch, PayloadBase::Partial(&base)).expect("patch applies");
        assert_eq!(draft.title, "Research assistant");
        assert!(!draft.is_active);
        assert_eq!(draft.salary, None);
        assert_eq!(draft.category_id, Some(CategoryId(4)));
        assert_eq!(draft.skill_ids, None);
    }

    #[test]
    fn skill_ids_are_deduplicated() {
        let payload = VacancyPayload {
            skill_ids: Some(vec![3, 1, 3]),
            ..full_payload()
        };
        let draft = merge_payload(payload, PayloadBase::Fresh).expect("valid payload");
        assert_eq!(draft.skill_ids, Some(vec![SkillId(1), SkillId(3)]));
    }

    #[test]
    fn replace_requires_core_fields_but_keeps_omitted_optional_ones() {
        let stored = VacancyDraft {
            is_active: false,
            category_id: Some(CategoryId(2)),
            ..merge_payload(full_payload(), PayloadBase::Fresh).expect("stored draft")
        };

        let errors = merge_payload(
            VacancyPayload {
                title: Some("Renamed".to_string()),
                ..VacancyPayload::default()
            },
            PayloadBase::Stored(&stored),
        )
        .expect_err("core fields missing");
        assert!(errors.contains("description"));
        assert!(errors.contains("location"));

        let renamed = VacancyPayload {
            title: Some("Renamed".to_string()),
            salary: None,
            ..full_payload()
        };
        let draft = merge_payload(renamed, PayloadBase::Stored(&stored)).expect("replace applies");
        assert_eq!(draft.title, "Renamed");
        assert!(!draft.is_active, "hidden vacancy must stay hidden");
        assert_eq!(draft.salary, Some(1500.0));
        assert_eq!(draft.category_id, Some(CategoryId(2)));
    }
}
