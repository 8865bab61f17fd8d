use std::sync::Arc;

use axum::response::Response;
use serde_json::Value;

use crate::config::{ReviewValidation, WorkflowConfig};
use crate::identity::{Caller, UserId};
use crate::store::SqliteStore;
use crate::workflows::accounts::{AccountRepository, NewAccount, NewProfile};
use crate::workflows::applications::domain::{
    Application, ApplicationId, ApplicationScope, ApplicationStatus, ApplyRequest, NewApplication,
    NewInterview, NewReview,
};
use crate::workflows::applications::repository::ApplicationRepository;
use crate::workflows::applications::ApplicationService;
use crate::workflows::catalog::{CategoryId, SkillId};
use crate::workflows::notifications::NewNotification;
use crate::workflows::vacancies::{
    Vacancy, VacancyDraft, VacancyId, VacancyQuery, VacancyRepository, VacancyType,
};
use crate::workflows::RepositoryError;

/// A store with one student, two employers, and one active vacancy per employer.
pub(super) struct Fixture {
    pub(super) store: Arc<SqliteStore>,
    pub(super) student: Caller,
    pub(super) employer: Caller,
    pub(super) other_employer: Caller,
    pub(super) vacancy: Vacancy,
    pub(super) other_vacancy: Vacancy,
}

impl Fixture {
    pub(super) fn new() -> Self {
        let store = Arc::new(SqliteStore::in_memory().expect("in-memory store"));
        let student = account(&store, "ivan", student_profile());
        let employer = account(&store, "anna", employer_profile("IT Department"));
        let other_employer = account(&store, "oleg", employer_profile("Library"));

        let vacancy = store
            .insert_vacancy(employer_id(&employer), &draft("Python developer assistant", true))
            .expect("vacancy inserted");
        let other_vacancy = store
            .insert_vacancy(employer_id(&other_employer), &draft("Archive assistant", true))
            .expect("vacancy inserted");

        Self {
            store,
            student,
            employer,
            other_employer,
            vacancy,
            other_vacancy,
        }
    }

    pub(super) fn service(&self, review_validation: ReviewValidation) -> ApplicationService<SqliteStore> {
        ApplicationService::new(self.store.clone(), WorkflowConfig { review_validation })
    }

    pub(super) fn second_student(&self) -> Caller {
        account(&self.store, "maria", student_profile())
    }

    pub(super) fn inactive_vacancy(&self) -> Vacancy {
        self.store
            .insert_vacancy(employer_id(&self.employer), &draft("Closed posting", false))
            .expect("vacancy inserted")
    }

    /// Apply as the fixture student to the fixture vacancy.
    pub(super) fn submitted(&self, service: &ApplicationService<SqliteStore>) -> Application {
        service
            .apply(&self.student, self.vacancy.id, apply_request())
            .expect("application submitted")
    }
}

fn account(store: &SqliteStore, username: &str, profile: NewProfile) -> Caller {
    let account = store
        .create_account(
            &NewAccount {
                username: username.to_string(),
                email: format!("{username}@example.edu"),
                password_hash: "hash".to_string(),
                first_name: "First".to_string(),
                last_name: "Last".to_string(),
                is_staff: false,
                profile: profile.clone(),
            },
            &format!("token-{username}"),
        )
        .expect("account created");
    match profile {
        NewProfile::Student { .. } => Caller::Student(account),
        NewProfile::Employer { .. } => Caller::Employer(account),
        NewProfile::None => Caller::Unassigned(account),
    }
}

fn student_profile() -> NewProfile {
    NewProfile::Student {
        faculty: "Computer Science".to_string(),
        course: 3,
        phone: None,
    }
}

fn employer_profile(company: &str) -> NewProfile {
    NewProfile::Employer {
        company_name: company.to_string(),
        department: "Development".to_string(),
        contact_person: "Anna Sidorova".to_string(),
        phone: "+79997654321".to_string(),
        description: None,
    }
}

fn employer_id(caller: &Caller) -> UserId {
    caller.employer_id().expect("employer caller")
}

pub(super) fn draft(title: &str, is_active: bool) -> VacancyDraft {
    VacancyDraft {
        title: title.to_string(),
        description: "Support the team".to_string(),
        requirements: "Python".to_string(),
        vacancy_type: VacancyType::Internship,
        salary: Some(25_000.0),
        location: "Main building, room 305".to_string(),
        is_active,
        category_id: None,
        skill_ids: None,
    }
}

pub(super) fn apply_request() -> ApplyRequest {
    ApplyRequest {
        resume_url: Some("https://example.edu/resume.pdf".to_string()),
        cover_letter: Some("I would love to join the team.".to_string()),
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body readable");
    serde_json::from_slice(&bytes).expect("valid json body")
}

/// Repository whose every call fails as if the database were gone.
pub(super) struct UnavailableRepository;

fn unavailable<T>() -> Result<T, RepositoryError> {
    Err(RepositoryError::Unavailable("database offline".to_string()))
}

impl ApplicationRepository for UnavailableRepository {
    fn application_exists(&self, _: UserId, _: VacancyId) -> Result<bool, RepositoryError> {
        unavailable()
    }

    fn insert_application(&self, _: &NewApplication) -> Result<Application, RepositoryError> {
        unavailable()
    }

    fn list_applications(
        &self,
        _: ApplicationScope,
        _: Option<VacancyId>,
    ) -> Result<Vec<Application>, RepositoryError> {
        unavailable()
    }

    fn fetch_application(
        &self,
        _: ApplicationScope,
        _: ApplicationId,
    ) -> Result<Option<Application>, RepositoryError> {
        unavailable()
    }

    fn delete_application(&self, _: ApplicationId) -> Result<(), RepositoryError> {
        unavailable()
    }

    fn update_status(
        &self,
        _: ApplicationId,
        _: ApplicationStatus,
        _: &NewNotification,
    ) -> Result<Application, RepositoryError> {
        unavailable()
    }

    fn insert_review(&self, _: &NewReview, _: &NewNotification) -> Result<Application, RepositoryError> {
        unavailable()
    }

    fn insert_interview(
        &self,
        _: &NewInterview,
        _: &NewNotification,
    ) -> Result<Application, RepositoryError> {
        unavailable()
    }
}

impl VacancyRepository for UnavailableRepository {
    fn list_vacancies(&self, _: &VacancyQuery) -> Result<Vec<Vacancy>, RepositoryError> {
        unavailable()
    }

    fn fetch_vacancy(&self, _: VacancyId) -> Result<Option<Vacancy>, RepositoryError> {
        unavailable()
    }

    fn insert_vacancy(&self, _: UserId, _: &VacancyDraft) -> Result<Vacancy, RepositoryError> {
        unavailable()
    }

    fn update_vacancy(&self, _: VacancyId, _: &VacancyDraft) -> Result<Vacancy, RepositoryError> {
        unavailable()
    }

    fn delete_vacancy(&self, _: VacancyId) -> Result<(), RepositoryError> {
        unavailable()
    }

    fn category_exists(&self, _: CategoryId) -> Result<bool, RepositoryError> {
        unavailable()
    }

    fn existing_skills(&self, _: &[SkillId]) -> Result<Vec<SkillId>, RepositoryError> {
        unavailable()
    }
}
