//! Vacancy postings: visibility, ownership, and the write payload.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

pub use domain::{
    Vacancy, VacancyDraft, VacancyFilter, VacancyId, VacancyPayload, VacancyQuery, VacancyScope,
    VacancyType,
};
pub use repository::VacancyRepository;
pub use router::vacancy_router;
pub use service::{VacancyService, VacancyServiceError};
