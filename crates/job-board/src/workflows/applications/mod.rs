//! Student applications to vacancies and the employer-side workflow on them:
//! status changes, the single review, and interview scheduling.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    Application, ApplicationFilter, ApplicationId, ApplicationScope, ApplicationStatus,
    ApplyRequest, CreateApplicationRequest, Interview, InterviewRequest, InterviewStatus,
    NewApplication, NewInterview, NewReview, Review, ReviewRequest, StatusUpdateRequest,
};
pub use repository::ApplicationRepository;
pub use router::application_router;
pub use service::{ApplicationService, ApplicationServiceError};
