//! Profile self-service: a caller reads and edits only their own profile.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

pub use domain::{
    EmployerProfileChanges, EmployerProfileView, ProfileUpdateRequest, StudentProfileChanges,
    StudentProfileView, UserView,
};
pub use repository::ProfileRepository;
pub use router::profile_router;
pub use service::{ProfileService, ProfileServiceError, ProfileUpdate};
