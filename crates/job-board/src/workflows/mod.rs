//! Resource workflows: each submodule owns its domain types, the repository seam
//! the store implements, the service enforcing visibility and ownership, and the
//! axum router exposing it.

pub mod accounts;
pub mod applications;
pub mod catalog;
pub mod notifications;
pub mod profiles;
mod repository;
pub mod vacancies;
pub mod validation;

pub use repository::RepositoryError;
