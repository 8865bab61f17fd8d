//! Read-only enumerations of vacancy categories and skills.

pub mod domain;
pub mod repository;
pub mod router;

pub use domain::{Category, CategoryId, Skill, SkillId};
pub use repository::CatalogRepository;
pub use router::catalog_router;
