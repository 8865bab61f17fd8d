//! Registration, login, and bearer-token issuance.

pub mod domain;
pub mod password;
pub mod repository;
pub mod router;
pub mod service;

pub use domain::{
    Credentials, LoginRequest, MeView, NewAccount, NewProfile, RegisterRequest,
    RegistrationRole, Session,
};
pub use repository::AccountRepository;
pub use router::account_router;
pub use service::{AccountService, AccountServiceError};
