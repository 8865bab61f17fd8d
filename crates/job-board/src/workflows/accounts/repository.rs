use super::domain::{Credentials, NewAccount};
use crate::identity::{UserAccount, UserId};
use crate::workflows::RepositoryError;

/// Storage abstraction for users and their bearer tokens.
pub trait AccountRepository: Send + Sync {
    fn username_taken(&self, username: &str) -> Result<bool, RepositoryError>;
    fn email_taken(&self, email: &str) -> Result<bool, RepositoryError>;
    /// Insert the user, its profile, and `token` in one transaction.
    fn create_account(
        &self,
        new: &NewAccount,
        token: &str,
    ) -> Result<UserAccount, RepositoryError>;
    fn find_credentials(&self, username: &str) -> Result<Option<Credentials>, RepositoryError>;
    /// The user's existing token, or `candidate` once stored as the new one.
    fn issue_token(&self, user: UserId, candidate: &str) -> Result<String, RepositoryError>;
}
