use std::sync::Arc;

use uuid::Uuid;

use super::domain::{
    LoginRequest, MeView, NewAccount, NewProfile, RegisterRequest, RegistrationRole, Session,
};
use super::password::{hash_password, verify_password, PasswordError, MAX_PASSWORD_BYTES};
use super::repository::AccountRepository;
use crate::config::AuthConfig;
use crate::identity::{Caller, Role, UserAccount};
use crate::workflows::profiles::service::parse_course;
use crate::workflows::profiles::ProfileRepository;
use crate::workflows::validation::{required_text, short_text, FieldErrors};
use crate::workflows::RepositoryError;

const MAX_USERNAME: usize = 150;
const MAX_EMAIL: usize = 254;

/// Registration, login, and the `/me` view.
pub struct AccountService<R> {
    repository: Arc<R>,
    bcrypt_cost: u32,
}

impl<R> AccountService<R>
where
    R: AccountRepository + ProfileRepository + 'static,
{
    pub fn new(repository: Arc<R>, config: AuthConfig) -> Self {
        Self {
            repository,
            bcrypt_cost: config.bcrypt_cost,
        }
    }

    /// Create a user with exactly one profile and issue its token.
    pub async fn register(&self, request: RegisterRequest) -> Result<Session, AccountServiceError> {
        let mut errors = FieldErrors::default();
        let username = required_text(
            &mut errors,
            "username",
            request.username.as_deref(),
            Some(MAX_USERNAME),
        );
        let email = required_text(&mut errors, "email", request.email.as_deref(), Some(MAX_EMAIL));
        let password = checked_password(&mut errors, request.password.as_deref());
        let role = match request.role.as_deref().map(str::trim) {
            None | Some("") => Some(RegistrationRole::Student),
            Some(raw) => {
                let parsed = RegistrationRole::parse(raw);
                if parsed.is_none() {
                    errors.push("role", format!("\"{raw}\" is not a valid choice."));
                }
                parsed
            }
        };
        let first_name = short_text(&mut errors, "first_name", trimmed(&request.first_name));
        let last_name = short_text(&mut errors, "last_name", trimmed(&request.last_name));
        let profile = match role {
            Some(RegistrationRole::Student) => student_profile(&mut errors, &request),
            Some(RegistrationRole::Employer) => Some(employer_profile(&mut errors, &request)),
            None => None,
        };
        errors
            .into_result()
            .map_err(AccountServiceError::Validation)?;

        let (Some(username), Some(email), Some(password), Some(role), Some(profile)) =
            (username, email, password, role, profile)
        else {
            return Err(AccountServiceError::Validation(FieldErrors::single(
                "non_field_errors",
                "incomplete registration",
            )));
        };

        if self.repository.username_taken(&username)? {
            return Err(AccountServiceError::UsernameTaken);
        }
        if self.repository.email_taken(&email)? {
            return Err(AccountServiceError::EmailTaken);
        }

        let new = NewAccount {
            username,
            email,
            password_hash: hash_password(&password, self.bcrypt_cost).await?,
            first_name: first_name.unwrap_or_default(),
            last_name: last_name.unwrap_or_default(),
            is_staff: false,
            profile,
        };

        let token = new_token();
        let account = match self.repository.create_account(&new, &token) {
            Ok(account) => account,
            Err(RepositoryError::Conflict) => return Err(self.conflict(&new)?),
            Err(err) => return Err(err.into()),
        };
        let role = match role {
            RegistrationRole::Student => Role::Student,
            RegistrationRole::Employer => Role::Employer,
        };
        Ok(Session {
            token,
            account,
            role,
        })
    }

    /// Verify credentials and hand back the user's token, creating it on first login.
    pub async fn login(&self, request: LoginRequest) -> Result<Session, AccountServiceError> {
        let (Some(username), Some(password)) = (request.username, request.password) else {
            return Err(AccountServiceError::InvalidCredentials);
        };
        let Some(credentials) = self.repository.find_credentials(username.trim())? else {
            return Err(AccountServiceError::InvalidCredentials);
        };
        if !verify_password(&password, &credentials.password_hash).await? {
            return Err(AccountServiceError::InvalidCredentials);
        }

        let Some(account) = credentials.caller.account().cloned() else {
            return Err(AccountServiceError::InvalidCredentials);
        };
        let token = self.repository.issue_token(account.id, &new_token())?;
        Ok(Session {
            token,
            role: credentials.caller.role(),
            account,
        })
    }

    pub fn me(&self, caller: &Caller) -> Result<MeView, AccountServiceError> {
        let account = caller
            .account()
            .ok_or(AccountServiceError::Unauthenticated)?;

        let (student_profile, employer_profile) = match caller {
            Caller::Student(_) => (self.repository.fetch_student(account.id)?, None),
            Caller::Employer(_) => (None, self.repository.fetch_employer(account.id)?),
            _ => (None, None),
        };

        Ok(MeView {
            id: account.id,
            username: account.username.clone(),
            email: account.email.clone(),
            first_name: account.first_name.clone(),
            last_name: account.last_name.clone(),
            role: caller.role(),
            student_profile,
            employer_profile,
        })
    }

    /// Staff user without a profile, for the `create-admin` command.
    pub async fn create_admin(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<UserAccount, AccountServiceError> {
        let mut errors = FieldErrors::default();
        let username = required_text(&mut errors, "username", Some(username), Some(MAX_USERNAME));
        let email = required_text(&mut errors, "email", Some(email), Some(MAX_EMAIL));
        let password = checked_password(&mut errors, Some(password));
        errors
            .into_result()
            .map_err(AccountServiceError::Validation)?;
        let (Some(username), Some(email), Some(password)) = (username, email, password) else {
            return Err(AccountServiceError::Validation(FieldErrors::single(
                "non_field_errors",
                "incomplete account",
            )));
        };

        if self.repository.username_taken(&username)? {
            return Err(AccountServiceError::UsernameTaken);
        }
        if self.repository.email_taken(&email)? {
            return Err(AccountServiceError::EmailTaken);
        }

        let new = NewAccount {
            username,
            email,
            password_hash: hash_password(&password, self.bcrypt_cost).await?,
            first_name: String::new(),
            last_name: String::new(),
            is_staff: true,
            profile: NewProfile::None,
        };
        match self.repository.create_account(&new, &new_token()) {
            Ok(account) => Ok(account),
            Err(RepositoryError::Conflict) => Err(self.conflict(&new)?),
            Err(err) => Err(err.into()),
        }
    }

    /// Name the unique field a concurrent insert beat us to.
    fn conflict(&self, new: &NewAccount) -> Result<AccountServiceError, AccountServiceError> {
        let email_taken = self.repository.email_taken(&new.email)?;
        if email_taken && !self.repository.username_taken(&new.username)? {
            return Ok(AccountServiceError::EmailTaken);
        }
        Ok(AccountServiceError::UsernameTaken)
    }
}

fn new_token() -> String {
    Uuid::new_v4().simple().to_string()
}

fn trimmed(value: &Option<String>) -> Option<String> {
    value.as_deref().map(|text| text.trim().to_string())
}

/// Student profile fields; `course` defaults to 1.
fn student_profile(errors: &mut FieldErrors, request: &RegisterRequest) -> Option<NewProfile> {
    let course = match request.course.as_ref() {
        None | Some(serde_json::Value::Null) => Some(1),
        Some(value) => parse_course(errors, value),
    };
    let faculty = short_text(errors, "faculty", trimmed(&request.faculty));
    Some(NewProfile::Student {
        faculty: faculty.unwrap_or_default(),
        course: course?,
        phone: trimmed(&request.phone),
    })
}

fn employer_profile(errors: &mut FieldErrors, request: &RegisterRequest) -> NewProfile {
    NewProfile::Employer {
        company_name: short_text(errors, "company_name", trimmed(&request.company_name))
            .unwrap_or_default(),
        department: short_text(errors, "department", trimmed(&request.department))
            .unwrap_or_default(),
        contact_person: short_text(errors, "contact_person", trimmed(&request.contact_person))
            .unwrap_or_default(),
        phone: trimmed(&request.phone).unwrap_or_default(),
        description: request.description.clone(),
    }
}

/// Non-empty and within the bcrypt input limit. The password is not trimmed.
fn checked_password(errors: &mut FieldErrors, value: Option<&str>) -> Option<String> {
    match value {
        None => {
            errors.push("password", "This field is required.");
            None
        }
        Some(password) if password.trim().is_empty() => {
            errors.push("password", "This field may not be blank.");
            None
        }
        Some(password) if password.len() > MAX_PASSWORD_BYTES => {
            errors.push(
                "password",
                format!("Ensure this field has no more than {MAX_PASSWORD_BYTES} bytes."),
            );
            None
        }
        Some(password) => Some(password.to_string()),
    }
}

/// Error raised by the account service.
#[derive(Debug, thiserror::Error)]
pub enum AccountServiceError {
    #[error("authentication credentials were not provided")]
    Unauthenticated,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("a user with that username already exists")]
    UsernameTaken,
    #[error("a user with that email already exists")]
    EmailTaken,
    #[error("invalid registration data: {0}")]
    Validation(FieldErrors),
    #[error(transparent)]
    Password(#[from] PasswordError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteStore;
    use crate::workflows::validation::MAX_SHORT_TEXT;

    fn service() -> AccountService<SqliteStore> {
        let store = SqliteStore::in_memory().expect("in-memory store");
        AccountService::new(Arc::new(store), AuthConfig { bcrypt_cost: 4 })
    }

    fn employer_request(username: &str, email: &str) -> RegisterRequest {
        RegisterRequest {
            username: Some(username.to_string()),
            email: Some(email.to_string()),
            password: Some("employer123".to_string()),
            role: Some("employer".to_string()),
            company_name: Some("IT Department".to_string()),
            department: Some("Development".to_string()),
            contact_person: Some("Anna Sidorova".to_string()),
            phone: Some("+79997654321".to_string()),
            ..RegisterRequest::default()
        }
    }

    #[test]
    fn password_must_be_present_and_fit_bcrypt() {
        let mut errors = FieldErrors::default();
        assert_eq!(checked_password(&mut errors, None), None);
        assert!(errors.contains("password"));

        let mut errors = FieldErrors::default();
        let long = "x".repeat(MAX_PASSWORD_BYTES + 1);
        assert_eq!(checked_password(&mut errors, Some(&long)), None);

        let mut errors = FieldErrors::default();
        assert_eq!(
            checked_password(&mut errors, Some(" spaced ")),
            Some(" spaced ".to_string())
        );
        assert!(errors.is_empty());
    }

    #[test]
    fn tokens_are_32_hex_characters() {
        let token = new_token();
        assert_eq!(token.len(), 32);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(token, new_token());
    }

    #[tokio::test]
    async fn overlong_profile_fields_are_rejected_not_cut() {
        let service = service();
        let request = RegisterRequest {
            company_name: Some("x".repeat(256)),
            last_name: Some("y".repeat(300)),
            ..employer_request("employer_test", "employer@test.edu")
        };

        match service.register(request).await {
            Err(AccountServiceError::Validation(errors)) => {
                assert!(errors.contains("company_name"), "{errors}");
                assert!(errors.contains("last_name"), "{errors}");
            }
            other => panic!("expected validation failure, got {other:?}"),
        }
        assert!(!service
            .repository
            .username_taken("employer_test")
            .expect("lookup"));

        let exact = RegisterRequest {
            company_name: Some("x".repeat(MAX_SHORT_TEXT)),
            ..employer_request("employer_test", "employer@test.edu")
        };
        service.register(exact).await.expect("255 characters fit");
    }

    #[tokio::test]
    async fn course_is_only_read_for_students() {
        let service = service();
        let employer = RegisterRequest {
            course: Some(serde_json::json!("not a number")),
            ..employer_request("employer_test", "employer@test.edu")
        };
        let session = service.register(employer).await.expect("employer registers");
        assert_eq!(session.role, Role::Employer);

        let student = RegisterRequest {
            username: Some("ivan".to_string()),
            email: Some("ivan@test.edu".to_string()),
            password: Some("student123".to_string()),
            course: Some(serde_json::json!("not a number")),
            ..RegisterRequest::default()
        };
        match service.register(student).await {
            Err(AccountServiceError::Validation(errors)) => assert!(errors.contains("course")),
            other => panic!("expected course rejection, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn insert_conflicts_name_the_field_already_taken() {
        let service = service();
        let session = service
            .register(employer_request("employer_test", "employer@test.edu"))
            .await
            .expect("first registration");

        let mut new = NewAccount {
            username: "someone_else".to_string(),
            email: session.account.email.clone(),
            password_hash: "hash".to_string(),
            first_name: String::new(),
            last_name: String::new(),
            is_staff: false,
            profile: NewProfile::None,
        };
        assert!(matches!(
            service.conflict(&new),
            Ok(AccountServiceError::EmailTaken)
        ));

        new.username = session.account.username.clone();
        new.email = "fresh@test.edu".to_string();
        assert!(matches!(
            service.conflict(&new),
            Ok(AccountServiceError::UsernameTaken)
        ));
    }
}
