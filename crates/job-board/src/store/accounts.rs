use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::SqliteStore;
use crate::identity::{Caller, IdentityResolver, UserAccount, UserId};
use crate::workflows::accounts::{AccountRepository, Credentials, NewAccount, NewProfile};
use crate::workflows::RepositoryError;

/// User columns plus whether each profile row exists.
const CALLER_COLUMNS: &str = "u.id, u.username, u.email, u.first_name, u.last_name, u.is_staff, \
     EXISTS(SELECT 1 FROM student_profiles s WHERE s.user_id = u.id) AS has_student, \
     EXISTS(SELECT 1 FROM employer_profiles e WHERE e.user_id = u.id) AS has_employer";

fn caller_from_row(row: &Row<'_>) -> rusqlite::Result<Caller> {
    let account = UserAccount {
        id: UserId(row.get("id")?),
        username: row.get("username")?,
        email: row.get("email")?,
        first_name: row.get("first_name")?,
        last_name: row.get("last_name")?,
        is_staff: row.get("is_staff")?,
    };
    Ok(Caller::from_relations(
        account,
        row.get("has_student")?,
        row.get("has_employer")?,
    ))
}

fn insert_profile(conn: &Connection, user: i64, new: &NewAccount) -> rusqlite::Result<()> {
    match &new.profile {
        NewProfile::Student {
            faculty,
            course,
            phone,
        } => {
            conn.execute(
                "INSERT INTO student_profiles \
                 (user_id, first_name, last_name, faculty, course, phone, created_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    user,
                    new.first_name,
                    new.last_name,
                    faculty,
                    course,
                    phone.as_deref().filter(|phone| !phone.is_empty()),
                    Utc::now(),
                ],
            )?;
        }
        NewProfile::Employer {
            company_name,
            department,
            contact_person,
            phone,
            description,
        } => {
            conn.execute(
                "INSERT INTO employer_profiles \
                 (user_id, first_name, last_name, company_name, department, contact_person, \
                  phone, description) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    user,
                    new.first_name,
                    new.last_name,
                    company_name,
                    department,
                    contact_person,
                    phone,
                    description,
                ],
            )?;
        }
        NewProfile::None => {}
    }
    Ok(())
}

impl AccountRepository for SqliteStore {
    fn username_taken(&self, username: &str) -> Result<bool, RepositoryError> {
        let conn = self.lock()?;
        Ok(conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM users WHERE username = ?1)",
            params![username],
            |row| row.get(0),
        )?)
    }

    fn email_taken(&self, email: &str) -> Result<bool, RepositoryError> {
        let conn = self.lock()?;
        Ok(conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM users WHERE email = ?1 COLLATE NOCASE)",
            params![email],
            |row| row.get(0),
        )?)
    }

    fn create_account(
        &self,
        new: &NewAccount,
        token: &str,
    ) -> Result<UserAccount, RepositoryError> {
        let now = Utc::now();
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO users \
             (username, email, password_hash, first_name, last_name, is_staff, date_joined) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                new.username,
                new.email,
                new.password_hash,
                new.first_name,
                new.last_name,
                new.is_staff,
                now,
            ],
        )?;
        let user = tx.last_insert_rowid();
        insert_profile(&tx, user, new)?;
        tx.execute(
            "INSERT INTO auth_tokens (key, user_id, created_at) VALUES (?1, ?2, ?3)",
            params![token, user, now],
        )?;
        tx.commit()?;

        Ok(UserAccount {
            id: UserId(user),
            username: new.username.clone(),
            email: new.email.clone(),
            first_name: new.first_name.clone(),
            last_name: new.last_name.clone(),
            is_staff: new.is_staff,
        })
    }

    fn find_credentials(&self, username: &str) -> Result<Option<Credentials>, RepositoryError> {
        let conn = self.lock()?;
        Ok(conn
            .query_row(
                &format!("SELECT {CALLER_COLUMNS}, u.password_hash FROM users u WHERE u.username = ?1"),
                params![username],
                |row| {
                    Ok(Credentials {
                        caller: caller_from_row(row)?,
                        password_hash: row.get("password_hash")?,
                    })
                },
            )
            .optional()?)
    }

    fn issue_token(&self, user: UserId, candidate: &str) -> Result<String, RepositoryError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT OR IGNORE INTO auth_tokens (key, user_id, created_at) VALUES (?1, ?2, ?3)",
            params![candidate, user.0, Utc::now()],
        )?;
        Ok(conn.query_row(
            "SELECT key FROM auth_tokens WHERE user_id = ?1",
            params![user.0],
            |row| row.get(0),
        )?)
    }
}

impl IdentityResolver for SqliteStore {
    fn resolve_token(&self, token: &str) -> Result<Option<Caller>, RepositoryError> {
        let conn = self.lock()?;
        Ok(conn
            .query_row(
                &format!(
                    "SELECT {CALLER_COLUMNS} FROM auth_tokens t \
                     JOIN users u ON u.id = t.user_id WHERE t.key = ?1"
                ),
                params![token],
                caller_from_row,
            )
            .optional()?)
    }
}
