use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

use super::catalog::{load_skills, replace_skills};
use super::SqliteStore;
use crate::identity::UserId;
use crate::workflows::catalog::Skill;
use crate::workflows::profiles::{
    EmployerProfileChanges, EmployerProfileView, ProfileRepository, StudentProfileChanges,
    StudentProfileView, UserView,
};
use crate::workflows::RepositoryError;

const STUDENT_COLUMNS: &str = "u.id, u.username, u.email, \
     u.first_name AS user_first_name, u.last_name AS user_last_name, \
     p.first_name, p.last_name, p.faculty, p.course, p.resume_url, p.phone, p.created_at";

const EMPLOYER_COLUMNS: &str = "u.id, u.username, u.email, \
     u.first_name AS user_first_name, u.last_name AS user_last_name, \
     p.first_name, p.last_name, p.company_name, p.department, p.contact_person, \
     p.phone, p.description";

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<UserView> {
    Ok(UserView {
        id: UserId(row.get("id")?),
        username: row.get("username")?,
        email: row.get("email")?,
        first_name: row.get("user_first_name")?,
        last_name: row.get("user_last_name")?,
    })
}

fn student_from_row(row: &Row<'_>) -> rusqlite::Result<StudentProfileView> {
    Ok(StudentProfileView {
        id: UserId(row.get("id")?),
        user: user_from_row(row)?,
        first_name: row.get("first_name")?,
        last_name: row.get("last_name")?,
        faculty: row.get("faculty")?,
        course: row.get("course")?,
        resume_url: row.get("resume_url")?,
        phone: row.get("phone")?,
        created_at: row.get("created_at")?,
        skills: Vec::new(),
    })
}

fn employer_from_row(row: &Row<'_>) -> rusqlite::Result<EmployerProfileView> {
    Ok(EmployerProfileView {
        id: UserId(row.get("id")?),
        user: user_from_row(row)?,
        first_name: row.get("first_name")?,
        last_name: row.get("last_name")?,
        company_name: row.get("company_name")?,
        department: row.get("department")?,
        contact_person: row.get("contact_person")?,
        phone: row.get("phone")?,
        description: row.get("description")?,
    })
}

pub(super) fn load_student(
    conn: &Connection,
    id: UserId,
) -> rusqlite::Result<Option<StudentProfileView>> {
    let sql = format!(
        "SELECT {STUDENT_COLUMNS} FROM student_profiles p \
         JOIN users u ON u.id = p.user_id WHERE p.user_id = ?1"
    );
    let Some(mut profile) = conn
        .query_row(&sql, params![id.0], student_from_row)
        .optional()?
    else {
        return Ok(None);
    };
    profile.skills = load_skills(conn, "student_skills", "student_id", id.0)?;
    Ok(Some(profile))
}

pub(super) fn load_employer(
    conn: &Connection,
    id: UserId,
) -> rusqlite::Result<Option<EmployerProfileView>> {
    let sql = format!(
        "SELECT {EMPLOYER_COLUMNS} FROM employer_profiles p \
         JOIN users u ON u.id = p.user_id WHERE p.user_id = ?1"
    );
    conn.query_row(&sql, params![id.0], employer_from_row)
        .optional()
}

/// Dynamic `SET` clause for partial updates.
#[derive(Default)]
pub(super) struct Assignments {
    columns: Vec<String>,
    values: Vec<Value>,
}

impl Assignments {
    pub(super) fn set(&mut self, column: &str, value: impl Into<Value>) {
        self.values.push(value.into());
        self.columns
            .push(format!("{column} = ?{}", self.values.len()));
    }

    /// Execute `UPDATE table SET ... WHERE key_column = key`. Returns the
    /// number of rows touched, or `None` when nothing was assigned.
    pub(super) fn apply(
        mut self,
        conn: &Connection,
        table: &str,
        key_column: &str,
        key: i64,
    ) -> rusqlite::Result<Option<usize>> {
        if self.columns.is_empty() {
            return Ok(None);
        }
        self.values.push(Value::Integer(key));
        let sql = format!(
            "UPDATE {table} SET {} WHERE {key_column} = ?{}",
            self.columns.join(", "),
            self.values.len()
        );
        conn.execute(&sql, params_from_iter(self.values))
            .map(Some)
    }
}

/// Empty strings clear nullable text columns.
fn nullable(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn profile_exists(conn: &Connection, table: &str, id: UserId) -> rusqlite::Result<bool> {
    conn.query_row(
        &format!("SELECT EXISTS(SELECT 1 FROM {table} WHERE user_id = ?1)"),
        params![id.0],
        |row| row.get(0),
    )
}

impl ProfileRepository for SqliteStore {
    fn fetch_student(&self, id: UserId) -> Result<Option<StudentProfileView>, RepositoryError> {
        let conn = self.lock()?;
        Ok(load_student(&conn, id)?)
    }

    fn fetch_employer(&self, id: UserId) -> Result<Option<EmployerProfileView>, RepositoryError> {
        let conn = self.lock()?;
        Ok(load_employer(&conn, id)?)
    }

    fn student_skills(&self, id: UserId) -> Result<Vec<Skill>, RepositoryError> {
        let conn = self.lock()?;
        Ok(load_skills(&conn, "student_skills", "student_id", id.0)?)
    }

    fn update_student(
        &self,
        id: UserId,
        changes: &StudentProfileChanges,
    ) -> Result<StudentProfileView, RepositoryError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        if !profile_exists(&tx, "student_profiles", id)? {
            return Err(RepositoryError::NotFound);
        }

        let mut assignments = Assignments::default();
        if let Some(first_name) = &changes.first_name {
            assignments.set("first_name", first_name.clone());
        }
        if let Some(last_name) = &changes.last_name {
            assignments.set("last_name", last_name.clone());
        }
        if let Some(faculty) = &changes.faculty {
            assignments.set("faculty", faculty.clone());
        }
        if let Some(course) = changes.course {
            assignments.set("course", course);
        }
        if let Some(phone) = &changes.phone {
            assignments.set("phone", nullable(phone));
        }
        if let Some(resume_url) = &changes.resume_url {
            assignments.set("resume_url", nullable(resume_url));
        }
        assignments.apply(&tx, "student_profiles", "user_id", id.0)?;

        if let Some(skills) = &changes.skills {
            replace_skills(&tx, "student_skills", "student_id", id.0, skills)?;
        }

        let profile = load_student(&tx, id)?.ok_or(RepositoryError::NotFound)?;
        tx.commit()?;
        Ok(profile)
    }

    fn update_employer(
        &self,
        id: UserId,
        changes: &EmployerProfileChanges,
    ) -> Result<EmployerProfileView, RepositoryError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        if !profile_exists(&tx, "employer_profiles", id)? {
            return Err(RepositoryError::NotFound);
        }

        let mut assignments = Assignments::default();
        if let Some(first_name) = &changes.first_name {
            assignments.set("first_name", first_name.clone());
        }
        if let Some(last_name) = &changes.last_name {
            assignments.set("last_name", last_name.clone());
        }
        if let Some(company_name) = &changes.company_name {
            assignments.set("company_name", company_name.clone());
        }
        if let Some(department) = &changes.department {
            assignments.set("department", department.clone());
        }
        if let Some(contact_person) = &changes.contact_person {
            assignments.set("contact_person", contact_person.clone());
        }
        if let Some(phone) = &changes.phone {
            assignments.set("phone", phone.clone());
        }
        if let Some(description) = &changes.description {
            assignments.set("description", nullable(description));
        }
        assignments.apply(&tx, "employer_profiles", "user_id", id.0)?;

        let profile = load_employer(&tx, id)?.ok_or(RepositoryError::NotFound)?;
        tx.commit()?;
        Ok(profile)
    }
}
