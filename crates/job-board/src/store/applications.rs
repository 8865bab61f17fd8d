use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

use super::notifications::insert_notification;
use super::profiles::load_student;
use super::vacancies::load_vacancy;
use super::{enum_column, SqliteStore};
use crate::identity::UserId;
use crate::workflows::applications::{
    Application, ApplicationId, ApplicationRepository, ApplicationScope, ApplicationStatus,
    Interview, InterviewStatus, NewApplication, NewInterview, NewReview, Review,
};
use crate::workflows::notifications::NewNotification;
use crate::workflows::vacancies::VacancyId;
use crate::workflows::RepositoryError;

const APPLICATION_COLUMNS: &str = "a.id, a.student_id, a.vacancy_id, a.resume_url, \
     a.cover_letter, a.status, a.applied_at, a.updated_at";

struct ApplicationRow {
    id: i64,
    student_id: i64,
    vacancy_id: i64,
    resume_url: String,
    cover_letter: String,
    status: ApplicationStatus,
    applied_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn application_row(row: &Row<'_>) -> rusqlite::Result<ApplicationRow> {
    Ok(ApplicationRow {
        id: row.get("id")?,
        student_id: row.get("student_id")?,
        vacancy_id: row.get("vacancy_id")?,
        resume_url: row.get("resume_url")?,
        cover_letter: row.get("cover_letter")?,
        status: enum_column(row, "status", ApplicationStatus::parse)?,
        applied_at: row.get("applied_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn load_review(conn: &Connection, application: i64) -> rusqlite::Result<Option<Review>> {
    conn.query_row(
        "SELECT id, rating, comment, from_role, created_at FROM reviews WHERE application_id = ?1",
        params![application],
        |row| {
            Ok(Review {
                id: row.get("id")?,
                rating: row.get("rating")?,
                comment: row.get("comment")?,
                from_role: row.get("from_role")?,
                created_at: row.get("created_at")?,
            })
        },
    )
    .optional()
}

fn load_interview(conn: &Connection, application: i64) -> rusqlite::Result<Option<Interview>> {
    conn.query_row(
        "SELECT id, scheduled_at, meeting_link, location, notes, status \
         FROM interviews WHERE application_id = ?1",
        params![application],
        |row| {
            Ok(Interview {
                id: row.get("id")?,
                scheduled_at: row.get("scheduled_at")?,
                meeting_link: row.get("meeting_link")?,
                location: row.get("location")?,
                notes: row.get("notes")?,
                status: enum_column(row, "status", InterviewStatus::parse)?,
            })
        },
    )
    .optional()
}

fn hydrate(conn: &Connection, row: ApplicationRow) -> Result<Application, RepositoryError> {
    let student = load_student(conn, UserId(row.student_id))?.ok_or_else(|| {
        RepositoryError::Unavailable(format!("application {} has no student profile", row.id))
    })?;
    let vacancy = load_vacancy(conn, VacancyId(row.vacancy_id))?.ok_or_else(|| {
        RepositoryError::Unavailable(format!("application {} has no vacancy", row.id))
    })?;
    Ok(Application {
        id: ApplicationId(row.id),
        student,
        vacancy,
        resume_url: row.resume_url,
        cover_letter: row.cover_letter,
        status: row.status,
        applied_at: row.applied_at,
        updated_at: row.updated_at,
        review: load_review(conn, row.id)?,
        interview: load_interview(conn, row.id)?,
    })
}

/// Applications visible in `scope`, optionally narrowed to one application or vacancy.
fn select_applications(
    conn: &Connection,
    scope: ApplicationScope,
    id: Option<ApplicationId>,
    vacancy: Option<VacancyId>,
) -> Result<Vec<Application>, RepositoryError> {
    let mut conditions: Vec<String> = Vec::new();
    let mut values: Vec<Value> = Vec::new();

    match scope {
        ApplicationScope::Nothing => return Ok(Vec::new()),
        ApplicationScope::SubmittedBy(student) => {
            values.push(Value::Integer(student.0));
            conditions.push(format!("a.student_id = ?{}", values.len()));
        }
        ApplicationScope::ReceivedBy(employer) => {
            values.push(Value::Integer(employer.0));
            conditions.push(format!("v.employer_id = ?{}", values.len()));
        }
        ApplicationScope::Everything => {}
    }
    if let Some(id) = id {
        values.push(Value::Integer(id.0));
        conditions.push(format!("a.id = ?{}", values.len()));
    }
    if let Some(vacancy) = vacancy {
        values.push(Value::Integer(vacancy.0));
        conditions.push(format!("a.vacancy_id = ?{}", values.len()));
    }

    let filter = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };
    let sql = format!(
        "SELECT {APPLICATION_COLUMNS} FROM applications a \
         JOIN vacancies v ON v.id = a.vacancy_id {filter} \
         ORDER BY a.applied_at DESC, a.id DESC"
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params_from_iter(values), application_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    rows.into_iter().map(|row| hydrate(conn, row)).collect()
}

fn load_application(
    conn: &Connection,
    id: ApplicationId,
) -> Result<Application, RepositoryError> {
    select_applications(conn, ApplicationScope::Everything, Some(id), None)?
        .into_iter()
        .next()
        .ok_or(RepositoryError::NotFound)
}

impl ApplicationRepository for SqliteStore {
    fn application_exists(
        &self,
        student: UserId,
        vacancy: VacancyId,
    ) -> Result<bool, RepositoryError> {
        let conn = self.lock()?;
        Ok(conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM applications WHERE student_id = ?1 AND vacancy_id = ?2)",
            params![student.0, vacancy.0],
            |row| row.get(0),
        )?)
    }

    fn insert_application(&self, new: &NewApplication) -> Result<Application, RepositoryError> {
        let now = Utc::now();
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO applications \
             (student_id, vacancy_id, resume_url, cover_letter, status, applied_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
            params![
                new.student.0,
                new.vacancy.0,
                new.resume_url,
                new.cover_letter,
                ApplicationStatus::Pending.label(),
                now,
            ],
        )?;
        let application = load_application(&tx, ApplicationId(tx.last_insert_rowid()))?;
        tx.commit()?;
        Ok(application)
    }

    fn list_applications(
        &self,
        scope: ApplicationScope,
        vacancy: Option<VacancyId>,
    ) -> Result<Vec<Application>, RepositoryError> {
        let conn = self.lock()?;
        select_applications(&conn, scope, None, vacancy)
    }

    fn fetch_application(
        &self,
        scope: ApplicationScope,
        id: ApplicationId,
    ) -> Result<Option<Application>, RepositoryError> {
        let conn = self.lock()?;
        Ok(select_applications(&conn, scope, Some(id), None)?
            .into_iter()
            .next())
    }

    fn delete_application(&self, id: ApplicationId) -> Result<(), RepositoryError> {
        let conn = self.lock()?;
        match conn.execute("DELETE FROM applications WHERE id = ?1", params![id.0])? {
            0 => Err(RepositoryError::NotFound),
            _ => Ok(()),
        }
    }

    fn update_status(
        &self,
        id: ApplicationId,
        status: ApplicationStatus,
        notification: &NewNotification,
    ) -> Result<Application, RepositoryError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let changed = tx.execute(
            "UPDATE applications SET status = ?1, updated_at = ?2 WHERE id = ?3",
            params![status.label(), Utc::now(), id.0],
        )?;
        if changed == 0 {
            return Err(RepositoryError::NotFound);
        }
        insert_notification(&tx, notification)?;
        let application = load_application(&tx, id)?;
        tx.commit()?;
        Ok(application)
    }

    fn insert_review(
        &self,
        review: &NewReview,
        notification: &NewNotification,
    ) -> Result<Application, RepositoryError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO reviews (application_id, rating, comment, from_role, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                review.application.0,
                review.rating,
                review.comment,
                review.from_role,
                Utc::now(),
            ],
        )?;
        insert_notification(&tx, notification)?;
        let application = load_application(&tx, review.application)?;
        tx.commit()?;
        Ok(application)
    }

    fn insert_interview(
        &self,
        interview: &NewInterview,
        notification: &NewNotification,
    ) -> Result<Application, RepositoryError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO interviews \
             (application_id, scheduled_at, meeting_link, location, notes, status) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                interview.application.0,
                interview.scheduled_at,
                interview.meeting_link,
                interview.location,
                interview.notes,
                InterviewStatus::Scheduled.label(),
            ],
        )?;
        insert_notification(&tx, notification)?;
        let application = load_application(&tx, interview.application)?;
        tx.commit()?;
        Ok(application)
    }
}
