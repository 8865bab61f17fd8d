use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

use super::catalog::{load_category, load_skills, replace_skills};
use super::profiles::load_employer;
use super::{enum_column, placeholders, SqliteStore};
use crate::identity::UserId;
use crate::workflows::catalog::{CategoryId, SkillId};
use crate::workflows::vacancies::{
    Vacancy, VacancyDraft, VacancyId, VacancyQuery, VacancyRepository, VacancyScope, VacancyType,
};
use crate::workflows::RepositoryError;

const VACANCY_COLUMNS: &str = "v.id, v.employer_id, v.title, v.description, v.requirements, \
     v.vacancy_type, v.salary, v.location, v.is_active, v.category_id, v.created_at, \
     v.updated_at, \
     (SELECT COUNT(*) FROM applications a WHERE a.vacancy_id = v.id) AS applications_count";

/// Flat vacancy row before the nested employer, category, and skills are attached.
struct VacancyRow {
    id: i64,
    employer_id: i64,
    title: String,
    description: String,
    requirements: String,
    vacancy_type: VacancyType,
    salary: Option<f64>,
    location: String,
    is_active: bool,
    category_id: Option<i64>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    applications_count: i64,
}

fn vacancy_row(row: &Row<'_>) -> rusqlite::Result<VacancyRow> {
    Ok(VacancyRow {
        id: row.get("id")?,
        employer_id: row.get("employer_id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        requirements: row.get("requirements")?,
        vacancy_type: enum_column(row, "vacancy_type", VacancyType::parse)?,
        salary: row.get("salary")?,
        location: row.get("location")?,
        is_active: row.get("is_active")?,
        category_id: row.get("category_id")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
        applications_count: row.get("applications_count")?,
    })
}

fn hydrate(conn: &Connection, row: VacancyRow) -> Result<Vacancy, RepositoryError> {
    let employer = load_employer(conn, UserId(row.employer_id))?.ok_or_else(|| {
        RepositoryError::Unavailable(format!("vacancy {} has no employer profile", row.id))
    })?;
    let category = match row.category_id {
        Some(id) => load_category(conn, CategoryId(id))?,
        None => None,
    };
    Ok(Vacancy {
        id: VacancyId(row.id),
        employer,
        title: row.title,
        description: row.description,
        requirements: row.requirements,
        vacancy_type: row.vacancy_type,
        salary: row.salary,
        location: row.location,
        is_active: row.is_active,
        created_at: row.created_at,
        updated_at: row.updated_at,
        category,
        skills: load_skills(conn, "vacancy_skills", "vacancy_id", row.id)?,
        applications_count: u64::try_from(row.applications_count).unwrap_or_default(),
    })
}

pub(super) fn load_vacancy(
    conn: &Connection,
    id: VacancyId,
) -> Result<Option<Vacancy>, RepositoryError> {
    let sql = format!("SELECT {VACANCY_COLUMNS} FROM vacancies v WHERE v.id = ?1");
    match conn.query_row(&sql, params![id.0], vacancy_row).optional()? {
        Some(row) => Ok(Some(hydrate(conn, row)?)),
        None => Ok(None),
    }
}

/// Escape `LIKE` wildcards so the search term matches literally.
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

fn draft_values(draft: &VacancyDraft) -> Vec<Value> {
    vec![
        Value::from(draft.title.clone()),
        Value::from(draft.description.clone()),
        Value::from(draft.requirements.clone()),
        Value::from(draft.vacancy_type.label().to_string()),
        Value::from(draft.salary),
        Value::from(draft.location.clone()),
        Value::from(draft.is_active),
        Value::from(draft.category_id.map(|id| id.0)),
    ]
}

impl VacancyRepository for SqliteStore {
    fn list_vacancies(&self, query: &VacancyQuery) -> Result<Vec<Vacancy>, RepositoryError> {
        let mut conditions: Vec<String> = Vec::new();
        let mut values: Vec<Value> = Vec::new();

        match query.scope {
            VacancyScope::ActiveOnly => conditions.push("v.is_active = 1".to_string()),
            VacancyScope::ActiveOrOwnedBy(owner) => {
                values.push(Value::Integer(owner.0));
                conditions.push(format!("(v.is_active = 1 OR v.employer_id = ?{})", values.len()));
            }
            VacancyScope::OwnedBy(owner) => {
                values.push(Value::Integer(owner.0));
                conditions.push(format!("v.employer_id = ?{}", values.len()));
            }
            VacancyScope::Everything => {}
        }
        if let Some(vacancy_type) = &query.vacancy_type {
            values.push(Value::Text(vacancy_type.clone()));
            conditions.push(format!("v.vacancy_type = ?{}", values.len()));
        }
        if let Some(category) = query.category {
            values.push(Value::Integer(category.0));
            conditions.push(format!("v.category_id = ?{}", values.len()));
        }
        if let Some(search) = &query.search {
            values.push(Value::Text(like_pattern(search)));
            conditions.push(format!("v.title LIKE ?{} ESCAPE '\\'", values.len()));
        }

        let filter = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };
        let sql = format!(
            "SELECT {VACANCY_COLUMNS} FROM vacancies v {filter} \
             ORDER BY v.created_at DESC, v.id DESC"
        );

        let conn = self.lock()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(values), vacancy_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        rows.into_iter().map(|row| hydrate(&conn, row)).collect()
    }

    fn fetch_vacancy(&self, id: VacancyId) -> Result<Option<Vacancy>, RepositoryError> {
        let conn = self.lock()?;
        load_vacancy(&conn, id)
    }

    fn insert_vacancy(
        &self,
        employer: UserId,
        draft: &VacancyDraft,
    ) -> Result<Vacancy, RepositoryError> {
        let now = Utc::now();
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let mut values = draft_values(draft);
        values.push(Value::Integer(employer.0));
        values.push(Value::Text(now.to_rfc3339()));
        tx.execute(
            "INSERT INTO vacancies (title, description, requirements, vacancy_type, salary, \
             location, is_active, category_id, employer_id, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)",
            params_from_iter(values),
        )?;
        let id = tx.last_insert_rowid();

        if let Some(skills) = &draft.skill_ids {
            replace_skills(&tx, "vacancy_skills", "vacancy_id", id, skills)?;
        }
        let vacancy = load_vacancy(&tx, VacancyId(id))?.ok_or(RepositoryError::NotFound)?;
        tx.commit()?;
        Ok(vacancy)
    }

    fn update_vacancy(
        &self,
        id: VacancyId,
        draft: &VacancyDraft,
    ) -> Result<Vacancy, RepositoryError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let mut values = draft_values(draft);
        values.push(Value::Text(Utc::now().to_rfc3339()));
        values.push(Value::Integer(id.0));
        let changed = tx.execute(
            "UPDATE vacancies SET title = ?1, description = ?2, requirements = ?3, \
             vacancy_type = ?4, salary = ?5, location = ?6, is_active = ?7, category_id = ?8, \
             updated_at = ?9 WHERE id = ?10",
            params_from_iter(values),
        )?;
        if changed == 0 {
            return Err(RepositoryError::NotFound);
        }

        if let Some(skills) = &draft.skill_ids {
            replace_skills(&tx, "vacancy_skills", "vacancy_id", id.0, skills)?;
        }
        let vacancy = load_vacancy(&tx, id)?.ok_or(RepositoryError::NotFound)?;
        tx.commit()?;
        Ok(vacancy)
    }

    fn delete_vacancy(&self, id: VacancyId) -> Result<(), RepositoryError> {
        let conn = self.lock()?;
        match conn.execute("DELETE FROM vacancies WHERE id = ?1", params![id.0])? {
            0 => Err(RepositoryError::NotFound),
            _ => Ok(()),
        }
    }

    fn category_exists(&self, id: CategoryId) -> Result<bool, RepositoryError> {
        let conn = self.lock()?;
        Ok(conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM categories WHERE id = ?1)",
            params![id.0],
            |row| row.get(0),
        )?)
    }

    fn existing_skills(&self, ids: &[SkillId]) -> Result<Vec<SkillId>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let conn = self.lock()?;
        let sql = format!(
            "SELECT id FROM skills WHERE id IN ({}) ORDER BY id",
            placeholders(ids.len(), 0)
        );
        let mut stmt = conn.prepare(&sql)?;
        let found = stmt
            .query_map(params_from_iter(ids.iter().map(|id| id.0)), |row| {
                row.get(0).map(SkillId)
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(found)
    }
}
