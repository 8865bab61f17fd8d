use rusqlite::{params, Connection, OptionalExtension, Row};

use super::SqliteStore;
use crate::workflows::catalog::{Category, CategoryId, CatalogRepository, Skill, SkillId};
use crate::workflows::RepositoryError;

pub(super) fn category_from_row(row: &Row<'_>) -> rusqlite::Result<Category> {
    Ok(Category {
        id: CategoryId(row.get("id")?),
        name: row.get("name")?,
        slug: row.get("slug")?,
    })
}

pub(super) fn skill_from_row(row: &Row<'_>) -> rusqlite::Result<Skill> {
    Ok(Skill {
        id: SkillId(row.get("id")?),
        name: row.get("name")?,
    })
}

pub(super) fn load_category(
    conn: &Connection,
    id: CategoryId,
) -> rusqlite::Result<Option<Category>> {
    conn.query_row(
        "SELECT id, name, slug FROM categories WHERE id = ?1",
        params![id.0],
        category_from_row,
    )
    .optional()
}

/// Skills attached to a row of `table` (`student_skills` or `vacancy_skills`).
pub(super) fn load_skills(
    conn: &Connection,
    table: &str,
    owner_column: &str,
    owner: i64,
) -> rusqlite::Result<Vec<Skill>> {
    let sql = format!(
        "SELECT s.id, s.name FROM skills s \
         JOIN {table} link ON link.skill_id = s.id \
         WHERE link.{owner_column} = ?1 ORDER BY s.name"
    );
    let mut stmt = conn.prepare_cached(&sql)?;
    let skills = stmt
        .query_map(params![owner], skill_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(skills)
}

/// Replace the skill links of one owner. Unknown skill ids are skipped.
pub(super) fn replace_skills(
    conn: &Connection,
    table: &str,
    owner_column: &str,
    owner: i64,
    skills: &[SkillId],
) -> rusqlite::Result<()> {
    conn.execute(
        &format!("DELETE FROM {table} WHERE {owner_column} = ?1"),
        params![owner],
    )?;
    let mut insert = conn.prepare_cached(&format!(
        "INSERT OR IGNORE INTO {table} ({owner_column}, skill_id) \
         SELECT ?1, id FROM skills WHERE id = ?2"
    ))?;
    for skill in skills {
        insert.execute(params![owner, skill.0])?;
    }
    Ok(())
}

impl CatalogRepository for SqliteStore {
    fn list_categories(&self) -> Result<Vec<Category>, RepositoryError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare_cached("SELECT id, name, slug FROM categories ORDER BY name")?;
        let categories = stmt
            .query_map([], category_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(categories)
    }

    fn fetch_category(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError> {
        let conn = self.lock()?;
        Ok(load_category(&conn, id)?)
    }

    fn list_skills(&self) -> Result<Vec<Skill>, RepositoryError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare_cached("SELECT id, name FROM skills ORDER BY name")?;
        let skills = stmt
            .query_map([], skill_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(skills)
    }

    fn fetch_skill(&self, id: SkillId) -> Result<Option<Skill>, RepositoryError> {
        let conn = self.lock()?;
        Ok(conn
            .query_row(
                "SELECT id, name FROM skills WHERE id = ?1",
                params![id.0],
                skill_from_row,
            )
            .optional()?)
    }
}
