//! Demo data for local runs: one student, one employer, a few skills and
//! categories, and two vacancies. Safe to run repeatedly.

use rusqlite::params;
use uuid::Uuid;

use super::SqliteStore;
use crate::identity::UserId;
use crate::workflows::accounts::{AccountRepository, NewAccount, NewProfile};
use crate::workflows::catalog::{CategoryId, SkillId};
use crate::workflows::vacancies::{VacancyDraft, VacancyRepository, VacancyType};
use crate::workflows::RepositoryError;

pub const STUDENT_USERNAME: &str = "student_test";
pub const STUDENT_PASSWORD: &str = "student123";
pub const EMPLOYER_USERNAME: &str = "employer_test";
pub const EMPLOYER_PASSWORD: &str = "employer123";

/// bcrypt hashes of the demo passwords, computed by the caller.
#[derive(Debug, Clone)]
pub struct SeedPasswords {
    pub student_hash: String,
    pub employer_hash: String,
}

/// What a seeding run actually inserted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub users: usize,
    pub skills: usize,
    pub categories: usize,
    pub vacancies: usize,
}

impl SqliteStore {
    fn ensure_skill(&self, name: &str) -> Result<(SkillId, bool), RepositoryError> {
        let conn = self.lock()?;
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO skills (name) VALUES (?1)",
            params![name],
        )?;
        let id = conn.query_row(
            "SELECT id FROM skills WHERE name = ?1",
            params![name],
            |row| row.get(0),
        )?;
        Ok((SkillId(id), inserted > 0))
    }

    fn ensure_category(&self, name: &str, slug: &str) -> Result<(CategoryId, bool), RepositoryError> {
        let conn = self.lock()?;
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO categories (name, slug) VALUES (?1, ?2)",
            params![name, slug],
        )?;
        let id = conn.query_row(
            "SELECT id FROM categories WHERE slug = ?1",
            params![slug],
            |row| row.get(0),
        )?;
        Ok((CategoryId(id), inserted > 0))
    }

    fn user_id(&self, username: &str) -> Result<Option<UserId>, RepositoryError> {
        use rusqlite::OptionalExtension;
        let conn = self.lock()?;
        Ok(conn
            .query_row(
                "SELECT id FROM users WHERE username = ?1",
                params![username],
                |row| row.get(0).map(UserId),
            )
            .optional()?)
    }

    fn ensure_account(&self, new: NewAccount) -> Result<(UserId, bool), RepositoryError> {
        if let Some(id) = self.user_id(&new.username)? {
            return Ok((id, false));
        }
        let token = Uuid::new_v4().simple().to_string();
        let account = self.create_account(&new, &token)?;
        Ok((account.id, true))
    }

    fn vacancy_count(&self, employer: UserId) -> Result<i64, RepositoryError> {
        let conn = self.lock()?;
        Ok(conn.query_row(
            "SELECT COUNT(*) FROM vacancies WHERE employer_id = ?1",
            params![employer.0],
            |row| row.get(0),
        )?)
    }
}

pub fn seed_demo(
    store: &SqliteStore,
    passwords: &SeedPasswords,
) -> Result<SeedReport, RepositoryError> {
    let mut report = SeedReport::default();

    let (_, created) = store.ensure_account(NewAccount {
        username: STUDENT_USERNAME.to_string(),
        email: "student@test.edu".to_string(),
        password_hash: passwords.student_hash.clone(),
        first_name: "Ivan".to_string(),
        last_name: "Petrov".to_string(),
        is_staff: false,
        profile: NewProfile::Student {
            faculty: "Faculty of Computer Science".to_string(),
            course: 3,
            phone: Some("+79991234567".to_string()),
        },
    })?;
    report.users += usize::from(created);

    let (employer, created) = store.ensure_account(NewAccount {
        username: EMPLOYER_USERNAME.to_string(),
        email: "employer@test.edu".to_string(),
        password_hash: passwords.employer_hash.clone(),
        first_name: "Anna".to_string(),
        last_name: "Sidorova".to_string(),
        is_staff: false,
        profile: NewProfile::Employer {
            company_name: "IT Department".to_string(),
            department: "Development".to_string(),
            contact_person: "Anna Sidorova".to_string(),
            phone: "+79997654321".to_string(),
            description: None,
        },
    })?;
    report.users += usize::from(created);

    let mut skills = Vec::new();
    for name in ["Python", "Django", "JavaScript"] {
        let (id, created) = store.ensure_skill(name)?;
        report.skills += usize::from(created);
        skills.push(id);
    }
    let (research, created) = store.ensure_category("Research", "research")?;
    report.categories += usize::from(created);
    let (teaching, created) = store.ensure_category("Teaching", "teaching")?;
    report.categories += usize::from(created);

    if store.vacancy_count(employer)? == 0 {
        let drafts = [
            VacancyDraft {
                title: "Python developer assistant".to_string(),
                description: "Help build the university's internal systems".to_string(),
                requirements: "Python, Django basics".to_string(),
                vacancy_type: VacancyType::Internship,
                salary: Some(25_000.0),
                location: "Main building, room 305".to_string(),
                is_active: true,
                category_id: Some(research),
                skill_ids: Some(vec![skills[0], skills[1]]),
            },
            VacancyDraft {
                title: "Web development teaching assistant".to_string(),
                description: "Assist with practical classes".to_string(),
                requirements: "HTML, CSS, JavaScript".to_string(),
                vacancy_type: VacancyType::Work,
                salary: Some(15_000.0),
                location: "Building 2, room 112".to_string(),
                is_active: true,
                category_id: Some(teaching),
                skill_ids: Some(vec![skills[2]]),
            },
        ];
        for draft in &drafts {
            store.insert_vacancy(employer, draft)?;
            report.vacancies += 1;
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::catalog::CatalogRepository;
    use crate::workflows::vacancies::{VacancyQuery, VacancyScope};

    fn passwords() -> SeedPasswords {
        SeedPasswords {
            student_hash: "student-hash".to_string(),
            employer_hash: "employer-hash".to_string(),
        }
    }

    #[test]
    fn seeding_twice_inserts_nothing_new() {
        let store = SqliteStore::in_memory().expect("store");
        let first = seed_demo(&store, &passwords()).expect("first seed");
        assert_eq!(
            first,
            SeedReport {
                users: 2,
                skills: 3,
                categories: 2,
                vacancies: 2,
            }
        );

        let second = seed_demo(&store, &passwords()).expect("second seed");
        assert_eq!(second, SeedReport::default());
        assert_eq!(store.list_skills().expect("skills").len(), 3);
    }

    #[test]
    fn seeded_vacancies_are_public() {
        let store = SqliteStore::in_memory().expect("store");
        seed_demo(&store, &passwords()).expect("seed");
        let query = VacancyQuery {
            scope: VacancyScope::ActiveOnly,
            vacancy_type: None,
            category: None,
            search: Some("python".to_string()),
        };
        let found = store.list_vacancies(&query).expect("list");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].skills.len(), 2);
    }
}
