use rusqlite::Connection;

/// Idempotent DDL. Timestamps are stored as text written by the application.
const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    username      TEXT NOT NULL UNIQUE,
    email         TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    first_name    TEXT NOT NULL DEFAULT '',
    last_name     TEXT NOT NULL DEFAULT '',
    is_staff      INTEGER NOT NULL DEFAULT 0,
    date_joined   TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS auth_tokens (
    key        TEXT PRIMARY KEY,
    user_id    INTEGER NOT NULL UNIQUE REFERENCES users(id) ON DELETE CASCADE,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS student_profiles (
    user_id    INTEGER PRIMARY KEY REFERENCES users(id) ON DELETE CASCADE,
    first_name TEXT NOT NULL DEFAULT '',
    last_name  TEXT NOT NULL DEFAULT '',
    faculty    TEXT NOT NULL DEFAULT '',
    course     INTEGER NOT NULL DEFAULT 1 CHECK (course >= 1),
    resume_url TEXT,
    phone      TEXT,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS employer_profiles (
    user_id        INTEGER PRIMARY KEY REFERENCES users(id) ON DELETE CASCADE,
    first_name     TEXT NOT NULL DEFAULT '',
    last_name      TEXT NOT NULL DEFAULT '',
    company_name   TEXT NOT NULL DEFAULT '',
    department     TEXT NOT NULL DEFAULT '',
    contact_person TEXT NOT NULL DEFAULT '',
    phone          TEXT NOT NULL DEFAULT '',
    description    TEXT
);

CREATE TABLE IF NOT EXISTS categories (
    id   INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    slug TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS skills (
    id   INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS student_skills (
    student_id INTEGER NOT NULL REFERENCES student_profiles(user_id) ON DELETE CASCADE,
    skill_id   INTEGER NOT NULL REFERENCES skills(id) ON DELETE CASCADE,
    PRIMARY KEY (student_id, skill_id)
);

CREATE TABLE IF NOT EXISTS vacancies (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    employer_id  INTEGER NOT NULL REFERENCES employer_profiles(user_id) ON DELETE CASCADE,
    title        TEXT NOT NULL,
    description  TEXT NOT NULL,
    requirements TEXT NOT NULL,
    vacancy_type TEXT NOT NULL CHECK (vacancy_type IN ('work', 'internship')),
    salary       REAL CHECK (salary IS NULL OR salary >= 0),
    location     TEXT NOT NULL,
    is_active    INTEGER NOT NULL DEFAULT 1,
    category_id  INTEGER REFERENCES categories(id) ON DELETE SET NULL,
    created_at   TEXT NOT NULL,
    updated_at   TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS vacancy_skills (
    vacancy_id INTEGER NOT NULL REFERENCES vacancies(id) ON DELETE CASCADE,
    skill_id   INTEGER NOT NULL REFERENCES skills(id) ON DELETE CASCADE,
    PRIMARY KEY (vacancy_id, skill_id)
);

CREATE TABLE IF NOT EXISTS applications (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    student_id   INTEGER NOT NULL REFERENCES student_profiles(user_id) ON DELETE CASCADE,
    vacancy_id   INTEGER NOT NULL REFERENCES vacancies(id) ON DELETE CASCADE,
    resume_url   TEXT NOT NULL,
    cover_letter TEXT NOT NULL,
    status       TEXT NOT NULL DEFAULT 'pending'
                 CHECK (status IN ('pending', 'reviewed', 'accepted', 'rejected')),
    applied_at   TEXT NOT NULL,
    updated_at   TEXT NOT NULL,
    UNIQUE (student_id, vacancy_id)
);

CREATE TABLE IF NOT EXISTS interviews (
    id             INTEGER PRIMARY KEY AUTOINCREMENT,
    application_id INTEGER NOT NULL UNIQUE REFERENCES applications(id) ON DELETE CASCADE,
    scheduled_at   TEXT NOT NULL,
    meeting_link   TEXT,
    location       TEXT,
    notes          TEXT,
    status         TEXT NOT NULL DEFAULT 'scheduled'
                   CHECK (status IN ('scheduled', 'completed', 'cancelled'))
);

CREATE TABLE IF NOT EXISTS reviews (
    id             INTEGER PRIMARY KEY AUTOINCREMENT,
    application_id INTEGER NOT NULL UNIQUE REFERENCES applications(id) ON DELETE CASCADE,
    rating         INTEGER NOT NULL CHECK (rating BETWEEN 1 AND 5),
    comment        TEXT NOT NULL DEFAULT '',
    from_role      TEXT NOT NULL CHECK (from_role IN ('employer', 'student')),
    created_at     TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS notifications (
    id                INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id           INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    title             TEXT NOT NULL,
    message           TEXT NOT NULL,
    notification_type TEXT NOT NULL
                      CHECK (notification_type IN ('application_update', 'new_vacancy', 'system')),
    is_read           INTEGER NOT NULL DEFAULT 0,
    created_at        TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS notifications_user_read ON notifications (user_id, is_read);
CREATE INDEX IF NOT EXISTS vacancies_employer ON vacancies (employer_id);
CREATE INDEX IF NOT EXISTS applications_vacancy ON applications (vacancy_id);
"#;

pub(super) fn migrate(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migration_is_idempotent() {
        let conn = Connection::open_in_memory().expect("opens");
        migrate(&conn).expect("first run");
        migrate(&conn).expect("second run");

        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'",
                [],
                |row| row.get(0),
            )
            .expect("count tables");
        assert_eq!(tables, 13);
    }

    #[test]
    fn review_rating_is_range_checked() {
        let conn = Connection::open_in_memory().expect("opens");
        migrate(&conn).expect("schema");
        let err = conn
            .execute(
                "INSERT INTO reviews (application_id, rating, from_role, created_at) \
                 VALUES (1, 9, 'employer', '2025-01-01')",
                [],
            )
            .expect_err("rating out of range");
        assert!(err.to_string().contains("CHECK"));
    }
}
