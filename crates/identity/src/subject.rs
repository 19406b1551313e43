//! Subject directory: profiles and the storage contract behind them.

use {anyhow::Result, async_trait::async_trait, sqlx::SqlitePool};

/// A registered subject. The password hash never leaves this crate's login
/// path; the struct deliberately has no serde derives.
#[derive(Debug, Clone)]
pub struct Subject {
    pub id: String,
    pub name: String,
    pub surname: String,
    pub email: String,
    pub phone: Option<String>,
    pub password_hash: String,
    pub active: bool,
    pub created_at: i64,
}

/// Payload for registering a subject.
#[derive(Debug, Clone)]
pub struct NewSubject {
    pub name: String,
    pub surname: String,
    pub email: String,
    pub phone: Option<String>,
    pub password: String,
}

/// Storage contract for the subject directory.
#[async_trait]
pub trait SubjectStore: Send + Sync {
    async fn insert(&self, subject: &Subject) -> Result<()>;
    async fn get(&self, id: &str) -> Result<Option<Subject>>;
    async fn get_by_email(&self, email: &str) -> Result<Option<Subject>>;
    /// Batch lookup; unknown ids are simply absent from the result.
    async fn get_many(&self, ids: &[String]) -> Result<Vec<Subject>>;
    async fn list(&self) -> Result<Vec<Subject>>;
    async fn count(&self) -> Result<i64>;
    /// Returns false when no such subject exists.
    async fn set_active(&self, id: &str, active: bool) -> Result<bool>;
}

/// Internal row type for sqlx mapping.
#[derive(sqlx::FromRow)]
struct SubjectRow {
    id: String,
    name: String,
    surname: String,
    email: String,
    phone: Option<String>,
    password_hash: String,
    active: i64,
    created_at: i64,
}

impl From<SubjectRow> for Subject {
    fn from(r: SubjectRow) -> Self {
        Self {
            id: r.id,
            name: r.name,
            surname: r.surname,
            email: r.email,
            phone: r.phone,
            password_hash: r.password_hash,
            active: r.active != 0,
            created_at: r.created_at,
        }
    }
}

/// SQLite-backed subject directory.
pub struct SqliteSubjectStore {
    pool: SqlitePool,
}

impl SqliteSubjectStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Initialize the subjects table schema.
    pub async fn init(pool: &SqlitePool) -> Result<()> {
        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS subjects (
                id            TEXT    PRIMARY KEY,
                name          TEXT    NOT NULL,
                surname       TEXT    NOT NULL,
                email         TEXT    NOT NULL UNIQUE,
                phone         TEXT,
                password_hash TEXT    NOT NULL,
                active        INTEGER NOT NULL DEFAULT 1,
                created_at    INTEGER NOT NULL
            )"#,
        )
        .execute(pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl SubjectStore for SqliteSubjectStore {
    async fn insert(&self, subject: &Subject) -> Result<()> {
        sqlx::query(
            r#"INSERT INTO subjects
               (id, name, surname, email, phone, password_hash, active, created_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(&subject.id)
        .bind(&subject.name)
        .bind(&subject.surname)
        .bind(&subject.email)
        .bind(&subject.phone)
        .bind(&subject.password_hash)
        .bind(i64::from(subject.active))
        .bind(subject.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<Subject>> {
        let row = sqlx::query_as::<_, SubjectRow>("SELECT * FROM subjects WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Into::into))
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<Subject>> {
        let row = sqlx::query_as::<_, SubjectRow>("SELECT * FROM subjects WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Into::into))
    }

    async fn get_many(&self, ids: &[String]) -> Result<Vec<Subject>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        // sqlx has no array binding for sqlite; build the placeholder list.
        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!("SELECT * FROM subjects WHERE id IN ({placeholders})");
        let mut query = sqlx::query_as::<_, SubjectRow>(&sql);
        for id in ids {
            query = query.bind(id);
        }
        let rows = query.fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn list(&self) -> Result<Vec<Subject>> {
        let rows =
            sqlx::query_as::<_, SubjectRow>("SELECT * FROM subjects ORDER BY surname, name")
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn count(&self) -> Result<i64> {
        let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM subjects")
            .fetch_one(&self.pool)
            .await?;
        Ok(n)
    }

    async fn set_active(&self, id: &str, active: bool) -> Result<bool> {
        let result = sqlx::query("UPDATE subjects SET active = ? WHERE id = ?")
            .bind(i64::from(active))
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
