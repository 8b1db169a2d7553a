//! Postgres-backed user directory
//!
//! Stores user records in the `users` table. Writes are plain upserts keyed on
//! `username`; the last writer wins.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lifecheck_core::{Result, UserDirectory, UserRecord};
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, PgPool};

use super::StorageError;

/// Row type for user queries.
#[derive(Debug, FromRow)]
struct UserRow {
    username: String,
    password_hash: String,
    profile_picture_path: Option<String>,
    last_verification_date: Option<DateTime<Utc>>,
}

impl From<UserRow> for UserRecord {
    fn from(row: UserRow) -> Self {
        Self {
            username: row.username,
            password_hash: row.password_hash,
            profile_picture_path: row.profile_picture_path,
            last_verification_date: row.last_verification_date,
        }
    }
}

/// User directory backed by PostgreSQL
#[derive(Clone)]
pub struct PostgresUserDirectory {
    pool: PgPool,
}

impl PostgresUserDirectory {
    /// Connect, then run migrations.
    pub async fn connect(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> std::result::Result<Self, StorageError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .connect(database_url)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        let directory = Self { pool };
        directory.migrate().await?;
        Ok(directory)
    }

    /// Run database migrations
    pub async fn migrate(&self) -> std::result::Result<(), StorageError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        tracing::info!("User directory migrations applied");
        Ok(())
    }

    const UPSERT_SQL: &'static str = r#"
        INSERT INTO users (username, password_hash, profile_picture_path, last_verification_date)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (username) DO UPDATE SET
            password_hash = EXCLUDED.password_hash,
            profile_picture_path = EXCLUDED.profile_picture_path,
            last_verification_date = EXCLUDED.last_verification_date,
            updated_at = NOW()
    "#;

    const INSERT_NEW_SQL: &'static str = r#"
        INSERT INTO users (username, password_hash, profile_picture_path, last_verification_date)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (username) DO NOTHING
    "#;

    async fn write(&self, sql: &str, record: &UserRecord) -> std::result::Result<u64, StorageError> {
        let result = sqlx::query(sql)
            .bind(&record.username)
            .bind(&record.password_hash)
            .bind(&record.profile_picture_path)
            .bind(record.last_verification_date)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl UserDirectory for PostgresUserDirectory {
    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>> {
        let row: Option<UserRow> = sqlx::query_as(
            r#"
            SELECT username, password_hash, profile_picture_path, last_verification_date
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(StorageError::from)?;

        Ok(row.map(Into::into))
    }

    async fn save(&self, record: UserRecord) -> Result<()> {
        self.write(Self::UPSERT_SQL, &record).await?;
        tracing::debug!(username = %record.username, "Saved user record");
        Ok(())
    }

    async fn create(&self, record: UserRecord) -> Result<bool> {
        let inserted = self.write(Self::INSERT_NEW_SQL, &record).await?;
        Ok(inserted > 0)
    }

    fn name(&self) -> &'static str {
        "postgres"
    }

    async fn check_health(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(())
    }
}

impl std::fmt::Debug for PostgresUserDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresUserDirectory")
            .field("pool_size", &self.pool.size())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upsert_overwrites_verification_fields() {
        let sql = PostgresUserDirectory::UPSERT_SQL;
        assert!(sql.contains("ON CONFLICT (username) DO UPDATE"));
        assert!(sql.contains("last_verification_date = EXCLUDED.last_verification_date"));
        assert!(sql.contains("profile_picture_path = EXCLUDED.profile_picture_path"));
    }

    #[test]
    fn test_create_never_overwrites() {
        assert!(PostgresUserDirectory::INSERT_NEW_SQL.contains("DO NOTHING"));
    }

    #[test]
    fn test_row_conversion() {
        let now = Utc::now();
        let record = UserRecord::from(UserRow {
            username: "alice".into(),
            password_hash: "$argon2id$v=19$stub".into(),
            profile_picture_path: Some("abc_me.jpg".into()),
            last_verification_date: Some(now),
        });
        assert_eq!(record.username, "alice");
        assert!(record.has_profile_picture());
        assert_eq!(record.last_verification_date, Some(now));
    }
}
