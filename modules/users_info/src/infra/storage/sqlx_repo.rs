use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};

use crate::contract::model::{NewUser, UserRecord};
use crate::domain::repo::{FetchError, RecordPage, UsernameConflict, UsersRepository};

const CREATE_USERS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS tb_users (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    username    TEXT    NOT NULL UNIQUE,
    password    TEXT    NOT NULL,
    created_at  TEXT    NOT NULL,
    updated_at  TEXT    NOT NULL
)
"#;

/// `tb_users` on SQLite.
#[derive(Clone)]
pub struct SqlxUsersRepository {
    pool: SqlitePool,
}

impl SqlxUsersRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create the users table if it is missing.
    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::query(CREATE_USERS_TABLE)
            .execute(&self.pool)
            .await
            .context("failed to create tb_users")?;
        Ok(())
    }
}

fn to_i64(v: u64) -> i64 {
    i64::try_from(v).unwrap_or(i64::MAX)
}

fn record_from_row(row: &SqliteRow) -> anyhow::Result<UserRecord> {
    let id: i64 = row.try_get("id")?;
    Ok(UserRecord {
        id: u64::try_from(id).context("negative user id")?,
        username: row.try_get("username")?,
        password: row.try_get("password")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[async_trait]
impl UsersRepository for SqlxUsersRepository {
    async fn list_users(
        &self,
        filter: &str,
        offset: u64,
        limit: u64,
    ) -> Result<RecordPage, FetchError> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM tb_users WHERE ?1 = '' OR username LIKE '%' || ?1 || '%'",
        )
        .bind(filter)
        .fetch_one(&self.pool)
        .await
        .context("failed to count users")?;
        let total_count = u64::try_from(total).unwrap_or(0);

        let rows = sqlx::query(
            "SELECT id, username, password, created_at, updated_at FROM tb_users \
             WHERE ?1 = '' OR username LIKE '%' || ?1 || '%' \
             ORDER BY id DESC LIMIT ?2 OFFSET ?3",
        )
        .bind(filter)
        .bind(to_i64(limit))
        .bind(to_i64(offset))
        .fetch_all(&self.pool)
        .await
        .context("failed to list users")
        .map_err(|e| FetchError::with_count(total_count, e))?;

        let records = rows
            .iter()
            .map(record_from_row)
            .collect::<anyhow::Result<Vec<_>>>()
            .map_err(|e| FetchError::with_count(total_count, e))?;

        Ok(RecordPage {
            records,
            total_count,
        })
    }

    async fn username_exists(&self, username: &str) -> anyhow::Result<bool> {
        let found: Option<i64> = sqlx::query_scalar("SELECT id FROM tb_users WHERE username = ?1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .context("failed to look up username")?;
        Ok(found.is_some())
    }

    async fn insert(&self, new_user: &NewUser, now: DateTime<Utc>) -> anyhow::Result<UserRecord> {
        let row = sqlx::query(
            "INSERT INTO tb_users (username, password, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?3) \
             RETURNING id, username, password, created_at, updated_at",
        )
        .bind(&new_user.username)
        .bind(&new_user.password)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                anyhow::Error::new(UsernameConflict {
                    username: new_user.username.clone(),
                })
            }
            _ => anyhow::Error::new(e).context("failed to insert user"),
        })?;

        record_from_row(&row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn repo() -> SqlxUsersRepository {
        // A single connection keeps every query on the same in-memory database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        let repo = SqlxUsersRepository::new(pool);
        repo.migrate().await.unwrap();
        repo
    }

    fn new_user(name: &str) -> NewUser {
        NewUser {
            username: name.into(),
            password: format!("{name}-pw"),
        }
    }

    #[tokio::test]
    async fn insert_round_trips_through_the_table() {
        let repo = repo().await;
        let now = DateTime::from_timestamp(1_700_000_000, 0).unwrap();

        let stored = repo.insert(&new_user("admin"), now).await.unwrap();
        assert_eq!(stored.id, 1);
        assert_eq!(stored.username, "admin");
        assert_eq!(stored.password, "admin-pw");
        assert_eq!(stored.created_at, now);
        assert_eq!(stored.updated_at, now);

        assert!(repo.username_exists("admin").await.unwrap());
        assert!(!repo.username_exists("root").await.unwrap());
    }

    #[tokio::test]
    async fn duplicate_username_is_rejected_by_the_table() {
        let repo = repo().await;
        repo.insert(&new_user("dup"), Utc::now()).await.unwrap();
        let err = repo.insert(&new_user("dup"), Utc::now()).await.unwrap_err();
        assert_eq!(
            err.downcast_ref::<UsernameConflict>(),
            Some(&UsernameConflict {
                username: "dup".into()
            })
        );
    }

    #[tokio::test]
    async fn failed_fetch_still_reports_the_count() {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        // the count only needs `username`; the page query also wants the other columns
        sqlx::query("CREATE TABLE tb_users (id INTEGER PRIMARY KEY, username TEXT NOT NULL)")
            .execute(&pool)
            .await
            .unwrap();
        for name in ["ann", "anna", "bob"] {
            sqlx::query("INSERT INTO tb_users (username) VALUES (?1)")
                .bind(name)
                .execute(&pool)
                .await
                .unwrap();
        }
        let repo = SqlxUsersRepository::new(pool);

        let err = repo.list_users("ann", 0, 10).await.unwrap_err();

        assert_eq!(err.total_count, Some(2));
        assert!(err.to_string().contains("failed to list users"), "{err}");
    }

    #[tokio::test]
    async fn list_filters_orders_and_pages() {
        let repo = repo().await;
        for name in ["alice", "bob", "alina", "carol", "malik"] {
            repo.insert(&new_user(name), Utc::now()).await.unwrap();
        }

        let page = repo.list_users("ali", 0, 10).await.unwrap();
        assert_eq!(page.total_count, 3);
        let names: Vec<_> = page.records.iter().map(|r| r.username.as_str()).collect();
        assert_eq!(names, ["malik", "alina", "alice"]);

        let page = repo.list_users("", 1, 2).await.unwrap();
        assert_eq!(page.total_count, 5);
        let ids: Vec<_> = page.records.iter().map(|r| r.id).collect();
        assert_eq!(ids, [4, 3]);

        let page = repo.list_users("nobody", 0, 10).await.unwrap();
        assert_eq!(page.total_count, 0);
        assert!(page.records.is_empty());
    }
}
