use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::contract::model::{NewUser, UserRecord};

/// One page of stored records plus the number of records matching the
/// filter, ignoring offset/limit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordPage {
    pub records: Vec<UserRecord>,
    pub total_count: u64,
}

/// Failed page fetch. `total_count` is set when the store managed to count
/// the matching records before the fetch itself failed.
#[derive(Error, Debug)]
#[error("{cause:#}")]
pub struct FetchError {
    pub total_count: Option<u64>,
    pub cause: anyhow::Error,
}

impl FetchError {
    pub fn with_count(total_count: u64, cause: impl Into<anyhow::Error>) -> Self {
        Self {
            total_count: Some(total_count),
            cause: cause.into(),
        }
    }
}

impl From<anyhow::Error> for FetchError {
    fn from(cause: anyhow::Error) -> Self {
        Self {
            total_count: None,
            cause,
        }
    }
}

/// Insert rejected because the username is already stored. Repositories
/// return it inside their `anyhow::Error` so the service can tell it apart
/// from storage failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("username '{username}' already stored")]
pub struct UsernameConflict {
    pub username: String,
}

/// Port for the domain layer: persistence operations the domain needs.
/// Object-safe and async via `async_trait`.
#[async_trait]
pub trait UsersRepository: Send + Sync {
    /// Records whose username contains `filter` (all when empty), newest
    /// first. The order must be stable across calls.
    async fn list_users(&self, filter: &str, offset: u64, limit: u64)
        -> Result<RecordPage, FetchError>;

    async fn username_exists(&self, username: &str) -> anyhow::Result<bool>;

    /// Persist a new user with `created_at = updated_at = now`. The store
    /// assigns the id. A taken username fails with [`UsernameConflict`].
    async fn insert(&self, new_user: &NewUser, now: DateTime<Utc>) -> anyhow::Result<UserRecord>;
}
