use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::contract::model::{NewUser, UserRecord};
use crate::domain::repo::{FetchError, RecordPage, UsernameConflict, UsersRepository};

/// Process-local store with the same listing semantics as the SQL one:
/// substring filter on username, newest id first.
#[derive(Default)]
pub struct InMemoryUsersRepository {
    users: RwLock<Vec<UserRecord>>,
}

impl InMemoryUsersRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<UserRecord>) -> Self {
        Self {
            users: RwLock::new(records),
        }
    }
}

#[async_trait]
impl UsersRepository for InMemoryUsersRepository {
    async fn list_users(
        &self,
        filter: &str,
        offset: u64,
        limit: u64,
    ) -> Result<RecordPage, FetchError> {
        let users = self.users.read().await;
        let mut matching: Vec<&UserRecord> = users
            .iter()
            .filter(|u| filter.is_empty() || u.username.contains(filter))
            .collect();
        matching.sort_by(|a, b| b.id.cmp(&a.id));

        let total_count = matching.len() as u64;
        let records = matching
            .into_iter()
            .skip(usize::try_from(offset).unwrap_or(usize::MAX))
            .take(usize::try_from(limit).unwrap_or(usize::MAX))
            .cloned()
            .collect();

        Ok(RecordPage {
            records,
            total_count,
        })
    }

    async fn username_exists(&self, username: &str) -> anyhow::Result<bool> {
        Ok(self
            .users
            .read()
            .await
            .iter()
            .any(|u| u.username == username))
    }

    async fn insert(&self, new_user: &NewUser, now: DateTime<Utc>) -> anyhow::Result<UserRecord> {
        let mut users = self.users.write().await;
        if users.iter().any(|u| u.username == new_user.username) {
            return Err(UsernameConflict {
                username: new_user.username.clone(),
            }
            .into());
        }
        let id = users.iter().map(|u| u.id).max().unwrap_or(0) + 1;
        let record = UserRecord {
            id,
            username: new_user.username.clone(),
            password: new_user.password.clone(),
            created_at: now,
            updated_at: now,
        };
        users.push(record.clone());
        Ok(record)
    }
}
