use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, instrument};

use crate::contract::model::{NewUser, UserInfo, UserPage, UserRecord};
use crate::domain::error::{DomainError, ListUsersError};
use crate::domain::fanout::FanOut;
use crate::domain::ports::TokenGenerator;
use crate::domain::repo::{UsernameConflict, UsersRepository};

/// Domain service with business rules for user listing and creation.
/// Depends only on the repository and token generator ports.
#[derive(Clone)]
pub struct Service {
    repo: Arc<dyn UsersRepository>,
    tokens: Arc<dyn TokenGenerator>,
    fanout: FanOut,
    config: ServiceConfig,
}

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub default_page_size: u64,
    pub max_page_size: u64,
    pub max_concurrency: usize,
    pub cancel_on_error: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            default_page_size: 50,
            max_page_size: 1000,
            max_concurrency: 64,
            cancel_on_error: true,
        }
    }
}

impl ServiceConfig {
    /// Requested page size, defaulted and clamped to `1..=max_page_size`.
    pub fn effective_limit(&self, requested: Option<u64>) -> u64 {
        requested
            .unwrap_or(self.default_page_size)
            .clamp(1, self.max_page_size.max(1))
    }
}

impl Service {
    pub fn new(
        repo: Arc<dyn UsersRepository>,
        tokens: Arc<dyn TokenGenerator>,
        config: ServiceConfig,
    ) -> Self {
        let fanout = FanOut::new(config.max_concurrency, config.cancel_on_error);
        Self {
            repo,
            tokens,
            fanout,
            config,
        }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Fetch one page of records and give every record its greeting.
    ///
    /// The output keeps the record source's order. Any failure fails the
    /// whole call; the source's total count is reported either way (0 when
    /// the source failed before it could count).
    #[instrument(name = "users_info.service.list_users", skip(self), err)]
    pub async fn list_users(
        &self,
        filter: &str,
        offset: u64,
        limit: u64,
    ) -> Result<UserPage, ListUsersError> {
        let page = self
            .repo
            .list_users(filter, offset, limit)
            .await
            .map_err(|e| {
                ListUsersError::new(
                    e.total_count.unwrap_or(0),
                    DomainError::source_fetch(format!("{:#}", e.cause)),
                )
            })?;
        let total_count = page.total_count;
        debug!(fetched = page.records.len(), total_count, "records fetched");

        let tokens = self.tokens.clone();
        let items = self
            .fanout
            .run(page.records, move |position, record: UserRecord| {
                let tokens = tokens.clone();
                async move {
                    let token = tokens.generate().await.map_err(|e| {
                        DomainError::enrichment(position, format!("user {}: {e:#}", record.id))
                    })?;
                    Ok(UserInfo::enrich(record, &token))
                }
            })
            .await
            .map_err(|e| ListUsersError::new(total_count, e))?;

        Ok(UserPage { total_count, items })
    }

    #[instrument(name = "users_info.service.create_user", skip(self, new_user), fields(username = %new_user.username), err)]
    pub async fn create_user(&self, new_user: NewUser) -> Result<UserRecord, DomainError> {
        if new_user.username.is_empty() {
            return Err(DomainError::UsernameRequired);
        }
        if new_user.password.is_empty() {
            return Err(DomainError::PasswordRequired);
        }

        let taken = self
            .repo
            .username_exists(&new_user.username)
            .await
            .map_err(|e| DomainError::database(format!("{e:#}")))?;
        if taken {
            return Err(DomainError::username_taken(new_user.username));
        }

        // a concurrent create can still win between the check and the insert
        let user = self
            .repo
            .insert(&new_user, Utc::now())
            .await
            .map_err(|e| match e.downcast_ref::<UsernameConflict>() {
                Some(conflict) => DomainError::username_taken(conflict.username.clone()),
                None => DomainError::database(format!("{e:#}")),
            })?;

        info!(id = user.id, "Created user");
        Ok(user)
    }
}
