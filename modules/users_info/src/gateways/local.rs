use async_trait::async_trait;
use std::sync::Arc;

use crate::contract::{
    client::UsersInfoApi,
    error::UsersInfoError,
    model::{NewUser, UserPage, UserRecord},
};
use crate::domain::{error::DomainError, service::Service};

/// Local implementation of the UsersInfoApi trait that delegates to the domain service
pub struct UsersInfoLocalClient {
    service: Arc<Service>,
}

impl UsersInfoLocalClient {
    pub fn new(service: Arc<Service>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl UsersInfoApi for UsersInfoLocalClient {
    async fn list_users(
        &self,
        filter: &str,
        offset: u64,
        limit: Option<u64>,
    ) -> anyhow::Result<UserPage> {
        let limit = self.service.config().effective_limit(limit);
        self.service
            .list_users(filter, offset, limit)
            .await
            .map_err(|e| map_domain_error_to_anyhow(e.source))
    }

    async fn create_user(&self, new_user: NewUser) -> anyhow::Result<UserRecord> {
        self.service
            .create_user(new_user)
            .await
            .map_err(map_domain_error_to_anyhow)
    }
}

impl From<DomainError> for UsersInfoError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::UsernameTaken { username } => UsersInfoError::conflict(username),
            DomainError::UsernameRequired | DomainError::PasswordRequired => {
                UsersInfoError::validation(e.to_string())
            }
            DomainError::SourceFetch { .. }
            | DomainError::Enrichment { .. }
            | DomainError::ConsistencyViolation { .. }
            | DomainError::Database { .. } => UsersInfoError::internal(),
        }
    }
}

/// Map domain errors to contract errors wrapped in anyhow
fn map_domain_error_to_anyhow(domain_error: DomainError) -> anyhow::Error {
    anyhow::Error::new(UsersInfoError::from(domain_error))
}
