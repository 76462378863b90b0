use async_trait::async_trait;

use crate::contract::model::{NewUser, UserPage, UserRecord};

/// Public API trait for the users_info module that other modules can use
#[async_trait]
pub trait UsersInfoApi: Send + Sync {
    /// List users whose username contains `filter`, enriched with a greeting.
    /// `limit = None` falls back to the configured page size.
    async fn list_users(
        &self,
        filter: &str,
        offset: u64,
        limit: Option<u64>,
    ) -> anyhow::Result<UserPage>;

    /// Create a new user
    async fn create_user(&self, new_user: NewUser) -> anyhow::Result<UserRecord>;
}
