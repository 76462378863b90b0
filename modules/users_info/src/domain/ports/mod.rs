use async_trait::async_trait;

/// Produces the short token used in a user's greeting. Called concurrently
/// from many tasks.
#[async_trait]
pub trait TokenGenerator: Send + Sync {
    async fn generate(&self) -> anyhow::Result<String>;
}
