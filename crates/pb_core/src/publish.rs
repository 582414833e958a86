use async_trait::async_trait;
use crate::Result;

#[async_trait]
pub trait PostTransport: Send + Sync {
    fn name(&self) -> &str;

    /// Publish `text` and return the external post identifier.
    async fn publish(&self, text: &str) -> Result<String>;

    /// Confirm the credentials are accepted. Returns the account handle.
    async fn verify_credentials(&self) -> Result<String>;
}
