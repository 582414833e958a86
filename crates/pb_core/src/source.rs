use async_trait::async_trait;
use crate::types::{DateWindow, DocumentRecord};
use crate::Result;

/// Producer of raw document records (the listing crawler).
#[async_trait]
pub trait DocumentSource: Send + Sync {
    fn name(&self) -> &str;

    /// Returns an error when the listing site cannot be reached.
    async fn check_available(&self) -> Result<()>;

    /// Collect the documents published within `window`.
    async fn fetch(&self, window: &DateWindow) -> Result<Vec<DocumentRecord>>;
}
