use async_trait::async_trait;
use crate::types::{DateWindow, DocumentRecord};
use crate::Result;

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Insert a record unless its identifier is already stored.
    /// Returns `false` without touching the store for duplicates.
    async fn insert(&self, record: &DocumentRecord) -> Result<bool>;

    /// Records whose `added_at` falls in `window`, most recently inserted first.
    /// An empty `categories` slice matches every category.
    async fn query_window(&self, window: &DateWindow, categories: &[String]) -> Result<Vec<DocumentRecord>>;

    /// Number of records `query_window` would return.
    async fn count_window(&self, window: &DateWindow, categories: &[String]) -> Result<u64>;

    /// Cheap reachability probe.
    async fn ping(&self) -> Result<()>;

    /// Release held connections.
    async fn close(&self) -> Result<()> {
        Ok(())
    }
}
