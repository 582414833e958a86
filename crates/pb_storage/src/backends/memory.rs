use std::sync::Arc;

use async_trait::async_trait;
use pb_core::{DateWindow, DocumentRecord, RecordStore, Result};
use tokio::sync::RwLock;
use crate::StorageBackend;

fn matches(record: &DocumentRecord, window: &DateWindow, categories: &[String]) -> bool {
    window.contains(record.added_at)
        && (categories.is_empty() || categories.iter().any(|c| *c == record.category))
}

#[derive(Default)]
pub struct MemoryStore {
    next_sn: u64,
    records: Vec<(u64, DocumentRecord)>,
}

impl MemoryStore {
    pub fn insert(&mut self, record: &DocumentRecord) -> bool {
        if self.records.iter().any(|(_, r)| r.id == record.id) {
            return false;
        }
        self.next_sn += 1;
        self.records.push((self.next_sn, record.clone()));
        true
    }

    pub fn query_window(&self, window: &DateWindow, categories: &[String]) -> Vec<DocumentRecord> {
        let mut rows = self.records
            .iter()
            .filter(|(_, r)| matches(r, window, categories))
            .collect::<Vec<_>>();
        rows.sort_by(|a, b| b.0.cmp(&a.0));
        rows.into_iter().map(|(_, r)| r.clone()).collect()
    }

    pub fn count_window(&self, window: &DateWindow, categories: &[String]) -> u64 {
        self.records
            .iter()
            .filter(|(_, r)| matches(r, window, categories))
            .count() as u64
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Process-local store. The single write lock makes check-then-insert atomic.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    store: Arc<RwLock<MemoryStore>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.store.read().await.len()
    }
}

#[async_trait]
impl StorageBackend for MemoryStorage {
    fn get_error_message() -> &'static str {
        "Memory storage should be available"
    }

    async fn open(_location: Option<&str>) -> Result<Self> {
        Ok(Self::new())
    }
}

#[async_trait]
impl RecordStore for MemoryStorage {
    async fn insert(&self, record: &DocumentRecord) -> Result<bool> {
        let mut store = self.store.write().await;
        Ok(store.insert(record))
    }

    async fn query_window(&self, window: &DateWindow, categories: &[String]) -> Result<Vec<DocumentRecord>> {
        let store = self.store.read().await;
        Ok(store.query_window(window, categories))
    }

    async fn count_window(&self, window: &DateWindow, categories: &[String]) -> Result<u64> {
        let store = self.store.read().await;
        Ok(store.count_window(window, categories))
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(id: &str, category: &str, day: u32) -> DocumentRecord {
        DocumentRecord {
            id: id.to_string(),
            category: category.to_string(),
            title: format!("Paper {}", id),
            authors: "Test Author".to_string(),
            abstract_text: "This is a test abstract about multi-agent systems.".to_string(),
            url: format!("https://arxiv.org/abs/{}", id),
            added_at: NaiveDate::from_ymd_opt(2024, 5, day).unwrap(),
        }
    }

    fn window() -> DateWindow {
        DateWindow::new(
            NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 5, 2).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_duplicate_insert_is_rejected() {
        let storage = MemoryStorage::new();
        assert!(storage.insert(&record("1", "cs.AI", 1)).await.unwrap());

        let mut changed = record("1", "cs.CL", 2);
        changed.title = "Changed".to_string();
        assert!(!storage.insert(&changed).await.unwrap());

        assert_eq!(storage.len().await, 1);
        let rows = storage.query_window(&window(), &[]).await.unwrap();
        assert_eq!(rows[0].title, "Paper 1");
    }

    #[tokio::test]
    async fn test_query_window_orders_most_recent_first() {
        let storage = MemoryStorage::new();
        storage.insert(&record("a", "cs.AI", 1)).await.unwrap();
        storage.insert(&record("b", "cs.CL", 2)).await.unwrap();
        storage.insert(&record("c", "cs.AI", 1)).await.unwrap();
        storage.insert(&record("d", "cs.AI", 9)).await.unwrap();

        let ids = storage
            .query_window(&window(), &[])
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect::<Vec<_>>();
        assert_eq!(ids, vec!["c", "b", "a"]);
    }

    #[tokio::test]
    async fn test_category_filter() {
        let storage = MemoryStorage::new();
        storage.insert(&record("a", "cs.AI", 1)).await.unwrap();
        storage.insert(&record("b", "cs.CL", 2)).await.unwrap();
        storage.insert(&record("c", "cs.RO", 2)).await.unwrap();

        let categories = vec!["cs.AI".to_string(), "cs.CL".to_string()];
        let rows = storage.query_window(&window(), &categories).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(storage.count_window(&window(), &categories).await.unwrap(), 2);
        assert_eq!(storage.count_window(&window(), &[]).await.unwrap(), 3);
    }
}
