use std::sync::Arc;

use pb_core::{DateWindow, DocumentSource, IngestStats, RecordStore, RelevanceFilter, Result};

/// Drives a [`DocumentSource`] and stores the records that pass the keyword prefilter.
pub struct ScraperManager {
    source: Arc<dyn DocumentSource>,
    filter: RelevanceFilter,
}

impl ScraperManager {
    pub fn new(source: Arc<dyn DocumentSource>, filter: RelevanceFilter) -> Self {
        Self { source, filter }
    }

    pub fn source(&self) -> &Arc<dyn DocumentSource> {
        &self.source
    }

    pub async fn check_available(&self) -> Result<()> {
        self.source.check_available().await
    }

    /// Fetch `window` from the source and insert plausible records.
    /// Store failures abort the ingest.
    pub async fn ingest(&self, store: &dyn RecordStore, window: &DateWindow) -> Result<IngestStats> {
        tracing::info!(source = self.source.name(), %window, "🔍 Fetching papers");
        let records = self.source.fetch(window).await?;

        let mut stats = IngestStats {
            fetched: records.len(),
            ..IngestStats::default()
        };

        for record in records {
            if !self.filter.is_plausible(&record.title, &record.abstract_text) {
                tracing::debug!(id = %record.id, "Rejected by prefilter: {}", record.title);
                stats.rejected += 1;
                continue;
            }

            if store.insert(&record).await? {
                tracing::info!(id = %record.id, "✅ Stored: {}", record.title);
                stats.inserted += 1;
            } else {
                tracing::debug!(id = %record.id, "Already stored");
                stats.duplicates += 1;
            }
        }

        tracing::info!(
            fetched = stats.fetched,
            rejected = stats.rejected,
            inserted = stats.inserted,
            duplicates = stats.duplicates,
            "Ingest finished"
        );
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use pb_core::{DocumentRecord, Error};
    use pb_storage::prelude::*;

    struct FixedSource(Vec<DocumentRecord>);

    #[async_trait]
    impl DocumentSource for FixedSource {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn check_available(&self) -> Result<()> {
            Ok(())
        }

        async fn fetch(&self, _window: &DateWindow) -> Result<Vec<DocumentRecord>> {
            Ok(self.0.clone())
        }
    }

    struct BrokenSource;

    #[async_trait]
    impl DocumentSource for BrokenSource {
        fn name(&self) -> &str {
            "broken"
        }

        async fn check_available(&self) -> Result<()> {
            Err(Error::Scraping("offline".to_string()))
        }

        async fn fetch(&self, _window: &DateWindow) -> Result<Vec<DocumentRecord>> {
            Err(Error::Scraping("offline".to_string()))
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 2).unwrap()
    }

    fn record(id: &str, title: &str, abstract_text: &str) -> DocumentRecord {
        DocumentRecord {
            id: id.to_string(),
            category: "cs.AI".to_string(),
            title: title.to_string(),
            authors: "A. Author".to_string(),
            abstract_text: abstract_text.to_string(),
            url: format!("https://arxiv.org/abs/{}", id),
            added_at: today(),
        }
    }

    #[tokio::test]
    async fn test_ingest_filters_and_dedups() {
        let records = vec![
            record("1", "Agents that plan", "We build a multi-agent system."),
            record("2", "Sparse kernels", "Faster matrix multiply."),
            record("1", "Agents that plan", "We build a multi-agent system."),
            record("3", "Imaging agents", "A new contrast agent for MRI."),
        ];
        let manager = ScraperManager::new(Arc::new(FixedSource(records)), RelevanceFilter::default());
        let store = MemoryStorage::new();

        let stats = manager.ingest(&store, &DateWindow::last_day(today())).await.unwrap();
        assert_eq!(stats.fetched, 4);
        assert_eq!(stats.rejected, 2);
        assert_eq!(stats.inserted, 1);
        assert_eq!(stats.duplicates, 1);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_ingest_propagates_source_failure() {
        let manager = ScraperManager::new(Arc::new(BrokenSource), RelevanceFilter::default());
        let store = MemoryStorage::new();
        let result = manager.ingest(&store, &DateWindow::last_day(today())).await;
        assert!(matches!(result, Err(Error::Scraping(_))));
        assert!(manager.check_available().await.is_err());
    }
}
