use std::sync::Arc;

use async_trait::async_trait;
use pb_core::{Judge, RecordStore, Result};

/// Opens the record store at the start of each run.
#[async_trait]
pub trait StoreProvider: Send + Sync {
    async fn open(&self) -> Result<Arc<dyn RecordStore>>;
}

/// Where the store lives; opened fresh for every run and closed after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreSpec {
    /// Backend name: "sqlite" or "memory".
    pub kind: String,
    pub location: Option<String>,
}

impl StoreSpec {
    pub fn new(kind: impl Into<String>, location: Option<String>) -> Self {
        Self {
            kind: kind.into(),
            location,
        }
    }
}

#[async_trait]
impl StoreProvider for StoreSpec {
    async fn open(&self) -> Result<Arc<dyn RecordStore>> {
        let store = pb_storage::create_storage(&self.kind, self.location.as_deref()).await?;
        tracing::info!("💾 Record store ready (using {})", self.kind);
        Ok(store)
    }
}

/// An already open store handed out as is.
#[async_trait]
impl<T: RecordStore + 'static> StoreProvider for Arc<T> {
    async fn open(&self) -> Result<Arc<dyn RecordStore>> {
        Ok(self.clone() as Arc<dyn RecordStore>)
    }
}

/// Builds the judge at the start of each run.
pub trait JudgeProvider: Send + Sync {
    fn build(&self) -> Result<Arc<dyn Judge>>;
}

impl JudgeProvider for pb_inference::Config {
    fn build(&self) -> Result<Arc<dyn Judge>> {
        let judge = pb_inference::create_model(self)?;
        tracing::info!("🧠 Judge ready (using {})", judge.name());
        Ok(judge)
    }
}

impl<T: Judge + 'static> JudgeProvider for Arc<T> {
    fn build(&self) -> Result<Arc<dyn Judge>> {
        Ok(self.clone() as Arc<dyn Judge>)
    }
}
