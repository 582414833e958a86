use std::sync::Arc;

use async_trait::async_trait;
use pb_core::{RecordStore, Result};

pub mod backends;

pub use backends::*;

#[async_trait]
pub trait StorageBackend: Send + Sync {
    fn get_error_message() -> &'static str;
    async fn open(location: Option<&str>) -> Result<Self> where Self: Sized;
}

/// Open the record store named by `kind` ("memory" or "sqlite").
pub async fn create_storage(kind: &str, location: Option<&str>) -> Result<Arc<dyn RecordStore>> {
    match kind {
        "memory" => Ok(Arc::new(MemoryStorage::open(location).await?)),
        #[cfg(feature = "sqlite")]
        "sqlite" => {
            let storage = SQLiteStorage::open(location).await.map_err(|e| {
                tracing::error!("{}: {}", SQLiteStorage::get_error_message(), e);
                e
            })?;
            Ok(Arc::new(storage))
        }
        other => Err(pb_core::Error::Config(format!("Unknown storage backend: {}", other))),
    }
}

pub mod prelude {
    pub use super::backends::*;
    pub use super::{create_storage, StorageBackend};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_memory_storage() {
        let storage = create_storage("memory", None).await.unwrap();
        storage.ping().await.unwrap();
    }

    #[tokio::test]
    async fn test_unknown_backend_is_a_config_error() {
        let result = create_storage("postgres-ish", None).await;
        assert!(matches!(result, Err(pb_core::Error::Config(_))));
    }
}
