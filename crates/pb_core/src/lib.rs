pub mod config;
pub mod error;
pub mod filter;
pub mod models;
pub mod publish;
pub mod retry;
pub mod source;
pub mod storage;
pub mod types;

pub use config::{FilterConfig, PipelineConfig, PublishPolicy};
pub use error::Error;
pub use filter::RelevanceFilter;
pub use models::Judge;
pub use publish::PostTransport;
pub use retry::{retry_if, retry_with_backoff, Retried, RetryConfig};
pub use source::DocumentSource;
pub use storage::RecordStore;
pub use types::*;

pub type Result<T> = std::result::Result<T, Error>;
