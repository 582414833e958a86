use std::fmt;

pub mod models;
pub mod prompts;
pub mod scoring;
pub mod summarize;

pub use models::create_model;
pub use scoring::{parse_score, RelevanceScorer};
pub use summarize::Summarizer;

pub const DEFAULT_MODEL_NAME: &str = "qwen/qwen3-32b";
pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";

#[derive(Clone)]
pub struct Config {
    /// Backend name: "groq", "openai" or "dummy".
    pub backend: String,
    pub api_key: Option<String>,
    pub model_name: Option<String>,
    pub base_url: Option<String>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("backend", &self.backend)
            .field("api_key", &self.api_key.as_deref().map(|_| "<redacted>"))
            .field("model_name", &self.model_name)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: "groq".to_string(),
            api_key: None,
            model_name: None,
            base_url: None,
        }
    }
}

pub mod prelude {
    pub use super::models::create_model;
    pub use super::{Config, RelevanceScorer, Summarizer};
    pub use pb_core::{Error, Judge, Result, ScoreResult};
}
