use std::sync::Arc;

use pb_core::{Judge, Result};
use crate::Config;

pub mod chat;
pub mod dummy;

pub use chat::ChatModel;
pub use dummy::DummyModel;

/// Build the judge backend named in `config.backend`.
pub fn create_model(config: &Config) -> Result<Arc<dyn Judge>> {
    match config.backend.to_lowercase().as_str() {
        "groq" | "openai" | "chat" => Ok(Arc::new(ChatModel::new(config)?)),
        "dummy" => Ok(Arc::new(DummyModel::new())),
        other => Err(pb_core::Error::Config(format!(
            "Unknown model backend: {}. Available models: groq (default), openai, dummy",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_dummy_model() {
        let config = Config {
            backend: "dummy".to_string(),
            ..Config::default()
        };
        let model = create_model(&config).unwrap();
        assert_eq!(model.name(), "Dummy");
    }

    #[test]
    fn test_chat_model_requires_api_key() {
        let result = create_model(&Config::default());
        assert!(matches!(result, Err(pb_core::Error::Config(_))));
    }

    #[test]
    fn test_unknown_backend() {
        let config = Config {
            backend: "markov".to_string(),
            ..Config::default()
        };
        assert!(create_model(&config).is_err());
    }
}
