use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use pb_core::{retry_if, Judge, Result, RetryConfig};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use crate::{prompts, Config, DEFAULT_BASE_URL, DEFAULT_MODEL_NAME};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
const MAX_TOKENS: u32 = 1000;
/// One call plus three retries on transient failures.
const RETRY: RetryConfig = RetryConfig {
    max_attempts: 4,
    delay: Duration::from_secs(2),
};

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    reasoning_effort: Option<String>,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Deserialize)]
struct Message {
    content: Option<String>,
}

/// OpenAI-compatible chat completions client (Groq by default).
pub struct ChatModel {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    retry: RetryConfig,
}

impl fmt::Debug for ChatModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatModel")
            .field("client", &"<reqwest::Client>")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("retry", &self.retry)
            .finish()
    }
}

impl ChatModel {
    pub fn new(config: &Config) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| pb_core::Error::Config("Judge API key is required (set GROQ_API_KEY)".to_string()))?;
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            api_key,
            base_url: config
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            model: config
                .model_name
                .clone()
                .unwrap_or_else(|| DEFAULT_MODEL_NAME.to_string()),
            retry: RETRY,
        })
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Qwen models think out loud unless told not to.
    fn reasoning_effort(&self) -> Option<String> {
        self.model
            .to_lowercase()
            .contains("qwen")
            .then(|| "none".to_string())
    }

    async fn complete(&self, prompt: String) -> Result<String> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt,
            }],
            temperature: 0.0,
            max_tokens: MAX_TOKENS,
            reasoning_effort: self.reasoning_effort(),
        };

        let request = &request;
        let retried = retry_if(
            self.retry,
            |_| self.request_once(request),
            pb_core::Error::is_transient,
        )
        .await;
        if retried.attempts > 1 {
            tracing::debug!(attempts = retried.attempts, "Judge call needed retries");
        }
        retried.result
    }

    async fn request_once(&self, request: &ChatRequest) -> Result<String> {
        let response = self.client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await?
            .error_for_status()?
            .json::<ChatResponse>()
            .await?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|content| content.trim().to_string())
            .ok_or_else(|| pb_core::Error::Inference("Judge returned no choices".to_string()))
    }
}

#[async_trait]
impl Judge for ChatModel {
    fn name(&self) -> &str {
        &self.model
    }

    async fn score(&self, abstract_text: &str, topic: &str) -> Result<String> {
        self.complete(prompts::relevance_prompt(abstract_text, topic)).await
    }

    async fn summarize(&self, title: &str, abstract_text: &str) -> Result<String> {
        self.complete(prompts::summary_prompt(title, abstract_text)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(base_url: String, model: &str) -> Config {
        Config {
            backend: "groq".to_string(),
            api_key: Some("test-key".to_string()),
            model_name: Some(model.to_string()),
            base_url: Some(base_url),
        }
    }

    fn no_wait(max_attempts: u32) -> RetryConfig {
        RetryConfig {
            max_attempts,
            delay: std::time::Duration::ZERO,
        }
    }

    #[test]
    fn test_model_requires_api_key() {
        let result = ChatModel::new(&Config::default());
        assert!(result.is_err());

        let result = ChatModel::new(&Config {
            api_key: Some("   ".to_string()),
            ..Config::default()
        });
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_summarize_posts_chat_completion() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .and(body_partial_json(serde_json::json!({
                "model": "llama-3.1-8b-instant",
                "temperature": 0.0
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"role": "assistant", "content": "  Uses agents for planning.  "}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let model = ChatModel::new(&config(server.uri(), "llama-3.1-8b-instant")).unwrap();
        let summary = model.summarize("Title", "Abstract").await.unwrap();
        assert_eq!(summary, "Uses agents for planning.");
    }

    #[tokio::test]
    async fn test_qwen_requests_disable_reasoning() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_partial_json(serde_json::json!({"reasoning_effort": "none"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"content": "{\"relevance_score\": 9}"}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let model = ChatModel::new(&config(server.uri(), "qwen/qwen3-32b")).unwrap();
        let raw = model.score("Abstract", "Agents").await.unwrap();
        assert!(raw.contains("relevance_score"));
    }

    #[tokio::test]
    async fn test_server_error_is_a_call_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let model = ChatModel::new(&config(server.uri(), "llama")).unwrap().with_retry(no_wait(2));
        assert!(model.summarize("Title", "Abstract").await.is_err());
        assert_eq!(server.received_requests().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_rate_limit_is_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(429))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"content": "Plans with agents."}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let model = ChatModel::new(&config(server.uri(), "llama")).unwrap().with_retry(no_wait(4));
        assert_eq!(model.summarize("Title", "Abstract").await.unwrap(), "Plans with agents.");
    }

    #[tokio::test]
    async fn test_client_error_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(400))
            .expect(1)
            .mount(&server)
            .await;

        let model = ChatModel::new(&config(server.uri(), "llama")).unwrap().with_retry(no_wait(4));
        assert!(model.score("Abstract", "Agents").await.is_err());
    }

    #[tokio::test]
    async fn test_empty_choices_is_an_inference_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"choices": []})))
            .mount(&server)
            .await;

        let model = ChatModel::new(&config(server.uri(), "llama")).unwrap();
        let err = model.score("Abstract", "Agents").await.unwrap_err();
        assert!(matches!(err, pb_core::Error::Inference(_)));
    }
}
