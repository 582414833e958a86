use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use pb_core::{Error, PostTransport, Result};
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};

pub const X_API_BASE_URL: &str = "https://api.x.com";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone)]
pub struct XConfig {
    pub base_url: String,
    /// OAuth 2.0 user-context access token with `tweet.write`.
    pub access_token: String,
}

impl fmt::Debug for XConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("XConfig")
            .field("base_url", &self.base_url)
            .field("access_token", &"<redacted>")
            .finish()
    }
}

#[derive(Serialize)]
struct CreatePostRequest<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct DataEnvelope<T> {
    data: Option<T>,
}

#[derive(Deserialize)]
struct CreatedPost {
    id: String,
}

#[derive(Deserialize)]
struct Me {
    username: String,
}

/// Minimal X API v2 client: create a post, read the authenticated user.
pub struct XClient {
    client: Client,
    config: XConfig,
}

impl XClient {
    pub fn new(config: XConfig) -> Result<Self> {
        if config.access_token.trim().is_empty() {
            return Err(Error::Config("X access token is required (set X_ACCESS_TOKEN)".to_string()));
        }
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            config: XConfig {
                base_url: config.base_url.trim_end_matches('/').to_string(),
                ..config
            },
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    async fn checked(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(Error::Publish(format!("X API returned {}: {}", status, body.trim())))
    }
}

#[async_trait]
impl PostTransport for XClient {
    fn name(&self) -> &str {
        "X"
    }

    async fn publish(&self, text: &str) -> Result<String> {
        let response = self.client
            .post(self.url("/2/tweets"))
            .bearer_auth(&self.config.access_token)
            .json(&CreatePostRequest { text })
            .send()
            .await?;

        let envelope = Self::checked(response)
            .await?
            .json::<DataEnvelope<CreatedPost>>()
            .await?;

        envelope
            .data
            .map(|post| post.id)
            .ok_or_else(|| Error::Publish("X API response carried no post data".to_string()))
    }

    async fn verify_credentials(&self) -> Result<String> {
        let response = self.client
            .get(self.url("/2/users/me"))
            .bearer_auth(&self.config.access_token)
            .send()
            .await?;

        let envelope = Self::checked(response)
            .await?
            .json::<DataEnvelope<Me>>()
            .await?;

        envelope
            .data
            .map(|me| me.username)
            .ok_or_else(|| Error::HealthCheck("X API did not return the authenticated user".to_string()))
    }
}
