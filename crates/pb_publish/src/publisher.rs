use std::sync::Arc;
use std::time::Duration;

use pb_core::{retry_with_backoff, PostTransport, PublishPolicy, PublishReport, PublishResult, RetryConfig, SelectedPost};

/// Sends posts one at a time with bounded retries and a pause between posts.
pub struct Publisher {
    transport: Arc<dyn PostTransport>,
    retry: RetryConfig,
    pacing: Duration,
}

impl Publisher {
    pub fn new(transport: Arc<dyn PostTransport>, policy: &PublishPolicy) -> Self {
        Self {
            transport,
            retry: RetryConfig::from(policy),
            pacing: policy.pacing(),
        }
    }

    pub fn transport(&self) -> &Arc<dyn PostTransport> {
        &self.transport
    }

    /// Publish one body. Never fails: the outcome is recorded in the result.
    pub async fn publish_one(&self, post: &SelectedPost) -> PublishResult {
        let record_id = post.candidate.record.id.clone();
        let transport = &self.transport;
        let body = post.body();

        let retried = retry_with_backoff(self.retry, |attempt| async move {
            tracing::debug!(attempt, "Sending post to {}", transport.name());
            transport.publish(body).await
        })
        .await;

        match retried.result {
            Ok(post_id) => {
                tracing::info!(record_id = %record_id, post_id = %post_id, attempts = retried.attempts, "✅ Published");
                PublishResult {
                    record_id,
                    success: true,
                    post_id: Some(post_id),
                    attempts: retried.attempts,
                    last_error: None,
                }
            }
            Err(e) => {
                tracing::error!(record_id = %record_id, attempts = retried.attempts, "❌ Giving up: {}", e);
                PublishResult {
                    record_id,
                    success: false,
                    post_id: None,
                    attempts: retried.attempts,
                    last_error: Some(e.to_string()),
                }
            }
        }
    }

    /// Publish `posts` in order. Pacing separates consecutive items whatever
    /// the outcome of the previous one; nothing waits after the last.
    pub async fn publish_batch(&self, posts: &[SelectedPost]) -> PublishReport {
        let mut report = PublishReport::default();
        if posts.is_empty() {
            tracing::info!("📝 Nothing to publish");
            return report;
        }

        tracing::info!("📱 Publishing {} posts via {}", posts.len(), self.transport.name());
        for (i, post) in posts.iter().enumerate() {
            tracing::info!("📱 Post {}/{}: {}", i + 1, posts.len(), post.candidate.record.title);
            report.results.push(self.publish_one(post).await);

            if i + 1 < posts.len() && !self.pacing.is_zero() {
                tracing::info!("⏳ Waiting {}s...", self.pacing.as_secs());
                tokio::time::sleep(self.pacing).await;
            }
        }

        tracing::info!("🎉 Published {}/{} posts", report.successes(), posts.len());
        let ids = report.post_ids();
        if !ids.is_empty() {
            tracing::info!("🔗 Post IDs: {}", ids.join(", "));
        }
        report
    }
}
