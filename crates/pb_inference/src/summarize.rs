use std::sync::Arc;

use pb_core::Judge;

/// Turns raw judge text into a capped, single-sentence description.
pub fn clean_summary(raw: &str) -> String {
    let mut description = raw.replace(['"', '\''], "").trim().to_string();

    // Models like to append "(123 chars)".
    if description.contains("chars)") {
        if let Some(head) = description.split('(').next() {
            description = head.trim().to_string();
        }
    }

    if let Some(head) = description.strip_suffix('.') {
        description = format!("{}.", head.trim_end());
    } else if !description.is_empty() {
        description.push('.');
    }

    description
}

/// Cut to `cap - 1` characters plus a period when longer than `cap`.
pub fn cap_summary(description: String, cap: usize) -> String {
    if description.chars().count() <= cap {
        return description;
    }
    let mut capped: String = description.chars().take(cap.saturating_sub(1)).collect();
    capped.push('.');
    capped
}

#[derive(Debug, Clone)]
pub struct Summarizer {
    judge: Arc<dyn Judge>,
    cap: usize,
    fallback: String,
}

impl Summarizer {
    pub fn new(judge: Arc<dyn Judge>, cap: usize, fallback: impl Into<String>) -> Self {
        Self {
            judge,
            cap,
            fallback: fallback.into(),
        }
    }

    /// Always yields a usable description; judge failures fall back to a
    /// fixed sentence.
    pub async fn summarize(&self, title: &str, abstract_text: &str) -> String {
        match self.judge.summarize(title, abstract_text).await {
            Ok(raw) => {
                let description = clean_summary(&raw);
                if description.is_empty() {
                    tracing::warn!("Judge returned an empty summary, using fallback");
                    return cap_summary(self.fallback.clone(), self.cap);
                }
                let length = description.chars().count();
                if length > self.cap {
                    tracing::warn!(length, cap = self.cap, "Summary too long, truncating");
                }
                cap_summary(description, self.cap)
            }
            Err(e) => {
                tracing::error!(judge = self.judge.name(), "Summary generation failed: {}", e);
                cap_summary(self.fallback.clone(), self.cap)
            }
        }
    }
}
