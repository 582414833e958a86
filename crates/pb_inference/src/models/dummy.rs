use std::fmt;

use pb_core::{Judge, Result};

const SIGNAL_WORDS: &[&str] = &["agent", "multi-agent", "agentic", "autonomous", "planning", "tool use"];

/// Offline judge: keyword counting instead of a language model.
pub struct DummyModel;

impl fmt::Debug for DummyModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DummyModel").finish()
    }
}

impl DummyModel {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DummyModel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Judge for DummyModel {
    fn name(&self) -> &str {
        "Dummy"
    }

    async fn score(&self, abstract_text: &str, _topic: &str) -> Result<String> {
        let lower = abstract_text.to_lowercase();
        let found: Vec<&str> = SIGNAL_WORDS
            .iter()
            .copied()
            .filter(|w| lower.contains(w))
            .collect();
        let score = (found.len() * 3).min(10);
        let verdict = serde_json::json!({
            "relevant": score >= 6,
            "confidence": if score >= 9 { "High" } else if score >= 6 { "Medium" } else { "Low" },
            "relevance_score": score,
            "analysis": format!("Found {} signal words", found.len()),
            "keywords": found,
        });
        Ok(verdict.to_string())
    }

    async fn summarize(&self, _title: &str, abstract_text: &str) -> Result<String> {
        // First sentence of the abstract
        let sentence = abstract_text
            .split_inclusive('.')
            .next()
            .unwrap_or_default()
            .trim();
        Ok(sentence.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::parse_score;

    #[tokio::test]
    async fn test_dummy_model() {
        let model = DummyModel::new();

        let raw = model
            .score("An agentic multi-agent framework for autonomous planning.", "Agents")
            .await
            .unwrap();
        let parsed = parse_score(&raw);
        assert_eq!(parsed.relevance_score, 10);
        assert!(parsed.relevant);
        assert!(parsed.keywords.contains("agentic"));

        let raw = model.score("Faster matrix multiplication.", "Agents").await.unwrap();
        assert_eq!(parse_score(&raw).relevance_score, 0);

        let summary = model
            .summarize("Title", "We build agents. They plan well.")
            .await
            .unwrap();
        assert_eq!(summary, "We build agents.");
    }
}
