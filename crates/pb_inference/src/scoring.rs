use std::collections::BTreeSet;
use std::sync::Arc;

use pb_core::{Confidence, DocumentRecord, Judge, ScoreResult};
use serde_json::Value;

const ANALYSIS_PREVIEW_CHARS: usize = 200;
const MAX_SCORE: u64 = 10;

/// Remove a surrounding ```json ... ``` or ``` ... ``` fence.
fn strip_code_fence(raw: &str) -> &str {
    let content = raw.trim();
    let inner = if let Some(rest) = content.strip_prefix("```json") {
        rest
    } else if let Some(rest) = content.strip_prefix("```") {
        rest
    } else {
        return content;
    };
    inner.trim_end().strip_suffix("```").unwrap_or(inner).trim()
}

fn as_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "yes" => Some(true),
            "false" | "no" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Fractional scores are truncated so 7.9 never clears an 8 threshold.
fn as_score(value: &Value) -> Option<u8> {
    let score = match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f.floor() as u64))
            .or_else(|| n.as_i64().map(|_| 0))?,
        Value::String(s) => s.trim().parse::<f64>().ok().map(|f| f.max(0.0).floor() as u64)?,
        _ => return None,
    };
    Some(score.min(MAX_SCORE) as u8)
}

fn structured(raw: &str) -> Option<ScoreResult> {
    let value: Value = serde_json::from_str(strip_code_fence(raw)).ok()?;
    let object = value.as_object()?;
    let relevance_score = as_score(object.get("relevance_score")?)?;

    Some(ScoreResult {
        relevant: object.get("relevant").and_then(as_bool).unwrap_or(false),
        confidence: object
            .get("confidence")
            .and_then(Value::as_str)
            .and_then(|s| s.parse().ok())
            .unwrap_or(Confidence::Medium),
        relevance_score,
        analysis: object
            .get("analysis")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        keywords: object
            .get("keywords")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default(),
    })
}

/// Conservative verdict for judge output that is not the expected JSON.
fn degraded(raw: &str) -> ScoreResult {
    let lower = raw.to_lowercase();
    let preview: String = raw.chars().take(ANALYSIS_PREVIEW_CHARS).collect();
    ScoreResult {
        relevant: lower.contains("yes") || lower.contains("true"),
        confidence: Confidence::Medium,
        relevance_score: 5,
        analysis: format!("{}...", preview),
        keywords: BTreeSet::new(),
    }
}

/// Parse raw judge output into a verdict. Never fails.
pub fn parse_score(raw: &str) -> ScoreResult {
    structured(raw).unwrap_or_else(|| {
        tracing::warn!("Judge output is not valid score JSON, using degraded verdict");
        degraded(raw)
    })
}

/// Scores candidates through the judge, absorbing every per-item failure.
#[derive(Debug, Clone)]
pub struct RelevanceScorer {
    judge: Arc<dyn Judge>,
    min_abstract_chars: usize,
}

impl RelevanceScorer {
    pub fn new(judge: Arc<dyn Judge>, min_abstract_chars: usize) -> Self {
        Self {
            judge,
            min_abstract_chars,
        }
    }

    /// True when the abstract is too short to be worth a judge call.
    pub fn is_too_short(&self, abstract_text: &str) -> bool {
        abstract_text.trim().chars().count() < self.min_abstract_chars
    }

    /// Ask the judge for a verdict. A failed call is recorded as an
    /// irrelevant, zero-score result.
    pub async fn score(&self, abstract_text: &str, topic: &str) -> ScoreResult {
        match self.judge.score(abstract_text, topic).await {
            Ok(raw) => parse_score(&raw),
            Err(e) => {
                tracing::error!(judge = self.judge.name(), "Relevance scoring failed: {}", e);
                ScoreResult::failed(e)
            }
        }
    }

    /// Score a stored record, or `None` when its abstract is too short.
    pub async fn assess(&self, record: &DocumentRecord, topic: &str) -> Option<ScoreResult> {
        if self.is_too_short(&record.abstract_text) {
            tracing::info!(id = %record.id, "Abstract too short, skipping");
            return None;
        }
        Some(self.score(&record.abstract_text, topic).await)
    }
}
