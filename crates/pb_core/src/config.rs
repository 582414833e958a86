use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use crate::Result;

pub const DEFAULT_TOPIC: &str = "Agent, Multi-Agent Systems, Agentic AI, LLM Agents";
pub const DEFAULT_FALLBACK_SUMMARY: &str = "Novel AI agent approach solving key challenges.";

/// Tunables for one pipeline run. Every field has a default so a partial
/// TOML file is enough.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub topic: String,
    pub categories: Vec<String>,
    pub score_threshold: u8,
    pub max_posts: usize,
    pub min_abstract_chars: usize,
    pub summary_cap: usize,
    pub fallback_summary: String,
    pub post_budget: usize,
    /// Judge calls in flight while scoring. 1 keeps scoring strictly sequential.
    pub scoring_concurrency: usize,
    pub report_dir: PathBuf,
    pub filter: FilterConfig,
    pub publish: PublishPolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            topic: DEFAULT_TOPIC.to_string(),
            categories: vec!["cs.CL".to_string(), "cs.AI".to_string()],
            score_threshold: 8,
            max_posts: 10,
            min_abstract_chars: 50,
            summary_cap: 200,
            fallback_summary: DEFAULT_FALLBACK_SUMMARY.to_string(),
            post_budget: 280,
            scoring_concurrency: 1,
            report_dir: PathBuf::from("."),
            filter: FilterConfig::default(),
            publish: PublishPolicy::default(),
        }
    }
}

impl PipelineConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn validate(&self) -> Result<()> {
        if self.score_threshold > 10 {
            return Err(crate::Error::Config(format!(
                "score_threshold must be within 0..=10, got {}",
                self.score_threshold
            )));
        }
        if self.summary_cap < 2 {
            return Err(crate::Error::Config("summary_cap must be at least 2".to_string()));
        }
        if self.scoring_concurrency == 0 {
            return Err(crate::Error::Config("scoring_concurrency must be at least 1".to_string()));
        }
        if self.publish.max_attempts == 0 {
            return Err(crate::Error::Config("publish.max_attempts must be at least 1".to_string()));
        }
        Ok(())
    }
}

/// Keyword lists for the cheap relevance gates. Matching is a
/// case-insensitive substring test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Accept when title or abstract contains one of these.
    pub core_keywords: Vec<String>,
    /// Accept when the title alone contains one of these.
    pub title_markers: Vec<String>,
    /// Reject when title or abstract contains one of these. Wins over acceptance.
    pub exclude_keywords: Vec<String>,
    /// Checked right before scoring only.
    pub scoring_exclusions: Vec<String>,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            core_keywords: strings(&[
                "multi-agent",
                "agentic",
                "llm agent",
                "ai agent",
                "autonomous agent",
                "agent-based",
                "intelligent agent",
                "conversational agent",
                "agent system",
                "agent framework",
                "agent architecture",
                "agent interaction",
                "agent planning",
                "agent reasoning",
                "agent learning",
                "agent coordination",
                "agent communication",
            ]),
            title_markers: strings(&["agent", "agents"]),
            exclude_keywords: strings(&[
                "user agent",
                "software agent",
                "web agent",
                "browser agent",
                "reagent",
                "magnetic agent",
                "contrast agent",
                "therapeutic agent",
                "chemical agent",
                "biological agent",
                "cleaning agent",
            ]),
            scoring_exclusions: strings(&[
                "vision",
                "visual",
                "image",
                "video",
                "computer vision",
                "object detection",
                "segmentation",
                "recognition",
                "vqa",
                "multimodal",
                "image generation",
                "visual question answering",
            ]),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishPolicy {
    pub max_attempts: u32,
    pub backoff_secs: u64,
    pub pacing_secs: u64,
}

impl Default for PublishPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_secs: 5,
            pacing_secs: 10,
        }
    }
}

impl PublishPolicy {
    pub fn backoff(&self) -> Duration {
        Duration::from_secs(self.backoff_secs)
    }

    pub fn pacing(&self) -> Duration {
        Duration::from_secs(self.pacing_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.score_threshold, 8);
        assert_eq!(config.max_posts, 10);
        assert_eq!(config.summary_cap, 200);
        assert_eq!(config.min_abstract_chars, 50);
        assert_eq!(config.publish.max_attempts, 3);
        assert_eq!(config.publish.backoff(), Duration::from_secs(5));
        assert_eq!(config.publish.pacing(), Duration::from_secs(10));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = PipelineConfig::from_toml_str(
            r#"
            score_threshold = 7
            categories = ["cs.MA"]

            [publish]
            pacing_secs = 30

            [filter]
            title_markers = ["robot"]
            "#,
        )
        .unwrap();
        assert_eq!(config.score_threshold, 7);
        assert_eq!(config.categories, vec!["cs.MA".to_string()]);
        assert_eq!(config.publish.pacing_secs, 30);
        assert_eq!(config.publish.backoff_secs, 5);
        assert_eq!(config.filter.title_markers, vec!["robot".to_string()]);
        assert!(!config.filter.exclude_keywords.is_empty());
    }

    #[test]
    fn test_out_of_range_threshold_is_rejected() {
        let result = PipelineConfig::from_toml_str("score_threshold = 11");
        assert!(matches!(result, Err(crate::Error::Config(_))));
    }

    #[test]
    fn test_from_toml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "max_posts = 3").unwrap();
        let config = PipelineConfig::from_toml_file(file.path()).unwrap();
        assert_eq!(config.max_posts, 3);
    }
}
