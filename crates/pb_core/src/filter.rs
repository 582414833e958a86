use crate::config::FilterConfig;

/// Deterministic keyword gate applied before any paid judge call.
#[derive(Debug, Clone)]
pub struct RelevanceFilter {
    core_keywords: Vec<String>,
    title_markers: Vec<String>,
    exclude_keywords: Vec<String>,
    scoring_exclusions: Vec<String>,
}

fn lowered(words: &[String]) -> Vec<String> {
    words
        .iter()
        .map(|w| w.trim().to_lowercase())
        .filter(|w| !w.is_empty())
        .collect()
}

fn contains_any(haystack: &str, needles: &[String]) -> bool {
    needles.iter().any(|n| haystack.contains(n.as_str()))
}

impl RelevanceFilter {
    pub fn new(config: &FilterConfig) -> Self {
        Self {
            core_keywords: lowered(&config.core_keywords),
            title_markers: lowered(&config.title_markers),
            exclude_keywords: lowered(&config.exclude_keywords),
            scoring_exclusions: lowered(&config.scoring_exclusions),
        }
    }

    /// Exclusions reject first; otherwise a core keyword anywhere or a topic
    /// marker in the title accepts.
    pub fn is_plausible(&self, title: &str, abstract_text: &str) -> bool {
        let title = title.to_lowercase();
        let abstract_text = abstract_text.to_lowercase();

        if contains_any(&title, &self.exclude_keywords)
            || contains_any(&abstract_text, &self.exclude_keywords)
        {
            return false;
        }

        contains_any(&title, &self.core_keywords)
            || contains_any(&abstract_text, &self.core_keywords)
            || contains_any(&title, &self.title_markers)
    }

    /// True when the document touches a topic excluded right before scoring.
    pub fn is_excluded_for_scoring(&self, title: &str, abstract_text: &str) -> bool {
        contains_any(&title.to_lowercase(), &self.scoring_exclusions)
            || contains_any(&abstract_text.to_lowercase(), &self.scoring_exclusions)
    }
}

impl Default for RelevanceFilter {
    fn default() -> Self {
        Self::new(&FilterConfig::default())
    }
}
