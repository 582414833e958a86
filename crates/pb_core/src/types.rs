use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A research document as produced by the ingestion collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub id: String,
    pub category: String,
    pub title: String,
    pub authors: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub url: String,
    pub added_at: NaiveDate,
}

/// Inclusive range of `added_at` dates a run operates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// The "past 24 hours" window: yesterday through `today`.
    pub fn last_day(today: NaiveDate) -> Self {
        Self {
            start: today.pred_opt().unwrap_or(today),
            end: today,
        }
    }

    /// `days` back from `today`. A start before the earliest representable
    /// date is a config error.
    pub fn last_days(today: NaiveDate, days: u64) -> Result<Self> {
        let start = today
            .checked_sub_days(Days::new(days))
            .ok_or_else(|| Error::Config(format!("lookback of {} days is out of range", days)))?;
        Ok(Self { start, end: today })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

impl fmt::Display for DateWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.start, self.end)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Confidence::High => "High",
            Confidence::Medium => "Medium",
            Confidence::Low => "Low",
        };
        f.write_str(s)
    }
}

impl FromStr for Confidence {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "high" => Ok(Confidence::High),
            "medium" => Ok(Confidence::Medium),
            "low" => Ok(Confidence::Low),
            other => Err(format!("Unknown confidence level: {}", other)),
        }
    }
}

/// Structured verdict of the relevance judge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub relevant: bool,
    pub confidence: Confidence,
    /// 0..=10
    pub relevance_score: u8,
    pub analysis: String,
    pub keywords: BTreeSet<String>,
}

impl ScoreResult {
    /// Result recorded when the judge call itself failed.
    pub fn failed(message: impl fmt::Display) -> Self {
        Self {
            relevant: false,
            confidence: Confidence::Low,
            relevance_score: 0,
            analysis: format!("Error analyzing: {}", message),
            keywords: BTreeSet::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoredCandidate {
    pub record: DocumentRecord,
    pub score: ScoreResult,
}

impl ScoredCandidate {
    pub fn new(record: DocumentRecord, score: ScoreResult) -> Self {
        Self { record, score }
    }

    pub fn relevance_score(&self) -> u8 {
        self.score.relevance_score
    }
}

/// Which branch the formatter took for the title block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TitleLayout {
    Full,
    Truncated { kept_chars: usize },
    Omitted,
}

/// Packed post body plus the arithmetic that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackedPost {
    pub text: String,
    pub layout: TitleLayout,
    pub available_for_title: i64,
    pub length: usize,
    pub budget: usize,
}

impl PackedPost {
    pub fn exceeds_budget(&self) -> bool {
        self.length > self.budget
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedPost {
    pub candidate: ScoredCandidate,
    pub summary: String,
    pub post: PackedPost,
}

impl SelectedPost {
    pub fn body(&self) -> &str {
        &self.post.text
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishResult {
    pub record_id: String,
    pub success: bool,
    pub post_id: Option<String>,
    pub attempts: u32,
    pub last_error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishReport {
    pub results: Vec<PublishResult>,
}

impl PublishReport {
    pub fn successes(&self) -> usize {
        self.results.iter().filter(|r| r.success).count()
    }

    pub fn failures(&self) -> usize {
        self.results.iter().filter(|r| !r.success).count()
    }

    pub fn post_ids(&self) -> Vec<String> {
        self.results
            .iter()
            .filter_map(|r| r.post_id.clone())
            .collect()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestStats {
    pub fetched: usize,
    pub rejected: usize,
    pub inserted: usize,
    pub duplicates: usize,
}
