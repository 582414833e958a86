use std::fmt;

use async_trait::async_trait;
use crate::Result;

/// Text-generation collaborator used for both scoring and summarizing.
///
/// Implementations return the raw model output; parsing, capping and
/// fallbacks are applied by the callers in `pb_inference`.
#[async_trait]
pub trait Judge: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    /// Judge how relevant `abstract_text` is to `topic`. Expected to return a
    /// JSON object, possibly inside a fenced code block.
    async fn score(&self, abstract_text: &str, topic: &str) -> Result<String>;

    /// One short sentence describing the document.
    async fn summarize(&self, title: &str, abstract_text: &str) -> Result<String>;
}
