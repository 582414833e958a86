use pb_core::ScoredCandidate;

/// Keeps candidates at or above the threshold, best first, at most `max_posts`.
#[derive(Debug, Clone, Copy)]
pub struct Selector {
    threshold: u8,
    max_posts: usize,
}

impl Selector {
    pub fn new(threshold: u8, max_posts: usize) -> Self {
        Self { threshold, max_posts }
    }

    pub fn threshold(&self) -> u8 {
        self.threshold
    }

    /// Ties keep their encounter order.
    pub fn select(&self, candidates: Vec<ScoredCandidate>) -> Vec<ScoredCandidate> {
        let mut kept = candidates
            .into_iter()
            .filter(|c| c.relevance_score() >= self.threshold)
            .collect::<Vec<_>>();
        kept.sort_by(|a, b| b.relevance_score().cmp(&a.relevance_score()));
        kept.truncate(self.max_posts);
        kept
    }
}
