use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use pb_core::{
    DateWindow, DocumentRecord, DocumentSource, Error, IngestStats, PipelineConfig, PostTransport,
    PublishReport, RecordStore, RelevanceFilter, Result, ScoredCandidate, SelectedPost,
};
use pb_inference::{RelevanceScorer, Summarizer};
use pb_publish::{pack_post, Publisher};
use pb_scrapers::ScraperManager;
use crate::health::{check_services, HealthReport};
use crate::report::write_error_report;
use crate::resources::{JudgeProvider, StoreProvider};
use crate::select::Selector;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    HealthChecking,
    Ingesting,
    Scoring,
    Selecting,
    SummarizingFormatting,
    Publishing,
    Done,
    Failed,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunState::Idle => "idle",
            RunState::HealthChecking => "health_checking",
            RunState::Ingesting => "ingesting",
            RunState::Scoring => "scoring",
            RunState::Selecting => "selecting",
            RunState::SummarizingFormatting => "summarizing_formatting",
            RunState::Publishing => "publishing",
            RunState::Done => "done",
            RunState::Failed => "failed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Everything up to formatting; nothing is published.
    DryRun,
    Full,
}

/// What a run did. Returned whether it ended in `Done` or `Failed`.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub mode: RunMode,
    pub window: DateWindow,
    pub state: RunState,
    pub health: Option<HealthReport>,
    pub ingest: Option<IngestStats>,
    pub in_window: usize,
    pub scored: usize,
    pub skipped: usize,
    pub posts: Vec<SelectedPost>,
    pub publish: Option<PublishReport>,
    pub error: Option<String>,
    pub error_kind: Option<&'static str>,
    pub error_report: Option<PathBuf>,
}

impl RunSummary {
    fn new(mode: RunMode, window: DateWindow) -> Self {
        Self {
            mode,
            window,
            state: RunState::Idle,
            health: None,
            ingest: None,
            in_window: 0,
            scored: 0,
            skipped: 0,
            posts: Vec::new(),
            publish: None,
            error: None,
            error_kind: None,
            error_report: None,
        }
    }

    pub fn selected(&self) -> usize {
        self.posts.len()
    }

    pub fn is_failed(&self) -> bool {
        self.state == RunState::Failed
    }

    fn enter(&mut self, next: RunState) {
        tracing::info!(from = %self.state, state = %next, "Run state changed");
        self.state = next;
    }
}

/// What a run acquires up front and gives back when it ends.
struct RunResources {
    store: Arc<dyn RecordStore>,
    scorer: RelevanceScorer,
    summarizer: Summarizer,
}

/// One ingest, score, select, format and publish pass over a date window.
/// The store is opened and the judge built at the start of every run, so a
/// pipeline can run any number of times.
pub struct Pipeline {
    config: PipelineConfig,
    store: Box<dyn StoreProvider>,
    judge: Box<dyn JudgeProvider>,
    ingest: ScraperManager,
    filter: RelevanceFilter,
    selector: Selector,
    publisher: Option<Publisher>,
}

impl Pipeline {
    pub fn new(
        config: PipelineConfig,
        store: impl StoreProvider + 'static,
        source: Arc<dyn DocumentSource>,
        judge: impl JudgeProvider + 'static,
        transport: Option<Arc<dyn PostTransport>>,
    ) -> Self {
        let filter = RelevanceFilter::new(&config.filter);
        Self {
            ingest: ScraperManager::new(source, filter.clone()),
            filter,
            selector: Selector::new(config.score_threshold, config.max_posts),
            publisher: transport.map(|t| Publisher::new(t, &config.publish)),
            store: Box::new(store),
            judge: Box::new(judge),
            config,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run the health checks only. The store is opened for the check and
    /// closed again.
    pub async fn health_check(&self, mode: RunMode) -> HealthReport {
        match self.store.open().await {
            Ok(store) => {
                let report = self.check(Ok(store.as_ref()), mode).await;
                close_store(store.as_ref()).await;
                report
            }
            Err(e) => self.check(Err(&e), mode).await,
        }
    }

    async fn check(&self, store: std::result::Result<&dyn RecordStore, &Error>, mode: RunMode) -> HealthReport {
        check_services(
            &self.ingest,
            store,
            self.publisher.as_ref().map(|p| p.transport().as_ref()),
            mode == RunMode::Full,
        )
        .await
    }

    /// Execute one run. Run-level failures, including a store that cannot be
    /// opened or a judge that cannot be built, end in `Failed` with an error
    /// report on disk. A store opened by the run is closed on every path.
    pub async fn run(&self, mode: RunMode, window: DateWindow) -> RunSummary {
        let mut summary = RunSummary::new(mode, window);
        tracing::info!(?mode, %window, "🌅 Starting run");

        summary.enter(RunState::HealthChecking);
        let outcome = match self.acquire().await {
            Ok(resources) => {
                let outcome = self.execute(&mut summary, &resources).await;
                close_store(resources.store.as_ref()).await;
                outcome
            }
            Err(e) => Err(e),
        };

        match outcome {
            Ok(()) => {
                summary.enter(RunState::Done);
                tracing::info!("✅ Run finished");
            }
            Err(e) => {
                tracing::error!(state = %summary.state, kind = e.kind(), "❌ Run failed: {}", e);
                summary.enter(RunState::Failed);
                summary.error = Some(e.to_string());
                summary.error_kind = Some(e.kind());
                match write_error_report(&self.config.report_dir, &e) {
                    Ok(path) => summary.error_report = Some(path),
                    Err(report_err) => tracing::error!("❌ Could not write error report: {}", report_err),
                }
            }
        }
        summary
    }

    /// Build the judge first so a bad judge config never leaves a store open.
    async fn acquire(&self) -> Result<RunResources> {
        let judge = self.judge.build()?;
        let store = self.store.open().await?;
        Ok(RunResources {
            store,
            scorer: RelevanceScorer::new(judge.clone(), self.config.min_abstract_chars),
            summarizer: Summarizer::new(judge, self.config.summary_cap, self.config.fallback_summary.clone()),
        })
    }

    async fn execute(&self, summary: &mut RunSummary, resources: &RunResources) -> Result<()> {
        let store = resources.store.as_ref();
        let health = self.check(Ok(store), summary.mode).await;
        summary.health = Some(health.clone());
        health.into_result()?;

        summary.enter(RunState::Ingesting);
        summary.ingest = Some(self.ingest.ingest(store, &summary.window).await?);
        let records = store
            .query_window(&summary.window, &self.config.categories)
            .await?;
        summary.in_window = records.len();
        tracing::info!("📚 {} papers in {}", records.len(), summary.window);
        if records.is_empty() {
            tracing::info!("📝 No new papers, nothing to post today");
            return Ok(());
        }

        summary.enter(RunState::Scoring);
        let candidates = self.score(&resources.scorer, records, summary).await;

        summary.enter(RunState::Selecting);
        let selected = self.selector.select(candidates);
        tracing::info!("✅ Selected {} papers", selected.len());
        for (i, candidate) in selected.iter().enumerate() {
            tracing::info!("  {}. [{}/10] {}", i + 1, candidate.relevance_score(), candidate.record.title);
        }
        if selected.is_empty() {
            tracing::info!("📝 No paper reached the threshold, nothing to post today");
            return Ok(());
        }

        summary.enter(RunState::SummarizingFormatting);
        summary.posts = self.compose(&resources.summarizer, selected).await;

        if summary.mode == RunMode::DryRun {
            for (i, post) in summary.posts.iter().enumerate() {
                tracing::info!(
                    "📄 Preview {}/{} ({} chars, {:?}):\n{}",
                    i + 1,
                    summary.posts.len(),
                    post.post.length,
                    post.post.layout,
                    post.body()
                );
            }
            return Ok(());
        }

        summary.enter(RunState::Publishing);
        let publisher = self
            .publisher
            .as_ref()
            .ok_or_else(|| Error::Config("no publishing transport configured".to_string()))?;
        summary.publish = Some(publisher.publish_batch(&summary.posts).await);
        Ok(())
    }

    /// Score every candidate that passes the gates. Order is preserved so the
    /// selector stays deterministic whatever the concurrency.
    async fn score(
        &self,
        scorer: &RelevanceScorer,
        records: Vec<DocumentRecord>,
        summary: &mut RunSummary,
    ) -> Vec<ScoredCandidate> {
        let total = records.len();
        let mut eligible = Vec::with_capacity(total);
        for record in records {
            if !self.filter.is_plausible(&record.title, &record.abstract_text) {
                tracing::info!(id = %record.id, "Rejected by prefilter");
                summary.skipped += 1;
            } else if self.filter.is_excluded_for_scoring(&record.title, &record.abstract_text) {
                tracing::info!(id = %record.id, "🚫 Excluded topic, skipping");
                summary.skipped += 1;
            } else {
                eligible.push(record);
            }
        }

        let topic = self.config.topic.as_str();
        let count = eligible.len();
        let verdicts = stream::iter(eligible.into_iter().enumerate())
            .map(|(i, record)| async move {
                tracing::info!("  Analyzing {}/{}: {}", i + 1, count, record.title);
                let verdict = scorer.assess(&record, topic).await;
                (record, verdict)
            })
            .buffered(self.config.scoring_concurrency.max(1))
            .collect::<Vec<_>>()
            .await;

        let mut candidates = Vec::with_capacity(verdicts.len());
        for (record, verdict) in verdicts {
            match verdict {
                Some(score) => {
                    summary.scored += 1;
                    tracing::info!(id = %record.id, score = score.relevance_score, "📊 Scored");
                    candidates.push(ScoredCandidate::new(record, score));
                }
                None => summary.skipped += 1,
            }
        }
        candidates
    }

    async fn compose(&self, summarizer: &Summarizer, selected: Vec<ScoredCandidate>) -> Vec<SelectedPost> {
        let mut posts = Vec::with_capacity(selected.len());
        for candidate in selected {
            let summary = summarizer
                .summarize(&candidate.record.title, &candidate.record.abstract_text)
                .await;
            tracing::info!("📝 Summary ({} chars): {}", summary.chars().count(), summary);
            let post = pack_post(&candidate.record.title, &summary, &candidate.record.url, self.config.post_budget);
            posts.push(SelectedPost {
                candidate,
                summary,
                post,
            });
        }
        posts
    }
}

/// Release a store. Errors are logged, never returned.
async fn close_store(store: &dyn RecordStore) {
    match store.close().await {
        Ok(()) => tracing::info!("🔒 Record store closed"),
        Err(e) => tracing::warn!("Failed to close record store: {}", e),
    }
}
