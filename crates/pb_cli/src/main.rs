mod logging;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use pb_core::{DateWindow, PipelineConfig, PostTransport};
use pb_pipeline::{window_stats, Pipeline, RunMode, RunSummary, StoreProvider, StoreSpec};
use pb_publish::{XClient, XConfig};
use pb_scrapers::{ArxivConfig, ArxivScraper};
use tracing::info;

const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

#[derive(Parser, Debug)]
#[command(author, version, about = "Crawl new arXiv papers, pick the most relevant and post them to X", long_about = None)]
struct Cli {
    /// TOML file with pipeline settings.
    #[arg(long, env = "PB_CONFIG")]
    config: Option<PathBuf>,
    #[arg(long, env = "PB_STORE", default_value = "sqlite")]
    store: String,
    /// Database location for the sqlite store.
    #[arg(long, env = "PB_DATABASE")]
    database: Option<String>,
    #[arg(long, env = "PB_MODEL", default_value = "groq", help = "Judge backend: groq (default), openai or dummy")]
    model: String,
    #[arg(long, env = "GROQ_API_KEY", hide_env_values = true)]
    api_key: Option<String>,
    #[arg(long, env = "GROQ_MODEL")]
    model_name: Option<String>,
    #[arg(long, env = "PB_MODEL_URL")]
    model_url: Option<String>,
    /// OAuth 2.0 user token used to post.
    #[arg(long, env = "X_ACCESS_TOKEN", hide_env_values = true)]
    x_access_token: Option<String>,
    #[arg(long, default_value = pb_publish::transport::X_API_BASE_URL)]
    x_api_url: String,
    #[arg(long, default_value = pb_scrapers::scrapers::arxiv::ARXIV_BASE_URL)]
    arxiv_url: String,
    /// Pause between arXiv requests (e.g. 1s, 500ms).
    #[arg(long, default_value = "1s", value_parser = humantime::parse_duration)]
    request_delay: Duration,
    #[arg(long, env = "PB_LOG_FILE", default_value = "paper_bot.log")]
    log_file: PathBuf,
    /// Log to stderr only.
    #[arg(long)]
    no_log_file: bool,
    #[arg(short, long)]
    verbose: bool,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Full run: crawl, score, select and publish.
    #[command(alias = "test")]
    Run {
        /// How far back to look (e.g. 1d, 48h).
        #[arg(long, default_value = "1d", value_parser = humantime::parse_duration)]
        lookback: Duration,
    },
    /// Same as run, but print the posts instead of publishing them.
    Analyze {
        #[arg(long, default_value = "1d", value_parser = humantime::parse_duration)]
        lookback: Duration,
    },
    /// Probe arXiv, the store and X, then exit.
    Health,
    /// Count stored papers per category.
    Stats {
        #[arg(long, default_value_t = 1)]
        days: u64,
    },
}

fn lookback_window(today: NaiveDate, lookback: Duration) -> pb_core::Result<DateWindow> {
    DateWindow::last_days(today, lookback.as_secs().div_ceil(SECONDS_PER_DAY).max(1))
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<PipelineConfig> {
    let config = match path {
        Some(path) => PipelineConfig::from_toml_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    config.validate()?;
    Ok(config)
}

fn store_spec(cli: &Cli) -> StoreSpec {
    StoreSpec::new(cli.store.clone(), cli.database.clone())
}

fn judge_config(cli: &Cli) -> pb_inference::Config {
    pb_inference::Config {
        backend: cli.model.clone(),
        api_key: cli.api_key.clone(),
        model_name: cli.model_name.clone(),
        base_url: cli.model_url.clone(),
    }
}

fn build_transport(cli: &Cli) -> anyhow::Result<Option<Arc<dyn PostTransport>>> {
    match cli.x_access_token.as_deref().filter(|t| !t.trim().is_empty()) {
        Some(token) => {
            let client = XClient::new(XConfig {
                base_url: cli.x_api_url.clone(),
                access_token: token.to_string(),
            })?;
            Ok(Some(Arc::new(client)))
        }
        None => {
            info!("X_ACCESS_TOKEN not set, publishing disabled");
            Ok(None)
        }
    }
}

/// The store and the judge are handed over unopened; each run acquires them
/// and a failure there ends the run with an error report.
fn build_pipeline(cli: &Cli, config: PipelineConfig) -> anyhow::Result<Pipeline> {
    let source = ArxivScraper::new(ArxivConfig {
        base_url: cli.arxiv_url.clone(),
        categories: config.categories.clone(),
        request_delay: cli.request_delay,
        ..ArxivConfig::default()
    })?;

    let transport = build_transport(cli)?;
    Ok(Pipeline::new(config, store_spec(cli), Arc::new(source), judge_config(cli), transport))
}

fn print_summary(summary: &RunSummary) {
    println!("Run {} over {}: {}", if summary.mode == RunMode::Full { "full" } else { "dry" }, summary.window, summary.state);
    if let Some(ingest) = &summary.ingest {
        println!(
            "  ingest: {} fetched, {} rejected, {} inserted, {} duplicates",
            ingest.fetched, ingest.rejected, ingest.inserted, ingest.duplicates
        );
    }
    println!(
        "  {} in window, {} scored, {} skipped, {} selected",
        summary.in_window,
        summary.scored,
        summary.skipped,
        summary.selected()
    );

    if summary.mode == RunMode::DryRun {
        for (i, post) in summary.posts.iter().enumerate() {
            println!(
                "\n--- {} [{}/10] ({}/{} chars) ---\n{}",
                i + 1,
                post.candidate.relevance_score(),
                post.post.length,
                post.post.budget,
                post.body()
            );
        }
    }

    if let Some(report) = &summary.publish {
        println!("  published {}/{}", report.successes(), report.results.len());
        let ids = report.post_ids();
        if !ids.is_empty() {
            println!("  post ids: {}", ids.join(", "));
        }
    }
    if let Some(error) = &summary.error {
        println!("  error ({}): {}", summary.error_kind.unwrap_or("unknown"), error);
    }
    if let Some(path) = &summary.error_report {
        println!("  error report: {}", path.display());
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let config = load_config(cli.config.as_ref())?;
    let today = Local::now().date_naive();

    match &cli.command {
        None => run_pipeline(&cli, config, RunMode::Full, DateWindow::last_day(today)).await,
        Some(Commands::Run { lookback }) => {
            let window = lookback_window(today, *lookback)?;
            run_pipeline(&cli, config, RunMode::Full, window).await
        }
        Some(Commands::Analyze { lookback }) => {
            let window = lookback_window(today, *lookback)?;
            run_pipeline(&cli, config, RunMode::DryRun, window).await
        }
        Some(Commands::Health) => {
            let mode = if cli.x_access_token.is_some() { RunMode::Full } else { RunMode::DryRun };
            let pipeline = build_pipeline(&cli, config)?;
            let report = pipeline.health_check(mode).await;
            for probe in &report.probes {
                println!("{} {}: {}", if probe.ok { "✅" } else { "❌" }, probe.name, probe.detail);
            }
            Ok(if report.is_healthy() { ExitCode::SUCCESS } else { ExitCode::FAILURE })
        }
        Some(Commands::Stats { days }) => {
            let window = DateWindow::last_days(today, (*days).max(1))?;
            let store = store_spec(&cli)
                .open()
                .await
                .with_context(|| format!("opening {} store", cli.store))?;
            let stats = window_stats(store.as_ref(), &window, &config.categories).await;
            store.close().await?;
            let stats = stats?;
            println!("📊 {} papers in {}", stats.total, stats.window);
            for (category, count) in &stats.per_category {
                println!("  {}: {}", category, count);
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn run_pipeline(cli: &Cli, config: PipelineConfig, mode: RunMode, window: DateWindow) -> anyhow::Result<ExitCode> {
    let pipeline = build_pipeline(cli, config)?;
    let summary = pipeline.run(mode, window).await;
    print_summary(&summary);
    Ok(if summary.is_failed() { ExitCode::FAILURE } else { ExitCode::SUCCESS })
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    let log_file = (!cli.no_log_file).then_some(cli.log_file.as_path());
    let _guard = logging::init_logging(log_file, cli.verbose);

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("❌ {:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 2).unwrap()
    }

    #[test]
    fn test_lookback_rounds_up_to_whole_days() {
        let window = lookback_window(today(), Duration::from_secs(36 * 60 * 60)).unwrap();
        assert_eq!(window.start, NaiveDate::from_ymd_opt(2024, 4, 30).unwrap());
        let window = lookback_window(today(), Duration::from_secs(60)).unwrap();
        assert_eq!(window, DateWindow::last_day(today()));
    }

    #[test]
    fn test_huge_lookback_is_rejected() {
        let err = lookback_window(today(), Duration::from_secs(u64::MAX)).unwrap_err();
        assert_eq!(err.kind(), "ConfigError");
    }

    #[test]
    fn test_huge_stats_days_is_rejected() {
        let cli = Cli::try_parse_from(["pb", "stats", "--days", "99999999999999"]).unwrap();
        match cli.command {
            Some(Commands::Stats { days }) => assert!(DateWindow::last_days(today(), days).is_err()),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_file_log_can_be_disabled() {
        let cli = Cli::try_parse_from(["pb", "--no-log-file", "health"]).unwrap();
        assert!(cli.no_log_file);
        let cli = Cli::try_parse_from(["pb", "health"]).unwrap();
        assert!(!cli.no_log_file);
    }
}
