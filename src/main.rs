use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use lighthouse_trend::audit_repo::LighthouseCli;
use lighthouse_trend::config::AppConfig;
use lighthouse_trend::history_repo::HistoryRepo;
use lighthouse_trend::models::MetricSet;
use lighthouse_trend::report::{ChromiumChartConfig, ChromiumChartRenderer, TrendReporter};
use lighthouse_trend::session_repo::{ChromiumSessionConfig, ChromiumSessionProvider};
use lighthouse_trend::worker::{self, WorkflowDeps};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

#[derive(Parser, Debug)]
#[command(name = "lighthouse-trend", version)]
#[command(about = "Sample Lighthouse audits for a component and chart the trend")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sample audits, append them to the history and render the trend charts (default)
    Run {
        #[arg(long)]
        iterations: Option<u32>,
        #[arg(long)]
        interval_ms: Option<u64>,
        #[arg(long)]
        metric_set: Option<String>,
    },
    /// Render trend charts from the stored history only
    Report {
        /// Metric set to chart; defaults to every set the configured metric set covers
        #[arg(long)]
        metric_set: Option<String>,
    },
    /// Print the stored history as JSON
    Dump {
        /// Only the most recent N rows
        #[arg(long)]
        limit: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .init();

    let cli = Cli::parse();
    let mut app_config = AppConfig::load()?;
    let command = cli.command.unwrap_or(Command::Run {
        iterations: None,
        interval_ms: None,
        metric_set: None,
    });

    if let Command::Run {
        iterations,
        interval_ms,
        metric_set,
    } = &command
    {
        if let Some(n) = iterations {
            app_config.sampling.iterations = *n;
        }
        if let Some(ms) = interval_ms {
            app_config.sampling.interval_ms = *ms;
        }
        if let Some(set) = metric_set {
            app_config.sampling.metric_set = set.clone();
        }
        app_config.validate()?;
    }

    let history_repo = Arc::new(HistoryRepo::new(&app_config.storage.dir));
    let reporter = TrendReporter::new(
        history_repo.clone(),
        ChromiumChartRenderer::new(ChromiumChartConfig {
            chart_js_url: app_config.report.chart_js_url.clone(),
            width: app_config.report.width,
            height: app_config.report.height,
            chrome_executable: app_config.browser.chrome_executable.clone(),
        }),
        &app_config.report.output_dir,
    );
    let component = app_config.target.component.clone();

    let result = match command {
        Command::Run { .. } => {
            let workflow_config = app_config.workflow_config(|key| std::env::var(key).ok())?;
            tracing::info!(
                url = %workflow_config.url,
                component = %workflow_config.component,
                iterations = workflow_config.iterations,
                interval_ms = workflow_config.interval.as_millis() as u64,
                metric_set = %workflow_config.metric_set,
                auth_cookie = workflow_config.auth_cookie.is_some(),
                "Starting audit workflow"
            );
            let deps = WorkflowDeps {
                sessions: Arc::new(ChromiumSessionProvider::new(ChromiumSessionConfig {
                    debugging_port: app_config.browser.debugging_port,
                    headless: app_config.browser.headless,
                    chrome_executable: app_config.browser.chrome_executable.clone(),
                })),
                audit: Arc::new(LighthouseCli::new(
                    &app_config.lighthouse.binary,
                    app_config.browser.debugging_port,
                )),
                history_repo: history_repo.clone(),
                reporter,
            };
            worker::run_workflow(&deps, &workflow_config)
                .await
                .map(|outcome| {
                    tracing::info!(
                        rows_written = outcome.sampling.rows_written,
                        charts = outcome.reports.len(),
                        "Audit workflow complete"
                    );
                })
        }
        Command::Report { metric_set } => {
            let sets: Vec<String> = match metric_set {
                Some(name) => vec![name],
                None => app_config
                    .metric_set()?
                    .covered_sets()
                    .into_iter()
                    .map(|s: MetricSet| s.name().to_string())
                    .collect(),
            };
            let mut outcome = Ok(());
            for set in sets {
                if let Err(e) = reporter.render(&component, &set).await {
                    outcome = Err(e.context(format!("report {set} failed")));
                    break;
                }
            }
            outcome
        }
        Command::Dump { limit } => dump(&history_repo, &component, limit).await,
    };

    history_repo.close().await;
    if let Err(e) = &result {
        tracing::error!(error = ?e, "run failed");
    }
    result
}

async fn dump(history_repo: &HistoryRepo, component: &str, limit: Option<usize>) -> Result<()> {
    let history = history_repo
        .read_all(component)
        .await
        .with_context(|| format!("reading history for {component}"))?;
    let skip = limit.map_or(0, |n| history.len().saturating_sub(n));
    println!("{}", serde_json::to_string_pretty(&history[skip..])?);
    Ok(())
}
