// Sampling workflow: one session, N sequential audit cycles, then trend reports.
// Cycles never overlap; each waits out the interval (including the last) before the next.
// The first failure aborts the remaining cycles; rows already appended stay persisted.

use crate::audit_repo::AuditProvider;
use crate::config::WorkflowConfig;
use crate::error::with_cleanup;
use crate::history_repo::HistoryRepo;
use crate::models::MetricSet;
use crate::report::{ChartRenderer, ReportOutcome, TrendReporter};
use crate::session_repo::SessionProvider;
use crate::snapshot_builder;
use anyhow::Context;
use std::sync::Arc;
use tokio::time::Duration;
use tracing::Instrument;
use url::Url;

/// Sampling loop inputs.
#[derive(Debug, Clone)]
pub struct SamplerConfig {
    pub url: Url,
    pub component: String,
    pub iterations: u32,
    pub interval: Duration,
    pub metric_set: MetricSet,
}

impl From<&WorkflowConfig> for SamplerConfig {
    fn from(c: &WorkflowConfig) -> Self {
        Self {
            url: c.url.clone(),
            component: c.component.clone(),
            iterations: c.iterations,
            interval: c.interval,
            metric_set: c.metric_set,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplingSummary {
    pub rows_written: u32,
}

/// Run `iterations` audit cycles, appending one snapshot per cycle.
pub async fn sample(
    audit: &dyn AuditProvider,
    history_repo: &HistoryRepo,
    config: &SamplerConfig,
) -> anyhow::Result<SamplingSummary> {
    let span = tracing::span!(
        tracing::Level::INFO,
        "sampler",
        component = %config.component,
        metric_set = %config.metric_set,
        iterations = config.iterations
    );
    async {
        let mut rows_written = 0;
        for i in 1..=config.iterations {
            let raw = audit
                .audit(&config.url, config.metric_set)
                .await
                .with_context(|| format!("audit {}/{} failed", i, config.iterations))?;
            let snapshot = snapshot_builder::build(&raw, config.metric_set)
                .with_context(|| format!("audit {}/{} result rejected", i, config.iterations))?;
            history_repo
                .append(&config.component, &snapshot)
                .await
                .with_context(|| format!("append {}/{} failed", i, config.iterations))?;
            rows_written += 1;

            tracing::info!(
                iteration = i,
                of = config.iterations,
                performance = snapshot.performance,
                accessibility = snapshot.accessibility,
                best_practices = snapshot.best_practices,
                seo = snapshot.seo,
                "Audit sample saved"
            );

            if !config.interval.is_zero() {
                tracing::debug!(
                    wait_ms = config.interval.as_millis() as u64,
                    "waiting for next audit"
                );
            }
            tokio::time::sleep(config.interval).await;
        }
        anyhow::Ok(SamplingSummary { rows_written })
    }
    .instrument(span)
    .await
}

/// Collaborators for a full workflow run.
pub struct WorkflowDeps<R> {
    pub sessions: Arc<dyn SessionProvider>,
    pub audit: Arc<dyn AuditProvider>,
    pub history_repo: Arc<HistoryRepo>,
    pub reporter: TrendReporter<R>,
}

#[derive(Debug)]
pub struct WorkflowOutcome {
    pub sampling: SamplingSummary,
    pub reports: Vec<ReportOutcome>,
}

/// Open the session, sample, report every covered metric set, then close the session.
/// The session is closed on every exit path; a close failure after an earlier failure is
/// logged and the earlier error returned.
pub async fn run_workflow<R: ChartRenderer>(
    deps: &WorkflowDeps<R>,
    config: &WorkflowConfig,
) -> anyhow::Result<WorkflowOutcome> {
    let session = deps
        .sessions
        .open(&config.url, config.auth_cookie.as_ref())
        .await
        .context("session open failed")?;

    let result = sample_and_report(deps, config).await;
    let closed = session.close().await;

    with_cleanup(result, closed, "session close")
}

async fn sample_and_report<R: ChartRenderer>(
    deps: &WorkflowDeps<R>,
    config: &WorkflowConfig,
) -> anyhow::Result<WorkflowOutcome> {
    let sampler_config = SamplerConfig::from(config);
    let sampling = sample(deps.audit.as_ref(), &deps.history_repo, &sampler_config).await?;

    let mut reports = Vec::new();
    for set in config.metric_set.covered_sets() {
        reports.push(deps.reporter.render(&config.component, set.name()).await?);
    }
    Ok(WorkflowOutcome { sampling, reports })
}
