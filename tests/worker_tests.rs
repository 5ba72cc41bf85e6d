// Sampling and workflow tests against stub session, audit and renderer

mod common;

use common::{RecordingRenderer, StubAudit, StubSessions, full_raw, raw_scores};
use lighthouse_trend::config::WorkflowConfig;
use lighthouse_trend::error::PipelineError;
use lighthouse_trend::history_repo::HistoryRepo;
use lighthouse_trend::models::MetricSet;
use lighthouse_trend::report::TrendReporter;
use lighthouse_trend::session_repo::AuthCookie;
use lighthouse_trend::worker::{SamplerConfig, WorkflowDeps, run_workflow, sample};
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;
use tempfile::TempDir;
use url::Url;

fn workflow_config(iterations: u32, metric_set: MetricSet) -> WorkflowConfig {
    WorkflowConfig {
        url: Url::parse("https://shop.example.com/checkout").unwrap(),
        component: "checkout".into(),
        auth_cookie: Some(AuthCookie {
            name: "VtexIdclientAutCookie".into(),
            value: "secret".into(),
        }),
        iterations,
        interval: Duration::ZERO,
        metric_set,
    }
}

#[tokio::test]
async fn three_iterations_then_general_report() {
    let dir = TempDir::new().unwrap();
    let repo = Arc::new(HistoryRepo::new(dir.path().join("data")));
    let sessions = StubSessions::new();
    let counters = sessions.counters.clone();
    let audit = Arc::new(StubAudit::new(raw_scores(1.0, 1.0, 1.0, 1.0)));
    let renderer = RecordingRenderer::default();

    let deps = WorkflowDeps {
        sessions: Arc::new(sessions),
        audit: audit.clone(),
        history_repo: repo.clone(),
        reporter: TrendReporter::new(repo.clone(), renderer.clone(), dir.path().join("reports")),
    };
    let outcome = run_workflow(&deps, &workflow_config(3, MetricSet::General))
        .await
        .unwrap();

    assert_eq!(outcome.sampling.rows_written, 3);
    assert_eq!(audit.calls(), 3);

    let history = repo.read_all("checkout").await.unwrap();
    assert_eq!(history.len(), 3);
    assert!(history.iter().all(|s| s.performance == 100.0));
    assert!(history.iter().all(|s| s.timings.is_none()));

    assert_eq!(outcome.reports.len(), 1);
    let report = &outcome.reports[0];
    assert_eq!(report.metric_set, "general");
    assert!(report.averages.iter().all(|a| a.value == 100.0));
    assert_eq!(renderer.charts().len(), 1);

    // One session for the whole run, closed after reporting.
    assert_eq!(counters.opened.load(Ordering::SeqCst), 1);
    assert_eq!(counters.closed.load(Ordering::SeqCst), 1);
    assert_eq!(
        *counters.cookies.lock().unwrap(),
        vec![Some("secret".to_string())]
    );
}

#[tokio::test]
async fn performance_run_reports_both_sets() {
    let dir = TempDir::new().unwrap();
    let repo = Arc::new(HistoryRepo::new(dir.path()));
    let audit = Arc::new(StubAudit::new(full_raw(0.5)));
    let renderer = RecordingRenderer::default();

    let deps = WorkflowDeps {
        sessions: Arc::new(StubSessions::new()),
        audit: audit.clone(),
        history_repo: repo.clone(),
        reporter: TrendReporter::new(repo.clone(), renderer.clone(), dir.path()),
    };
    let outcome = run_workflow(&deps, &workflow_config(2, MetricSet::Performance))
        .await
        .unwrap();

    let sets: Vec<_> = outcome.reports.iter().map(|r| r.metric_set).collect();
    assert_eq!(sets, vec!["general", "performance"]);
    assert!(dir.path().join("checkout-performance.png").exists());
    assert_eq!(
        *audit.seen_sets.lock().unwrap(),
        vec![MetricSet::Performance, MetricSet::Performance]
    );

    let history = repo.read_all("checkout").await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(
        history[0].timings.map(|t| t.total_blocking_time),
        Some(150.0)
    );
}

#[tokio::test]
async fn failure_stops_remaining_iterations_and_keeps_rows() {
    let dir = TempDir::new().unwrap();
    let repo = Arc::new(HistoryRepo::new(dir.path()));
    let sessions = StubSessions::new();
    let counters = sessions.counters.clone();
    let audit = Arc::new(StubAudit::failing_on(full_raw(0.9), 3));
    let renderer = RecordingRenderer::default();

    let deps = WorkflowDeps {
        sessions: Arc::new(sessions),
        audit: audit.clone(),
        history_repo: repo.clone(),
        reporter: TrendReporter::new(repo.clone(), renderer.clone(), dir.path()),
    };
    let err = run_workflow(&deps, &workflow_config(5, MetricSet::General))
        .await
        .unwrap_err();

    assert!(format!("{err:#}").contains("audit 3/5 failed"));
    assert_eq!(audit.calls(), 3);
    assert_eq!(repo.read_all("checkout").await.unwrap().len(), 2);
    // No report after a sampling failure, but the session is still closed.
    assert!(renderer.charts().is_empty());
    assert_eq!(counters.closed.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn report_failure_still_closes_session_and_keeps_rows() {
    let dir = TempDir::new().unwrap();
    let repo = Arc::new(HistoryRepo::new(dir.path()));
    let sessions = StubSessions::new();
    let counters = sessions.counters.clone();
    let audit = Arc::new(StubAudit::new(full_raw(0.8)));

    let deps = WorkflowDeps {
        sessions: Arc::new(sessions),
        audit: audit.clone(),
        history_repo: repo.clone(),
        reporter: TrendReporter::new(repo.clone(), RecordingRenderer::failing(), dir.path()),
    };
    let err = run_workflow(&deps, &workflow_config(2, MetricSet::General))
        .await
        .unwrap_err();

    assert!(format!("{err:#}").contains("stub renderer failure"));
    assert_eq!(audit.calls(), 2);
    assert_eq!(repo.read_all("checkout").await.unwrap().len(), 2);
    assert_eq!(counters.opened.load(Ordering::SeqCst), 1);
    assert_eq!(counters.closed.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn malformed_audit_aborts_sampling() {
    let dir = TempDir::new().unwrap();
    let repo = HistoryRepo::new(dir.path());
    let mut raw = full_raw(1.0);
    raw.categories.remove("accessibility");
    let audit = StubAudit::new(raw);

    let config = SamplerConfig::from(&workflow_config(4, MetricSet::General));
    let err = sample(&audit, &repo, &config).await.unwrap_err();

    assert_eq!(
        err.downcast_ref::<PipelineError>(),
        Some(&PipelineError::MalformedAudit("category accessibility".into()))
    );
    assert_eq!(audit.calls(), 1);
    assert!(repo.read_all("checkout").await.unwrap().is_empty());
}

#[tokio::test]
async fn session_open_failure_skips_sampling() {
    let dir = TempDir::new().unwrap();
    let repo = Arc::new(HistoryRepo::new(dir.path()));
    let mut sessions = StubSessions::new();
    sessions.fail_open = true;
    let audit = Arc::new(StubAudit::new(full_raw(1.0)));

    let deps = WorkflowDeps {
        sessions: Arc::new(sessions),
        audit: audit.clone(),
        history_repo: repo.clone(),
        reporter: TrendReporter::new(repo.clone(), RecordingRenderer::default(), dir.path()),
    };
    assert!(
        run_workflow(&deps, &workflow_config(2, MetricSet::General))
            .await
            .is_err()
    );
    assert_eq!(audit.calls(), 0);
}

#[tokio::test]
async fn waits_interval_after_every_iteration() {
    let dir = TempDir::new().unwrap();
    let repo = HistoryRepo::new(dir.path());
    let audit = StubAudit::new(full_raw(1.0));
    let mut config = SamplerConfig::from(&workflow_config(2, MetricSet::General));
    config.interval = Duration::from_millis(40);

    let started = std::time::Instant::now();
    let summary = sample(&audit, &repo, &config).await.unwrap();

    assert_eq!(summary.rows_written, 2);
    assert!(started.elapsed() >= Duration::from_millis(80));
}
