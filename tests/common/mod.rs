// Shared test helpers: snapshots and stub collaborators

#![allow(dead_code)]

use async_trait::async_trait;
use lighthouse_trend::audit_repo::{AuditEntry, AuditProvider, CategoryResult, RawAuditResult};
use lighthouse_trend::models::{MetricSet, MetricSnapshot, TimingMetrics};
use lighthouse_trend::report::{ChartRenderer, TrendChart};
use lighthouse_trend::session_repo::{AuthCookie, PageSession, SessionProvider};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use url::Url;

pub fn scores_snapshot(timestamp: &str, performance: f64) -> MetricSnapshot {
    MetricSnapshot {
        timestamp: timestamp.into(),
        performance,
        accessibility: 90.0,
        best_practices: 100.0,
        seo: 80.0,
        timings: None,
    }
}

pub fn timed_snapshot(timestamp: &str, lcp: f64) -> MetricSnapshot {
    MetricSnapshot {
        timings: Some(TimingMetrics {
            first_contentful_paint: 900.0,
            largest_contentful_paint: lcp,
            speed_index: 1500.0,
            total_blocking_time: 120.0,
            cumulative_layout_shift: 0.05,
        }),
        ..scores_snapshot(timestamp, 75.0)
    }
}

/// Raw result with the four categories at the given [0, 1] scores and no audits.
pub fn raw_scores(
    performance: f64,
    accessibility: f64,
    best_practices: f64,
    seo: f64,
) -> RawAuditResult {
    let categories = [
        ("performance", performance),
        ("accessibility", accessibility),
        ("best-practices", best_practices),
        ("seo", seo),
    ]
    .into_iter()
    .map(|(id, score)| (id.to_string(), CategoryResult { score: Some(score) }))
    .collect();
    RawAuditResult {
        categories,
        audits: HashMap::new(),
    }
}

/// `raw` with audit `id` set to `display_value`.
pub fn with_audit(mut raw: RawAuditResult, id: &str, display_value: &str) -> RawAuditResult {
    raw.audits.insert(
        id.to_string(),
        AuditEntry {
            display_value: Some(display_value.to_string()),
            numeric_value: None,
        },
    );
    raw
}

/// Raw result with every category at `score` and all timing audits present.
pub fn full_raw(score: f64) -> RawAuditResult {
    [
        ("first-contentful-paint", "1.2\u{a0}s"),
        ("largest-contentful-paint", "2,345\u{a0}ms"),
        ("speed-index", "3.4\u{a0}s"),
        ("total-blocking-time", "150\u{a0}ms"),
        ("cumulative-layout-shift", "0.05"),
    ]
    .into_iter()
    .fold(raw_scores(score, score, score, score), |raw, (id, display)| {
        with_audit(raw, id, display)
    })
}

/// Audit stub returning `result`; fails on call number `fail_on` (1-based) if set.
pub struct StubAudit {
    pub result: RawAuditResult,
    pub fail_on: Option<usize>,
    pub calls: AtomicUsize,
    pub seen_sets: Mutex<Vec<MetricSet>>,
}

impl StubAudit {
    pub fn new(result: RawAuditResult) -> Self {
        Self {
            result,
            fail_on: None,
            calls: AtomicUsize::new(0),
            seen_sets: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_on(result: RawAuditResult, call: usize) -> Self {
        Self {
            fail_on: Some(call),
            ..Self::new(result)
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AuditProvider for StubAudit {
    async fn audit(&self, _url: &Url, metric_set: MetricSet) -> anyhow::Result<RawAuditResult> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.seen_sets.lock().unwrap().push(metric_set);
        if self.fail_on == Some(n) {
            anyhow::bail!("stub audit failure on call {n}");
        }
        Ok(self.result.clone())
    }
}

#[derive(Default)]
pub struct SessionCounters {
    pub opened: AtomicUsize,
    pub closed: AtomicUsize,
    pub cookies: Mutex<Vec<Option<String>>>,
}

pub struct StubSessions {
    pub counters: Arc<SessionCounters>,
    pub fail_open: bool,
}

impl StubSessions {
    pub fn new() -> Self {
        Self {
            counters: Arc::new(SessionCounters::default()),
            fail_open: false,
        }
    }
}

struct StubSession {
    counters: Arc<SessionCounters>,
}

#[async_trait]
impl PageSession for StubSession {
    async fn close(self: Box<Self>) -> anyhow::Result<()> {
        self.counters.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait]
impl SessionProvider for StubSessions {
    async fn open(
        &self,
        _url: &Url,
        cookie: Option<&AuthCookie>,
    ) -> anyhow::Result<Box<dyn PageSession>> {
        if self.fail_open {
            anyhow::bail!("stub session refused");
        }
        self.counters.opened.fetch_add(1, Ordering::SeqCst);
        self.counters
            .cookies
            .lock()
            .unwrap()
            .push(cookie.map(|c| c.value.clone()));
        Ok(Box::new(StubSession {
            counters: self.counters.clone(),
        }))
    }
}

/// Renderer that records charts and writes a placeholder file at the target path.
/// A `failing` renderer records nothing and returns an error.
#[derive(Clone, Default)]
pub struct RecordingRenderer {
    pub rendered: Arc<Mutex<Vec<(TrendChart, PathBuf)>>>,
    pub fail: bool,
}

impl RecordingRenderer {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn charts(&self) -> Vec<(TrendChart, PathBuf)> {
        self.rendered.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChartRenderer for RecordingRenderer {
    async fn render(&self, chart: &TrendChart, path: &Path) -> anyhow::Result<()> {
        if self.fail {
            anyhow::bail!("stub renderer failure for {}", path.display());
        }
        std::fs::write(path, b"png")?;
        self.rendered
            .lock()
            .unwrap()
            .push((chart.clone(), path.to_path_buf()));
        Ok(())
    }
}
