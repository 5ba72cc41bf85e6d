// Trend reporting: full history -> per-field averages -> one chart image per metric set.

mod chart;

pub use chart::{ChartRenderer, ChromiumChartConfig, ChromiumChartRenderer, chart_js_config};

use crate::error::PipelineError;
use crate::history_repo::HistoryRepo;
use crate::models::{FieldAverage, MetricSetConfig, MetricSnapshot, component_slug, lookup};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::instrument;

/// One line series of a trend chart. Rows without the field plot as gaps.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartSeries {
    pub label: &'static str,
    pub color: &'static str,
    pub points: Vec<Option<f64>>,
}

/// Renderer-independent description of a trend chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendChart {
    pub title: String,
    pub subtitle: String,
    /// One label per history row, duplicates included.
    pub labels: Vec<String>,
    pub series: Vec<ChartSeries>,
}

#[derive(Debug, Clone)]
pub struct ReportOutcome {
    pub metric_set: &'static str,
    pub path: PathBuf,
    pub rows: usize,
    pub averages: Vec<FieldAverage>,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Mean of every configured field over the rows that carry it, rounded to two decimals.
/// Fails with `EmptyHistory` when any field has no samples.
pub fn compute_averages(
    component: &str,
    config: &MetricSetConfig,
    history: &[MetricSnapshot],
) -> Result<Vec<FieldAverage>, PipelineError> {
    config
        .fields()
        .map(|field| {
            let values: Vec<f64> = history.iter().filter_map(|s| field.value(s)).collect();
            if values.is_empty() {
                return Err(PipelineError::EmptyHistory {
                    component: component.to_string(),
                    metric_set: config.name.to_string(),
                });
            }
            let mean = values.iter().sum::<f64>() / values.len() as f64;
            Ok(FieldAverage {
                field,
                label: field.label(),
                value: round2(mean),
                samples: values.len(),
            })
        })
        .collect()
}

pub fn build_chart(
    component: &str,
    config: &MetricSetConfig,
    history: &[MetricSnapshot],
    averages: &[FieldAverage],
) -> TrendChart {
    TrendChart {
        title: format!("{} - {}", config.title, component),
        subtitle: (config.averages_label)(averages),
        labels: history.iter().map(|s| s.timestamp.clone()).collect(),
        series: config
            .series
            .iter()
            .map(|spec| ChartSeries {
                label: spec.field.label(),
                color: spec.color,
                points: history.iter().map(|s| spec.field.value(s)).collect(),
            })
            .collect(),
    }
}

/// Image path for a (component, metric set) pair: `<dir>/<component>-<metric_set>.png`.
pub fn chart_path(dir: &Path, component: &str, metric_set: &str) -> PathBuf {
    dir.join(format!("{}-{}.png", component_slug(component), metric_set))
}

pub struct TrendReporter<R> {
    history_repo: Arc<HistoryRepo>,
    renderer: R,
    output_dir: PathBuf,
}

impl<R: ChartRenderer> TrendReporter<R> {
    pub fn new(
        history_repo: Arc<HistoryRepo>,
        renderer: R,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            history_repo,
            renderer,
            output_dir: output_dir.into(),
        }
    }

    /// Read the component's history and render the chart for `metric_set_name`.
    #[instrument(skip(self), fields(operation = "render_report"))]
    pub async fn render(
        &self,
        component: &str,
        metric_set_name: &str,
    ) -> anyhow::Result<ReportOutcome> {
        let config = lookup(metric_set_name)?;
        let history = self.history_repo.read_all(component).await?;
        let averages = compute_averages(component, config, &history)?;
        let chart = build_chart(component, config, &history, &averages);

        std::fs::create_dir_all(&self.output_dir)?;
        let path = chart_path(&self.output_dir, component, config.name);
        self.renderer.render(&chart, &path).await?;

        tracing::info!(
            metric_set = config.name,
            rows = history.len(),
            path = %path.display(),
            averages = %chart.subtitle,
            "Trend chart written"
        );
        Ok(ReportOutcome {
            metric_set: config.name,
            path,
            rows: history.len(),
            averages,
        })
    }
}
