// Raw audit result -> MetricSnapshot.
// Category scores are always taken; timing audits only when the metric set charts them.

mod duration;

pub use duration::parse_duration_ms;

use crate::audit_repo::RawAuditResult;
use crate::error::PipelineError;
use crate::models::{MetricField, MetricSet, MetricSnapshot, TimingMetrics, local_timestamp};

/// Build a snapshot stamped with the current local time.
pub fn build(raw: &RawAuditResult, metric_set: MetricSet) -> Result<MetricSnapshot, PipelineError> {
    build_at(raw, metric_set, local_timestamp())
}

pub fn build_at(
    raw: &RawAuditResult,
    metric_set: MetricSet,
    timestamp: String,
) -> Result<MetricSnapshot, PipelineError> {
    let timings = if metric_set.includes_timings() {
        Some(TimingMetrics {
            first_contentful_paint: timing(raw, MetricField::FirstContentfulPaint)?,
            largest_contentful_paint: timing(raw, MetricField::LargestContentfulPaint)?,
            speed_index: timing(raw, MetricField::SpeedIndex)?,
            total_blocking_time: timing(raw, MetricField::TotalBlockingTime)?,
            cumulative_layout_shift: timing(raw, MetricField::CumulativeLayoutShift)?,
        })
    } else {
        None
    };

    Ok(MetricSnapshot {
        timestamp,
        performance: category_score(raw, "performance")?,
        accessibility: category_score(raw, "accessibility")?,
        best_practices: category_score(raw, "best-practices")?,
        seo: category_score(raw, "seo")?,
        timings,
    })
}

/// Category score scaled from [0, 1] to [0, 100].
fn category_score(raw: &RawAuditResult, id: &str) -> Result<f64, PipelineError> {
    let category = raw
        .categories
        .get(id)
        .ok_or_else(|| PipelineError::MalformedAudit(format!("category {id}")))?;
    let score = category
        .score
        .ok_or_else(|| PipelineError::MalformedAudit(format!("score for category {id}")))?;
    Ok(score * 100.0)
}

fn timing(raw: &RawAuditResult, field: MetricField) -> Result<f64, PipelineError> {
    let Some(id) = field.audit_id() else {
        return Err(PipelineError::MalformedAudit(format!(
            "audit id for {}",
            field.column()
        )));
    };
    let entry = raw
        .audits
        .get(id)
        .ok_or_else(|| PipelineError::MalformedAudit(format!("audit {id}")))?;
    match (&entry.display_value, entry.numeric_value) {
        (Some(display), _) => parse_duration_ms(display),
        (None, Some(numeric)) => Ok(numeric),
        (None, None) => Err(PipelineError::MalformedAudit(format!("value for audit {id}"))),
    }
}
