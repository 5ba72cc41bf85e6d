// Audit snapshot models

use serde::{Deserialize, Serialize};

/// Timing audits, present together only when the sampled metric set asks for them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimingMetrics {
    pub first_contentful_paint: f64,
    pub largest_contentful_paint: f64,
    pub speed_index: f64,
    pub total_blocking_time: f64,
    /// Unitless layout-shift score.
    pub cumulative_layout_shift: f64,
}

/// One audit sample. Category scores are in [0, 100]; timings in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricSnapshot {
    /// Local capture time, `YYYY-MM-DD HH:MM:SS`.
    pub timestamp: String,
    pub performance: f64,
    pub accessibility: f64,
    pub best_practices: f64,
    pub seo: f64,
    #[serde(flatten)]
    pub timings: Option<TimingMetrics>,
}

/// Timestamp format shared by snapshots and chart labels.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Current local time formatted for a snapshot.
pub fn local_timestamp() -> String {
    chrono::Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// File-name-safe form of a component identifier. `[A-Za-z0-9-]` is kept; every other byte,
/// `_` included, becomes `_XX` (uppercase hex), so distinct components never share a file.
pub fn component_slug(component: &str) -> String {
    let mut slug = String::with_capacity(component.len());
    for b in component.bytes() {
        if b.is_ascii_alphanumeric() || b == b'-' {
            slug.push(char::from(b));
        } else {
            slug.push_str(&format!("_{b:02X}"));
        }
    }
    slug
}
