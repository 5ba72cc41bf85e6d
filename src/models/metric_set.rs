// Metric-set registry: which fields chart together, their colours and the averages label.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::MetricField;
use crate::error::PipelineError;

/// Named collection of fields sampled and charted together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricSet {
    General,
    Performance,
}

impl MetricSet {
    pub fn name(self) -> &'static str {
        self.config().name
    }

    pub fn config(self) -> &'static MetricSetConfig {
        match self {
            MetricSet::General => &REGISTRY[0],
            MetricSet::Performance => &REGISTRY[1],
        }
    }

    /// Whether sampling this set must parse the timing audits.
    pub fn includes_timings(self) -> bool {
        self.config().series.iter().any(|s| s.field.is_timing())
    }

    /// Sets whose fields are all present in a snapshot sampled with `self`.
    /// Category scores are always stored, so `general` is covered by every set.
    pub fn covered_sets(self) -> Vec<MetricSet> {
        REGISTRY
            .iter()
            .map(|c| c.set)
            .filter(|set| !set.includes_timings() || self.includes_timings())
            .collect()
    }
}

impl fmt::Display for MetricSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MetricSet {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        lookup(s).map(|c| c.set)
    }
}

/// One line series: the field and its `rgb(...)` colour.
#[derive(Debug, Clone, Copy)]
pub struct SeriesSpec {
    pub field: MetricField,
    pub color: &'static str,
}

/// Per-field mean over a history, rounded to two decimals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldAverage {
    #[serde(skip)]
    pub field: MetricField,
    pub label: &'static str,
    pub value: f64,
    pub samples: usize,
}

/// Static chart descriptor for one metric set.
pub struct MetricSetConfig {
    pub set: MetricSet,
    pub name: &'static str,
    pub title: &'static str,
    pub series: &'static [SeriesSpec],
    pub averages_label: fn(&[FieldAverage]) -> String,
}

impl fmt::Debug for MetricSetConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetricSetConfig")
            .field("name", &self.name)
            .field("series", &self.series)
            .finish()
    }
}

impl MetricSetConfig {
    pub fn fields(&self) -> impl Iterator<Item = MetricField> + '_ {
        self.series.iter().map(|s| s.field)
    }
}

pub static REGISTRY: [MetricSetConfig; 2] = [
    MetricSetConfig {
        set: MetricSet::General,
        name: "general",
        title: "Lighthouse scores",
        series: &[
            SeriesSpec {
                field: MetricField::Performance,
                color: "rgb(75, 192, 192)",
            },
            SeriesSpec {
                field: MetricField::Accessibility,
                color: "rgb(0, 51, 51)",
            },
            SeriesSpec {
                field: MetricField::BestPractices,
                color: "rgb(153, 204, 0)",
            },
            SeriesSpec {
                field: MetricField::Seo,
                color: "rgb(51, 0, 0)",
            },
        ],
        averages_label: score_averages_label,
    },
    MetricSetConfig {
        set: MetricSet::Performance,
        name: "performance",
        title: "Lighthouse timings",
        series: &[
            SeriesSpec {
                field: MetricField::FirstContentfulPaint,
                color: "rgb(54, 162, 235)",
            },
            SeriesSpec {
                field: MetricField::LargestContentfulPaint,
                color: "rgb(255, 99, 132)",
            },
            SeriesSpec {
                field: MetricField::SpeedIndex,
                color: "rgb(255, 159, 64)",
            },
            SeriesSpec {
                field: MetricField::TotalBlockingTime,
                color: "rgb(153, 102, 255)",
            },
            SeriesSpec {
                field: MetricField::CumulativeLayoutShift,
                color: "rgb(201, 203, 207)",
            },
        ],
        averages_label: timing_averages_label,
    },
];

/// Resolve a registry entry by name (case-insensitive).
pub fn lookup(name: &str) -> Result<&'static MetricSetConfig, PipelineError> {
    REGISTRY
        .iter()
        .find(|c| c.name.eq_ignore_ascii_case(name.trim()))
        .ok_or_else(|| PipelineError::UnknownMetricSet(name.to_string()))
}

fn score_averages_label(averages: &[FieldAverage]) -> String {
    let parts: Vec<String> = averages
        .iter()
        .map(|a| format!("{}: {:.2}", a.field.abbreviation(), a.value))
        .collect();
    format!("Averages - {}", parts.join(" | "))
}

fn timing_averages_label(averages: &[FieldAverage]) -> String {
    let parts: Vec<String> = averages
        .iter()
        .map(|a| {
            if a.field == MetricField::CumulativeLayoutShift {
                format!("{}: {:.2}", a.field.abbreviation(), a.value)
            } else {
                format!("{}: {:.2} ms", a.field.abbreviation(), a.value)
            }
        })
        .collect();
    format!("Averages - {}", parts.join(" | "))
}
