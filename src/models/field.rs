// Metric field identifiers and their typed accessors

use super::MetricSnapshot;

/// Every stored metric column, in schema order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricField {
    Performance,
    Accessibility,
    BestPractices,
    Seo,
    FirstContentfulPaint,
    LargestContentfulPaint,
    SpeedIndex,
    TotalBlockingTime,
    CumulativeLayoutShift,
}

impl MetricField {
    pub const ALL: [MetricField; 9] = [
        MetricField::Performance,
        MetricField::Accessibility,
        MetricField::BestPractices,
        MetricField::Seo,
        MetricField::FirstContentfulPaint,
        MetricField::LargestContentfulPaint,
        MetricField::SpeedIndex,
        MetricField::TotalBlockingTime,
        MetricField::CumulativeLayoutShift,
    ];

    /// SQLite column name.
    pub fn column(self) -> &'static str {
        match self {
            MetricField::Performance => "performance",
            MetricField::Accessibility => "accessibility",
            MetricField::BestPractices => "best_practices",
            MetricField::Seo => "seo",
            MetricField::FirstContentfulPaint => "first_contentful_paint",
            MetricField::LargestContentfulPaint => "largest_contentful_paint",
            MetricField::SpeedIndex => "speed_index",
            MetricField::TotalBlockingTime => "total_blocking_time",
            MetricField::CumulativeLayoutShift => "cumulative_layout_shift",
        }
    }

    /// Chart legend label.
    pub fn label(self) -> &'static str {
        match self {
            MetricField::Performance => "Performance",
            MetricField::Accessibility => "Accessibility",
            MetricField::BestPractices => "Best Practices",
            MetricField::Seo => "SEO",
            MetricField::FirstContentfulPaint => "First Contentful Paint",
            MetricField::LargestContentfulPaint => "Largest Contentful Paint",
            MetricField::SpeedIndex => "Speed Index",
            MetricField::TotalBlockingTime => "Total Blocking Time",
            MetricField::CumulativeLayoutShift => "Cumulative Layout Shift",
        }
    }

    /// Short form used in averages subtitles.
    pub fn abbreviation(self) -> &'static str {
        match self {
            MetricField::Performance => "Performance",
            MetricField::Accessibility => "Accessibility",
            MetricField::BestPractices => "Best Practices",
            MetricField::Seo => "SEO",
            MetricField::FirstContentfulPaint => "FCP",
            MetricField::LargestContentfulPaint => "LCP",
            MetricField::SpeedIndex => "SI",
            MetricField::TotalBlockingTime => "TBT",
            MetricField::CumulativeLayoutShift => "CLS",
        }
    }

    /// Lighthouse audit id for timing fields; `None` for category scores.
    pub fn audit_id(self) -> Option<&'static str> {
        match self {
            MetricField::FirstContentfulPaint => Some("first-contentful-paint"),
            MetricField::LargestContentfulPaint => Some("largest-contentful-paint"),
            MetricField::SpeedIndex => Some("speed-index"),
            MetricField::TotalBlockingTime => Some("total-blocking-time"),
            MetricField::CumulativeLayoutShift => Some("cumulative-layout-shift"),
            _ => None,
        }
    }

    pub fn is_timing(self) -> bool {
        self.audit_id().is_some()
    }

    /// Value carried by `snapshot`, or `None` when the field was not sampled.
    pub fn value(self, snapshot: &MetricSnapshot) -> Option<f64> {
        let timings = snapshot.timings.as_ref();
        match self {
            MetricField::Performance => Some(snapshot.performance),
            MetricField::Accessibility => Some(snapshot.accessibility),
            MetricField::BestPractices => Some(snapshot.best_practices),
            MetricField::Seo => Some(snapshot.seo),
            MetricField::FirstContentfulPaint => timings.map(|t| t.first_contentful_paint),
            MetricField::LargestContentfulPaint => timings.map(|t| t.largest_contentful_paint),
            MetricField::SpeedIndex => timings.map(|t| t.speed_index),
            MetricField::TotalBlockingTime => timings.map(|t| t.total_blocking_time),
            MetricField::CumulativeLayoutShift => timings.map(|t| t.cumulative_layout_shift),
        }
    }
}
