// Domain models: audit snapshots, metric fields and the metric-set registry

mod field;
mod metric_set;
mod snapshot;

pub use field::MetricField;
pub use metric_set::{FieldAverage, MetricSet, MetricSetConfig, REGISTRY, SeriesSpec, lookup};
pub use snapshot::{
    MetricSnapshot, TIMESTAMP_FORMAT, TimingMetrics, component_slug, local_timestamp,
};
