//! Metric grouping for CloudWatch EMF
//!
//! Extracts OTLP data points, groups them by destination, timestamp and label
//! set, and renders each group as one Embedded Metric Format event.
//! Supports all 5 OTLP metric types: Gauge, Sum, Histogram, ExponentialHistogram, Summary.

pub mod cycle;
pub mod emf;
pub mod extract;
pub mod grouper;
pub mod key;
pub mod kubernetes;
pub mod pattern;
pub mod types;
pub mod units;

pub use cycle::ExportCycle;
pub use emf::{EmfRecord, render_all, render_bucket};
pub use extract::{ExtractError, extract_metric};
pub use grouper::{GroupingContext, add_to_grouped_metrics};
pub use key::GroupedMetricKey;
pub use pattern::{LabelPatternResolver, PatternError, PatternResolver};
pub use types::{
    DescriptorLookup, ExtractedMetric, GroupIdentity, GroupedMetricBucket, GroupedMetrics, Labels,
    MetricDataPoint, MetricDescriptor, MetricInfo, MetricType, MetricValue, StatisticSet,
    TracingWarnSink, WarnSink,
};
