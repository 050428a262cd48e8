//! Data point extraction from OTLP protobuf
//!
//! Turns one OTLP `Metric` into an [`ExtractedMetric`] with one
//! [`MetricDataPoint`] per OTLP data point. Supports all 5 OTLP metric types:
//! Gauge, Sum, Histogram, ExponentialHistogram, Summary.

use opentelemetry_proto::tonic::common::v1::KeyValue;
use opentelemetry_proto::tonic::metrics::v1::{
    ExponentialHistogramDataPoint, HistogramDataPoint, Metric, NumberDataPoint, SummaryDataPoint,
    metric::Data, number_data_point,
};
use thiserror::Error;

use super::types::{
    ExtractedMetric, Labels, MetricDataPoint, MetricType, MetricValue, StatisticSet,
};
use crate::core::constants::OTEL_LIB_LABEL;
use crate::utils::otlp::extract_attributes;
use crate::utils::time::nanos_to_millis;

/// `DataPointFlags.FLAG_NO_RECORDED_VALUE`
const FLAG_NO_RECORDED_VALUE: u32 = 1;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractError {
    #[error("Metric has an empty name")]
    EmptyName,
    #[error("Metric '{0}' carries no data")]
    MissingData(String),
}

/// Extract the data points of one metric.
///
/// `scope_name` is the instrumentation scope; when non-empty it is added to
/// every point's labels as `OTelLib`.
pub fn extract_metric(
    metric: &Metric,
    scope_name: Option<&str>,
) -> Result<ExtractedMetric, ExtractError> {
    if metric.name.is_empty() {
        return Err(ExtractError::EmptyName);
    }
    let Some(ref data) = metric.data else {
        return Err(ExtractError::MissingData(metric.name.clone()));
    };

    let scope_name = scope_name.filter(|s| !s.is_empty());
    let labels_for = |attrs: &[KeyValue]| -> Labels {
        let mut labels = extract_attributes(attrs);
        if let Some(scope) = scope_name {
            labels.insert(OTEL_LIB_LABEL.to_string(), scope.to_string());
        }
        labels
    };

    let (metric_type, data_points) = match data {
        Data::Gauge(g) => (
            MetricType::Gauge,
            g.data_points
                .iter()
                .map(|dp| number_point(dp, labels_for(&dp.attributes)))
                .collect(),
        ),
        Data::Sum(s) => (
            MetricType::Sum,
            s.data_points
                .iter()
                .map(|dp| number_point(dp, labels_for(&dp.attributes)))
                .collect(),
        ),
        Data::Histogram(h) => (
            MetricType::Histogram,
            h.data_points
                .iter()
                .map(|dp| histogram_point(dp, labels_for(&dp.attributes)))
                .collect(),
        ),
        Data::ExponentialHistogram(eh) => (
            MetricType::ExponentialHistogram,
            eh.data_points
                .iter()
                .map(|dp| exp_histogram_point(dp, labels_for(&dp.attributes)))
                .collect(),
        ),
        Data::Summary(s) => (
            MetricType::Summary,
            s.data_points
                .iter()
                .map(|dp| summary_point(dp, labels_for(&dp.attributes)))
                .collect(),
        ),
    };

    Ok(ExtractedMetric {
        name: metric.name.clone(),
        unit: metric.unit.clone(),
        metric_type,
        data_points,
    })
}

fn has_no_recorded_value(flags: u32) -> bool {
    flags & FLAG_NO_RECORDED_VALUE != 0
}

/// Gauge or Sum point; NaN, infinite and missing values are not retained
fn number_point(dp: &NumberDataPoint, labels: Labels) -> MetricDataPoint {
    let (value, finite) = match dp.value {
        Some(number_data_point::Value::AsInt(i)) => (MetricValue::Int(i), true),
        Some(number_data_point::Value::AsDouble(d)) => (MetricValue::Double(d), d.is_finite()),
        None => {
            tracing::debug!(
                time_unix_nano = dp.time_unix_nano,
                "Dropping number data point without a value"
            );
            (MetricValue::Double(0.0), false)
        }
    };

    MetricDataPoint {
        value,
        timestamp_ms: nanos_to_millis(dp.time_unix_nano),
        labels,
        retained: finite && !has_no_recorded_value(dp.flags),
    }
}

fn histogram_point(dp: &HistogramDataPoint, labels: Labels) -> MetricDataPoint {
    MetricDataPoint {
        value: MetricValue::Stats(StatisticSet {
            count: dp.count,
            sum: dp.sum.unwrap_or_default(),
            min: dp.min.unwrap_or_default(),
            max: dp.max.unwrap_or_default(),
        }),
        timestamp_ms: nanos_to_millis(dp.time_unix_nano),
        labels,
        retained: !has_no_recorded_value(dp.flags),
    }
}

fn exp_histogram_point(dp: &ExponentialHistogramDataPoint, labels: Labels) -> MetricDataPoint {
    MetricDataPoint {
        value: MetricValue::Stats(StatisticSet {
            count: dp.count,
            sum: dp.sum.unwrap_or_default(),
            min: dp.min.unwrap_or_default(),
            max: dp.max.unwrap_or_default(),
        }),
        timestamp_ms: nanos_to_millis(dp.time_unix_nano),
        labels,
        retained: !has_no_recorded_value(dp.flags),
    }
}

/// Summary point; min/max come from the 0.0 and 1.0 quantiles when present
fn summary_point(dp: &SummaryDataPoint, labels: Labels) -> MetricDataPoint {
    let quantile = |q: f64| {
        dp.quantile_values
            .iter()
            .find(|v| v.quantile == q)
            .map(|v| v.value)
            .unwrap_or_default()
    };

    MetricDataPoint {
        value: MetricValue::Stats(StatisticSet {
            count: dp.count,
            sum: dp.sum,
            min: quantile(0.0),
            max: quantile(1.0),
        }),
        timestamp_ms: nanos_to_millis(dp.time_unix_nano),
        labels,
        retained: !has_no_recorded_value(dp.flags),
    }
}
