//! CloudWatch Embedded Metric Format rendering
//!
//! Turns the buckets of one export cycle into EMF log events. Each bucket
//! becomes a single JSON object:
//!
//! ```json
//! {
//!   "OTelLib": "io.app", "host": "a",
//!   "latency": 12.5,
//!   "_aws": {
//!     "Timestamp": 1700000000000,
//!     "CloudWatchMetrics": [{
//!       "Namespace": "shop/api",
//!       "Dimensions": [["OTelLib", "host"], ["OTelLib"]],
//!       "Metrics": [{"Name": "latency", "Unit": "Milliseconds"}]
//!     }]
//!   }
//! }
//! ```

use std::collections::BTreeSet;

use serde::Serialize;
use serde_json::{Map, Value, json};

use super::types::{GroupedMetricBucket, GroupedMetrics, Labels};
use crate::core::config::DimensionRollupOption;
use crate::core::constants::{KUBERNETES_LABEL, OTEL_LIB_LABEL};

/// One rendered EMF log event with its destination
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmfRecord {
    pub log_group: String,
    pub log_stream: String,
    pub timestamp_ms: i64,
    pub event: Value,
}

/// Render one bucket. `fallback_timestamp_ms` is used when the bucket has none.
pub fn render_bucket(bucket: &GroupedMetricBucket, fallback_timestamp_ms: i64) -> EmfRecord {
    let metadata = &bucket.metadata;
    let timestamp_ms = if metadata.timestamp_ms > 0 {
        metadata.timestamp_ms
    } else {
        fallback_timestamp_ms
    };

    let mut label_names: Vec<&str> = bucket
        .labels
        .keys()
        .map(String::as_str)
        .filter(|k| *k != KUBERNETES_LABEL)
        .collect();
    label_names.sort_unstable();

    let mut event = Map::new();
    for name in &label_names {
        event.insert((*name).to_string(), Value::String(bucket.labels[*name].clone()));
    }
    if let Some(raw) = bucket.labels.get(KUBERNETES_LABEL) {
        let nested = serde_json::from_str(raw).unwrap_or_else(|e| {
            tracing::debug!(error = %e, "Kubernetes label is not JSON, emitting as string");
            Value::String(raw.clone())
        });
        event.insert(KUBERNETES_LABEL.to_string(), nested);
    }

    let mut definitions = Vec::with_capacity(bucket.metrics.len());
    for (name, info) in &bucket.metrics {
        event.insert(name.clone(), json!(info.value));
        let mut definition = Map::new();
        definition.insert("Name".to_string(), Value::String(name.clone()));
        if !info.unit.is_empty() {
            definition.insert("Unit".to_string(), Value::String(info.unit.clone()));
        }
        definitions.push(Value::Object(definition));
    }

    let dimensions = dimension_sets(&label_names, &bucket.labels, metadata.dimension_rollup);

    event.insert(
        "_aws".to_string(),
        json!({
            "Timestamp": timestamp_ms,
            "CloudWatchMetrics": [{
                "Namespace": metadata.namespace,
                "Dimensions": dimensions,
                "Metrics": definitions,
            }],
        }),
    );

    EmfRecord {
        log_group: metadata.log_group.clone(),
        log_stream: metadata.log_stream.clone(),
        timestamp_ms,
        event: Value::Object(event),
    }
}

/// Render every bucket of a cycle, in a stable order
pub fn render_all(grouped: GroupedMetrics, fallback_timestamp_ms: i64) -> Vec<EmfRecord> {
    let mut entries: Vec<_> = grouped.into_iter().collect();
    entries.sort_by_cached_key(|(key, _)| {
        let identity = key.identity();
        (
            identity.log_group.clone(),
            identity.log_stream.clone(),
            identity.namespace.clone(),
            identity.timestamp_ms,
            identity.metric_type.as_str(),
            key.labels()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<Vec<_>>(),
        )
    });

    entries
        .iter()
        .map(|(_, bucket)| render_bucket(bucket, fallback_timestamp_ms))
        .collect()
}

/// Full label set first, then rollup sets; duplicates removed
fn dimension_sets(
    label_names: &[&str],
    labels: &Labels,
    rollup: DimensionRollupOption,
) -> Vec<Vec<String>> {
    let full: Vec<String> = label_names.iter().map(|s| s.to_string()).collect();
    let mut sets = vec![full];

    // OTelLib is kept in every rolled-up set
    let base: Vec<String> = if labels.contains_key(OTEL_LIB_LABEL) {
        vec![OTEL_LIB_LABEL.to_string()]
    } else {
        Vec::new()
    };

    let (zero, single) = match rollup {
        DimensionRollupOption::ZeroAndSingleDimensionRollup => (true, true),
        DimensionRollupOption::SingleDimensionRollupOnly => (false, true),
        DimensionRollupOption::NoDimensionRollup => (false, false),
    };

    if zero {
        sets.push(base.clone());
    }
    if single {
        for name in label_names.iter().filter(|n| **n != OTEL_LIB_LABEL) {
            let mut set = base.clone();
            set.push(name.to_string());
            sets.push(set);
        }
    }

    let mut seen = BTreeSet::new();
    sets.retain(|set| {
        let mut sorted = set.clone();
        sorted.sort_unstable();
        seen.insert(sorted)
    });
    sets
}
