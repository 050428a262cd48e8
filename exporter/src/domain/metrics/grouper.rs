//! Metric grouping
//!
//! Folds the data points of one metric into the key -> bucket mapping of an
//! export cycle. Per data point:
//! 1. skip points extraction did not retain
//! 2. wrap Kubernetes labels for Pod/Container records (when enabled)
//! 3. retry unresolved destination templates against the point's labels
//! 4. resolve the unit
//! 5. advance the running timestamp
//! 6. insert into the bucket for (identity, labels); duplicate names are dropped

use std::collections::BTreeMap;
use std::collections::hash_map::Entry;

use super::key::GroupedMetricKey;
use super::kubernetes::{add_kubernetes_wrapper, is_pod_or_container};
use super::pattern::{PatternResolver, resolve_or_partial};
use super::types::{
    DescriptorLookup, ExtractedMetric, GroupIdentity, GroupedMetricBucket, GroupedMetrics,
    MetricInfo, WarnSink,
};
use super::units::translate_unit;
use crate::core::config::EmfConfig;
use crate::core::constants::UNDEFINED_MARKER;

/// Warning field carrying the metric name
pub const FIELD_NAME: &str = "Name";
/// Warning field carrying the name-sorted label set
pub const FIELD_LABELS: &str = "Labels";

/// Collaborators and settings for grouping, shared by every metric of a cycle
pub struct GroupingContext<'a> {
    pub config: &'a EmfConfig,
    pub descriptors: &'a dyn DescriptorLookup,
    pub resolver: &'a dyn PatternResolver,
    pub warnings: &'a dyn WarnSink,
}

impl<'a> GroupingContext<'a> {
    /// Context using the descriptors carried by `config`
    pub fn new(
        config: &'a EmfConfig,
        resolver: &'a dyn PatternResolver,
        warnings: &'a dyn WarnSink,
    ) -> Self {
        Self {
            config,
            descriptors: &config.metric_descriptors,
            resolver,
            warnings,
        }
    }
}

/// Add the retained data points of `metric` to `grouped`.
///
/// `metadata` is the identity computed by the caller for this metric;
/// `pattern_replace_succeeded` tells whether the caller's own template
/// resolution fully succeeded. Destination and timestamp updates made while
/// walking the points carry over to later points of the same metric.
pub fn add_to_grouped_metrics(
    metric: ExtractedMetric,
    grouped: &mut GroupedMetrics,
    mut metadata: GroupIdentity,
    pattern_replace_succeeded: bool,
    ctx: &GroupingContext<'_>,
) {
    let ExtractedMetric {
        name,
        unit,
        data_points,
        ..
    } = metric;

    // Depends only on the metric, not the point
    let unit = translate_unit(&name, &unit, ctx.descriptors);

    for dp in data_points {
        if !dp.retained {
            continue;
        }

        let mut labels = dp.labels;

        if ctx.config.eks_fargate_container_insights_enabled && is_pod_or_container(&labels) {
            add_kubernetes_wrapper(&mut labels);
        }

        if !pattern_replace_succeeded {
            if metadata.log_group.contains(UNDEFINED_MARKER) {
                metadata.log_group =
                    resolve_or_partial(ctx.resolver, &ctx.config.log_group_name, &labels).0;
            }
            if metadata.log_stream.contains(UNDEFINED_MARKER) {
                metadata.log_stream =
                    resolve_or_partial(ctx.resolver, &ctx.config.log_stream_name, &labels).0;
            }
        }

        let info = MetricInfo {
            value: dp.value,
            unit: unit.clone(),
        };

        if dp.timestamp_ms > 0 {
            metadata.timestamp_ms = dp.timestamp_ms;
        }

        let key = GroupedMetricKey::new(&metadata, &labels);
        match grouped.entry(key) {
            Entry::Occupied(mut entry) => {
                if entry.get().metrics.contains_key(&name) {
                    let sorted_labels: BTreeMap<&str, &str> = entry.key().labels().collect();
                    ctx.warnings.warn(
                        "Duplicate metric found",
                        &[
                            (FIELD_NAME, name.clone()),
                            (FIELD_LABELS, format!("{:?}", sorted_labels)),
                        ],
                    );
                } else {
                    entry.get_mut().metrics.insert(name.clone(), info);
                }
            }
            Entry::Vacant(entry) => {
                entry.insert(GroupedMetricBucket {
                    labels,
                    metrics: BTreeMap::from([(name.clone(), info)]),
                    metadata: metadata.clone(),
                });
            }
        }
    }
}

#[cfg(test)]
#[path = "grouper_tests.rs"]
mod tests;
