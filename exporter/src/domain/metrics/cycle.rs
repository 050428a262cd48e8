//! Export cycle
//!
//! Drives grouping over a whole OTLP export request. Each cycle owns a fresh
//! key -> bucket mapping; nothing is shared between cycles except the
//! injected collaborators.

use opentelemetry_proto::tonic::collector::metrics::v1::ExportMetricsServiceRequest;

use super::extract::extract_metric;
use super::grouper::{GroupingContext, add_to_grouped_metrics};
use super::pattern::{PatternResolver, resolve_or_partial};
use super::types::{GroupIdentity, GroupedMetrics, Labels, WarnSink};
use crate::core::config::EmfConfig;
use crate::core::constants::DEFAULT_NAMESPACE;
use crate::utils::otlp::{extract_attributes, keys};
use crate::utils::time::now_millis;

pub struct ExportCycle<'a> {
    ctx: GroupingContext<'a>,
    received_at_ms: i64,
}

impl<'a> ExportCycle<'a> {
    pub fn new(
        config: &'a EmfConfig,
        resolver: &'a dyn PatternResolver,
        warnings: &'a dyn WarnSink,
    ) -> Self {
        Self {
            ctx: GroupingContext::new(config, resolver, warnings),
            received_at_ms: now_millis(),
        }
    }

    /// Override the receive time used for points without a timestamp
    pub fn with_received_at(mut self, received_at_ms: i64) -> Self {
        self.received_at_ms = received_at_ms;
        self
    }

    pub fn received_at_ms(&self) -> i64 {
        self.received_at_ms
    }

    /// Group every metric of `request`.
    ///
    /// A metric that fails extraction is logged and skipped; the rest of the
    /// request is still grouped.
    pub fn run(&self, request: &ExportMetricsServiceRequest) -> GroupedMetrics {
        let config = self.ctx.config;
        let mut grouped = GroupedMetrics::new();
        let mut skipped = 0usize;

        for resource_metrics in &request.resource_metrics {
            let resource_attrs = resource_metrics
                .resource
                .as_ref()
                .map(|r| extract_attributes(&r.attributes))
                .unwrap_or_default();

            let namespace = resolve_namespace(&config.namespace, &resource_attrs);
            let (log_group, group_ok) =
                resolve_or_partial(self.ctx.resolver, &config.log_group_name, &resource_attrs);
            let (log_stream, stream_ok) =
                resolve_or_partial(self.ctx.resolver, &config.log_stream_name, &resource_attrs);
            let pattern_replace_succeeded = group_ok && stream_ok;

            for scope_metrics in &resource_metrics.scope_metrics {
                let scope_name = scope_metrics.scope.as_ref().map(|s| s.name.as_str());

                for metric in &scope_metrics.metrics {
                    let extracted = match extract_metric(metric, scope_name) {
                        Ok(extracted) => extracted,
                        Err(e) => {
                            tracing::warn!(error = %e, "Skipping metric that failed extraction");
                            skipped += 1;
                            continue;
                        }
                    };

                    let metadata = GroupIdentity {
                        namespace: namespace.clone(),
                        timestamp_ms: self.received_at_ms,
                        log_group: log_group.clone(),
                        log_stream: log_stream.clone(),
                        metric_type: extracted.metric_type,
                        dimension_rollup: config.dimension_rollup_option,
                    };

                    add_to_grouped_metrics(
                        extracted,
                        &mut grouped,
                        metadata,
                        pattern_replace_succeeded,
                        &self.ctx,
                    );
                }
            }
        }

        tracing::debug!(
            buckets = grouped.len(),
            skipped_metrics = skipped,
            "Grouped metrics for export cycle"
        );
        grouped
    }
}

/// Configured namespace, else `service.namespace/service.name` from the resource
fn resolve_namespace(configured: &str, resource_attrs: &Labels) -> String {
    if !configured.is_empty() {
        return configured.to_string();
    }

    let get = |key: &str| resource_attrs.get(key).filter(|v| !v.is_empty());
    match (get(keys::SERVICE_NAMESPACE), get(keys::SERVICE_NAME)) {
        (Some(ns), Some(name)) => format!("{}/{}", ns, name),
        (Some(ns), None) => ns.clone(),
        (None, Some(name)) => name.clone(),
        (None, None) => DEFAULT_NAMESPACE.to_string(),
    }
}
