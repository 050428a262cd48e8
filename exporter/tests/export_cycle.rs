//! End-to-end grouping of OTLP export requests into EMF records

use std::sync::Mutex;

use emf_exporter::core::EmfConfig;
use emf_exporter::domain::metrics::{
    ExportCycle, LabelPatternResolver, MetricValue, TracingWarnSink, WarnSink, render_all,
};
use opentelemetry_proto::tonic::collector::metrics::v1::ExportMetricsServiceRequest;
use opentelemetry_proto::tonic::common::v1::{AnyValue, InstrumentationScope, KeyValue, any_value};
use opentelemetry_proto::tonic::metrics::v1::{
    Gauge, Histogram, HistogramDataPoint, Metric, NumberDataPoint, ResourceMetrics, ScopeMetrics,
    metric, number_data_point,
};
use opentelemetry_proto::tonic::resource::v1::Resource;
use serde_json::json;

const SECOND_NANOS: u64 = 1_000_000_000;
const RECEIVED_AT_MS: i64 = 5_000;

#[derive(Default)]
struct CountingSink {
    messages: Mutex<Vec<String>>,
}

impl WarnSink for CountingSink {
    fn warn(&self, message: &str, _fields: &[(&str, String)]) {
        self.messages.lock().unwrap().push(message.to_string());
    }
}

fn kv(key: &str, value: &str) -> KeyValue {
    KeyValue {
        key: key.to_string(),
        value: Some(AnyValue {
            value: Some(any_value::Value::StringValue(value.to_string())),
        }),
    }
}

fn number(
    value: number_data_point::Value,
    time_unix_nano: u64,
    attrs: &[(&str, &str)],
) -> NumberDataPoint {
    NumberDataPoint {
        attributes: attrs.iter().map(|(k, v)| kv(k, v)).collect(),
        time_unix_nano,
        value: Some(value),
        ..Default::default()
    }
}

fn gauge(name: &str, data_points: Vec<NumberDataPoint>) -> Metric {
    Metric {
        name: name.to_string(),
        data: Some(metric::Data::Gauge(Gauge { data_points })),
        ..Default::default()
    }
}

fn resource_metrics(
    resource_attrs: &[(&str, &str)],
    scope: Option<&str>,
    metrics: Vec<Metric>,
) -> ResourceMetrics {
    ResourceMetrics {
        resource: Some(Resource {
            attributes: resource_attrs.iter().map(|(k, v)| kv(k, v)).collect(),
            ..Default::default()
        }),
        scope_metrics: vec![ScopeMetrics {
            scope: scope.map(|name| InstrumentationScope {
                name: name.to_string(),
                ..Default::default()
            }),
            metrics,
            ..Default::default()
        }],
        ..Default::default()
    }
}

fn ecs_config() -> EmfConfig {
    EmfConfig {
        log_group_name: "/aws/ecs/{ClusterName}".to_string(),
        log_stream_name: "{TaskId}".to_string(),
        ..Default::default()
    }
}

#[test]
fn test_request_grouped_and_rendered() {
    let labels = [("TaskId", "t1"), ("host", "a")];

    let latency = Metric {
        name: "latency".to_string(),
        unit: "ms".to_string(),
        data: Some(metric::Data::Histogram(Histogram {
            data_points: vec![HistogramDataPoint {
                attributes: labels.iter().map(|(k, v)| kv(k, v)).collect(),
                time_unix_nano: 2 * SECOND_NANOS,
                count: 2,
                sum: Some(30.0),
                min: Some(10.0),
                max: Some(20.0),
                ..Default::default()
            }],
            ..Default::default()
        })),
        ..Default::default()
    };

    let request = ExportMetricsServiceRequest {
        resource_metrics: vec![
            resource_metrics(
                &[
                    ("service.namespace", "shop"),
                    ("service.name", "api"),
                    ("ClusterName", "prod"),
                ],
                Some("io.app"),
                vec![
                    gauge(
                        "requests",
                        vec![
                            number(number_data_point::Value::AsInt(3), SECOND_NANOS, &labels),
                            number(number_data_point::Value::AsInt(4), 2 * SECOND_NANOS, &labels),
                            number(
                                number_data_point::Value::AsDouble(f64::NAN),
                                2 * SECOND_NANOS,
                                &labels,
                            ),
                        ],
                    ),
                    latency,
                ],
            ),
            resource_metrics(
                &[],
                None,
                vec![gauge(
                    "cpu",
                    vec![number(number_data_point::Value::AsDouble(0.25), 0, &[])],
                )],
            ),
        ],
    };

    let config = ecs_config();
    let resolver = LabelPatternResolver;
    let warnings = TracingWarnSink;
    let cycle = ExportCycle::new(&config, &resolver, &warnings).with_received_at(RECEIVED_AT_MS);

    let grouped = cycle.run(&request);
    assert_eq!(grouped.len(), 4);

    let records = render_all(grouped, cycle.received_at_ms());
    let summary: Vec<_> = records
        .iter()
        .map(|r| (r.log_group.as_str(), r.log_stream.as_str(), r.timestamp_ms))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("/aws/ecs/prod", "t1", 1_000),
            ("/aws/ecs/prod", "t1", 2_000),
            ("/aws/ecs/prod", "t1", 2_000),
            ("/aws/ecs/undefined", "undefined", RECEIVED_AT_MS),
        ]
    );

    assert_eq!(records[0].event["requests"], 3);
    assert_eq!(records[1].event["requests"], 4);
    assert_eq!(
        records[2].event,
        json!({
            "OTelLib": "io.app",
            "TaskId": "t1",
            "host": "a",
            "latency": {"Count": 2, "Sum": 30.0, "Min": 10.0, "Max": 20.0},
            "_aws": {
                "Timestamp": 2_000,
                "CloudWatchMetrics": [{
                    "Namespace": "shop/api",
                    "Dimensions": [
                        ["OTelLib", "TaskId", "host"],
                        ["OTelLib"],
                        ["OTelLib", "TaskId"],
                        ["OTelLib", "host"]
                    ],
                    "Metrics": [{"Name": "latency", "Unit": "Milliseconds"}]
                }]
            }
        })
    );

    let cpu = &records[3].event;
    assert_eq!(cpu["cpu"], 0.25);
    assert_eq!(cpu["_aws"]["CloudWatchMetrics"][0]["Namespace"], "default");
    assert_eq!(cpu["_aws"]["CloudWatchMetrics"][0]["Dimensions"], json!([[]]));
}

#[test]
fn test_duplicate_metric_across_scopes_keeps_first() {
    let labels = [("host", "a")];
    let point = |v: i64| number(number_data_point::Value::AsInt(v), SECOND_NANOS, &labels);

    let mut resource = resource_metrics(
        &[("ClusterName", "prod"), ("TaskId", "t1")],
        None,
        vec![gauge("requests", vec![point(1)])],
    );
    resource.scope_metrics.push(ScopeMetrics {
        metrics: vec![gauge("requests", vec![point(2)])],
        ..Default::default()
    });
    let request = ExportMetricsServiceRequest {
        resource_metrics: vec![resource],
    };

    let config = ecs_config();
    let resolver = LabelPatternResolver;
    let warnings = CountingSink::default();
    let grouped = ExportCycle::new(&config, &resolver, &warnings)
        .with_received_at(RECEIVED_AT_MS)
        .run(&request);

    assert_eq!(grouped.len(), 1);
    let bucket = grouped.values().next().unwrap();
    assert_eq!(bucket.metrics["requests"].value, MetricValue::Int(1));
    assert_eq!(bucket.metadata.log_stream, "t1");
    assert_eq!(
        *warnings.messages.lock().unwrap(),
        vec!["Duplicate metric found".to_string()]
    );
}

#[test]
fn test_invalid_metric_skipped() {
    let request = ExportMetricsServiceRequest {
        resource_metrics: vec![resource_metrics(
            &[("ClusterName", "prod"), ("TaskId", "t1")],
            None,
            vec![
                Metric {
                    name: "no_data".to_string(),
                    ..Default::default()
                },
                gauge(
                    "",
                    vec![number(number_data_point::Value::AsInt(1), SECOND_NANOS, &[])],
                ),
                gauge(
                    "ok",
                    vec![number(number_data_point::Value::AsInt(1), SECOND_NANOS, &[])],
                ),
            ],
        )],
    };

    let config = ecs_config();
    let resolver = LabelPatternResolver;
    let warnings = TracingWarnSink;
    let grouped = ExportCycle::new(&config, &resolver, &warnings).run(&request);

    assert_eq!(grouped.len(), 1);
    assert!(grouped.values().next().unwrap().metrics.contains_key("ok"));
}
