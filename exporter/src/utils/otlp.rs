//! OTLP utility functions
//!
//! Attribute extraction and the resource attribute keys used for context.

use std::collections::HashMap;

use opentelemetry_proto::tonic::common::v1::{AnyValue, KeyValue, any_value};
use serde_json::Value;

/// OTLP/JSON field of an integer number data point
const JSON_AS_INT: &str = "asInt";

/// Resource attribute keys used when deriving metric context
pub mod keys {
    pub const SERVICE_NAME: &str = "service.name";
    pub const SERVICE_NAMESPACE: &str = "service.namespace";
}

/// Rewrite string-encoded `asInt` values of OTLP/JSON into JSON numbers.
///
/// OTLP/JSON encodes int64 as decimal strings, which the generated serde
/// types only accept as numbers. Strings that do not parse are left as is.
pub fn normalize_json_int_values(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, child) in map.iter_mut() {
                if key == JSON_AS_INT
                    && let Value::String(raw) = &*child
                    && let Ok(parsed) = raw.parse::<i64>()
                {
                    *child = Value::from(parsed);
                } else {
                    normalize_json_int_values(child);
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(normalize_json_int_values),
        _ => {}
    }
}

/// Extract attributes from KeyValue array into HashMap
pub fn extract_attributes(attrs: &[KeyValue]) -> HashMap<String, String> {
    attrs
        .iter()
        .filter_map(|kv| {
            kv.value
                .as_ref()
                .map(|v| (kv.key.clone(), any_value_to_string(v)))
        })
        .collect()
}

/// Convert AnyValue to string representation
pub fn any_value_to_string(value: &AnyValue) -> String {
    match &value.value {
        Some(any_value::Value::StringValue(s)) => s.clone(),
        Some(any_value::Value::BoolValue(b)) => b.to_string(),
        Some(any_value::Value::IntValue(i)) => i.to_string(),
        Some(any_value::Value::DoubleValue(d)) => d.to_string(),
        Some(any_value::Value::ArrayValue(arr)) => {
            let values: Vec<String> = arr.values.iter().map(any_value_to_string).collect();
            serde_json::to_string(&values).unwrap_or_default()
        }
        Some(any_value::Value::KvlistValue(kvlist)) => {
            // Sorted so equal maps serialize identically
            let map: std::collections::BTreeMap<String, String> = kvlist
                .values
                .iter()
                .filter_map(|kv| {
                    kv.value
                        .as_ref()
                        .map(|v| (kv.key.clone(), any_value_to_string(v)))
                })
                .collect();
            serde_json::to_string(&map).unwrap_or_default()
        }
        Some(any_value::Value::BytesValue(b)) => hex::encode(b),
        None => String::new(),
    }
}
