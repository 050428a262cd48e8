//! Unit resolution for EMF metric definitions

use super::types::DescriptorLookup;

/// Resolve the unit emitted for a metric.
///
/// A descriptor wins when the raw unit is empty or the descriptor sets
/// `overwrite`; otherwise well-known UCUM abbreviations are expanded and any
/// other unit passes through unchanged.
pub fn translate_unit(metric_name: &str, unit: &str, descriptors: &dyn DescriptorLookup) -> String {
    if let Some(descriptor) = descriptors.lookup(metric_name)
        && (unit.is_empty() || descriptor.overwrite)
    {
        return descriptor.unit.clone();
    }

    match unit {
        "ms" => "Milliseconds",
        "s" => "Seconds",
        "us" => "Microseconds",
        "By" => "Bytes",
        "Bi" => "Bits",
        other => other,
    }
    .to_string()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::domain::metrics::types::MetricDescriptor;

    fn descriptors(entries: &[(&str, &str, bool)]) -> HashMap<String, MetricDescriptor> {
        entries
            .iter()
            .map(|(name, unit, overwrite)| {
                (
                    name.to_string(),
                    MetricDescriptor {
                        metric_name: name.to_string(),
                        unit: unit.to_string(),
                        overwrite: *overwrite,
                    },
                )
            })
            .collect()
    }

    #[test]
    fn test_abbreviation_table() {
        let none = descriptors(&[]);
        assert_eq!(translate_unit("m", "ms", &none), "Milliseconds");
        assert_eq!(translate_unit("m", "s", &none), "Seconds");
        assert_eq!(translate_unit("m", "us", &none), "Microseconds");
        assert_eq!(translate_unit("m", "By", &none), "Bytes");
        assert_eq!(translate_unit("m", "Bi", &none), "Bits");
    }

    #[test]
    fn test_unknown_unit_passes_through() {
        let none = descriptors(&[]);
        assert_eq!(translate_unit("m", "1", &none), "1");
        assert_eq!(translate_unit("m", "{requests}", &none), "{requests}");
        assert_eq!(translate_unit("m", "", &none), "");
        assert_eq!(translate_unit("m", "MS", &none), "MS");
    }

    #[test]
    fn test_descriptor_overwrite_wins() {
        let d = descriptors(&[("requests", "Count", true)]);
        assert_eq!(translate_unit("requests", "1", &d), "Count");
        assert_eq!(translate_unit("requests", "ms", &d), "Count");
        assert_eq!(translate_unit("requests", "", &d), "Count");
    }

    #[test]
    fn test_descriptor_fills_empty_unit_only() {
        let d = descriptors(&[("latency", "Milliseconds", false)]);
        assert_eq!(translate_unit("latency", "", &d), "Milliseconds");
        assert_eq!(translate_unit("latency", "s", &d), "Seconds");
        assert_eq!(translate_unit("latency", "1", &d), "1");
    }

    #[test]
    fn test_descriptor_for_other_metric_ignored() {
        let d = descriptors(&[("latency", "Milliseconds", true)]);
        assert_eq!(translate_unit("throughput", "By", &d), "Bytes");
    }
}
