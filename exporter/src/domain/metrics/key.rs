//! Grouping key construction

use std::collections::BTreeMap;

use super::types::{GroupIdentity, Labels};

/// Composite key selecting the bucket of a data point.
///
/// Labels are held name-sorted, so equality and hashing do not depend on the
/// insertion order of the source label set.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupedMetricKey {
    identity: GroupIdentity,
    labels: BTreeMap<String, String>,
}

impl GroupedMetricKey {
    pub fn new(identity: &GroupIdentity, labels: &Labels) -> Self {
        Self {
            identity: identity.clone(),
            labels: labels
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        }
    }

    pub fn identity(&self) -> &GroupIdentity {
        &self.identity
    }

    /// Label pairs in name order
    pub fn labels(&self) -> impl Iterator<Item = (&str, &str)> {
        self.labels.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::domain::metrics::types::MetricType;

    fn identity(namespace: &str) -> GroupIdentity {
        GroupIdentity {
            namespace: namespace.to_string(),
            timestamp_ms: 1_700_000_000_000,
            log_group: "/metrics/default".to_string(),
            log_stream: String::new(),
            metric_type: MetricType::Gauge,
            ..Default::default()
        }
    }

    #[test]
    fn test_key_independent_of_label_order() {
        let mut first = Labels::new();
        for (k, v) in [("a", "1"), ("b", "2"), ("c", "3"), ("d", "4")] {
            first.insert(k.to_string(), v.to_string());
        }
        let mut second = Labels::new();
        for (k, v) in [("d", "4"), ("c", "3"), ("b", "2"), ("a", "1")] {
            second.insert(k.to_string(), v.to_string());
        }

        let key1 = GroupedMetricKey::new(&identity("ns"), &first);
        let key2 = GroupedMetricKey::new(&identity("ns"), &second);
        assert_eq!(key1, key2);

        let set: HashSet<_> = [key1, key2].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_key_differs_on_label_value() {
        let a: Labels = [("host".to_string(), "a".to_string())].into();
        let b: Labels = [("host".to_string(), "b".to_string())].into();

        assert_ne!(
            GroupedMetricKey::new(&identity("ns"), &a),
            GroupedMetricKey::new(&identity("ns"), &b)
        );
    }

    #[test]
    fn test_key_differs_on_extra_label() {
        let a: Labels = [("host".to_string(), "a".to_string())].into();
        let mut b = a.clone();
        b.insert("zone".to_string(), "z1".to_string());

        assert_ne!(
            GroupedMetricKey::new(&identity("ns"), &a),
            GroupedMetricKey::new(&identity("ns"), &b)
        );
    }

    #[test]
    fn test_key_differs_on_identity() {
        let labels: Labels = [("host".to_string(), "a".to_string())].into();

        assert_ne!(
            GroupedMetricKey::new(&identity("ns1"), &labels),
            GroupedMetricKey::new(&identity("ns2"), &labels)
        );

        let mut later = identity("ns1");
        later.timestamp_ms += 1;
        assert_ne!(
            GroupedMetricKey::new(&identity("ns1"), &labels),
            GroupedMetricKey::new(&later, &labels)
        );
    }

    #[test]
    fn test_key_labels_sorted() {
        let labels: Labels = [
            ("zone".to_string(), "z".to_string()),
            ("app".to_string(), "x".to_string()),
        ]
        .into();
        let key = GroupedMetricKey::new(&identity("ns"), &labels);

        let names: Vec<&str> = key.labels().map(|(k, _)| k).collect();
        assert_eq!(names, vec!["app", "zone"]);
        assert_eq!(key.identity().namespace, "ns");
    }
}
