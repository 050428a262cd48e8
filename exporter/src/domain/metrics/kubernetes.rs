//! Kubernetes metadata wrapping for Container Insights metrics
//!
//! Flat orchestration labels are folded into a nested `kubernetes` object and
//! stored back into the label set as serialized JSON.

use serde::Serialize;

use super::types::Labels;
use crate::core::constants::KUBERNETES_LABEL;

/// Label holding the Container Insights record type
const TYPE_LABEL: &str = "Type";

#[derive(Debug, Default, Serialize)]
struct KubernetesMetadata {
    #[serde(skip_serializing_if = "String::is_empty")]
    container_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    docker: Option<DockerMetadata>,
    #[serde(skip_serializing_if = "String::is_empty")]
    host: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    labels: Option<PodLabels>,
    #[serde(skip_serializing_if = "String::is_empty")]
    namespace_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pod_id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pod_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pod_owners: Option<PodOwners>,
    #[serde(skip_serializing_if = "String::is_empty")]
    service_name: String,
}

#[derive(Debug, Serialize)]
struct DockerMetadata {
    container_id: String,
}

#[derive(Debug, Serialize)]
struct PodLabels {
    #[serde(skip_serializing_if = "String::is_empty")]
    app: String,
    #[serde(rename = "pod-template-hash", skip_serializing_if = "String::is_empty")]
    pod_template_hash: String,
}

#[derive(Debug, Serialize)]
struct PodOwners {
    #[serde(skip_serializing_if = "String::is_empty")]
    owner_kind: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    owner_name: String,
}

impl KubernetesMetadata {
    /// Build from flat labels; sub-objects whose fields are all empty stay `None`
    fn from_labels(labels: &Labels) -> Self {
        let get = |key: &str| labels.get(key).cloned().unwrap_or_default();

        let container_id = get("container_id");
        let docker = (!container_id.is_empty()).then_some(DockerMetadata { container_id });

        let app = get("app");
        let pod_template_hash = get("pod-template-hash");
        let pod_labels = (!app.is_empty() || !pod_template_hash.is_empty()).then_some(PodLabels {
            app,
            pod_template_hash,
        });

        let owner_kind = get("owner_kind");
        let owner_name = get("owner_name");
        let pod_owners = (!owner_kind.is_empty() || !owner_name.is_empty()).then_some(PodOwners {
            owner_kind,
            owner_name,
        });

        Self {
            container_name: get("container"),
            docker,
            host: get("NodeName"),
            labels: pod_labels,
            namespace_name: get("Namespace"),
            pod_id: get("PodId"),
            pod_name: get("PodName"),
            pod_owners,
            service_name: get("Service"),
        }
    }
}

/// Whether the label set describes a Container Insights Pod or Container record
pub fn is_pod_or_container(labels: &Labels) -> bool {
    matches!(
        labels.get(TYPE_LABEL).map(String::as_str),
        Some("Pod") | Some("Container")
    )
}

/// Add the serialized `kubernetes` object to the label set.
///
/// Serialization failures leave the labels untouched.
pub fn add_kubernetes_wrapper(labels: &mut Labels) {
    let metadata = KubernetesMetadata::from_labels(labels);
    match serde_json::to_string(&metadata) {
        Ok(json) => {
            labels.insert(KUBERNETES_LABEL.to_string(), json);
        }
        Err(e) => {
            tracing::debug!(error = %e, "Failed to serialize kubernetes metadata");
        }
    }
}
