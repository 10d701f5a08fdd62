//! Resource normalization
//!
//! Converts raw cluster-control CLI listings into uniform descriptors. Every
//! descriptor shares the `{namespace?, name, age, status}` envelope consumed by
//! the aggregation engine; kind-specific fields live in [`ResourceDetail`].
//! Dispatch is table-driven: one extraction function per [`ResourceKind`].

mod cluster;
mod network;
mod storage;
mod workloads;

pub use cluster::NODE_ROLE_PREFIX;

use crate::error::{FleetError, FleetResult};
use crate::models::Listing;
use chrono::SecondsFormat;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, Time};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Resource kinds the normalizer understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResourceKind {
    Pod,
    Deployment,
    Service,
    ConfigMap,
    Secret,
    Ingress,
    PersistentVolumeClaim,
    Job,
    CronJob,
    StatefulSet,
    DaemonSet,
    ReplicaSet,
    Node,
    Event,
    Namespace,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 15] = [
        ResourceKind::Pod,
        ResourceKind::Deployment,
        ResourceKind::Service,
        ResourceKind::ConfigMap,
        ResourceKind::Secret,
        ResourceKind::Ingress,
        ResourceKind::PersistentVolumeClaim,
        ResourceKind::Job,
        ResourceKind::CronJob,
        ResourceKind::StatefulSet,
        ResourceKind::DaemonSet,
        ResourceKind::ReplicaSet,
        ResourceKind::Node,
        ResourceKind::Event,
        ResourceKind::Namespace,
    ];

    /// Resource name as passed to `kubectl get`
    pub fn cli_name(&self) -> &'static str {
        match self {
            ResourceKind::Pod => "pods",
            ResourceKind::Deployment => "deployments",
            ResourceKind::Service => "services",
            ResourceKind::ConfigMap => "configmaps",
            ResourceKind::Secret => "secrets",
            ResourceKind::Ingress => "ingresses",
            ResourceKind::PersistentVolumeClaim => "pvc",
            ResourceKind::Job => "jobs",
            ResourceKind::CronJob => "cronjobs",
            ResourceKind::StatefulSet => "statefulsets",
            ResourceKind::DaemonSet => "daemonsets",
            ResourceKind::ReplicaSet => "replicasets",
            ResourceKind::Node => "nodes",
            ResourceKind::Event => "events",
            ResourceKind::Namespace => "namespaces",
        }
    }

    /// Cluster-scoped kinds ignore any namespace selection
    pub fn is_namespaced(&self) -> bool {
        !matches!(self, ResourceKind::Node | ResourceKind::Namespace)
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.cli_name())
    }
}

impl FromStr for ResourceKind {
    type Err = FleetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let kind = match s.to_ascii_lowercase().as_str() {
            "pod" | "pods" | "po" => ResourceKind::Pod,
            "deployment" | "deployments" | "deploy" => ResourceKind::Deployment,
            "service" | "services" | "svc" => ResourceKind::Service,
            "configmap" | "configmaps" | "cm" => ResourceKind::ConfigMap,
            "secret" | "secrets" => ResourceKind::Secret,
            "ingress" | "ingresses" | "ing" => ResourceKind::Ingress,
            "persistentvolumeclaim" | "persistentvolumeclaims" | "pvc" | "pvcs" => {
                ResourceKind::PersistentVolumeClaim
            }
            "job" | "jobs" => ResourceKind::Job,
            "cronjob" | "cronjobs" | "cj" => ResourceKind::CronJob,
            "statefulset" | "statefulsets" | "sts" => ResourceKind::StatefulSet,
            "daemonset" | "daemonsets" | "ds" => ResourceKind::DaemonSet,
            "replicaset" | "replicasets" | "rs" => ResourceKind::ReplicaSet,
            "node" | "nodes" | "no" => ResourceKind::Node,
            "event" | "events" | "ev" => ResourceKind::Event,
            "namespace" | "namespaces" | "ns" => ResourceKind::Namespace,
            other => return Err(FleetError::NotFound(format!("resource kind '{}'", other))),
        };
        Ok(kind)
    }
}

/// Uniform descriptor for one resource instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceDescriptor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    pub name: String,
    /// Creation timestamp exactly as reported upstream
    pub age: Option<String>,
    /// Status or phase, when the kind has one
    pub status: Option<String>,
    #[serde(flatten)]
    pub detail: ResourceDetail,
}

impl ResourceDescriptor {
    pub fn kind(&self) -> ResourceKind {
        self.detail.kind()
    }
}

/// Kind-specific descriptor fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ResourceDetail {
    Pod(workloads::PodDetail),
    Deployment(workloads::DeploymentDetail),
    Service(network::ServiceDetail),
    ConfigMap(storage::ConfigMapDetail),
    Secret(storage::SecretDetail),
    Ingress(network::IngressDetail),
    PersistentVolumeClaim(storage::VolumeClaimDetail),
    Job(workloads::JobDetail),
    CronJob(workloads::CronJobDetail),
    StatefulSet(workloads::StatefulSetDetail),
    DaemonSet(workloads::DaemonSetDetail),
    ReplicaSet(workloads::ReplicaSetDetail),
    Node(cluster::NodeDetail),
    Event(cluster::EventDetail),
    Namespace(cluster::NamespaceDetail),
}

impl ResourceDetail {
    pub fn kind(&self) -> ResourceKind {
        match self {
            ResourceDetail::Pod(_) => ResourceKind::Pod,
            ResourceDetail::Deployment(_) => ResourceKind::Deployment,
            ResourceDetail::Service(_) => ResourceKind::Service,
            ResourceDetail::ConfigMap(_) => ResourceKind::ConfigMap,
            ResourceDetail::Secret(_) => ResourceKind::Secret,
            ResourceDetail::Ingress(_) => ResourceKind::Ingress,
            ResourceDetail::PersistentVolumeClaim(_) => ResourceKind::PersistentVolumeClaim,
            ResourceDetail::Job(_) => ResourceKind::Job,
            ResourceDetail::CronJob(_) => ResourceKind::CronJob,
            ResourceDetail::StatefulSet(_) => ResourceKind::StatefulSet,
            ResourceDetail::DaemonSet(_) => ResourceKind::DaemonSet,
            ResourceDetail::ReplicaSet(_) => ResourceKind::ReplicaSet,
            ResourceDetail::Node(_) => ResourceKind::Node,
            ResourceDetail::Event(_) => ResourceKind::Event,
            ResourceDetail::Namespace(_) => ResourceKind::Namespace,
        }
    }
}

pub use cluster::{EventDetail, NamespaceDetail, NodeDetail};
pub use network::{IngressDetail, ServiceDetail};
pub use storage::{ConfigMapDetail, SecretDetail, VolumeClaimDetail};
pub use workloads::{
    CronJobDetail, DaemonSetDetail, DeploymentDetail, JobDetail, PodDetail, ReplicaSetDetail,
    StatefulSetDetail,
};

type Extractor = fn(Value) -> FleetResult<ResourceDescriptor>;

fn extractor_for(kind: ResourceKind) -> Extractor {
    match kind {
        ResourceKind::Pod => workloads::pod,
        ResourceKind::Deployment => workloads::deployment,
        ResourceKind::Service => network::service,
        ResourceKind::ConfigMap => storage::config_map,
        ResourceKind::Secret => storage::secret,
        ResourceKind::Ingress => network::ingress,
        ResourceKind::PersistentVolumeClaim => storage::volume_claim,
        ResourceKind::Job => workloads::job,
        ResourceKind::CronJob => workloads::cron_job,
        ResourceKind::StatefulSet => workloads::stateful_set,
        ResourceKind::DaemonSet => workloads::daemon_set,
        ResourceKind::ReplicaSet => workloads::replica_set,
        ResourceKind::Node => cluster::node,
        ResourceKind::Event => cluster::event,
        ResourceKind::Namespace => cluster::namespace,
    }
}

/// Normalize raw listing items of a single kind
pub fn normalize_items(kind: ResourceKind, items: Vec<Value>) -> FleetResult<Vec<ResourceDescriptor>> {
    let extract = extractor_for(kind);
    items.into_iter().map(extract).collect()
}

/// Normalize a raw listing, degrading an upstream failure to an empty
/// listing that carries the error
pub fn normalize(kind: ResourceKind, raw: FleetResult<Vec<Value>>) -> Listing<ResourceDescriptor> {
    Listing::from_result(raw.and_then(|items| normalize_items(kind, items)))
}

/// Render a readiness ratio
pub(crate) fn ratio(ready: u32, total: u32) -> String {
    format!("{}/{}", ready, total)
}

/// Timestamp in the RFC 3339 form the API server emits
pub(crate) fn timestamp(time: &Time) -> String {
    time.0.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// API counts are signed; negatives never reach a descriptor
pub(crate) fn count(value: i32) -> u32 {
    u32::try_from(value).unwrap_or(0)
}

pub(crate) fn count_or_zero(value: Option<i32>) -> u32 {
    value.map(count).unwrap_or(0)
}

/// Wrap kind-specific fields in the shared envelope
pub(crate) fn describe(
    metadata: ObjectMeta,
    status: Option<String>,
    detail: ResourceDetail,
) -> ResourceDescriptor {
    ResourceDescriptor {
        namespace: metadata.namespace,
        name: metadata.name.unwrap_or_default(),
        age: metadata.creation_timestamp.as_ref().map(timestamp),
        status,
        detail,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_kind_parsing_accepts_cli_names() {
        for kind in ResourceKind::ALL {
            assert_eq!(kind.cli_name().parse::<ResourceKind>().unwrap(), kind);
        }
        assert_eq!("svc".parse::<ResourceKind>().unwrap(), ResourceKind::Service);
        assert!("widgets".parse::<ResourceKind>().is_err());
    }

    #[test]
    fn test_cluster_scoped_kinds() {
        assert!(!ResourceKind::Node.is_namespaced());
        assert!(!ResourceKind::Namespace.is_namespaced());
        assert!(ResourceKind::Pod.is_namespaced());
    }

    #[test]
    fn test_upstream_failure_yields_empty_listing_with_error() {
        let listing = normalize(
            ResourceKind::Pod,
            Err(FleetError::upstream("kubectl: connection refused")),
        );
        assert!(listing.items.is_empty());
        assert!(listing.error.unwrap().contains("connection refused"));
    }

    #[test]
    fn test_empty_listing_has_no_error() {
        let listing = normalize(ResourceKind::Deployment, Ok(vec![]));
        assert!(listing.items.is_empty());
        assert!(listing.error.is_none());
    }

    #[test]
    fn test_malformed_item_fails_the_listing() {
        let listing = normalize(ResourceKind::Pod, Ok(vec![json!({"metadata": "oops"})]));
        assert!(listing.items.is_empty());
        assert!(listing.is_error());
    }

    #[test]
    fn test_descriptor_serializes_envelope_and_kind() {
        let items = vec![json!({
            "metadata": {"name": "web-0", "namespace": "shop", "creationTimestamp": "2024-03-01T10:00:00Z"},
            "spec": {"containers": [{"name": "web"}]},
            "status": {"phase": "Running", "containerStatuses": [{"ready": true, "restartCount": 2}]}
        })];
        let listing = normalize(ResourceKind::Pod, Ok(items));
        let json = serde_json::to_value(&listing).unwrap();
        let pod = &json["items"][0];

        assert_eq!(pod["kind"], "pod");
        assert_eq!(pod["namespace"], "shop");
        assert_eq!(pod["age"], "2024-03-01T10:00:00Z");
        assert_eq!(pod["status"], "Running");
        assert_eq!(pod["ready"], "1/1");

        let back: Listing<ResourceDescriptor> = serde_json::from_value(json).unwrap();
        assert_eq!(back, listing);
    }

    #[test]
    fn test_ratio_formatting() {
        assert_eq!(ratio(1, 2), "1/2");
        assert_eq!(ratio(0, 0), "0/0");
    }

    #[test]
    fn test_negative_counts_clamp_to_zero() {
        assert_eq!(count(-3), 0);
        assert_eq!(count(4), 4);
        assert_eq!(count_or_zero(None), 0);
    }

    #[test]
    fn test_items_with_api_version_and_kind_parse() {
        let items = vec![json!({
            "apiVersion": "v1",
            "kind": "Namespace",
            "metadata": {"name": "kube-system", "creationTimestamp": "2024-01-02T03:04:05Z"},
            "status": {"phase": "Active"}
        })];
        let listing = normalize(ResourceKind::Namespace, Ok(items));
        assert!(listing.error.is_none());
        assert_eq!(listing.items[0].age.as_deref(), Some("2024-01-02T03:04:05Z"));
    }
}
