//! Cluster-scoped kinds plus events

use super::{count, describe, timestamp, ResourceDescriptor, ResourceDetail};
use crate::error::FleetResult;
use k8s_openapi::api::core::v1::{Event, Namespace, Node, NodeAddress};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Label prefix marking node roles
pub const NODE_ROLE_PREFIX: &str = "node-role.kubernetes.io/";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDetail {
    pub roles: Vec<String>,
    pub version: Option<String>,
    pub os: Option<String>,
    pub kernel: Option<String>,
    pub container_runtime: Option<String>,
    pub cpu: Option<String>,
    pub memory: Option<String>,
    pub pods: Option<String>,
    #[serde(rename = "internalIP")]
    pub internal_ip: Option<String>,
    #[serde(rename = "externalIP")]
    pub external_ip: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDetail {
    #[serde(rename = "type")]
    pub event_type: Option<String>,
    pub reason: Option<String>,
    pub message: Option<String>,
    /// Involved object as `Kind/name`
    pub object: String,
    pub count: u32,
    pub first_seen: Option<String>,
    pub last_seen: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamespaceDetail {
    pub labels: BTreeMap<String, String>,
}

fn address_of(addresses: &[NodeAddress], address_type: &str) -> Option<String> {
    addresses
        .iter()
        .find(|a| a.type_ == address_type)
        .map(|a| a.address.clone())
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

pub(super) fn node(item: Value) -> FleetResult<ResourceDescriptor> {
    let node: Node = serde_json::from_value(item)?;
    let status = node.status.unwrap_or_default();

    // Last condition of a given type wins
    let conditions: BTreeMap<String, String> = status
        .conditions
        .unwrap_or_default()
        .into_iter()
        .map(|c| (c.type_, c.status))
        .collect();
    let readiness = if conditions.get("Ready").map(String::as_str) == Some("True") {
        "Ready"
    } else {
        "NotReady"
    };

    let roles = node
        .metadata
        .labels
        .iter()
        .flatten()
        .filter_map(|(key, _)| key.strip_prefix(NODE_ROLE_PREFIX))
        .map(str::to_string)
        .collect();

    let capacity = status.capacity.unwrap_or_default();
    let quantity = |name: &str| capacity.get(name).map(|q| q.0.clone());
    let info = status.node_info.as_ref();
    let addresses = status.addresses.unwrap_or_default();

    let detail = NodeDetail {
        roles,
        version: info.and_then(|i| non_empty(&i.kubelet_version)),
        os: info.and_then(|i| non_empty(&i.os_image)),
        kernel: info.and_then(|i| non_empty(&i.kernel_version)),
        container_runtime: info.and_then(|i| non_empty(&i.container_runtime_version)),
        cpu: quantity("cpu"),
        memory: quantity("memory"),
        pods: quantity("pods"),
        internal_ip: address_of(&addresses, "InternalIP"),
        external_ip: address_of(&addresses, "ExternalIP"),
    };

    let mut descriptor = describe(
        node.metadata,
        Some(readiness.to_string()),
        ResourceDetail::Node(detail),
    );
    descriptor.namespace = None;
    Ok(descriptor)
}

pub(super) fn event(item: Value) -> FleetResult<ResourceDescriptor> {
    let event: Event = serde_json::from_value(item)?;
    let involved = &event.involved_object;
    let last_seen = event.last_timestamp.as_ref().map(timestamp);

    Ok(ResourceDescriptor {
        namespace: event.metadata.namespace.clone(),
        name: event.metadata.name.clone().unwrap_or_default(),
        age: last_seen.clone(),
        status: None,
        detail: ResourceDetail::Event(EventDetail {
            event_type: event.type_.clone(),
            reason: event.reason.clone(),
            message: event.message.clone(),
            object: format!(
                "{}/{}",
                involved.kind.as_deref().unwrap_or_default(),
                involved.name.as_deref().unwrap_or_default()
            ),
            count: event.count.map(count).unwrap_or(1),
            first_seen: event.first_timestamp.as_ref().map(timestamp),
            last_seen,
        }),
    })
}

pub(super) fn namespace(item: Value) -> FleetResult<ResourceDescriptor> {
    let namespace: Namespace = serde_json::from_value(item)?;
    let phase = namespace.status.and_then(|s| s.phase);
    let labels = namespace.metadata.labels.clone().unwrap_or_default();

    let mut descriptor = describe(
        namespace.metadata,
        Some(phase.unwrap_or_else(|| "Unknown".to_string())),
        ResourceDetail::Namespace(NamespaceDetail { labels }),
    );
    descriptor.namespace = None;
    Ok(descriptor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_node_roles_and_readiness() {
        let item = json!({
            "metadata": {
                "name": "ip-10-0-1-5.ec2.internal",
                "creationTimestamp": "2024-04-01T00:00:00Z",
                "labels": {
                    "node-role.kubernetes.io/worker": "",
                    "node-role.kubernetes.io/ingress": "",
                    "eks.amazonaws.com/nodegroup": "general"
                }
            },
            "status": {
                "conditions": [
                    {"type": "MemoryPressure", "status": "False"},
                    {"type": "Ready", "status": "True"}
                ],
                "capacity": {"cpu": "4", "memory": "16Gi", "pods": "58"},
                "nodeInfo": {"kubeletVersion": "v1.29.3-eks", "osImage": "Amazon Linux 2", "kernelVersion": "5.10", "containerRuntimeVersion": "containerd://1.7"},
                "addresses": [
                    {"type": "InternalIP", "address": "10.0.1.5"},
                    {"type": "Hostname", "address": "ip-10-0-1-5"}
                ]
            }
        });

        let descriptor = node(item).unwrap();
        assert_eq!(descriptor.status.as_deref(), Some("Ready"));
        assert!(descriptor.namespace.is_none());

        match descriptor.detail {
            ResourceDetail::Node(d) => {
                assert_eq!(d.roles, vec!["ingress", "worker"]);
                assert_eq!(d.version.as_deref(), Some("v1.29.3-eks"));
                assert_eq!(d.container_runtime.as_deref(), Some("containerd://1.7"));
                assert_eq!(d.cpu.as_deref(), Some("4"));
                assert_eq!(d.pods.as_deref(), Some("58"));
                assert_eq!(d.internal_ip.as_deref(), Some("10.0.1.5"));
                assert!(d.external_ip.is_none());
            }
            other => panic!("unexpected detail {:?}", other),
        }
    }

    #[test]
    fn test_node_without_ready_condition_is_not_ready() {
        let item = json!({
            "metadata": {"name": "n1"},
            "status": {"conditions": [{"type": "Ready", "status": "Unknown"}]}
        });
        assert_eq!(node(item).unwrap().status.as_deref(), Some("NotReady"));
        assert_eq!(
            node(json!({"metadata": {"name": "n2"}})).unwrap().status.as_deref(),
            Some("NotReady")
        );
    }

    #[test]
    fn test_event_fields() {
        let item = json!({
            "metadata": {"name": "api.17c", "namespace": "shop"},
            "type": "Warning",
            "reason": "BackOff",
            "message": "Back-off restarting failed container",
            "involvedObject": {"kind": "Pod", "name": "api-7d9f"},
            "count": 4,
            "firstTimestamp": "2024-05-01T08:00:00Z",
            "lastTimestamp": "2024-05-01T08:05:00Z"
        });

        let descriptor = event(item).unwrap();
        assert_eq!(descriptor.age.as_deref(), Some("2024-05-01T08:05:00Z"));

        match descriptor.detail {
            ResourceDetail::Event(d) => {
                assert_eq!(d.event_type.as_deref(), Some("Warning"));
                assert_eq!(d.object, "Pod/api-7d9f");
                assert_eq!(d.count, 4);
                assert_eq!(d.first_seen.as_deref(), Some("2024-05-01T08:00:00Z"));
            }
            other => panic!("unexpected detail {:?}", other),
        }
    }

    #[test]
    fn test_event_count_defaults_to_one() {
        let item = json!({"metadata": {"name": "e"}, "involvedObject": {"kind": "Node", "name": "n1"}});
        match event(item).unwrap().detail {
            ResourceDetail::Event(d) => {
                assert_eq!(d.count, 1);
                assert_eq!(d.object, "Node/n1");
                assert!(d.last_seen.is_none());
            }
            other => panic!("unexpected detail {:?}", other),
        }
    }

    #[test]
    fn test_namespace_phase_and_labels() {
        let item = json!({
            "metadata": {"name": "shop", "labels": {"team": "checkout"}},
            "status": {"phase": "Active"}
        });
        let descriptor = namespace(item).unwrap();
        assert_eq!(descriptor.status.as_deref(), Some("Active"));
        match descriptor.detail {
            ResourceDetail::Namespace(d) => assert_eq!(d.labels.get("team").map(String::as_str), Some("checkout")),
            other => panic!("unexpected detail {:?}", other),
        }

        let bare = namespace(json!({"metadata": {"name": "x"}})).unwrap();
        assert_eq!(bare.status.as_deref(), Some("Unknown"));
    }
}
