//! Services and ingresses

use super::{describe, ResourceDescriptor, ResourceDetail};
use crate::error::FleetResult;
use k8s_openapi::api::core::v1::{Service, ServicePort};
use k8s_openapi::api::networking::v1::Ingress;
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceDetail {
    #[serde(rename = "type")]
    pub service_type: String,
    #[serde(rename = "clusterIP")]
    pub cluster_ip: Option<String>,
    #[serde(rename = "externalIP")]
    pub external_ip: Option<String>,
    /// One `port[:target][:nodePort]/protocol` label per port
    pub ports: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngressDetail {
    #[serde(rename = "class")]
    pub ingress_class: Option<String>,
    pub hosts: Vec<String>,
    pub address: Option<String>,
}

/// Zero and empty port values count as absent
fn number(value: i32) -> Option<String> {
    (value != 0).then(|| value.to_string())
}

fn target_value(value: &IntOrString) -> Option<String> {
    match value {
        IntOrString::Int(n) => number(*n),
        IntOrString::String(s) if s.is_empty() => None,
        IntOrString::String(s) => Some(s.clone()),
    }
}

/// Synthesize the display label for one service port
fn port_label(port: &ServicePort) -> String {
    let mut label = number(port.port).unwrap_or_default();
    if let Some(target) = port.target_port.as_ref().and_then(target_value) {
        label.push(':');
        label.push_str(&target);
    }
    if let Some(node_port) = port.node_port.and_then(number) {
        label.push(':');
        label.push_str(&node_port);
    }
    label.push('/');
    label.push_str(port.protocol.as_deref().unwrap_or("TCP"));
    label
}

pub(super) fn service(item: Value) -> FleetResult<ResourceDescriptor> {
    let service: Service = serde_json::from_value(item)?;
    let spec = service.spec.unwrap_or_default();

    Ok(describe(
        service.metadata,
        None,
        ResourceDetail::Service(ServiceDetail {
            service_type: spec.type_.unwrap_or_else(|| "ClusterIP".to_string()),
            cluster_ip: spec.cluster_ip,
            external_ip: spec.external_ips.and_then(|ips| ips.into_iter().next()),
            ports: spec.ports.unwrap_or_default().iter().map(port_label).collect(),
        }),
    ))
}

pub(super) fn ingress(item: Value) -> FleetResult<ResourceDescriptor> {
    let ingress: Ingress = serde_json::from_value(item)?;
    let spec = ingress.spec.unwrap_or_default();

    let hosts = spec
        .rules
        .unwrap_or_default()
        .into_iter()
        .filter_map(|rule| rule.host)
        .filter(|host| !host.is_empty())
        .collect();

    let address = ingress
        .status
        .and_then(|status| status.load_balancer)
        .and_then(|lb| lb.ingress)
        .and_then(|entries| entries.into_iter().next())
        .and_then(|entry| {
            entry
                .hostname
                .filter(|h| !h.is_empty())
                .or_else(|| entry.ip.filter(|ip| !ip.is_empty()))
        });

    Ok(describe(
        ingress.metadata,
        None,
        ResourceDetail::Ingress(IngressDetail {
            ingress_class: spec.ingress_class_name,
            hosts,
            address,
        }),
    ))
}
