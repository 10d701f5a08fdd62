//! Namespace and fleet summaries
//!
//! Folds normalized pod, deployment and service listings into per-namespace
//! counts and a pod phase histogram. The fold is commutative: every input is
//! counted into a `BTreeMap` bucket created on first sight, so the result does
//! not depend on listing order and repeated runs never accumulate.

use crate::models::Listing;
use crate::normalizer::{ResourceDescriptor, ResourceKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Sentinel namespace for summaries spanning every namespace
pub const ALL_NAMESPACES: &str = "*";

/// Namespace assumed for descriptors that report none
pub const DEFAULT_NAMESPACE: &str = "default";

/// Phase label for pods without a reported phase
const UNKNOWN_PHASE: &str = "Unknown";

/// Resource counts within one namespace
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KindCounts {
    pub pods: u32,
    pub deployments: u32,
    pub services: u32,
}

impl KindCounts {
    fn record(&mut self, kind: ResourceKind) {
        match kind {
            ResourceKind::Pod => self.pods += 1,
            ResourceKind::Deployment => self.deployments += 1,
            ResourceKind::Service => self.services += 1,
            _ => {}
        }
    }
}

/// Fleet-wide totals
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalCounts {
    pub pods: u32,
    pub deployments: u32,
    pub services: u32,
    pub namespaces: u32,
}

/// Summary across all namespaces of one context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FleetSummary {
    /// Always [`ALL_NAMESPACES`]
    pub namespace: String,
    pub total_counts: TotalCounts,
    pub pod_statuses: BTreeMap<String, u32>,
    pub by_namespace: BTreeMap<String, KindCounts>,
    /// Per-kind fetch failures; a kind listed here was counted as zero
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub errors: BTreeMap<ResourceKind, String>,
}

/// Summary of a single namespace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamespaceSummary {
    pub namespace: String,
    pub counts: KindCounts,
    pub pod_statuses: BTreeMap<String, u32>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub errors: BTreeMap<ResourceKind, String>,
}

/// Count pods, deployments and services per namespace.
///
/// A namespace bucket exists once any of the three kinds is observed in it;
/// the other counters of that bucket stay zero.
pub fn count_by_namespace<'a, I>(descriptors: I) -> BTreeMap<String, KindCounts>
where
    I: IntoIterator<Item = &'a ResourceDescriptor>,
{
    descriptors
        .into_iter()
        .fold(BTreeMap::new(), |mut buckets, descriptor| {
            let namespace = descriptor
                .namespace
                .clone()
                .unwrap_or_else(|| DEFAULT_NAMESPACE.to_string());
            buckets
                .entry(namespace)
                .or_insert_with(KindCounts::default)
                .record(descriptor.kind());
            buckets
        })
}

/// Histogram of pod phases. Unrecognized phases keep their literal label.
pub fn pod_phase_histogram<'a, I>(pods: I) -> BTreeMap<String, u32>
where
    I: IntoIterator<Item = &'a ResourceDescriptor>,
{
    pods.into_iter()
        .filter(|d| d.kind() == ResourceKind::Pod)
        .fold(BTreeMap::new(), |mut histogram, pod| {
            let phase = pod.status.as_deref().unwrap_or(UNKNOWN_PHASE);
            *histogram.entry(phase.to_string()).or_insert(0) += 1;
            histogram
        })
}

fn collect_errors(
    pods: &Listing<ResourceDescriptor>,
    deployments: &Listing<ResourceDescriptor>,
    services: &Listing<ResourceDescriptor>,
) -> BTreeMap<ResourceKind, String> {
    [
        (ResourceKind::Pod, pods),
        (ResourceKind::Deployment, deployments),
        (ResourceKind::Service, services),
    ]
    .into_iter()
    .filter_map(|(kind, listing)| listing.error.clone().map(|e| (kind, e)))
    .collect()
}

/// Summarize three all-namespace listings of one context
pub fn summarize_fleet(
    pods: &Listing<ResourceDescriptor>,
    deployments: &Listing<ResourceDescriptor>,
    services: &Listing<ResourceDescriptor>,
) -> FleetSummary {
    let by_namespace = count_by_namespace(
        pods.items
            .iter()
            .chain(deployments.items.iter())
            .chain(services.items.iter()),
    );

    FleetSummary {
        namespace: ALL_NAMESPACES.to_string(),
        total_counts: TotalCounts {
            pods: pods.items.len() as u32,
            deployments: deployments.items.len() as u32,
            services: services.items.len() as u32,
            namespaces: by_namespace.len() as u32,
        },
        pod_statuses: pod_phase_histogram(&pods.items),
        by_namespace,
        errors: collect_errors(pods, deployments, services),
    }
}

/// Summarize three listings scoped to `namespace`
pub fn summarize_namespace(
    namespace: &str,
    pods: &Listing<ResourceDescriptor>,
    deployments: &Listing<ResourceDescriptor>,
    services: &Listing<ResourceDescriptor>,
) -> NamespaceSummary {
    NamespaceSummary {
        namespace: namespace.to_string(),
        counts: KindCounts {
            pods: pods.items.len() as u32,
            deployments: deployments.items.len() as u32,
            services: services.items.len() as u32,
        },
        pod_statuses: pod_phase_histogram(&pods.items),
        errors: collect_errors(pods, deployments, services),
    }
}
