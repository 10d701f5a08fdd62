//! External collaborators
//!
//! The cloud control plane and the cluster-control CLI sit behind the
//! [`ControlPlane`] and [`ClusterCli`] traits so the facade can be driven by
//! in-memory fakes. The production adapters shell out through
//! [`CommandRunner`], which bounds every call with a timeout.

mod aws;
mod command;
mod kubectl;

pub use aws::{AwsCli, AwsSettings};
pub use command::{CommandOutput, CommandRunner};
pub use kubectl::{Kubectl, KubectlSettings};

use crate::cost::CostQuery;
use crate::error::FleetResult;
use crate::models::{
    AddonCompatibility, AddonDescriptor, ClusterContext, ClusterDescriptor, NamespaceScope,
    NodeGroupDescriptor, ScalingConfig,
};
use crate::normalizer::ResourceKind;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;

/// Cloud control-plane operations used by the console
#[async_trait]
pub trait ControlPlane: Send + Sync {
    async fn list_clusters(&self) -> FleetResult<Vec<String>>;

    async fn describe_cluster(&self, name: &str) -> FleetResult<ClusterDescriptor>;

    async fn list_node_groups(&self, cluster: &str) -> FleetResult<Vec<String>>;

    async fn describe_node_group(&self, cluster: &str, nodegroup: &str) -> FleetResult<NodeGroupDescriptor>;

    /// Send one atomic scaling update for a node group
    async fn update_node_group_scaling(
        &self,
        cluster: &str,
        nodegroup: &str,
        config: ScalingConfig,
    ) -> FleetResult<()>;

    async fn list_addons(&self, cluster: &str) -> FleetResult<Vec<String>>;

    async fn describe_addon(&self, cluster: &str, addon: &str) -> FleetResult<AddonDescriptor>;

    /// Add-on release compatibility matrix across cluster versions
    async fn describe_addon_versions(&self) -> FleetResult<Vec<AddonCompatibility>>;

    /// Total cost over the query window, summed across result periods
    async fn cost_and_usage(&self, query: &CostQuery) -> FleetResult<f64>;

    /// Cost per billed service over the query window, summed across result periods
    async fn cost_by_service(&self, query: &CostQuery) -> FleetResult<BTreeMap<String, f64>>;

    /// ARNs of every resource known to the tagging API
    async fn list_tagged_resources(&self) -> FleetResult<Vec<String>>;

    /// Write kubeconfig credentials for `cluster` under a context of the same name
    async fn update_kubeconfig(&self, cluster: &str) -> FleetResult<String>;
}

/// Cluster-control CLI operations used by the console
#[async_trait]
pub trait ClusterCli: Send + Sync {
    /// Raw `items` of a resource listing
    async fn get(
        &self,
        context: &ClusterContext,
        kind: ResourceKind,
        scope: &NamespaceScope,
    ) -> FleetResult<Vec<Value>>;

    async fn contexts(&self) -> FleetResult<Vec<String>>;

    /// The CLI's selected context, if any
    async fn current_context(&self) -> FleetResult<Option<String>>;

    async fn use_context(&self, context: &ClusterContext) -> FleetResult<()>;

    async fn cluster_info(&self, context: &ClusterContext) -> FleetResult<String>;
}
