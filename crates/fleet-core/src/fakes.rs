//! In-memory upstreams for unit tests

use crate::cost::{CostFilter, CostQuery};
use crate::error::{FleetError, FleetResult};
use crate::models::{
    AddonCompatibility, AddonDescriptor, ClusterContext, ClusterDescriptor, NamespaceScope,
    NodeGroupDescriptor, ScalingConfig,
};
use crate::normalizer::ResourceKind;
use crate::upstream::{ClusterCli, ControlPlane};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

#[derive(Default)]
pub struct FakeControlPlane {
    clusters: Vec<ClusterDescriptor>,
    node_groups: Vec<NodeGroupDescriptor>,
    addons: Vec<(String, AddonDescriptor)>,
    compatibilities: Vec<AddonCompatibility>,
    tagged_cost: Option<f64>,
    service_cost: Option<f64>,
    service_breakdown: Option<Vec<(String, f64)>>,
    tagged_resources: Option<Vec<String>>,
    fail_cluster_list: bool,
    fail_describe: BTreeSet<String>,
    fail_update: BTreeSet<String>,
    fail_kubeconfig: bool,
    updates: Mutex<Vec<(String, String, ScalingConfig)>>,
    cost_queries: Mutex<Vec<CostQuery>>,
}

impl FakeControlPlane {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_clusters(mut self, names: &[&str]) -> Self {
        for name in names {
            self = self.with_cluster(name, "1.29");
        }
        self
    }

    pub fn with_cluster(mut self, name: &str, version: &str) -> Self {
        self.clusters.push(ClusterDescriptor {
            name: name.to_string(),
            status: Some("ACTIVE".to_string()),
            version: Some(version.to_string()),
            ..Default::default()
        });
        self
    }

    pub fn with_node_group(mut self, cluster: &str, name: &str, config: ScalingConfig) -> Self {
        if !self.clusters.iter().any(|c| c.name == cluster) {
            self = self.with_cluster(cluster, "1.29");
        }
        self.node_groups.push(NodeGroupDescriptor {
            name: name.to_string(),
            cluster_name: cluster.to_string(),
            status: Some("ACTIVE".to_string()),
            scaling_config: config,
            ..Default::default()
        });
        self
    }

    pub fn with_addon(mut self, cluster: &str, name: &str, version: &str) -> Self {
        self.addons.push((
            cluster.to_string(),
            AddonDescriptor {
                name: name.to_string(),
                version: Some(version.to_string()),
                status: Some("ACTIVE".to_string()),
                created_at: None,
            },
        ));
        self
    }

    pub fn with_cluster_versions(mut self, versions: &[&str]) -> Self {
        self.compatibilities.push(AddonCompatibility {
            addon_name: "vpc-cni".to_string(),
            addon_version: "v1.18.0".to_string(),
            cluster_versions: versions.iter().map(|v| v.to_string()).collect(),
        });
        self
    }

    pub fn with_tagged_cost(mut self, amount: f64) -> Self {
        self.tagged_cost = Some(amount);
        self
    }

    pub fn with_service_cost(mut self, amount: f64) -> Self {
        self.service_cost = Some(amount);
        self
    }

    pub fn with_service_breakdown(mut self, services: &[(&str, f64)]) -> Self {
        self.service_breakdown = Some(services.iter().map(|(s, c)| (s.to_string(), *c)).collect());
        self
    }

    pub fn with_tagged_resources(mut self, arns: &[&str]) -> Self {
        self.tagged_resources = Some(arns.iter().map(|a| a.to_string()).collect());
        self
    }

    pub fn failing_cluster_list(mut self) -> Self {
        self.fail_cluster_list = true;
        self
    }

    /// Describing a cluster, node group or add-on with this name fails
    pub fn failing_describe(mut self, name: &str) -> Self {
        self.fail_describe.insert(name.to_string());
        self
    }

    pub fn failing_update(mut self, nodegroup: &str) -> Self {
        self.fail_update.insert(nodegroup.to_string());
        self
    }

    pub fn failing_kubeconfig(mut self) -> Self {
        self.fail_kubeconfig = true;
        self
    }

    pub fn updates(&self) -> Vec<(String, String, ScalingConfig)> {
        self.updates.lock().unwrap().clone()
    }

    pub fn tagged_queries(&self) -> usize {
        self.count_queries(|f| matches!(f, Some(CostFilter::ClusterTag { .. })))
    }

    pub fn service_queries(&self) -> usize {
        self.count_queries(|f| matches!(f, Some(CostFilter::Service { .. })))
    }

    pub fn unfiltered_queries(&self) -> usize {
        self.count_queries(Option::is_none)
    }

    fn count_queries(&self, pred: impl Fn(&Option<CostFilter>) -> bool) -> usize {
        self.cost_queries
            .lock()
            .unwrap()
            .iter()
            .filter(|q| pred(&q.filter))
            .count()
    }

    fn check_describe(&self, name: &str) -> FleetResult<()> {
        if self.fail_describe.contains(name) {
            Err(FleetError::upstream(format!("describe {} throttled", name)))
        } else {
            Ok(())
        }
    }

    fn require_cluster(&self, cluster: &str) -> FleetResult<&ClusterDescriptor> {
        self.clusters
            .iter()
            .find(|c| c.name == cluster)
            .ok_or_else(|| FleetError::NotFound(format!("cluster {}", cluster)))
    }
}

#[async_trait]
impl ControlPlane for FakeControlPlane {
    async fn list_clusters(&self) -> FleetResult<Vec<String>> {
        if self.fail_cluster_list {
            return Err(FleetError::upstream("list clusters: access denied"));
        }
        Ok(self.clusters.iter().map(|c| c.name.clone()).collect())
    }

    async fn describe_cluster(&self, name: &str) -> FleetResult<ClusterDescriptor> {
        self.check_describe(name)?;
        self.require_cluster(name).cloned()
    }

    async fn list_node_groups(&self, cluster: &str) -> FleetResult<Vec<String>> {
        self.require_cluster(cluster)?;
        Ok(self
            .node_groups
            .iter()
            .filter(|ng| ng.cluster_name == cluster)
            .map(|ng| ng.name.clone())
            .collect())
    }

    async fn describe_node_group(&self, cluster: &str, nodegroup: &str) -> FleetResult<NodeGroupDescriptor> {
        self.check_describe(nodegroup)?;
        self.node_groups
            .iter()
            .find(|ng| ng.cluster_name == cluster && ng.name == nodegroup)
            .cloned()
            .ok_or_else(|| FleetError::NotFound(format!("nodegroup {}", nodegroup)))
    }

    async fn update_node_group_scaling(
        &self,
        cluster: &str,
        nodegroup: &str,
        config: ScalingConfig,
    ) -> FleetResult<()> {
        if self.fail_update.contains(nodegroup) {
            return Err(FleetError::upstream(format!("update {} rejected", nodegroup)));
        }
        self.updates
            .lock()
            .unwrap()
            .push((cluster.to_string(), nodegroup.to_string(), config));
        Ok(())
    }

    async fn list_addons(&self, cluster: &str) -> FleetResult<Vec<String>> {
        self.require_cluster(cluster)?;
        Ok(self
            .addons
            .iter()
            .filter(|(c, _)| c == cluster)
            .map(|(_, a)| a.name.clone())
            .collect())
    }

    async fn describe_addon(&self, cluster: &str, addon: &str) -> FleetResult<AddonDescriptor> {
        self.check_describe(addon)?;
        self.addons
            .iter()
            .find(|(c, a)| c == cluster && a.name == addon)
            .map(|(_, a)| a.clone())
            .ok_or_else(|| FleetError::NotFound(format!("addon {}", addon)))
    }

    async fn describe_addon_versions(&self) -> FleetResult<Vec<AddonCompatibility>> {
        Ok(self.compatibilities.clone())
    }

    async fn cost_and_usage(&self, query: &CostQuery) -> FleetResult<f64> {
        self.cost_queries.lock().unwrap().push(query.clone());
        let amount = match query.filter {
            Some(CostFilter::ClusterTag { .. }) => self.tagged_cost,
            Some(CostFilter::Service { .. }) | None => self.service_cost,
        };
        amount.ok_or_else(|| FleetError::upstream("cost explorer unavailable"))
    }

    async fn cost_by_service(&self, query: &CostQuery) -> FleetResult<BTreeMap<String, f64>> {
        self.cost_queries.lock().unwrap().push(query.clone());
        self.service_breakdown
            .as_ref()
            .map(|services| services.iter().cloned().collect())
            .ok_or_else(|| FleetError::upstream("cost explorer unavailable"))
    }

    async fn list_tagged_resources(&self) -> FleetResult<Vec<String>> {
        self.tagged_resources
            .clone()
            .ok_or_else(|| FleetError::upstream("tagging api: access denied"))
    }

    async fn update_kubeconfig(&self, cluster: &str) -> FleetResult<String> {
        if self.fail_kubeconfig {
            return Err(FleetError::upstream("update-kubeconfig failed"));
        }
        self.require_cluster(cluster)?;
        Ok(format!("Added new context {} to kubeconfig", cluster))
    }
}

#[derive(Default)]
pub struct FakeClusterCli {
    items: BTreeMap<ResourceKind, Vec<Value>>,
    failing: BTreeSet<ResourceKind>,
    contexts: Vec<String>,
    current: Option<String>,
    fail_contexts: bool,
    fail_use_context: bool,
    selected: Mutex<Vec<String>>,
    calls: Mutex<Vec<(String, ResourceKind, NamespaceScope)>>,
}

impl FakeClusterCli {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_items(mut self, kind: ResourceKind, items: Vec<Value>) -> Self {
        self.items.insert(kind, items);
        self
    }

    pub fn failing(mut self, kind: ResourceKind) -> Self {
        self.failing.insert(kind);
        self
    }

    pub fn with_contexts(mut self, contexts: &[&str], current: Option<&str>) -> Self {
        self.contexts = contexts.iter().map(|c| c.to_string()).collect();
        self.current = current.map(str::to_string);
        self
    }

    pub fn failing_contexts(mut self) -> Self {
        self.fail_contexts = true;
        self
    }

    pub fn failing_use_context(mut self) -> Self {
        self.fail_use_context = true;
        self
    }

    /// Contexts passed to `use_context`, in call order
    pub fn selected(&self) -> Vec<String> {
        self.selected.lock().unwrap().clone()
    }

    pub fn calls(&self) -> Vec<(String, ResourceKind, NamespaceScope)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ClusterCli for FakeClusterCli {
    async fn get(
        &self,
        context: &ClusterContext,
        kind: ResourceKind,
        scope: &NamespaceScope,
    ) -> FleetResult<Vec<Value>> {
        self.calls
            .lock()
            .unwrap()
            .push((context.to_string(), kind, scope.clone()));

        if self.failing.contains(&kind) {
            return Err(FleetError::upstream(format!("kubectl get {} timed out", kind.cli_name())));
        }

        let items = self.items.get(&kind).cloned().unwrap_or_default();
        Ok(match scope {
            NamespaceScope::All => items,
            NamespaceScope::Namespace(ns) => items
                .into_iter()
                .filter(|item| item["metadata"]["namespace"].as_str() == Some(ns.as_str()))
                .collect(),
        })
    }

    async fn contexts(&self) -> FleetResult<Vec<String>> {
        if self.fail_contexts {
            return Err(FleetError::upstream("kubeconfig unreadable"));
        }
        Ok(self.contexts.clone())
    }

    async fn current_context(&self) -> FleetResult<Option<String>> {
        Ok(self.current.clone())
    }

    async fn use_context(&self, context: &ClusterContext) -> FleetResult<()> {
        if self.fail_use_context {
            return Err(FleetError::upstream(format!("no context exists with the name: \"{}\"", context)));
        }
        self.selected.lock().unwrap().push(context.to_string());
        Ok(())
    }

    async fn cluster_info(&self, context: &ClusterContext) -> FleetResult<String> {
        if self.fail_contexts {
            return Err(FleetError::upstream("cluster unreachable"));
        }
        Ok(format!("Kubernetes control plane for {} is running", context))
    }
}
