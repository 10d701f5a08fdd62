//! Fleet service facade
//!
//! One entry point per console operation. Reads degrade to results carrying
//! an `error` field; mutations surface failures as `Err`. Every upstream
//! call feeds the health registry and, on failure, the structured log.

use crate::aggregation::{summarize_fleet, summarize_namespace, FleetSummary, NamespaceSummary};
use crate::cost::{ClusterCosts, CostAssessor, CostSettings, CostSummary, ServiceCost};
use crate::error::{FleetError, FleetResult};
use crate::health::{components, HealthRegistry, UpstreamTracker};
use crate::inventory::{count_by_service, ResourceCount};
use crate::models::{
    AddonDescriptor, ClusterContext, ClusterDescriptor, ClusterInfo, ContextInfo, ContextList,
    Described, Listing, NamespaceScope, NodeGroupDescriptor, ScalingConfig,
};
use crate::normalizer::{normalize, ResourceDescriptor, ResourceKind};
use crate::observability::{FleetMetrics, StructuredLogger};
use crate::scaling::{
    plan_scale, NodeGroupOutcome, ScaleBatchResult, ScalePolicy, ScaleRequest, ScaleResult,
    ScalingStatus,
};
use crate::upstream::{ClusterCli, ControlPlane};
use crate::version::{assess_upgrade, UpgradeStatus, VersionCatalog, VersionSet};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// Result of selecting a CLI context
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextSwitch {
    pub context: String,
    pub message: String,
}

/// Result of wiring a managed cluster into the local CLI configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectResult {
    pub cluster_name: String,
    pub context: String,
    pub message: String,
    pub output: String,
}

/// Run `task` once per name concurrently; results come back in input order.
async fn fan_out<T, F, Fut>(names: Vec<String>, task: F) -> Vec<(String, FleetResult<T>)>
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = FleetResult<T>> + Send + 'static,
    T: Send + 'static,
{
    let mut set = JoinSet::new();
    for (index, name) in names.iter().enumerate() {
        let fut = task(name.clone());
        set.spawn(async move { (index, fut.await) });
    }

    let mut slots: Vec<Option<FleetResult<T>>> = names.iter().map(|_| None).collect();
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok((index, result)) => slots[index] = Some(result),
            Err(e) => warn!(error = %e, "Fan-out task did not complete"),
        }
    }

    names
        .into_iter()
        .zip(slots)
        .map(|(name, slot)| {
            let result = slot.unwrap_or_else(|| {
                Err(FleetError::upstream(format!("task for {} did not complete", name)))
            });
            (name, result)
        })
        .collect()
}

async fn apply_policy(
    plane: Arc<dyn ControlPlane>,
    cluster: String,
    nodegroup: String,
    policy: ScalePolicy,
) -> FleetResult<ScalingConfig> {
    let current = plane.describe_node_group(&cluster, &nodegroup).await?;
    let planned = policy.plan(&current.scaling_config)?;
    plane
        .update_node_group_scaling(&cluster, &nodegroup, planned)
        .await?;
    Ok(planned)
}

/// Facade over both upstreams
#[derive(Clone)]
pub struct FleetService {
    plane: Arc<dyn ControlPlane>,
    cli: Arc<dyn ClusterCli>,
    tracker: UpstreamTracker,
    metrics: FleetMetrics,
    logger: StructuredLogger,
    costs: CostAssessor,
}

impl FleetService {
    pub fn new(
        plane: Arc<dyn ControlPlane>,
        cli: Arc<dyn ClusterCli>,
        health: HealthRegistry,
        logger: StructuredLogger,
        cost_settings: CostSettings,
    ) -> Self {
        let metrics = FleetMetrics::new();
        let tracker = UpstreamTracker::new(health, logger.clone());
        let costs = CostAssessor::new(plane.clone(), cost_settings, metrics.clone(), tracker.clone());

        Self {
            plane,
            cli,
            tracker,
            metrics,
            logger,
            costs,
        }
    }

    pub fn health(&self) -> &HealthRegistry {
        self.tracker.health()
    }

    async fn tracked<T>(&self, component: &str, operation: &str, result: FleetResult<T>) -> FleetResult<T> {
        self.tracker.track(component, operation, result).await
    }

    /// Known contexts with the currently selected one flagged
    pub async fn list_contexts(&self) -> ContextList {
        let contexts = self.cli.contexts().await;
        let contexts = match self.tracked(components::CLUSTER_CLI, "contexts", contexts).await {
            Ok(contexts) => contexts,
            Err(e) => {
                return ContextList {
                    contexts: Vec::new(),
                    current_context: None,
                    error: Some(e.to_string()),
                }
            }
        };

        let current = self.cli.current_context().await;
        let current_context = self
            .tracked(components::CLUSTER_CLI, "current_context", current)
            .await
            .unwrap_or_else(|e| {
                debug!(error = %e, "Current context unavailable");
                None
            });

        ContextList {
            contexts: contexts
                .into_iter()
                .map(|name| ContextInfo {
                    is_current: current_context.as_deref() == Some(name.as_str()),
                    name,
                })
                .collect(),
            current_context,
            error: None,
        }
    }

    pub async fn switch_context(&self, context: &ClusterContext) -> FleetResult<ContextSwitch> {
        let result = self.cli.use_context(context).await;
        self.tracked(components::CLUSTER_CLI, "use_context", result).await?;
        self.logger.log_context_switched(context.as_str());

        Ok(ContextSwitch {
            context: context.to_string(),
            message: format!("Switched to context {}", context),
        })
    }

    pub async fn cluster_info(&self, context: &ClusterContext) -> ClusterInfo {
        let result = self.cli.cluster_info(context).await;
        match self.tracked(components::CLUSTER_CLI, "cluster_info", result).await {
            Ok(info) => ClusterInfo {
                info: Some(info),
                error: None,
            },
            Err(e) => ClusterInfo {
                info: None,
                error: Some(e.to_string()),
            },
        }
    }

    /// Fetch and normalize one resource kind
    pub async fn list_resources(
        &self,
        context: &ClusterContext,
        kind: ResourceKind,
        scope: &NamespaceScope,
    ) -> Listing<ResourceDescriptor> {
        let raw = self.cli.get(context, kind, scope).await;
        let raw = self.tracked(components::CLUSTER_CLI, "get", raw).await;
        normalize(kind, raw)
    }

    async fn summary_listings(
        &self,
        context: &ClusterContext,
        scope: &NamespaceScope,
    ) -> (
        Listing<ResourceDescriptor>,
        Listing<ResourceDescriptor>,
        Listing<ResourceDescriptor>,
    ) {
        tokio::join!(
            self.list_resources(context, ResourceKind::Pod, scope),
            self.list_resources(context, ResourceKind::Deployment, scope),
            self.list_resources(context, ResourceKind::Service, scope),
        )
    }

    pub async fn fleet_summary(&self, context: &ClusterContext) -> FleetSummary {
        let (pods, deployments, services) = self.summary_listings(context, &NamespaceScope::All).await;
        summarize_fleet(&pods, &deployments, &services)
    }

    pub async fn namespace_summary(&self, context: &ClusterContext, namespace: &str) -> NamespaceSummary {
        let scope = NamespaceScope::Namespace(namespace.to_string());
        let (pods, deployments, services) = self.summary_listings(context, &scope).await;
        summarize_namespace(namespace, &pods, &deployments, &services)
    }

    /// Every cluster, described concurrently; a failed describe becomes `{name, error}`
    pub async fn list_clusters(&self) -> Listing<Described<ClusterDescriptor>> {
        let names = self.plane.list_clusters().await;
        let names = match self.tracked(components::CLOUD_API, "list_clusters", names).await {
            Ok(names) => names,
            Err(e) => return Listing::failed(&e),
        };

        let plane = self.plane.clone();
        let described = fan_out(names, move |name| {
            let plane = plane.clone();
            async move { plane.describe_cluster(&name).await }
        })
        .await;

        self.collect_described(described, "describe_cluster").await
    }

    pub async fn describe_cluster(&self, name: &str) -> FleetResult<ClusterDescriptor> {
        let result = self.plane.describe_cluster(name).await;
        self.tracked(components::CLOUD_API, "describe_cluster", result).await
    }

    async fn collect_described<T>(
        &self,
        described: Vec<(String, FleetResult<T>)>,
        operation: &str,
    ) -> Listing<Described<T>> {
        let mut items = Vec::with_capacity(described.len());
        for (name, result) in described {
            let result = self.tracked(components::CLOUD_API, operation, result).await;
            items.push(Described::from_result(&name, result));
        }
        Listing::ok(items)
    }

    async fn node_group_names(&self, cluster: &str) -> FleetResult<Vec<String>> {
        let names = self.plane.list_node_groups(cluster).await;
        self.tracked(components::CLOUD_API, "list_node_groups", names).await
    }

    async fn describe_node_groups(&self, cluster: &str, names: Vec<String>) -> Vec<Described<NodeGroupDescriptor>> {
        let plane = self.plane.clone();
        let cluster_name = cluster.to_string();
        let described = fan_out(names, move |name| {
            let plane = plane.clone();
            let cluster = cluster_name.clone();
            async move { plane.describe_node_group(&cluster, &name).await }
        })
        .await;

        self.collect_described(described, "describe_node_group").await.items
    }

    pub async fn list_node_groups(&self, cluster: &str) -> Listing<Described<NodeGroupDescriptor>> {
        match self.node_group_names(cluster).await {
            Ok(names) => Listing::ok(self.describe_node_groups(cluster, names).await),
            Err(e) => Listing::failed(&e),
        }
    }

    pub async fn list_addons(&self, cluster: &str) -> Listing<Described<AddonDescriptor>> {
        let names = self.plane.list_addons(cluster).await;
        let names = match self.tracked(components::CLOUD_API, "list_addons", names).await {
            Ok(names) => names,
            Err(e) => return Listing::failed(&e),
        };

        let plane = self.plane.clone();
        let cluster_name = cluster.to_string();
        let described = fan_out(names, move |name| {
            let plane = plane.clone();
            let cluster = cluster_name.clone();
            async move { plane.describe_addon(&cluster, &name).await }
        })
        .await;

        self.collect_described(described, "describe_addon").await
    }

    /// Capacity of every node group and whether the cluster has workers requested
    pub async fn scaling_status(&self, cluster: &str) -> FleetResult<ScalingStatus> {
        let names = self.node_group_names(cluster).await?;
        let nodegroups = self.describe_node_groups(cluster, names).await;
        Ok(ScalingStatus::from_node_groups(cluster, nodegroups))
    }

    fn record_scaling(&self, cluster: &str, nodegroup: &str, result: &FleetResult<ScalingConfig>) {
        match result {
            Ok(config) => {
                self.metrics.inc_scaling_operation("applied");
                self.logger.log_nodegroup_scaled(
                    cluster,
                    nodegroup,
                    config.min_size,
                    config.desired_size,
                    config.max_size,
                );
            }
            Err(e) => {
                let outcome = match e {
                    FleetError::InvalidState(_) => "rejected",
                    _ => "failed",
                };
                self.metrics.inc_scaling_operation(outcome);
                self.logger
                    .log_nodegroup_scale_failed(cluster, nodegroup, &e.to_string());
            }
        }
    }

    /// Scale one node group; missing bounds are derived from the current config
    pub async fn scale_node_group(
        &self,
        cluster: &str,
        nodegroup: &str,
        request: &ScaleRequest,
    ) -> FleetResult<ScaleResult> {
        let current = self.plane.describe_node_group(cluster, nodegroup).await;
        let current = self
            .tracked(components::CLOUD_API, "describe_node_group", current)
            .await?
            .scaling_config;

        let planned = plan_scale(&current, request);
        let applied = match planned {
            Ok(config) => {
                let sent = self
                    .plane
                    .update_node_group_scaling(cluster, nodegroup, config)
                    .await;
                self.tracked(components::CLOUD_API, "update_node_group_scaling", sent)
                    .await
                    .map(|_| config)
            }
            Err(e) => Err(e),
        };
        self.record_scaling(cluster, nodegroup, &applied);
        let new_config = applied?;

        Ok(ScaleResult {
            cluster_name: cluster.to_string(),
            nodegroup: nodegroup.to_string(),
            message: format!("Scaling {} to {} nodes", nodegroup, request.desired_size),
            previous_config: current,
            new_config,
        })
    }

    async fn apply_to_all(&self, cluster: &str, policy: ScalePolicy) -> FleetResult<ScaleBatchResult> {
        let names = self.node_group_names(cluster).await?;

        let plane = self.plane.clone();
        let cluster_name = cluster.to_string();
        let applied = fan_out(names, move |nodegroup| {
            apply_policy(plane.clone(), cluster_name.clone(), nodegroup, policy)
        })
        .await;

        let mut results = Vec::with_capacity(applied.len());
        for (nodegroup, result) in applied {
            let result = self
                .tracked(components::CLOUD_API, policy.outcome_label(), result)
                .await;
            self.record_scaling(cluster, &nodegroup, &result);
            results.push(match result {
                Ok(config) => NodeGroupOutcome::applied(&nodegroup, &policy, config),
                Err(e) => NodeGroupOutcome::failed(&nodegroup, &e),
            });
        }

        Ok(ScaleBatchResult::new(cluster, &policy, results))
    }

    /// desired = 0, min = 0, max kept, for every node group
    pub async fn scale_down(&self, cluster: &str) -> FleetResult<ScaleBatchResult> {
        self.apply_to_all(cluster, ScalePolicy::DownToZero).await
    }

    /// desired = max(per_group, min) for every node group
    pub async fn scale_up(&self, cluster: &str, per_group: u32) -> FleetResult<ScaleBatchResult> {
        self.apply_to_all(cluster, ScalePolicy::Up { per_group }).await
    }

    /// Add kubeconfig credentials for the cluster and select its context
    pub async fn connect_cluster(&self, cluster: &str) -> FleetResult<ConnectResult> {
        let output = self.plane.update_kubeconfig(cluster).await;
        let output = self
            .tracked(components::CLOUD_API, "update_kubeconfig", output)
            .await?;

        let context = ClusterContext::new(cluster);
        self.switch_context(&context).await?;

        Ok(ConnectResult {
            cluster_name: cluster.to_string(),
            context: context.to_string(),
            message: format!("Connected to cluster {}", cluster),
            output,
        })
    }

    async fn known_versions(&self) -> FleetResult<VersionSet> {
        let compat = self.plane.describe_addon_versions().await;
        let compat = self
            .tracked(components::CLOUD_API, "describe_addon_versions", compat)
            .await?;
        Ok(VersionSet::from_compatibilities(&compat))
    }

    pub async fn available_versions(&self) -> VersionCatalog {
        match self.known_versions().await {
            Ok(set) => VersionCatalog::from_set(&set),
            Err(e) => VersionCatalog::failed(&e),
        }
    }

    pub async fn upgrade_status(&self, cluster: &str) -> FleetResult<UpgradeStatus> {
        let descriptor = self.describe_cluster(cluster).await?;
        let current = descriptor
            .version
            .ok_or_else(|| FleetError::InvalidState(format!("cluster {} reports no version", cluster)))?;

        let known = self.known_versions().await?;
        assess_upgrade(cluster, &current, &known)
    }

    pub async fn cluster_costs(&self, cluster: &str) -> ClusterCosts {
        self.costs
            .cluster_costs(cluster, chrono::Utc::now().date_naive())
            .await
    }

    pub async fn costs_summary(&self) -> CostSummary {
        self.costs.summary(chrono::Utc::now().date_naive()).await
    }

    pub async fn cost_by_service(&self) -> Listing<ServiceCost> {
        self.costs.by_service(chrono::Utc::now().date_naive()).await
    }

    /// Tagged account resources counted per owning service
    pub async fn resource_counts(&self) -> Listing<ResourceCount> {
        let arns = self.plane.list_tagged_resources().await;
        let arns = self
            .tracked(components::CLOUD_API, "list_tagged_resources", arns)
            .await;
        Listing::from_result(arns.map(count_by_service))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cost::CostAmount;
    use crate::fakes::{FakeClusterCli, FakeControlPlane};
    use crate::health::ComponentStatus;
    use crate::scaling::ClusterState;
    use serde_json::json;
    use tokio_test::{assert_err, assert_ok};

    struct Harness {
        service: FleetService,
        plane: Arc<FakeControlPlane>,
        cli: Arc<FakeClusterCli>,
    }

    fn harness(plane: FakeControlPlane, cli: FakeClusterCli) -> Harness {
        let plane = Arc::new(plane);
        let cli = Arc::new(cli);
        let service = FleetService::new(
            plane.clone(),
            cli.clone(),
            HealthRegistry::new(),
            StructuredLogger::new("test"),
            CostSettings::default(),
        );
        Harness { service, plane, cli }
    }

    fn ctx() -> ClusterContext {
        ClusterContext::new("prod")
    }

    #[tokio::test]
    async fn test_list_contexts_marks_current() {
        let h = harness(
            FakeControlPlane::new(),
            FakeClusterCli::new().with_contexts(&["prod", "dev"], Some("dev")),
        );

        let list = h.service.list_contexts().await;
        assert_eq!(list.current_context.as_deref(), Some("dev"));
        assert!(!list.contexts[0].is_current);
        assert!(list.contexts[1].is_current);
        assert!(list.error.is_none());
    }

    #[tokio::test]
    async fn test_list_contexts_failure_degrades() {
        let h = harness(FakeControlPlane::new(), FakeClusterCli::new().failing_contexts());

        let list = h.service.list_contexts().await;
        assert!(list.contexts.is_empty());
        assert!(list.error.is_some());

        let health = h.service.health().health().await;
        assert_eq!(health.components[components::CLUSTER_CLI].status, ComponentStatus::Degraded);
    }

    #[tokio::test]
    async fn test_switch_context_failure_surfaces() {
        let h = harness(FakeControlPlane::new(), FakeClusterCli::new().failing_use_context());
        assert_err!(h.service.switch_context(&ClusterContext::new("ghost")).await);
    }

    #[tokio::test]
    async fn test_list_resources_passes_scope_and_context() {
        let h = harness(
            FakeControlPlane::new(),
            FakeClusterCli::new().with_items(
                ResourceKind::Pod,
                vec![
                    json!({"metadata": {"name": "a", "namespace": "shop"}, "status": {"phase": "Running"}}),
                    json!({"metadata": {"name": "b", "namespace": "batch"}}),
                ],
            ),
        );

        let scope = NamespaceScope::Namespace("shop".into());
        let listing = h.service.list_resources(&ctx(), ResourceKind::Pod, &scope).await;

        assert_eq!(listing.items.len(), 1);
        assert_eq!(listing.items[0].name, "a");
        assert_eq!(h.cli.calls(), vec![("prod".to_string(), ResourceKind::Pod, scope)]);
    }

    #[tokio::test]
    async fn test_list_resources_error_is_distinct_from_empty() {
        let h = harness(FakeControlPlane::new(), FakeClusterCli::new().failing(ResourceKind::Secret));

        let failed = h.service.list_resources(&ctx(), ResourceKind::Secret, &NamespaceScope::All).await;
        assert!(failed.items.is_empty() && failed.is_error());

        let empty = h.service.list_resources(&ctx(), ResourceKind::ConfigMap, &NamespaceScope::All).await;
        assert!(empty.items.is_empty() && !empty.is_error());
    }

    #[tokio::test]
    async fn test_fleet_summary_joins_three_fetches() {
        let h = harness(
            FakeControlPlane::new(),
            FakeClusterCli::new()
                .with_items(
                    ResourceKind::Pod,
                    vec![json!({"metadata": {"name": "a", "namespace": "shop"}, "status": {"phase": "Pending"}})],
                )
                .with_items(
                    ResourceKind::Service,
                    vec![json!({"metadata": {"name": "s", "namespace": "edge"}})],
                )
                .failing(ResourceKind::Deployment),
        );

        let summary = h.service.fleet_summary(&ctx()).await;
        assert_eq!(summary.total_counts.namespaces, 2);
        assert_eq!(summary.pod_statuses["Pending"], 1);
        assert!(summary.errors.contains_key(&ResourceKind::Deployment));
        assert_eq!(h.cli.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_namespace_summary_scopes_fetches() {
        let h = harness(
            FakeControlPlane::new(),
            FakeClusterCli::new().with_items(
                ResourceKind::Pod,
                vec![
                    json!({"metadata": {"name": "a", "namespace": "shop"}, "status": {"phase": "Running"}}),
                    json!({"metadata": {"name": "b", "namespace": "other"}, "status": {"phase": "Running"}}),
                ],
            ),
        );

        let summary = h.service.namespace_summary(&ctx(), "shop").await;
        assert_eq!(summary.namespace, "shop");
        assert_eq!(summary.counts.pods, 1);
        assert!(h
            .cli
            .calls()
            .iter()
            .all(|(_, _, scope)| *scope == NamespaceScope::Namespace("shop".into())));
    }

    #[tokio::test]
    async fn test_list_clusters_keeps_failed_describes_in_order() {
        let h = harness(
            FakeControlPlane::new()
                .with_clusters(&["alpha", "beta", "gamma"])
                .failing_describe("beta"),
            FakeClusterCli::new(),
        );

        let listing = h.service.list_clusters().await;
        assert!(listing.error.is_none());
        assert_eq!(listing.items.len(), 3);
        assert_eq!(listing.items[0].ok().map(|c| c.name.as_str()), Some("alpha"));
        assert!(matches!(&listing.items[1], Described::Failed(f) if f.name == "beta"));
        assert_eq!(listing.items[2].ok().map(|c| c.name.as_str()), Some("gamma"));
    }

    #[tokio::test]
    async fn test_list_clusters_failure_degrades() {
        let h = harness(FakeControlPlane::new().failing_cluster_list(), FakeClusterCli::new());
        let listing = h.service.list_clusters().await;
        assert!(listing.items.is_empty() && listing.is_error());
    }

    #[tokio::test]
    async fn test_describe_missing_cluster_is_not_found() {
        let h = harness(FakeControlPlane::new(), FakeClusterCli::new());
        let err = h.service.describe_cluster("ghost").await.unwrap_err();
        assert!(matches!(err, FleetError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_scale_node_group_derives_bounds() {
        let h = harness(
            FakeControlPlane::new().with_node_group("prod", "general", ScalingConfig::new(2, 3, 5)),
            FakeClusterCli::new(),
        );

        let result = h
            .service
            .scale_node_group("prod", "general", &ScaleRequest::desired(8))
            .await
            .unwrap();

        assert_eq!(result.previous_config, ScalingConfig::new(2, 3, 5));
        assert_eq!(result.new_config, ScalingConfig::new(2, 8, 8));
        assert_eq!(
            h.plane.updates(),
            vec![("prod".to_string(), "general".to_string(), ScalingConfig::new(2, 8, 8))]
        );
    }

    #[tokio::test]
    async fn test_invalid_explicit_request_sends_nothing() {
        let h = harness(
            FakeControlPlane::new().with_node_group("prod", "general", ScalingConfig::new(1, 2, 4)),
            FakeClusterCli::new(),
        );
        let request = ScaleRequest {
            desired_size: 2,
            min_size: Some(3),
            max_size: None,
        };

        let err = h.service.scale_node_group("prod", "general", &request).await.unwrap_err();
        assert!(matches!(err, FleetError::InvalidState(_)));
        assert!(h.plane.updates().is_empty());
    }

    #[tokio::test]
    async fn test_scale_down_partial_success() {
        let h = harness(
            FakeControlPlane::new()
                .with_node_group("prod", "general", ScalingConfig::new(1, 3, 6))
                .with_node_group("prod", "gpu", ScalingConfig::new(0, 1, 2))
                .with_node_group("prod", "spot", ScalingConfig::new(2, 2, 10))
                .failing_update("gpu"),
            FakeClusterCli::new(),
        );

        let batch = h.service.scale_down("prod").await.unwrap();

        let names: Vec<&str> = batch.results.iter().map(|r| r.nodegroup.as_str()).collect();
        assert_eq!(names, vec!["general", "gpu", "spot"]);
        assert_eq!((batch.succeeded, batch.failed), (2, 1));
        assert_eq!(batch.results[0].new_config, Some(ScalingConfig::new(0, 0, 6)));
        assert!(batch.results[1].error.is_some());
        assert_eq!(batch.results[2].new_config, Some(ScalingConfig::new(0, 0, 10)));
    }

    #[tokio::test]
    async fn test_scale_up_respects_floor_and_ceiling() {
        let h = harness(
            FakeControlPlane::new()
                .with_node_group("prod", "general", ScalingConfig::new(5, 0, 10))
                .with_node_group("prod", "tiny", ScalingConfig::new(0, 0, 1)),
            FakeClusterCli::new(),
        );

        let batch = h.service.scale_up("prod", 2).await.unwrap();

        assert_eq!(batch.results[0].new_config, Some(ScalingConfig::new(5, 5, 10)));
        assert_eq!(batch.results[0].status.as_deref(), Some("scaling_up"));
        assert!(batch.results[1].error.as_deref().unwrap().contains("invalid state"));
        assert_eq!(h.plane.updates().len(), 1);
    }

    #[tokio::test]
    async fn test_scale_unknown_cluster_fails_whole_batch() {
        let h = harness(FakeControlPlane::new(), FakeClusterCli::new());
        let err = h.service.scale_down("ghost").await.unwrap_err();
        assert!(matches!(err, FleetError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_scaling_status() {
        let h = harness(
            FakeControlPlane::new()
                .with_node_group("prod", "general", ScalingConfig::new(0, 0, 3))
                .with_node_group("prod", "batch", ScalingConfig::new(0, 0, 3)),
            FakeClusterCli::new(),
        );

        let status = h.service.scaling_status("prod").await.unwrap();
        assert_eq!(status.cluster_state, ClusterState::ScaledDown);
        assert_eq!(status.nodegroups.len(), 2);
    }

    #[tokio::test]
    async fn test_connect_updates_kubeconfig_then_selects_context() {
        let h = harness(FakeControlPlane::new().with_clusters(&["prod"]), FakeClusterCli::new());

        let result = assert_ok!(h.service.connect_cluster("prod").await);
        assert_eq!(result.context, "prod");
        assert_eq!(h.cli.selected(), vec!["prod"]);
    }

    #[tokio::test]
    async fn test_connect_surfaces_kubeconfig_failure() {
        let h = harness(
            FakeControlPlane::new().with_clusters(&["prod"]).failing_kubeconfig(),
            FakeClusterCli::new(),
        );

        assert_err!(h.service.connect_cluster("prod").await);
        assert!(h.cli.selected().is_empty());
    }

    #[tokio::test]
    async fn test_upgrade_status_and_versions() {
        let h = harness(
            FakeControlPlane::new()
                .with_cluster("prod", "1.28")
                .with_cluster_versions(&["1.28", "1.29", "1.30", "1.9"]),
            FakeClusterCli::new(),
        );

        let catalog = h.service.available_versions().await;
        assert_eq!(catalog.latest_version.as_deref(), Some("1.30"));

        let status = h.service.upgrade_status("prod").await.unwrap();
        assert!(!status.is_up_to_date);
        assert_eq!(status.available_upgrades, vec!["1.29", "1.30"]);
    }

    #[tokio::test]
    async fn test_cost_failures_degrade_cloud_api() {
        let h = harness(FakeControlPlane::new().failing_cluster_list(), FakeClusterCli::new());
        h.service.health().register(components::CLOUD_API).await;

        let costs = h.service.cluster_costs("prod").await;
        assert!(costs.costs.iter().all(|(_, amount)| *amount == CostAmount::Unavailable));

        let summary = h.service.costs_summary().await;
        assert!(summary.error.unwrap().contains("access denied"));

        let health = h.service.health().health().await;
        assert_eq!(health.components[components::CLOUD_API].status, ComponentStatus::Degraded);
    }

    #[tokio::test]
    async fn test_cost_by_service_ranks_spend() {
        let h = harness(
            FakeControlPlane::new().with_service_breakdown(&[
                ("Amazon Simple Storage Service", 3.456),
                ("Amazon Elastic Container Service for Kubernetes", 73.0),
                ("Tax", 0.0),
            ]),
            FakeClusterCli::new(),
        );

        let services = h.service.cost_by_service().await;
        assert!(services.error.is_none());
        let names: Vec<_> = services.items.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["Amazon Elastic Container Service for Kubernetes", "Amazon Simple Storage Service"]
        );
        assert_eq!(services.items[1].cost, 3.46);
    }

    #[tokio::test]
    async fn test_resource_counts() {
        let h = harness(
            FakeControlPlane::new().with_tagged_resources(&[
                "arn:aws:eks:eu-west-1:123456789012:cluster/prod",
                "arn:aws:ec2:eu-west-1:123456789012:instance/i-1",
                "arn:aws:ec2:eu-west-1:123456789012:instance/i-2",
            ]),
            FakeClusterCli::new(),
        );

        let counts = h.service.resource_counts().await;
        assert!(counts.error.is_none());
        assert_eq!(counts.items[0], ResourceCount { service: "ec2".into(), count: 2 });
        assert_eq!(counts.items[1].service, "eks");
    }

    #[tokio::test]
    async fn test_resource_counts_failure_degrades() {
        let h = harness(FakeControlPlane::new(), FakeClusterCli::new());
        h.service.health().register(components::CLOUD_API).await;

        let counts = h.service.resource_counts().await;
        assert!(counts.items.is_empty());
        assert!(counts.error.unwrap().contains("access denied"));

        let health = h.service.health().health().await;
        assert_eq!(health.components[components::CLOUD_API].status, ComponentStatus::Degraded);
    }

    #[tokio::test]
    async fn test_list_addons_and_node_groups() {
        let h = harness(
            FakeControlPlane::new()
                .with_node_group("prod", "general", ScalingConfig::new(1, 1, 2))
                .with_addon("prod", "coredns", "v1.11.1")
                .with_addon("prod", "kube-proxy", "v1.29.0")
                .failing_describe("kube-proxy"),
            FakeClusterCli::new(),
        );

        let addons = h.service.list_addons("prod").await;
        assert_eq!(addons.items.len(), 2);
        assert!(addons.items[1].ok().is_none());

        let groups = h.service.list_node_groups("prod").await;
        assert_eq!(groups.items[0].ok().map(|g| g.name.as_str()), Some("general"));

        let missing = h.service.list_node_groups("ghost").await;
        assert!(missing.is_error());
    }
}
