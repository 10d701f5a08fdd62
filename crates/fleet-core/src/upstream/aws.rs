//! Cloud control-plane adapter over the vendor CLI
//!
//! Every call runs `aws <service> <operation> ... --output json` through a
//! [`CommandRunner`]. Error classes are recovered from the exception name the
//! CLI prints on stderr.

use super::command::{CommandOutput, CommandRunner};
use super::ControlPlane;
use crate::cost::CostQuery;
use crate::error::{FleetError, FleetResult};
use crate::models::{
    null_as_default, AddonCompatibility, AddonDescriptor, ClusterDescriptor, NodeGroupDescriptor,
    ScalingConfig,
};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;

/// Region, profile and timeout for vendor CLI calls
#[derive(Debug, Clone)]
pub struct AwsSettings {
    pub region: Option<String>,
    pub profile: Option<String>,
    pub command_timeout: Duration,
}

impl Default for AwsSettings {
    fn default() -> Self {
        Self {
            region: None,
            profile: None,
            command_timeout: Duration::from_secs(30),
        }
    }
}

/// [`ControlPlane`] backed by the `aws` CLI
#[derive(Debug, Clone)]
pub struct AwsCli {
    runner: CommandRunner,
    settings: AwsSettings,
}

#[derive(Deserialize)]
struct ClusterList {
    #[serde(default, deserialize_with = "null_as_default")]
    clusters: Vec<String>,
}

#[derive(Deserialize)]
struct ClusterEnvelope {
    cluster: ClusterDescriptor,
}

#[derive(Deserialize)]
struct NodeGroupList {
    #[serde(default, deserialize_with = "null_as_default")]
    nodegroups: Vec<String>,
}

#[derive(Deserialize)]
struct NodeGroupEnvelope {
    nodegroup: NodeGroupDescriptor,
}

#[derive(Deserialize)]
struct AddonList {
    #[serde(default, deserialize_with = "null_as_default")]
    addons: Vec<String>,
}

#[derive(Deserialize)]
struct AddonEnvelope {
    addon: AddonDescriptor,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Compatibility {
    cluster_version: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddonRelease {
    addon_version: String,
    #[serde(default, deserialize_with = "null_as_default")]
    compatibilities: Vec<Compatibility>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddonVersions {
    addon_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    addon_versions: Vec<AddonRelease>,
}

#[derive(Deserialize)]
struct AddonVersionsResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    addons: Vec<AddonVersions>,
}

#[derive(Deserialize)]
struct MetricValue {
    #[serde(rename = "Amount")]
    amount: String,
}

impl MetricValue {
    fn parse(&self) -> FleetResult<f64> {
        self.amount
            .parse::<f64>()
            .map_err(|_| FleetError::upstream(format!("malformed cost amount '{}'", self.amount)))
    }
}

#[derive(Deserialize)]
struct CostGroup {
    #[serde(rename = "Keys", default, deserialize_with = "null_as_default")]
    keys: Vec<String>,
    #[serde(rename = "Metrics", default, deserialize_with = "null_as_default")]
    metrics: BTreeMap<String, MetricValue>,
}

#[derive(Deserialize)]
struct ResultByTime {
    #[serde(rename = "Total", default, deserialize_with = "null_as_default")]
    total: BTreeMap<String, MetricValue>,
    #[serde(rename = "Groups", default, deserialize_with = "null_as_default")]
    groups: Vec<CostGroup>,
}

#[derive(Deserialize)]
struct CostResponse {
    #[serde(rename = "ResultsByTime", default, deserialize_with = "null_as_default")]
    results_by_time: Vec<ResultByTime>,
}

#[derive(Deserialize)]
struct ResourceTagMapping {
    #[serde(rename = "ResourceARN")]
    resource_arn: String,
}

#[derive(Deserialize)]
struct TaggedResources {
    #[serde(rename = "ResourceTagMappingList", default, deserialize_with = "null_as_default")]
    mappings: Vec<ResourceTagMapping>,
}

/// Map a failed invocation to the error taxonomy
fn classify(message: String, stderr: &str) -> FleetError {
    if stderr.contains("ResourceNotFoundException") {
        FleetError::NotFound(message)
    } else if stderr.contains("ResourceInUseException") || stderr.contains("ConflictException") {
        FleetError::Conflict(message)
    } else {
        FleetError::UpstreamUnavailable(message)
    }
}

impl AwsCli {
    pub fn new(runner: CommandRunner, settings: AwsSettings) -> Self {
        Self { runner, settings }
    }

    fn args(&self, command: &[&str]) -> Vec<String> {
        let mut args: Vec<String> = command.iter().map(|s| s.to_string()).collect();
        if let Some(region) = &self.settings.region {
            args.push("--region".to_string());
            args.push(region.clone());
        }
        if let Some(profile) = &self.settings.profile {
            args.push("--profile".to_string());
            args.push(profile.clone());
        }
        args.push("--output".to_string());
        args.push("json".to_string());
        args
    }

    async fn invoke(&self, command: &[&str]) -> FleetResult<CommandOutput> {
        let output = self
            .runner
            .run_unchecked(&self.args(command), self.settings.command_timeout)
            .await?;

        if output.success() {
            return Ok(output);
        }

        let error = classify(self.runner.exit_message(&output), &output.stderr);
        if matches!(error, FleetError::UpstreamUnavailable(_)) {
            self.runner.record_failure();
        }
        Err(error)
    }

    async fn call<T: DeserializeOwned>(&self, command: &[&str]) -> FleetResult<T> {
        let output = self.invoke(command).await?;
        Ok(serde_json::from_str(&output.stdout)?)
    }

    /// `ce get-cost-and-usage` with the query's window, metric and filter
    async fn cost_report(&self, query: &CostQuery, extra: &[&str]) -> FleetResult<CostResponse> {
        let period = format!(
            "Start={},End={}",
            query.start.format("%Y-%m-%d"),
            query.end.format("%Y-%m-%d")
        );
        let filter = query.filter.as_ref().map(|f| f.to_expression().to_string());

        let mut command = vec![
            "ce",
            "get-cost-and-usage",
            "--time-period",
            period.as_str(),
            "--granularity",
            query.granularity.as_str(),
            "--metrics",
            query.metric.as_str(),
        ];
        if let Some(filter) = &filter {
            command.push("--filter");
            command.push(filter.as_str());
        }
        command.extend_from_slice(extra);

        self.call(&command).await
    }
}

#[async_trait]
impl ControlPlane for AwsCli {
    async fn list_clusters(&self) -> FleetResult<Vec<String>> {
        let list: ClusterList = self.call(&["eks", "list-clusters"]).await?;
        Ok(list.clusters)
    }

    async fn describe_cluster(&self, name: &str) -> FleetResult<ClusterDescriptor> {
        let envelope: ClusterEnvelope = self.call(&["eks", "describe-cluster", "--name", name]).await?;
        Ok(envelope.cluster)
    }

    async fn list_node_groups(&self, cluster: &str) -> FleetResult<Vec<String>> {
        let list: NodeGroupList = self
            .call(&["eks", "list-nodegroups", "--cluster-name", cluster])
            .await?;
        Ok(list.nodegroups)
    }

    async fn describe_node_group(&self, cluster: &str, nodegroup: &str) -> FleetResult<NodeGroupDescriptor> {
        let envelope: NodeGroupEnvelope = self
            .call(&[
                "eks",
                "describe-nodegroup",
                "--cluster-name",
                cluster,
                "--nodegroup-name",
                nodegroup,
            ])
            .await?;
        Ok(envelope.nodegroup)
    }

    async fn update_node_group_scaling(
        &self,
        cluster: &str,
        nodegroup: &str,
        config: ScalingConfig,
    ) -> FleetResult<()> {
        let scaling = format!(
            "minSize={},maxSize={},desiredSize={}",
            config.min_size, config.max_size, config.desired_size
        );
        self.invoke(&[
            "eks",
            "update-nodegroup-config",
            "--cluster-name",
            cluster,
            "--nodegroup-name",
            nodegroup,
            "--scaling-config",
            scaling.as_str(),
        ])
        .await?;
        Ok(())
    }

    async fn list_addons(&self, cluster: &str) -> FleetResult<Vec<String>> {
        let list: AddonList = self.call(&["eks", "list-addons", "--cluster-name", cluster]).await?;
        Ok(list.addons)
    }

    async fn describe_addon(&self, cluster: &str, addon: &str) -> FleetResult<AddonDescriptor> {
        let envelope: AddonEnvelope = self
            .call(&[
                "eks",
                "describe-addon",
                "--cluster-name",
                cluster,
                "--addon-name",
                addon,
            ])
            .await?;
        Ok(envelope.addon)
    }

    async fn describe_addon_versions(&self) -> FleetResult<Vec<AddonCompatibility>> {
        let response: AddonVersionsResponse = self.call(&["eks", "describe-addon-versions"]).await?;

        Ok(response
            .addons
            .into_iter()
            .flat_map(|addon| {
                let addon_name = addon.addon_name;
                addon.addon_versions.into_iter().map(move |release| AddonCompatibility {
                    addon_name: addon_name.clone(),
                    addon_version: release.addon_version,
                    cluster_versions: release
                        .compatibilities
                        .into_iter()
                        .filter_map(|c| c.cluster_version)
                        .collect(),
                })
            })
            .collect())
    }

    async fn cost_and_usage(&self, query: &CostQuery) -> FleetResult<f64> {
        let response = self.cost_report(query, &[]).await?;

        response
            .results_by_time
            .iter()
            .filter_map(|result| result.total.get(&query.metric))
            .try_fold(0.0, |sum, metric| metric.parse().map(|v| sum + v))
    }

    async fn cost_by_service(&self, query: &CostQuery) -> FleetResult<BTreeMap<String, f64>> {
        let response = self
            .cost_report(query, &["--group-by", "Type=DIMENSION,Key=SERVICE"])
            .await?;

        let mut totals = BTreeMap::new();
        for group in response.results_by_time.iter().flat_map(|r| r.groups.iter()) {
            let (Some(service), Some(metric)) = (group.keys.first(), group.metrics.get(&query.metric)) else {
                continue;
            };
            *totals.entry(service.clone()).or_insert(0.0) += metric.parse()?;
        }
        Ok(totals)
    }

    async fn list_tagged_resources(&self) -> FleetResult<Vec<String>> {
        let response: TaggedResources = self
            .call(&["resourcegroupstaggingapi", "get-resources"])
            .await?;
        Ok(response.mappings.into_iter().map(|m| m.resource_arn).collect())
    }

    async fn update_kubeconfig(&self, cluster: &str) -> FleetResult<String> {
        let output = self
            .invoke(&["eks", "update-kubeconfig", "--name", cluster, "--alias", cluster])
            .await?;
        Ok(output.stdout.trim().to_string())
    }
}
