//! API client for communicating with the fleet console

use anyhow::{anyhow, Context, Result};
use fleet_core::{
    aggregation::{FleetSummary, NamespaceSummary},
    cost::{ClusterCosts, CostSummary, ServiceCost},
    inventory::ResourceCount,
    models::{
        AddonDescriptor, ClusterDescriptor, ClusterInfo, ContextList, Described, Listing,
        NodeGroupDescriptor,
    },
    normalizer::ResourceDescriptor,
    scaling::{ScaleBatchResult, ScaleRequest, ScaleResult, ScalingStatus},
    version::{UpgradeStatus, VersionCatalog},
    ConnectResult, ContextSwitch,
};
use reqwest::{Client, RequestBuilder};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};
use url::Url;

/// Error body returned by the console
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// API client for the fleet console
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a new API client
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .context("Failed to create HTTP client")?;

        let base_url = Url::parse(base_url).context("Invalid API URL")?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("Invalid API URL: {}", base_url);
        }

        Ok(Self { client, base_url })
    }

    /// Build an endpoint URL; each segment is percent-encoded
    fn url(&self, segments: &[&str], query: &[(&str, String)]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow!("Invalid API URL: {}", self.base_url))?
            .pop_if_empty()
            .extend(segments);
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request.send().await.context("Failed to send request")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error)
                .unwrap_or(body);
            anyhow::bail!("API error ({}): {}", status, message);
        }

        response.json().await.context("Failed to parse response")
    }

    /// Make a GET request
    async fn get<T: DeserializeOwned>(&self, segments: &[&str], query: &[(&str, String)]) -> Result<T> {
        let url = self.url(segments, query)?;
        self.send(self.client.get(url)).await
    }

    /// Make a POST request with JSON body
    async fn post<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(&str, String)],
        body: Value,
    ) -> Result<T> {
        let url = self.url(segments, query)?;
        self.send(self.client.post(url).json(&body)).await
    }

    pub async fn contexts(&self) -> Result<ContextList> {
        self.get(&["api", "contexts"], &[]).await
    }

    pub async fn switch_context(&self, context: &str) -> Result<ContextSwitch> {
        self.post(&["api", "contexts", "switch"], &[], json!({ "context": context }))
            .await
    }

    pub async fn cluster_info(&self, context: &str) -> Result<ClusterInfo> {
        self.get(&["api", "contexts", context, "info"], &[]).await
    }

    pub async fn resources(
        &self,
        context: &str,
        kind: &str,
        namespace: Option<&str>,
    ) -> Result<Listing<ResourceDescriptor>> {
        let query: Vec<(&str, String)> = namespace
            .map(|ns| ("namespace", ns.to_string()))
            .into_iter()
            .collect();
        self.get(&["api", "contexts", context, "resources", kind], &query)
            .await
    }

    pub async fn fleet_summary(&self, context: &str) -> Result<FleetSummary> {
        self.get(&["api", "contexts", context, "summary"], &[]).await
    }

    pub async fn namespace_summary(&self, context: &str, namespace: &str) -> Result<NamespaceSummary> {
        self.get(
            &["api", "contexts", context, "namespaces", namespace, "summary"],
            &[],
        )
        .await
    }

    pub async fn clusters(&self) -> Result<Listing<Described<ClusterDescriptor>>> {
        self.get(&["api", "clusters"], &[]).await
    }

    pub async fn cluster(&self, name: &str) -> Result<ClusterDescriptor> {
        self.get(&["api", "clusters", name], &[]).await
    }

    pub async fn node_groups(&self, cluster: &str) -> Result<Listing<Described<NodeGroupDescriptor>>> {
        self.get(&["api", "clusters", cluster, "nodegroups"], &[]).await
    }

    pub async fn addons(&self, cluster: &str) -> Result<Listing<Described<AddonDescriptor>>> {
        self.get(&["api", "clusters", cluster, "addons"], &[]).await
    }

    pub async fn scaling_status(&self, cluster: &str) -> Result<ScalingStatus> {
        self.get(&["api", "clusters", cluster, "scaling-status"], &[])
            .await
    }

    pub async fn scale_node_group(
        &self,
        cluster: &str,
        nodegroup: &str,
        request: &ScaleRequest,
    ) -> Result<ScaleResult> {
        self.post(
            &["api", "clusters", cluster, "nodegroups", nodegroup, "scale"],
            &[],
            serde_json::to_value(request)?,
        )
        .await
    }

    pub async fn scale_down(&self, cluster: &str) -> Result<ScaleBatchResult> {
        self.post(&["api", "clusters", cluster, "scale-down"], &[], json!({}))
            .await
    }

    pub async fn scale_up(&self, cluster: &str, per_nodegroup: u32) -> Result<ScaleBatchResult> {
        self.post(
            &["api", "clusters", cluster, "scale-up"],
            &[("desiredPerNodegroup", per_nodegroup.to_string())],
            json!({}),
        )
        .await
    }

    pub async fn connect(&self, cluster: &str) -> Result<ConnectResult> {
        self.post(&["api", "clusters", cluster, "connect"], &[], json!({}))
            .await
    }

    pub async fn upgrade_status(&self, cluster: &str) -> Result<UpgradeStatus> {
        self.get(&["api", "clusters", cluster, "upgrade-status"], &[])
            .await
    }

    pub async fn versions(&self) -> Result<VersionCatalog> {
        self.get(&["api", "versions"], &[]).await
    }

    pub async fn cluster_costs(&self, cluster: &str) -> Result<ClusterCosts> {
        self.get(&["api", "clusters", cluster, "costs"], &[]).await
    }

    pub async fn costs_summary(&self) -> Result<CostSummary> {
        self.get(&["api", "costs", "summary"], &[]).await
    }

    pub async fn service_costs(&self) -> Result<Listing<ServiceCost>> {
        self.get(&["api", "services"], &[]).await
    }

    pub async fn resource_counts(&self) -> Result<Listing<ResourceCount>> {
        self.get(&["api", "resources"], &[]).await
    }
}
