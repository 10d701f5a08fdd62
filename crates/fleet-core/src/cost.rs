//! Tiered cost estimation
//!
//! Per cluster and window, the tag-attributed cost is used when the query
//! succeeds. When it fails, the service-wide cost for the same window is
//! divided evenly across the current cluster count (at least one). A window
//! where both tiers fail is reported as unavailable, never as zero.
//!
//! The even split is a coarse approximation with no weighting by node count
//! or instance size. It is kept as is because callers rely on the arithmetic.

use crate::error::{FleetError, FleetResult};
use crate::health::{components, UpstreamTracker};
use crate::models::Listing;
use crate::observability::FleetMetrics;
use crate::upstream::ControlPlane;
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Cost metric requested from the billing API
pub const UNBLENDED_COST: &str = "UnblendedCost";

/// Reporting window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CostWindow {
    #[serde(rename = "last30Days")]
    Last30Days,
    #[serde(rename = "last7Days")]
    Last7Days,
    #[serde(rename = "lastDay")]
    LastDay,
}

impl CostWindow {
    pub const ALL: [CostWindow; 3] = [CostWindow::Last30Days, CostWindow::Last7Days, CostWindow::LastDay];

    pub fn days(&self) -> i64 {
        match self {
            CostWindow::Last30Days => 30,
            CostWindow::Last7Days => 7,
            CostWindow::LastDay => 1,
        }
    }

    pub fn granularity(&self) -> Granularity {
        if self.days() <= 7 {
            Granularity::Daily
        } else {
            Granularity::Monthly
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CostWindow::Last30Days => "last30Days",
            CostWindow::Last7Days => "last7Days",
            CostWindow::LastDay => "lastDay",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Granularity {
    Daily,
    Monthly,
}

impl Granularity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::Daily => "DAILY",
            Granularity::Monthly => "MONTHLY",
        }
    }
}

/// Dimension filter of a cost query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CostFilter {
    /// Whole managed-cluster service
    Service { service: String },
    /// Service cost attributed to one cluster through a cost-allocation tag
    ClusterTag {
        service: String,
        tag_key: String,
        cluster: String,
    },
}

impl CostFilter {
    /// Billing API filter expression
    pub fn to_expression(&self) -> Value {
        let service_dimension = |service: &str| {
            json!({"Dimensions": {"Key": "SERVICE", "Values": [service]}})
        };

        match self {
            CostFilter::Service { service } => service_dimension(service),
            CostFilter::ClusterTag {
                service,
                tag_key,
                cluster,
            } => json!({
                "And": [
                    service_dimension(service),
                    {"Tags": {"Key": tag_key, "Values": [cluster]}}
                ]
            }),
        }
    }
}

/// One cost-and-usage query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CostQuery {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub granularity: Granularity,
    pub metric: String,
    /// Account-wide when absent
    pub filter: Option<CostFilter>,
}

impl CostQuery {
    /// Query covering `window` up to `today` (UTC)
    pub fn for_window(window: CostWindow, today: NaiveDate, filter: CostFilter) -> Self {
        Self {
            filter: Some(filter),
            ..Self::unfiltered(window, today)
        }
    }

    /// Account-wide query covering `window` up to `today` (UTC)
    pub fn unfiltered(window: CostWindow, today: NaiveDate) -> Self {
        Self {
            start: today - Duration::days(window.days()),
            end: today,
            granularity: window.granularity(),
            metric: UNBLENDED_COST.to_string(),
            filter: None,
        }
    }
}

/// Spend on one billed service over the last 30 days
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceCost {
    pub name: String,
    pub cost: f64,
    pub status: String,
}

/// Services with a positive spend, rounded to cents, most expensive first.
///
/// Equal costs keep name order.
pub fn rank_service_costs(amounts: BTreeMap<String, f64>) -> Vec<ServiceCost> {
    let mut ranked: Vec<ServiceCost> = amounts
        .into_iter()
        .filter(|(_, amount)| *amount > 0.0)
        .map(|(name, amount)| ServiceCost {
            name,
            cost: round_cents(amount),
            status: "active".to_string(),
        })
        .collect();
    ranked.sort_by(|a, b| b.cost.total_cmp(&a.cost));
    ranked
}

/// An amount in the billing currency, or an explicit unavailable marker
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CostAmount {
    Available(f64),
    /// Serialized as `null`
    Unavailable,
}

impl CostAmount {
    pub fn value(&self) -> Option<f64> {
        match self {
            CostAmount::Available(v) => Some(*v),
            CostAmount::Unavailable => None,
        }
    }
}

/// Amount per reporting window
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CostEstimate(BTreeMap<CostWindow, CostAmount>);

impl CostEstimate {
    pub fn get(&self, window: CostWindow) -> Option<CostAmount> {
        self.0.get(&window).copied()
    }

    pub fn insert(&mut self, window: CostWindow, amount: CostAmount) {
        self.0.insert(window, amount);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CostWindow, &CostAmount)> {
        self.0.iter()
    }
}

/// Cost breakdown of one cluster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterCosts {
    pub cluster_name: String,
    pub costs: CostEstimate,
}

/// Fleet total plus even per-cluster shares
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostSummary {
    pub total_costs: CostEstimate,
    pub per_cluster_costs: BTreeMap<String, CostEstimate>,
    pub cluster_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CostSummary {
    pub fn failed(error: &FleetError) -> Self {
        Self {
            total_costs: CostEstimate::default(),
            per_cluster_costs: BTreeMap::new(),
            cluster_count: 0,
            error: Some(error.to_string()),
        }
    }
}

/// Round to cents
pub fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// Even share of `total` across `cluster_count` clusters, with a floor of one
pub fn even_share(total: f64, cluster_count: usize) -> f64 {
    round_cents(total / cluster_count.max(1) as f64)
}

/// Billing dimensions used for cost queries
#[derive(Debug, Clone)]
pub struct CostSettings {
    pub service_name: String,
    pub cluster_tag_key: String,
}

impl Default for CostSettings {
    fn default() -> Self {
        Self {
            service_name: "Amazon Elastic Container Service for Kubernetes".to_string(),
            cluster_tag_key: "eks:cluster-name".to_string(),
        }
    }
}

/// Runs the two-tier estimation against the control plane
#[derive(Clone)]
pub struct CostAssessor {
    plane: Arc<dyn ControlPlane>,
    settings: CostSettings,
    metrics: FleetMetrics,
    tracker: UpstreamTracker,
}

impl CostAssessor {
    pub fn new(
        plane: Arc<dyn ControlPlane>,
        settings: CostSettings,
        metrics: FleetMetrics,
        tracker: UpstreamTracker,
    ) -> Self {
        Self {
            plane,
            settings,
            metrics,
            tracker,
        }
    }

    async fn query(&self, query: &CostQuery) -> FleetResult<f64> {
        let result = self.plane.cost_and_usage(query).await;
        self.tracker
            .track(components::CLOUD_API, "cost_and_usage", result)
            .await
    }

    async fn cluster_names(&self) -> FleetResult<Vec<String>> {
        let result = self.plane.list_clusters().await;
        self.tracker
            .track(components::CLOUD_API, "list_clusters", result)
            .await
    }

    fn service_filter(&self) -> CostFilter {
        CostFilter::Service {
            service: self.settings.service_name.clone(),
        }
    }

    async fn service_total(&self, window: CostWindow, today: NaiveDate) -> FleetResult<f64> {
        let query = CostQuery::for_window(window, today, self.service_filter());
        self.query(&query).await
    }

    /// Estimate every window for one cluster
    pub async fn cluster_costs(&self, cluster: &str, today: NaiveDate) -> ClusterCosts {
        let mut costs = CostEstimate::default();
        // Cluster count is listed at most once, and only if a fallback needs it
        let mut cluster_count: Option<FleetResult<usize>> = None;

        for window in CostWindow::ALL {
            let tagged = CostQuery::for_window(
                window,
                today,
                CostFilter::ClusterTag {
                    service: self.settings.service_name.clone(),
                    tag_key: self.settings.cluster_tag_key.clone(),
                    cluster: cluster.to_string(),
                },
            );

            let amount = match self.query(&tagged).await {
                Ok(total) => CostAmount::Available(round_cents(total)),
                Err(e) => {
                    debug!(cluster = %cluster, window = window.label(), error = %e, "Tagged cost query failed");
                    self.metrics.inc_cost_fallbacks();

                    if cluster_count.is_none() {
                        cluster_count = Some(self.cluster_names().await.map(|c| c.len()));
                    }

                    match (self.service_total(window, today).await, &cluster_count) {
                        (Ok(total), Some(Ok(count))) => {
                            self.tracker
                                .logger()
                                .log_cost_fallback(cluster, window.label(), *count);
                            CostAmount::Available(even_share(total, *count))
                        }
                        _ => CostAmount::Unavailable,
                    }
                }
            };

            costs.insert(window, amount);
        }

        ClusterCosts {
            cluster_name: cluster.to_string(),
            costs,
        }
    }

    /// Account spend over the last 30 days grouped by billed service
    pub async fn by_service(&self, today: NaiveDate) -> Listing<ServiceCost> {
        let query = CostQuery::unfiltered(CostWindow::Last30Days, today);
        let result = self.plane.cost_by_service(&query).await;
        let result = self
            .tracker
            .track(components::CLOUD_API, "cost_by_service", result)
            .await;
        Listing::from_result(result.map(rank_service_costs))
    }

    /// Service-wide totals divided evenly across every cluster.
    ///
    /// Tag-based attribution is not attempted here.
    pub async fn summary(&self, today: NaiveDate) -> CostSummary {
        let clusters = match self.cluster_names().await {
            Ok(clusters) => clusters,
            Err(e) => return CostSummary::failed(&e),
        };

        let mut total_costs = CostEstimate::default();
        for window in CostWindow::ALL {
            let amount = match self.service_total(window, today).await {
                Ok(total) => CostAmount::Available(round_cents(total)),
                Err(_) => CostAmount::Unavailable,
            };
            total_costs.insert(window, amount);
        }

        let per_cluster_costs = clusters
            .iter()
            .map(|name| {
                let mut share = CostEstimate::default();
                for (window, amount) in total_costs.iter() {
                    let amount = match amount {
                        CostAmount::Available(total) => {
                            CostAmount::Available(even_share(*total, clusters.len()))
                        }
                        CostAmount::Unavailable => CostAmount::Unavailable,
                    };
                    share.insert(*window, amount);
                }
                (name.clone(), share)
            })
            .collect();

        CostSummary {
            total_costs,
            per_cluster_costs,
            cluster_count: clusters.len(),
            error: None,
        }
    }
}
