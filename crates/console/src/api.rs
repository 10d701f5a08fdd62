//! HTTP API for fleet operations, health checks and Prometheus metrics

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use fleet_core::{
    aggregation::{FleetSummary, NamespaceSummary},
    cost::{ClusterCosts, CostSummary, ServiceCost},
    inventory::ResourceCount,
    health::{ComponentStatus, HealthRegistry},
    models::{
        AddonDescriptor, ClusterContext, ClusterDescriptor, ClusterInfo, ContextList, Described,
        Listing, NamespaceScope, NodeGroupDescriptor,
    },
    normalizer::{ResourceDescriptor, ResourceKind},
    observability::render_metrics,
    scaling::{ScaleBatchResult, ScaleRequest, ScaleResult, ScalingStatus, DEFAULT_SCALE_UP_SIZE},
    version::{UpgradeStatus, VersionCatalog},
    ConnectResult, ContextSwitch, FleetError, FleetService,
};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use tracing::{info, warn};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub fleet: FleetService,
    pub health_registry: HealthRegistry,
}

impl AppState {
    pub fn new(fleet: FleetService) -> Self {
        let health_registry = fleet.health().clone();
        Self {
            fleet,
            health_registry,
        }
    }
}

/// JSON error body returned for every failed mutation or lookup
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: String,
}

/// Maps a [`FleetError`] onto an HTTP status
#[derive(Debug)]
pub struct ApiError(pub FleetError);

impl From<FleetError> for ApiError {
    fn from(err: FleetError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            FleetError::UpstreamUnavailable(_) => StatusCode::BAD_GATEWAY,
            FleetError::NotFound(_) => StatusCode::NOT_FOUND,
            FleetError::Conflict(_) => StatusCode::CONFLICT,
            FleetError::InvalidState(_) => StatusCode::UNPROCESSABLE_ENTITY,
        };
        let code = serde_json::to_value(self.0.code())
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default();

        (
            status,
            Json(ErrorBody {
                error: self.0.to_string(),
                code,
            }),
        )
            .into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

/// Health check response - returns 200 if healthy, 503 if unhealthy
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_registry.health().await;

    let status_code = match health.status {
        ComponentStatus::Healthy => StatusCode::OK,
        ComponentStatus::Degraded => StatusCode::OK, // Still operational
        ComponentStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(health))
}

/// Readiness check response - returns 200 if ready, 503 if not ready
async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = state.health_registry.readiness().await;

    let status_code = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(readiness))
}

/// Prometheus metrics endpoint
async fn metrics() -> Response {
    match render_metrics() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(e) => {
            warn!(error = %e, "Failed to encode metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SwitchContextRequest {
    pub context: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct NamespaceQuery {
    pub namespace: Option<String>,
}

async fn list_contexts(State(state): State<Arc<AppState>>) -> Json<ContextList> {
    Json(state.fleet.list_contexts().await)
}

async fn switch_context(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SwitchContextRequest>,
) -> ApiResult<ContextSwitch> {
    let context = ClusterContext::new(request.context);
    Ok(Json(state.fleet.switch_context(&context).await?))
}

async fn cluster_info(
    State(state): State<Arc<AppState>>,
    Path(context): Path<String>,
) -> Json<ClusterInfo> {
    Json(state.fleet.cluster_info(&ClusterContext::new(context)).await)
}

async fn list_resources(
    State(state): State<Arc<AppState>>,
    Path((context, kind)): Path<(String, String)>,
    Query(query): Query<NamespaceQuery>,
) -> ApiResult<Listing<ResourceDescriptor>> {
    let kind: ResourceKind = kind.parse()?;
    let scope = NamespaceScope::from_option(query.namespace);
    Ok(Json(
        state
            .fleet
            .list_resources(&ClusterContext::new(context), kind, &scope)
            .await,
    ))
}

async fn fleet_summary(
    State(state): State<Arc<AppState>>,
    Path(context): Path<String>,
) -> Json<FleetSummary> {
    Json(state.fleet.fleet_summary(&ClusterContext::new(context)).await)
}

async fn namespace_summary(
    State(state): State<Arc<AppState>>,
    Path((context, namespace)): Path<(String, String)>,
) -> Json<NamespaceSummary> {
    Json(
        state
            .fleet
            .namespace_summary(&ClusterContext::new(context), &namespace)
            .await,
    )
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScaleUpQuery {
    pub desired_per_nodegroup: Option<u32>,
}

async fn list_clusters(State(state): State<Arc<AppState>>) -> Json<Listing<Described<ClusterDescriptor>>> {
    Json(state.fleet.list_clusters().await)
}

async fn describe_cluster(
    State(state): State<Arc<AppState>>,
    Path(cluster): Path<String>,
) -> ApiResult<ClusterDescriptor> {
    Ok(Json(state.fleet.describe_cluster(&cluster).await?))
}

async fn list_node_groups(
    State(state): State<Arc<AppState>>,
    Path(cluster): Path<String>,
) -> Json<Listing<Described<NodeGroupDescriptor>>> {
    Json(state.fleet.list_node_groups(&cluster).await)
}

async fn list_addons(
    State(state): State<Arc<AppState>>,
    Path(cluster): Path<String>,
) -> Json<Listing<Described<AddonDescriptor>>> {
    Json(state.fleet.list_addons(&cluster).await)
}

async fn scaling_status(
    State(state): State<Arc<AppState>>,
    Path(cluster): Path<String>,
) -> ApiResult<ScalingStatus> {
    Ok(Json(state.fleet.scaling_status(&cluster).await?))
}

async fn scale_node_group(
    State(state): State<Arc<AppState>>,
    Path((cluster, nodegroup)): Path<(String, String)>,
    Json(request): Json<ScaleRequest>,
) -> ApiResult<ScaleResult> {
    Ok(Json(
        state
            .fleet
            .scale_node_group(&cluster, &nodegroup, &request)
            .await?,
    ))
}

async fn scale_down(
    State(state): State<Arc<AppState>>,
    Path(cluster): Path<String>,
) -> ApiResult<ScaleBatchResult> {
    Ok(Json(state.fleet.scale_down(&cluster).await?))
}

async fn scale_up(
    State(state): State<Arc<AppState>>,
    Path(cluster): Path<String>,
    Query(query): Query<ScaleUpQuery>,
) -> ApiResult<ScaleBatchResult> {
    let per_group = query.desired_per_nodegroup.unwrap_or(DEFAULT_SCALE_UP_SIZE);
    Ok(Json(state.fleet.scale_up(&cluster, per_group).await?))
}

async fn connect_cluster(
    State(state): State<Arc<AppState>>,
    Path(cluster): Path<String>,
) -> ApiResult<ConnectResult> {
    Ok(Json(state.fleet.connect_cluster(&cluster).await?))
}

async fn upgrade_status(
    State(state): State<Arc<AppState>>,
    Path(cluster): Path<String>,
) -> ApiResult<UpgradeStatus> {
    Ok(Json(state.fleet.upgrade_status(&cluster).await?))
}

async fn cluster_costs(
    State(state): State<Arc<AppState>>,
    Path(cluster): Path<String>,
) -> Json<ClusterCosts> {
    Json(state.fleet.cluster_costs(&cluster).await)
}

async fn costs_summary(State(state): State<Arc<AppState>>) -> Json<CostSummary> {
    Json(state.fleet.costs_summary().await)
}

async fn service_costs(State(state): State<Arc<AppState>>) -> Json<Listing<ServiceCost>> {
    Json(state.fleet.cost_by_service().await)
}

async fn resource_counts(State(state): State<Arc<AppState>>) -> Json<Listing<ResourceCount>> {
    Json(state.fleet.resource_counts().await)
}

async fn versions(State(state): State<Arc<AppState>>) -> Json<VersionCatalog> {
    Json(state.fleet.available_versions().await)
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .route("/api/contexts", get(list_contexts))
        .route("/api/contexts/switch", post(switch_context))
        .route("/api/contexts/:context/info", get(cluster_info))
        .route("/api/contexts/:context/resources/:kind", get(list_resources))
        .route("/api/contexts/:context/summary", get(fleet_summary))
        .route(
            "/api/contexts/:context/namespaces/:namespace/summary",
            get(namespace_summary),
        )
        .route("/api/clusters", get(list_clusters))
        .route("/api/clusters/:cluster", get(describe_cluster))
        .route("/api/clusters/:cluster/nodegroups", get(list_node_groups))
        .route("/api/clusters/:cluster/addons", get(list_addons))
        .route("/api/clusters/:cluster/scaling-status", get(scaling_status))
        .route(
            "/api/clusters/:cluster/nodegroups/:nodegroup/scale",
            post(scale_node_group),
        )
        .route("/api/clusters/:cluster/scale-down", post(scale_down))
        .route("/api/clusters/:cluster/scale-up", post(scale_up))
        .route("/api/clusters/:cluster/connect", post(connect_cluster))
        .route("/api/clusters/:cluster/upgrade-status", get(upgrade_status))
        .route("/api/clusters/:cluster/costs", get(cluster_costs))
        .route("/api/costs/summary", get(costs_summary))
        .route("/api/services", get(service_costs))
        .route("/api/resources", get(resource_counts))
        .route("/api/versions", get(versions))
        .with_state(state)
}

/// Start the API server, stopping when `shutdown` resolves
pub async fn serve<F>(addr: String, state: Arc<AppState>, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = create_router(state);

    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}
