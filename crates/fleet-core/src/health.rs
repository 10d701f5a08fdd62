//! Health tracking for the fleet console
//!
//! Tracks the reachability of the two upstream collaborators and exposes
//! liveness/readiness views for the HTTP boundary.

use crate::error::{FleetError, FleetResult};
use crate::observability::StructuredLogger;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Health status of a component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentStatus {
    /// Last call succeeded
    Healthy,
    /// Last call failed; the console still serves degraded results
    Degraded,
    /// Component cannot be used at all
    Unhealthy,
}

impl ComponentStatus {
    /// Returns true if the component is at least partially operational
    pub fn is_operational(&self) -> bool {
        matches!(self, ComponentStatus::Healthy | ComponentStatus::Degraded)
    }
}

/// Information about a component's health
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub status: ComponentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub last_check_timestamp: i64,
}

impl ComponentHealth {
    fn at_now(status: ComponentStatus, message: Option<String>) -> Self {
        Self {
            status,
            message,
            last_check_timestamp: chrono::Utc::now().timestamp(),
        }
    }

    pub fn healthy() -> Self {
        Self::at_now(ComponentStatus::Healthy, None)
    }

    pub fn degraded(message: impl Into<String>) -> Self {
        Self::at_now(ComponentStatus::Degraded, Some(message.into()))
    }

    pub fn unhealthy(message: impl Into<String>) -> Self {
        Self::at_now(ComponentStatus::Unhealthy, Some(message.into()))
    }
}

/// Overall health response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: ComponentStatus,
    pub components: BTreeMap<String, ComponentHealth>,
}

impl HealthResponse {
    /// Worst status across all components
    pub fn compute_status(components: &BTreeMap<String, ComponentHealth>) -> ComponentStatus {
        let mut has_degraded = false;

        for health in components.values() {
            match health.status {
                ComponentStatus::Unhealthy => return ComponentStatus::Unhealthy,
                ComponentStatus::Degraded => has_degraded = true,
                ComponentStatus::Healthy => {}
            }
        }

        if has_degraded {
            ComponentStatus::Degraded
        } else {
            ComponentStatus::Healthy
        }
    }
}

/// Readiness response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Component names for health tracking
pub mod components {
    /// Cloud control plane (cluster, node group, add-on and billing calls)
    pub const CLOUD_API: &str = "cloud_api";
    /// Cluster-control CLI
    pub const CLUSTER_CLI: &str = "cluster_cli";
}

/// Health registry for tracking component health
#[derive(Debug, Clone)]
pub struct HealthRegistry {
    components: Arc<RwLock<BTreeMap<String, ComponentHealth>>>,
    ready: Arc<RwLock<bool>>,
}

impl Default for HealthRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl HealthRegistry {
    pub fn new() -> Self {
        Self {
            components: Arc::new(RwLock::new(BTreeMap::new())),
            ready: Arc::new(RwLock::new(false)),
        }
    }

    /// Register a component with initial healthy status
    pub async fn register(&self, name: &str) {
        let mut components = self.components.write().await;
        components.insert(name.to_string(), ComponentHealth::healthy());
    }

    pub async fn update(&self, name: &str, health: ComponentHealth) {
        let mut components = self.components.write().await;
        components.insert(name.to_string(), health);
    }

    pub async fn set_healthy(&self, name: &str) {
        self.update(name, ComponentHealth::healthy()).await;
    }

    pub async fn set_degraded(&self, name: &str, message: impl Into<String>) {
        self.update(name, ComponentHealth::degraded(message)).await;
    }

    pub async fn set_unhealthy(&self, name: &str, message: impl Into<String>) {
        self.update(name, ComponentHealth::unhealthy(message)).await;
    }

    /// Fold the outcome of one upstream call into the component's health.
    ///
    /// Only `UpstreamUnavailable` degrades a component: a NotFound or an
    /// InvalidState answer still proves the collaborator is reachable.
    pub async fn record<T>(&self, name: &str, outcome: &Result<T, FleetError>) {
        match outcome {
            Err(FleetError::UpstreamUnavailable(message)) => {
                self.set_degraded(name, message.clone()).await
            }
            _ => self.set_healthy(name).await,
        }
    }

    pub async fn set_ready(&self, ready: bool) {
        let mut r = self.ready.write().await;
        *r = ready;
    }

    pub async fn health(&self) -> HealthResponse {
        let components = self.components.read().await.clone();
        let status = HealthResponse::compute_status(&components);
        HealthResponse { status, components }
    }

    pub async fn readiness(&self) -> ReadinessResponse {
        let ready = *self.ready.read().await;
        let health = self.health().await;

        if !ready {
            ReadinessResponse {
                ready: false,
                reason: Some("Console not yet initialized".to_string()),
            }
        } else if !health.status.is_operational() {
            ReadinessResponse {
                ready: false,
                reason: Some("Upstream component unhealthy".to_string()),
            }
        } else {
            ReadinessResponse {
                ready: true,
                reason: None,
            }
        }
    }
}

/// Folds upstream call outcomes into the registry and the structured log.
///
/// Shared by every caller of an upstream so no call bypasses health tracking.
#[derive(Clone)]
pub struct UpstreamTracker {
    health: HealthRegistry,
    logger: StructuredLogger,
}

impl UpstreamTracker {
    pub fn new(health: HealthRegistry, logger: StructuredLogger) -> Self {
        Self { health, logger }
    }

    pub fn health(&self) -> &HealthRegistry {
        &self.health
    }

    pub fn logger(&self) -> &StructuredLogger {
        &self.logger
    }

    /// Record the outcome of one upstream call and pass it through
    pub async fn track<T>(&self, component: &str, operation: &str, result: FleetResult<T>) -> FleetResult<T> {
        self.health.record(component, &result).await;
        if let Err(e @ FleetError::UpstreamUnavailable(_)) = &result {
            self.logger
                .log_upstream_failure(component, operation, &e.to_string());
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_health_registry_initial_state() {
        let registry = HealthRegistry::new();
        let health = registry.health().await;

        assert_eq!(health.status, ComponentStatus::Healthy);
        assert!(health.components.is_empty());
    }

    #[tokio::test]
    async fn test_record_upstream_failure_degrades() {
        let registry = HealthRegistry::new();
        registry.register(components::CLOUD_API).await;
        registry.register(components::CLUSTER_CLI).await;

        let failed: Result<(), FleetError> = Err(FleetError::upstream("kubectl timed out after 30s"));
        registry.record(components::CLUSTER_CLI, &failed).await;

        let health = registry.health().await;
        assert_eq!(health.status, ComponentStatus::Degraded);
        assert_eq!(
            health.components[components::CLUSTER_CLI].message.as_deref(),
            Some("kubectl timed out after 30s")
        );
        assert_eq!(
            health.components[components::CLOUD_API].status,
            ComponentStatus::Healthy
        );
    }

    #[tokio::test]
    async fn test_record_not_found_keeps_component_healthy() {
        let registry = HealthRegistry::new();
        registry.set_degraded(components::CLOUD_API, "earlier failure").await;

        let missing: Result<(), FleetError> = Err(FleetError::NotFound("cluster ghost".into()));
        registry.record(components::CLOUD_API, &missing).await;

        assert_eq!(registry.health().await.status, ComponentStatus::Healthy);
    }

    #[tokio::test]
    async fn test_health_registry_unhealthy_status() {
        let registry = HealthRegistry::new();
        registry.register(components::CLOUD_API).await;
        registry.set_unhealthy(components::CLOUD_API, "no credentials").await;

        let health = registry.health().await;
        assert_eq!(health.status, ComponentStatus::Unhealthy);
    }

    #[tokio::test]
    async fn test_readiness_not_ready_initially() {
        let registry = HealthRegistry::new();
        let readiness = registry.readiness().await;

        assert!(!readiness.ready);
        assert!(readiness.reason.is_some());
    }

    #[tokio::test]
    async fn test_readiness_survives_degraded_upstream() {
        let registry = HealthRegistry::new();
        registry.set_ready(true).await;
        registry.set_degraded(components::CLOUD_API, "throttled").await;

        assert!(registry.readiness().await.ready);
    }

    #[tokio::test]
    async fn test_readiness_not_ready_when_unhealthy() {
        let registry = HealthRegistry::new();
        registry.set_ready(true).await;
        registry.set_unhealthy(components::CLUSTER_CLI, "binary missing").await;

        assert!(!registry.readiness().await.ready);
    }

    #[tokio::test]
    async fn test_tracker_passes_results_through() {
        let tracker = UpstreamTracker::new(HealthRegistry::new(), StructuredLogger::new("test"));

        let ok = tracker.track(components::CLOUD_API, "list_clusters", Ok(3)).await;
        assert_eq!(ok.unwrap(), 3);

        let failed: FleetResult<u32> = tracker
            .track(components::CLOUD_API, "cost_and_usage", Err(FleetError::upstream("throttled")))
            .await;
        assert!(failed.is_err());
        let health = tracker.health().health().await;
        assert_eq!(health.components[components::CLOUD_API].status, ComponentStatus::Degraded);
    }
}
