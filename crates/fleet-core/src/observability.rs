//! Observability infrastructure for the fleet console
//!
//! Provides:
//! - Prometheus metrics (upstream call latency and failures, scaling outcomes, cost fallbacks)
//! - Structured JSON logging with tracing

use prometheus::{
    register_histogram_vec, register_int_counter, register_int_counter_vec, Encoder, HistogramVec,
    IntCounter, IntCounterVec, TextEncoder,
};
use std::sync::OnceLock;
use tracing::{info, warn};

/// Histogram buckets for upstream calls (in seconds); CLI invocations run
/// from tens of milliseconds up to the command timeout
const UPSTREAM_BUCKETS: &[f64] = &[0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<FleetMetricsInner> = OnceLock::new();

struct FleetMetricsInner {
    upstream_call_duration_seconds: HistogramVec,
    upstream_failures: IntCounterVec,
    scaling_operations: IntCounterVec,
    cost_fallbacks: IntCounter,
}

impl FleetMetricsInner {
    fn new() -> Self {
        Self {
            upstream_call_duration_seconds: register_histogram_vec!(
                "fleet_console_upstream_call_duration_seconds",
                "Wall time of external tool invocations",
                &["tool"],
                UPSTREAM_BUCKETS.to_vec()
            )
            .expect("Failed to register upstream_call_duration_seconds"),

            upstream_failures: register_int_counter_vec!(
                "fleet_console_upstream_failures_total",
                "External tool invocations that failed, timed out or exited non-zero",
                &["tool"]
            )
            .expect("Failed to register upstream_failures_total"),

            scaling_operations: register_int_counter_vec!(
                "fleet_console_scaling_operations_total",
                "Node group scaling attempts by outcome",
                &["outcome"]
            )
            .expect("Failed to register scaling_operations_total"),

            cost_fallbacks: register_int_counter!(
                "fleet_console_cost_fallbacks_total",
                "Cost windows estimated by dividing service-wide cost across clusters"
            )
            .expect("Failed to register cost_fallbacks_total"),
        }
    }
}

/// Console metrics for Prometheus exposition
///
/// This is a lightweight handle to the global metrics instance.
/// Multiple clones share the same underlying metrics.
#[derive(Clone)]
pub struct FleetMetrics {
    _private: (),
}

impl Default for FleetMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for FleetMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("FleetMetrics")
    }
}

impl FleetMetrics {
    /// Create a new metrics handle (initializes global metrics if needed)
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(FleetMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &FleetMetricsInner {
        GLOBAL_METRICS.get_or_init(FleetMetricsInner::new)
    }

    /// Record the latency of one external tool invocation
    pub fn observe_upstream_call(&self, tool: &str, duration_secs: f64) {
        self.inner()
            .upstream_call_duration_seconds
            .with_label_values(&[tool])
            .observe(duration_secs);
    }

    pub fn inc_upstream_failures(&self, tool: &str) {
        self.inner()
            .upstream_failures
            .with_label_values(&[tool])
            .inc();
    }

    /// Count one node group scaling attempt (`applied`, `rejected` or `failed`)
    pub fn inc_scaling_operation(&self, outcome: &str) {
        self.inner()
            .scaling_operations
            .with_label_values(&[outcome])
            .inc();
    }

    pub fn inc_cost_fallbacks(&self) {
        self.inner().cost_fallbacks.inc();
    }

    /// Current failure count for `tool`
    pub fn upstream_failures(&self, tool: &str) -> u64 {
        self.inner()
            .upstream_failures
            .with_label_values(&[tool])
            .get()
    }

    pub fn scaling_operations(&self, outcome: &str) -> u64 {
        self.inner()
            .scaling_operations
            .with_label_values(&[outcome])
            .get()
    }

    pub fn cost_fallbacks(&self) -> u64 {
        self.inner().cost_fallbacks.get()
    }
}

/// Render every registered metric in the text exposition format
pub fn render_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder.encode(&prometheus::gather(), &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}

/// Structured logger for console events
///
/// Provides consistent JSON-formatted logging for mutations and degraded
/// upstream behaviour.
#[derive(Debug, Clone)]
pub struct StructuredLogger {
    instance: String,
}

impl StructuredLogger {
    pub fn new(instance: impl Into<String>) -> Self {
        Self {
            instance: instance.into(),
        }
    }

    pub fn instance(&self) -> &str {
        &self.instance
    }

    /// Log console startup
    pub fn log_startup(&self, version: &str, bind_addr: &str) {
        info!(
            event = "console_started",
            instance = %self.instance,
            console_version = %version,
            bind_addr = %bind_addr,
            "Fleet console started"
        );
    }

    /// Log console shutdown
    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "console_shutdown",
            instance = %self.instance,
            reason = %reason,
            "Fleet console shutting down"
        );
    }

    /// Log an applied node group scaling change
    pub fn log_nodegroup_scaled(
        &self,
        cluster: &str,
        nodegroup: &str,
        min_size: u32,
        desired_size: u32,
        max_size: u32,
    ) {
        info!(
            event = "nodegroup_scaled",
            instance = %self.instance,
            cluster = %cluster,
            nodegroup = %nodegroup,
            min_size = min_size,
            desired_size = desired_size,
            max_size = max_size,
            "Node group scaling config updated"
        );
    }

    /// Log a node group scaling change that was rejected or failed upstream
    pub fn log_nodegroup_scale_failed(&self, cluster: &str, nodegroup: &str, error: &str) {
        warn!(
            event = "nodegroup_scale_failed",
            instance = %self.instance,
            cluster = %cluster,
            nodegroup = %nodegroup,
            error = %error,
            "Node group scaling failed"
        );
    }

    /// Log a CLI context switch
    pub fn log_context_switched(&self, context: &str) {
        info!(
            event = "context_switched",
            instance = %self.instance,
            context = %context,
            "Cluster CLI context switched"
        );
    }

    /// Log a failed external tool invocation
    pub fn log_upstream_failure(&self, tool: &str, operation: &str, error: &str) {
        warn!(
            event = "upstream_call_failed",
            instance = %self.instance,
            tool = %tool,
            operation = %operation,
            error = %error,
            "Upstream call failed"
        );
    }

    /// Log a cost window estimated from the service-wide total
    pub fn log_cost_fallback(&self, cluster: &str, window: &str, cluster_count: usize) {
        info!(
            event = "cost_fallback_used",
            instance = %self.instance,
            cluster = %cluster,
            window = %window,
            cluster_count = cluster_count,
            "Tag-based cost query failed, dividing service cost evenly"
        );
    }
}
