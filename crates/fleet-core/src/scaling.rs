//! Node group scaling rules
//!
//! Pure planning: every function here takes the current [`ScalingConfig`] and
//! returns the triple to send upstream. A plan that would break
//! `min <= desired <= max` is rejected with `InvalidState` instead of being
//! corrected, so nothing is ever sent for it.

use crate::error::{FleetError, FleetResult};
use crate::models::{Described, NodeGroupDescriptor, ScalingConfig};
use serde::{Deserialize, Serialize};

/// Default desired size per node group for scale-up
pub const DEFAULT_SCALE_UP_SIZE: u32 = 2;

/// Requested capacity change for one node group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScaleRequest {
    pub desired_size: u32,
    #[serde(default)]
    pub min_size: Option<u32>,
    #[serde(default)]
    pub max_size: Option<u32>,
}

impl ScaleRequest {
    pub fn desired(desired_size: u32) -> Self {
        Self {
            desired_size,
            min_size: None,
            max_size: None,
        }
    }
}

fn checked(config: ScalingConfig) -> FleetResult<ScalingConfig> {
    if config.is_valid() {
        Ok(config)
    } else {
        Err(FleetError::InvalidState(format!(
            "scaling config violates min <= desired <= max ({})",
            config
        )))
    }
}

/// Plan a single node group change.
///
/// Explicit bounds are used verbatim. An omitted min shrinks to the
/// requested size but never rises; an omitted max grows to it but never
/// falls.
pub fn plan_scale(current: &ScalingConfig, request: &ScaleRequest) -> FleetResult<ScalingConfig> {
    let desired = request.desired_size;
    let min_size = request
        .min_size
        .unwrap_or_else(|| desired.min(current.min_size));
    let max_size = request
        .max_size
        .unwrap_or_else(|| desired.max(current.max_size));

    checked(ScalingConfig::new(min_size, desired, max_size))
}

/// Fleet-wide scaling policy applied to every node group of a cluster
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalePolicy {
    /// desired = 0, min = 0, max kept
    DownToZero,
    /// desired = max(per_group, min), min kept, max kept
    Up { per_group: u32 },
}

impl ScalePolicy {
    pub fn plan(&self, current: &ScalingConfig) -> FleetResult<ScalingConfig> {
        match *self {
            ScalePolicy::DownToZero => Ok(ScalingConfig::new(0, 0, current.max_size)),
            ScalePolicy::Up { per_group } => {
                let desired = per_group.max(current.min_size);
                let min_size = desired.min(current.min_size);
                checked(ScalingConfig::new(min_size, desired, current.max_size))
            }
        }
    }

    /// Status reported for a node group the policy was applied to
    pub fn status_label(&self) -> &'static str {
        match self {
            ScalePolicy::DownToZero => "scaling_down",
            ScalePolicy::Up { .. } => "scaling_up",
        }
    }

    /// Metric label
    pub fn outcome_label(&self) -> &'static str {
        match self {
            ScalePolicy::DownToZero => "scale_down",
            ScalePolicy::Up { .. } => "scale_up",
        }
    }
}

/// Result of scaling one node group directly
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScaleResult {
    pub cluster_name: String,
    pub nodegroup: String,
    pub message: String,
    pub previous_config: ScalingConfig,
    pub new_config: ScalingConfig,
}

/// Per node group entry of a fan-out
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeGroupOutcome {
    pub nodegroup: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_config: Option<ScalingConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl NodeGroupOutcome {
    pub fn applied(nodegroup: &str, policy: &ScalePolicy, config: ScalingConfig) -> Self {
        Self {
            nodegroup: nodegroup.to_string(),
            status: Some(policy.status_label().to_string()),
            new_config: Some(config),
            error: None,
        }
    }

    pub fn failed(nodegroup: &str, error: &FleetError) -> Self {
        Self {
            nodegroup: nodegroup.to_string(),
            status: None,
            new_config: None,
            error: Some(error.to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Outcome of a cluster-wide scaling policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScaleBatchResult {
    pub cluster_name: String,
    pub message: String,
    pub succeeded: usize,
    pub failed: usize,
    pub results: Vec<NodeGroupOutcome>,
}

impl ScaleBatchResult {
    pub fn new(cluster_name: &str, policy: &ScalePolicy, results: Vec<NodeGroupOutcome>) -> Self {
        let succeeded = results.iter().filter(|r| r.is_success()).count();
        let message = match policy {
            ScalePolicy::DownToZero => format!("Scaling down {} node groups to 0", results.len()),
            ScalePolicy::Up { per_group } => format!(
                "Scaling up {} node groups to at least {} nodes",
                results.len(),
                per_group
            ),
        };

        Self {
            cluster_name: cluster_name.to_string(),
            message,
            succeeded,
            failed: results.len() - succeeded,
            results,
        }
    }
}

/// Whether a cluster has any worker capacity requested
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClusterState {
    Running,
    ScaledDown,
}

/// Current capacity of every node group in a cluster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScalingStatus {
    pub cluster_name: String,
    pub cluster_state: ClusterState,
    pub total_desired_nodes: u32,
    pub nodegroups: Vec<Described<NodeGroupDescriptor>>,
}

impl ScalingStatus {
    /// Node groups that failed to describe contribute nothing to the total
    pub fn from_node_groups(cluster_name: &str, nodegroups: Vec<Described<NodeGroupDescriptor>>) -> Self {
        let total_desired_nodes = nodegroups
            .iter()
            .filter_map(|ng| ng.ok())
            .map(|ng| ng.scaling_config.desired_size)
            .sum();

        Self {
            cluster_name: cluster_name.to_string(),
            cluster_state: if total_desired_nodes > 0 {
                ClusterState::Running
            } else {
                ClusterState::ScaledDown
            },
            total_desired_nodes,
            nodegroups,
        }
    }
}
