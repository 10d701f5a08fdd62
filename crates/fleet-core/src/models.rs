//! Core data models for the fleet console
//!
//! Every type here is a transient view object rebuilt from a fresh upstream
//! query. Nothing is cached between requests.

use crate::error::FleetError;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Treat an explicit JSON `null` the same as an absent field
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Result of a list/describe query.
///
/// `error` is the failure signal: an empty `items` without an error is a
/// legitimately empty result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing<T> {
    pub items: Vec<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> Listing<T> {
    pub fn ok(items: Vec<T>) -> Self {
        Self { items, error: None }
    }

    pub fn failed(error: &FleetError) -> Self {
        Self {
            items: Vec::new(),
            error: Some(error.to_string()),
        }
    }

    pub fn from_result(result: Result<Vec<T>, FleetError>) -> Self {
        match result {
            Ok(items) => Self::ok(items),
            Err(e) => Self::failed(&e),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Describe failure for one member of a list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescribeFailure {
    pub name: String,
    pub error: String,
}

/// Outcome of describing one listed item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Described<T> {
    Failed(DescribeFailure),
    Ok(T),
}

impl<T> Described<T> {
    pub fn from_result(name: &str, result: Result<T, FleetError>) -> Self {
        match result {
            Ok(item) => Described::Ok(item),
            Err(e) => Described::Failed(DescribeFailure {
                name: name.to_string(),
                error: e.to_string(),
            }),
        }
    }

    pub fn ok(&self) -> Option<&T> {
        match self {
            Described::Ok(item) => Some(item),
            Described::Failed(_) => None,
        }
    }
}

/// Cluster-control CLI context name, threaded explicitly through every call
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClusterContext(String);

impl ClusterContext {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClusterContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Namespace selection for namespaced resource listings
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NamespaceScope {
    All,
    Namespace(String),
}

impl NamespaceScope {
    pub fn from_option(namespace: Option<String>) -> Self {
        match namespace {
            Some(ns) if !ns.is_empty() => NamespaceScope::Namespace(ns),
            _ => NamespaceScope::All,
        }
    }
}

/// A known CLI context
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextInfo {
    pub name: String,
    pub is_current: bool,
}

/// All known contexts and the one the CLI currently selects
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextList {
    pub contexts: Vec<ContextInfo>,
    pub current_context: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// `cluster-info` output for one context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterInfo {
    pub info: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Network configuration of a managed cluster
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VpcConfig {
    pub vpc_id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub subnet_ids: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub security_group_ids: Vec<String>,
    pub cluster_security_group_id: Option<String>,
    pub endpoint_public_access: Option<bool>,
    pub endpoint_private_access: Option<bool>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub public_access_cidrs: Vec<String>,
}

/// Managed cluster as reported by the cloud control plane
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterDescriptor {
    pub name: String,
    pub arn: Option<String>,
    pub status: Option<String>,
    pub version: Option<String>,
    pub endpoint: Option<String>,
    pub role_arn: Option<String>,
    pub created_at: Option<String>,
    pub platform_version: Option<String>,
    #[serde(
        rename = "vpcConfig",
        alias = "resourcesVpcConfig",
        default,
        deserialize_with = "null_as_default"
    )]
    pub vpc_config: VpcConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logging: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity: Option<serde_json::Value>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: BTreeMap<String, String>,
}

/// Node group capacity triple; `0 <= min <= desired <= max` must hold
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScalingConfig {
    pub min_size: u32,
    pub max_size: u32,
    pub desired_size: u32,
}

impl ScalingConfig {
    pub fn new(min_size: u32, desired_size: u32, max_size: u32) -> Self {
        Self {
            min_size,
            max_size,
            desired_size,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.min_size <= self.desired_size && self.desired_size <= self.max_size
    }
}

impl fmt::Display for ScalingConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "min={} desired={} max={}",
            self.min_size, self.desired_size, self.max_size
        )
    }
}

/// Worker pool attached to a cluster (by name, not by ownership)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeGroupDescriptor {
    #[serde(rename = "name", alias = "nodegroupName")]
    pub name: String,
    #[serde(default)]
    pub cluster_name: String,
    pub status: Option<String>,
    pub capacity_type: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub instance_types: Vec<String>,
    pub ami_type: Option<String>,
    pub disk_size: Option<u32>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub scaling_config: ScalingConfig,
    #[serde(default, deserialize_with = "null_as_default")]
    pub subnets: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub labels: BTreeMap<String, String>,
    pub created_at: Option<String>,
}

/// Installed cluster add-on
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddonDescriptor {
    #[serde(rename = "name", alias = "addonName")]
    pub name: String,
    #[serde(rename = "version", alias = "addonVersion")]
    pub version: Option<String>,
    pub status: Option<String>,
    pub created_at: Option<String>,
}

/// Cluster versions one add-on release is compatible with
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddonCompatibility {
    pub addon_name: String,
    pub addon_version: String,
    pub cluster_versions: Vec<String>,
}
