//! Console configuration

use anyhow::{Context, Result};
use fleet_core::cost::CostSettings;
use fleet_core::upstream::{AwsSettings, KubectlSettings};
use serde::Deserialize;
use std::time::Duration;

/// Console configuration, read from `FLEET_*` environment variables
#[derive(Debug, Clone, Deserialize)]
pub struct ConsoleConfig {
    /// API server port
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Cluster-control CLI binary
    #[serde(default = "default_kubectl_path")]
    pub kubectl_path: String,

    /// Cloud vendor CLI binary
    #[serde(default = "default_aws_path")]
    pub aws_path: String,

    #[serde(default)]
    pub aws_region: Option<String>,

    #[serde(default)]
    pub aws_profile: Option<String>,

    /// Timeout for resource listings and cloud calls
    #[serde(default = "default_command_timeout")]
    pub command_timeout_secs: u64,

    /// Timeout for kubeconfig context commands
    #[serde(default = "default_context_timeout")]
    pub context_timeout_secs: u64,

    /// Billing service dimension
    #[serde(default = "default_cost_service_name")]
    pub cost_service_name: String,

    /// Tag carrying the cluster name on billed resources
    #[serde(default = "default_cluster_tag_key")]
    pub cluster_tag_key: String,

    /// Most recent events kept per listing
    #[serde(default = "default_events_limit")]
    pub events_limit: usize,
}

fn default_port() -> u16 {
    8080
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_kubectl_path() -> String {
    "kubectl".to_string()
}

fn default_aws_path() -> String {
    "aws".to_string()
}

fn default_command_timeout() -> u64 {
    30
}

fn default_context_timeout() -> u64 {
    10
}

fn default_cost_service_name() -> String {
    CostSettings::default().service_name
}

fn default_cluster_tag_key() -> String {
    CostSettings::default().cluster_tag_key
}

fn default_events_limit() -> usize {
    100
}

impl ConsoleConfig {
    /// Load configuration from the environment
    pub fn load() -> Result<Self> {
        Self::from_builder(config::Config::builder().add_source(
            config::Environment::with_prefix("FLEET").try_parsing(true),
        ))
    }

    fn from_builder(builder: config::ConfigBuilder<config::builder::DefaultState>) -> Result<Self> {
        let config = builder.build().context("failed to read console configuration")?;
        config
            .try_deserialize()
            .context("invalid console configuration")
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }

    pub fn kubectl_settings(&self) -> KubectlSettings {
        KubectlSettings {
            command_timeout: Duration::from_secs(self.command_timeout_secs),
            context_timeout: Duration::from_secs(self.context_timeout_secs),
            events_limit: self.events_limit,
        }
    }

    pub fn aws_settings(&self) -> AwsSettings {
        AwsSettings {
            region: self.aws_region.clone(),
            profile: self.aws_profile.clone(),
            command_timeout: Duration::from_secs(self.command_timeout_secs),
        }
    }

    pub fn cost_settings(&self) -> CostSettings {
        CostSettings {
            service_name: self.cost_service_name.clone(),
            cluster_tag_key: self.cluster_tag_key.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ConsoleConfig::from_builder(config::Config::builder()).unwrap();

        assert_eq!(config.bind_addr(), "0.0.0.0:8080");
        assert_eq!(config.kubectl_path, "kubectl");
        assert_eq!(config.aws_region, None);
        assert_eq!(config.kubectl_settings().context_timeout, Duration::from_secs(10));
        assert_eq!(config.kubectl_settings().events_limit, 100);
        assert_eq!(config.cost_settings().cluster_tag_key, "eks:cluster-name");
    }

    #[test]
    fn test_overrides() {
        let builder = config::Config::builder()
            .set_override("port", 9090)
            .unwrap()
            .set_override("aws_region", "eu-west-1")
            .unwrap()
            .set_override("command_timeout_secs", 5)
            .unwrap();
        let config = ConsoleConfig::from_builder(builder).unwrap();

        assert_eq!(config.port, 9090);
        assert_eq!(config.aws_settings().region.as_deref(), Some("eu-west-1"));
        assert_eq!(config.aws_settings().command_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_invalid_value_is_an_error() {
        let builder = config::Config::builder()
            .set_override("port", "not-a-port")
            .unwrap();
        assert!(ConsoleConfig::from_builder(builder).is_err());
    }
}
