//! Cluster-control CLI adapter (kubectl)

use super::command::CommandRunner;
use super::ClusterCli;
use crate::error::{FleetError, FleetResult};
use crate::models::{ClusterContext, NamespaceScope};
use crate::normalizer::ResourceKind;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

/// Timeouts and limits for kubectl invocations
#[derive(Debug, Clone)]
pub struct KubectlSettings {
    /// Resource listings and cluster-info
    pub command_timeout: Duration,
    /// `config ...` subcommands
    pub context_timeout: Duration,
    /// Most recent events kept from an event listing
    pub events_limit: usize,
}

impl Default for KubectlSettings {
    fn default() -> Self {
        Self {
            command_timeout: Duration::from_secs(30),
            context_timeout: Duration::from_secs(10),
            events_limit: 100,
        }
    }
}

/// [`ClusterCli`] backed by the kubectl binary
#[derive(Debug, Clone)]
pub struct Kubectl {
    runner: CommandRunner,
    settings: KubectlSettings,
}

impl Kubectl {
    pub fn new(runner: CommandRunner, settings: KubectlSettings) -> Self {
        Self { runner, settings }
    }

    fn get_args(context: &ClusterContext, kind: ResourceKind, scope: &NamespaceScope) -> Vec<String> {
        let mut args = vec![
            "--context".to_string(),
            context.to_string(),
            "get".to_string(),
            kind.cli_name().to_string(),
        ];

        if kind.is_namespaced() {
            match scope {
                NamespaceScope::All => args.push("--all-namespaces".to_string()),
                NamespaceScope::Namespace(ns) => {
                    args.push("-n".to_string());
                    args.push(ns.clone());
                }
            }
        }

        if kind == ResourceKind::Event {
            args.push("--sort-by=.lastTimestamp".to_string());
        }

        args.push("-o".to_string());
        args.push("json".to_string());
        args
    }

    fn parse_items(stdout: &str) -> FleetResult<Vec<Value>> {
        let mut listing: Value = serde_json::from_str(stdout)?;
        match listing.get_mut("items").map(Value::take) {
            Some(Value::Array(items)) => Ok(items),
            _ => Err(FleetError::upstream(
                "malformed kubectl output: missing items array",
            )),
        }
    }
}

#[async_trait]
impl ClusterCli for Kubectl {
    async fn get(
        &self,
        context: &ClusterContext,
        kind: ResourceKind,
        scope: &NamespaceScope,
    ) -> FleetResult<Vec<Value>> {
        let args = Self::get_args(context, kind, scope);
        let output = self.runner.run(&args, self.settings.command_timeout).await?;
        let mut items = Self::parse_items(&output.stdout)?;

        if kind == ResourceKind::Event && items.len() > self.settings.events_limit {
            items.drain(..items.len() - self.settings.events_limit);
        }

        Ok(items)
    }

    async fn contexts(&self) -> FleetResult<Vec<String>> {
        let args = ["config", "get-contexts", "-o", "name"].map(String::from);
        let output = self.runner.run(&args, self.settings.context_timeout).await?;

        Ok(output
            .stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }

    async fn current_context(&self) -> FleetResult<Option<String>> {
        let args = ["config", "current-context"].map(String::from);
        let output = self
            .runner
            .run_unchecked(&args, self.settings.context_timeout)
            .await?;

        // kubectl exits non-zero when no context is selected
        if !output.success() {
            return Ok(None);
        }

        let current = output.stdout.trim();
        Ok((!current.is_empty()).then(|| current.to_string()))
    }

    async fn use_context(&self, context: &ClusterContext) -> FleetResult<()> {
        let args = vec![
            "config".to_string(),
            "use-context".to_string(),
            context.to_string(),
        ];
        self.runner.run(&args, self.settings.context_timeout).await?;
        Ok(())
    }

    async fn cluster_info(&self, context: &ClusterContext) -> FleetResult<String> {
        let args = vec![
            "--context".to_string(),
            context.to_string(),
            "cluster-info".to_string(),
        ];
        let output = self.runner.run(&args, self.settings.command_timeout).await?;
        Ok(output.stdout)
    }
}
