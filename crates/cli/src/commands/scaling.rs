//! Node group scaling commands

use anyhow::Result;
use colored::Colorize;
use fleet_core::models::Described;
use fleet_core::scaling::{ClusterState, ScaleBatchResult, ScaleRequest};
use tabled::Tabled;

use crate::client::ApiClient;
use crate::output::{
    color_status, print_heading, print_json, print_success, print_table, print_warning,
    OutputFormat,
};

/// Row for per-node-group scaling outcomes
#[derive(Tabled)]
struct OutcomeRow {
    #[tabled(rename = "Node Group")]
    nodegroup: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "New Config")]
    new_config: String,
}

/// Row for current node group capacity
#[derive(Tabled)]
struct CapacityRow {
    #[tabled(rename = "Node Group")]
    nodegroup: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Scaling")]
    scaling: String,
}

/// Scale a single node group
pub async fn scale_node_group(
    client: &ApiClient,
    cluster: &str,
    nodegroup: &str,
    request: ScaleRequest,
    format: OutputFormat,
) -> Result<()> {
    let result = client.scale_node_group(cluster, nodegroup, &request).await?;

    match format {
        OutputFormat::Json => print_json(&result)?,
        OutputFormat::Table => {
            print_success(&result.message);
            println!("Previous:               {}", result.previous_config);
            println!("New:                    {}", result.new_config.to_string().green());
        }
    }

    Ok(())
}

fn print_batch(batch: &ScaleBatchResult) {
    let rows = batch
        .results
        .iter()
        .map(|outcome| OutcomeRow {
            nodegroup: outcome.nodegroup.clone(),
            status: match (&outcome.status, &outcome.error) {
                (_, Some(error)) => format!("{}: {}", "failed".red(), error),
                (Some(status), None) => color_status(status),
                (None, None) => "-".to_string(),
            },
            new_config: outcome
                .new_config
                .map(|c| c.to_string())
                .unwrap_or_else(|| "-".to_string()),
        })
        .collect();
    print_table(rows);

    if batch.failed == 0 {
        print_success(&batch.message);
    } else {
        print_warning(&format!(
            "{} ({} succeeded, {} failed)",
            batch.message, batch.succeeded, batch.failed
        ));
    }
}

/// Scale every node group of a cluster to zero
pub async fn scale_down(client: &ApiClient, cluster: &str, format: OutputFormat) -> Result<()> {
    let batch = client.scale_down(cluster).await?;

    match format {
        OutputFormat::Json => print_json(&batch)?,
        OutputFormat::Table => print_batch(&batch),
    }

    Ok(())
}

/// Bring every node group of a cluster back up
pub async fn scale_up(client: &ApiClient, cluster: &str, per_nodegroup: u32, format: OutputFormat) -> Result<()> {
    let batch = client.scale_up(cluster, per_nodegroup).await?;

    match format {
        OutputFormat::Json => print_json(&batch)?,
        OutputFormat::Table => print_batch(&batch),
    }

    Ok(())
}

/// Show current capacity of every node group
pub async fn show_status(client: &ApiClient, cluster: &str, format: OutputFormat) -> Result<()> {
    let status = client.scaling_status(cluster).await?;

    match format {
        OutputFormat::Json => print_json(&status)?,
        OutputFormat::Table => {
            let state = match status.cluster_state {
                ClusterState::Running => color_status("running"),
                ClusterState::ScaledDown => color_status("scaled_down"),
            };
            print_heading(&format!("Scaling status for {}", status.cluster_name.cyan()));
            println!("State:                  {}", state);
            println!("Desired nodes:          {}", status.total_desired_nodes);
            println!();

            let rows = status
                .nodegroups
                .iter()
                .map(|item| match item {
                    Described::Ok(ng) => CapacityRow {
                        nodegroup: ng.name.clone(),
                        status: color_status(ng.status.as_deref().unwrap_or("-")),
                        scaling: ng.scaling_config.to_string(),
                    },
                    Described::Failed(failure) => CapacityRow {
                        nodegroup: failure.name.clone(),
                        status: format!("{}: {}", "error".red(), failure.error),
                        scaling: "-".to_string(),
                    },
                })
                .collect();
            print_table(rows);
        }
    }

    Ok(())
}
