//! Managed cluster commands

use anyhow::Result;
use colored::Colorize;
use fleet_core::models::{Described, Listing};
use tabled::Tabled;

use crate::client::ApiClient;
use crate::output::{
    color_status, join_or_dash, or_dash, print_heading, print_info, print_json, print_success,
    print_table, print_warning, OutputFormat,
};

/// Row for clusters table
#[derive(Tabled)]
struct ClusterRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Version")]
    version: String,
    #[tabled(rename = "Platform")]
    platform_version: String,
    #[tabled(rename = "Created")]
    created_at: String,
}

/// Row for node groups table
#[derive(Tabled)]
struct NodeGroupRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Capacity")]
    capacity_type: String,
    #[tabled(rename = "Instance Types")]
    instance_types: String,
    #[tabled(rename = "Min")]
    min: String,
    #[tabled(rename = "Desired")]
    desired: String,
    #[tabled(rename = "Max")]
    max: String,
}

/// Row for add-ons table
#[derive(Tabled)]
struct AddonRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Version")]
    version: String,
    #[tabled(rename = "Status")]
    status: String,
}

/// Convert described items to rows; failed describes keep their name and show the error
fn described_rows<T, R>(
    listing: &Listing<Described<T>>,
    ok_row: impl Fn(&T) -> R,
    failed_row: impl Fn(&str, &str) -> R,
) -> Vec<R> {
    listing
        .items
        .iter()
        .map(|item| match item {
            Described::Ok(value) => ok_row(value),
            Described::Failed(failure) => failed_row(&failure.name, &failure.error),
        })
        .collect()
}

fn error_status(error: &str) -> String {
    format!("{}: {}", "error".red(), error)
}

/// List all clusters in the account
pub async fn list_clusters(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let result = client.clusters().await?;

    match format {
        OutputFormat::Json => print_json(&result)?,
        OutputFormat::Table => {
            if let Some(error) = &result.error {
                print_warning(&format!("Failed to list clusters: {}", error));
                return Ok(());
            }
            let rows = described_rows(
                &result,
                |c| ClusterRow {
                    name: c.name.clone(),
                    status: color_status(c.status.as_deref().unwrap_or("-")),
                    version: or_dash(c.version.as_deref()),
                    platform_version: or_dash(c.platform_version.as_deref()),
                    created_at: or_dash(c.created_at.as_deref()),
                },
                |name, error| ClusterRow {
                    name: name.to_string(),
                    status: error_status(error),
                    version: "-".to_string(),
                    platform_version: "-".to_string(),
                    created_at: "-".to_string(),
                },
            );
            print_table(rows);
        }
    }

    Ok(())
}

/// Describe one cluster
pub async fn describe_cluster(client: &ApiClient, name: &str, format: OutputFormat) -> Result<()> {
    let cluster = client.cluster(name).await?;

    match format {
        OutputFormat::Json => print_json(&cluster)?,
        OutputFormat::Table => {
            print_heading(&format!("Cluster {}", cluster.name.cyan()));
            println!("Status:                 {}", color_status(cluster.status.as_deref().unwrap_or("-")));
            println!("Version:                {}", or_dash(cluster.version.as_deref()));
            println!("Platform version:       {}", or_dash(cluster.platform_version.as_deref()));
            println!("Endpoint:               {}", or_dash(cluster.endpoint.as_deref()));
            println!("Role ARN:               {}", or_dash(cluster.role_arn.as_deref()));
            println!("Created:                {}", or_dash(cluster.created_at.as_deref()));
            println!();

            println!("{}", "Networking".bold());
            println!("{}", "-".repeat(50));
            let vpc = &cluster.vpc_config;
            println!("VPC:                    {}", or_dash(vpc.vpc_id.as_deref()));
            println!("Subnets:                {}", join_or_dash(&vpc.subnet_ids));
            println!("Security groups:        {}", join_or_dash(&vpc.security_group_ids));
            println!(
                "Cluster security group: {}",
                or_dash(vpc.cluster_security_group_id.as_deref())
            );
            println!("Public access CIDRs:    {}", join_or_dash(&vpc.public_access_cidrs));

            if !cluster.tags.is_empty() {
                println!();
                println!("{}", "Tags".bold());
                println!("{}", "-".repeat(50));
                for (key, value) in &cluster.tags {
                    println!("{} = {}", key, value);
                }
            }
        }
    }

    Ok(())
}

/// List node groups of a cluster
pub async fn list_node_groups(client: &ApiClient, cluster: &str, format: OutputFormat) -> Result<()> {
    let result = client.node_groups(cluster).await?;

    match format {
        OutputFormat::Json => print_json(&result)?,
        OutputFormat::Table => {
            if let Some(error) = &result.error {
                print_warning(&format!("Failed to list node groups: {}", error));
                return Ok(());
            }
            let rows = described_rows(
                &result,
                |ng| NodeGroupRow {
                    name: ng.name.clone(),
                    status: color_status(ng.status.as_deref().unwrap_or("-")),
                    capacity_type: or_dash(ng.capacity_type.as_deref()),
                    instance_types: join_or_dash(&ng.instance_types),
                    min: ng.scaling_config.min_size.to_string(),
                    desired: ng.scaling_config.desired_size.to_string(),
                    max: ng.scaling_config.max_size.to_string(),
                },
                |name, error| NodeGroupRow {
                    name: name.to_string(),
                    status: error_status(error),
                    capacity_type: "-".to_string(),
                    instance_types: "-".to_string(),
                    min: "-".to_string(),
                    desired: "-".to_string(),
                    max: "-".to_string(),
                },
            );
            print_table(rows);
        }
    }

    Ok(())
}

/// List add-ons installed on a cluster
pub async fn list_addons(client: &ApiClient, cluster: &str, format: OutputFormat) -> Result<()> {
    let result = client.addons(cluster).await?;

    match format {
        OutputFormat::Json => print_json(&result)?,
        OutputFormat::Table => {
            if let Some(error) = &result.error {
                print_warning(&format!("Failed to list add-ons: {}", error));
                return Ok(());
            }
            let rows = described_rows(
                &result,
                |addon| AddonRow {
                    name: addon.name.clone(),
                    version: or_dash(addon.version.as_deref()),
                    status: color_status(addon.status.as_deref().unwrap_or("-")),
                },
                |name, error| AddonRow {
                    name: name.to_string(),
                    version: "-".to_string(),
                    status: error_status(error),
                },
            );
            print_table(rows);
        }
    }

    Ok(())
}

/// Compare a cluster's version against the supported set
pub async fn show_upgrade_status(client: &ApiClient, cluster: &str, format: OutputFormat) -> Result<()> {
    let status = client.upgrade_status(cluster).await?;

    match format {
        OutputFormat::Json => print_json(&status)?,
        OutputFormat::Table => {
            print_heading(&format!("Upgrade status for {}", status.cluster_name.cyan()));
            println!("Current version:        {}", status.current_version);
            println!("Latest version:         {}", status.latest_version);
            println!();
            if status.is_up_to_date {
                print_success("Cluster is up to date");
            } else {
                print_info(&format!(
                    "Upgrades available: {}",
                    status.available_upgrades.join(", ").green()
                ));
            }
        }
    }

    Ok(())
}

/// List supported cluster versions
pub async fn list_versions(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let catalog = client.versions().await?;

    match format {
        OutputFormat::Json => print_json(&catalog)?,
        OutputFormat::Table => {
            if let Some(error) = &catalog.error {
                print_warning(&format!("Failed to list versions: {}", error));
                return Ok(());
            }
            let latest = catalog.latest_version.as_deref();
            for version in &catalog.versions {
                if Some(version.as_str()) == latest {
                    println!("{} {}", version.green().bold(), "(latest)".dimmed());
                } else {
                    println!("{}", version);
                }
            }
        }
    }

    Ok(())
}

/// Write kubeconfig credentials for a cluster and switch to it
pub async fn connect(client: &ApiClient, cluster: &str, format: OutputFormat) -> Result<()> {
    let result = client.connect(cluster).await?;

    match format {
        OutputFormat::Json => print_json(&result)?,
        OutputFormat::Table => {
            print_success(&result.message);
            print_info(&format!("Current context: {}", result.context.cyan()));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleet_core::models::DescribeFailure;

    #[test]
    fn test_failed_describes_keep_their_rows() {
        let listing: Listing<Described<String>> = Listing::ok(vec![
            Described::Ok("alpha".to_string()),
            Described::Failed(DescribeFailure {
                name: "beta".to_string(),
                error: "throttled".to_string(),
            }),
        ]);

        let rows = described_rows(
            &listing,
            |name| format!("ok {}", name),
            |name, error| format!("failed {} {}", name, error),
        );

        assert_eq!(rows, vec!["ok alpha", "failed beta throttled"]);
    }
}
