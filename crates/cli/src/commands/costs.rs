//! Cost estimation commands

use anyhow::Result;
use colored::Colorize;
use fleet_core::cost::{CostEstimate, CostWindow, ServiceCost};
use tabled::Tabled;

use crate::client::ApiClient;
use crate::output::{
    format_cost, format_currency, print_heading, print_json, print_table, print_warning, OutputFormat,
};

/// Row for per-cluster cost table
#[derive(Tabled)]
struct ClusterCostRow {
    #[tabled(rename = "Cluster")]
    cluster: String,
    #[tabled(rename = "Last Day")]
    last_day: String,
    #[tabled(rename = "Last 7 Days")]
    last_7_days: String,
    #[tabled(rename = "Last 30 Days")]
    last_30_days: String,
}

/// Row for per-service cost table
#[derive(Tabled)]
struct ServiceCostRow {
    #[tabled(rename = "Service")]
    name: String,
    #[tabled(rename = "Last 30 Days")]
    cost: String,
}

impl From<&ServiceCost> for ServiceCostRow {
    fn from(service: &ServiceCost) -> Self {
        Self {
            name: service.name.clone(),
            cost: format_currency(service.cost),
        }
    }
}

fn cost_row(cluster: &str, costs: &CostEstimate) -> ClusterCostRow {
    ClusterCostRow {
        cluster: cluster.to_string(),
        last_day: format_cost(costs.get(CostWindow::LastDay)),
        last_7_days: format_cost(costs.get(CostWindow::Last7Days)),
        last_30_days: format_cost(costs.get(CostWindow::Last30Days)),
    }
}

/// Show estimated costs of one cluster
pub async fn show_cluster_costs(client: &ApiClient, cluster: &str, format: OutputFormat) -> Result<()> {
    let result = client.cluster_costs(cluster).await?;

    match format {
        OutputFormat::Json => print_json(&result)?,
        OutputFormat::Table => {
            print_heading(&format!("Costs for {}", result.cluster_name.cyan()));
            println!("Last day:               {}", format_cost(result.costs.get(CostWindow::LastDay)));
            println!("Last 7 days:            {}", format_cost(result.costs.get(CostWindow::Last7Days)));
            println!(
                "Last 30 days:           {}",
                format_cost(result.costs.get(CostWindow::Last30Days)).green().bold()
            );
        }
    }

    Ok(())
}

/// Show fleet-wide cost totals and per-cluster shares
pub async fn show_summary(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let result = client.costs_summary().await?;

    match format {
        OutputFormat::Json => print_json(&result)?,
        OutputFormat::Table => {
            if let Some(error) = &result.error {
                print_warning(&format!("Cost summary unavailable: {}", error));
                return Ok(());
            }

            print_heading("Fleet Costs");
            println!("Clusters:               {}", result.cluster_count);
            println!();

            let mut rows: Vec<ClusterCostRow> = result
                .per_cluster_costs
                .iter()
                .map(|(cluster, costs)| cost_row(cluster, costs))
                .collect();
            rows.push(cost_row("TOTAL", &result.total_costs));
            print_table(rows);
        }
    }

    Ok(())
}

/// Show account spend per billed service, most expensive first
pub async fn show_services(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let result = client.service_costs().await?;

    match format {
        OutputFormat::Json => print_json(&result)?,
        OutputFormat::Table => {
            if let Some(error) = &result.error {
                print_warning(&format!("Service costs unavailable: {}", error));
                return Ok(());
            }

            print_heading("Costs by Service");
            print_table(result.items.iter().map(ServiceCostRow::from).collect());

            let total: f64 = result.items.iter().map(|s| s.cost).sum();
            println!("Total:                  {}", format_currency(total).green().bold());
        }
    }

    Ok(())
}
