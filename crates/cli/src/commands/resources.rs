//! Resource listing and summary commands

use anyhow::Result;
use chrono::{DateTime, Utc};
use colored::Colorize;
use fleet_core::normalizer::{ResourceDescriptor, ResourceDetail};
use tabled::Tabled;

use crate::client::ApiClient;
use crate::output::{
    color_status, join_or_dash, or_dash, print_heading, print_json, print_table, print_warning,
    OutputFormat,
};

/// Row for resource listings
#[derive(Tabled)]
struct ResourceRow {
    #[tabled(rename = "Namespace")]
    namespace: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Age")]
    age: String,
    #[tabled(rename = "Details")]
    details: String,
}

/// Row for per-namespace counts
#[derive(Tabled)]
struct NamespaceCountRow {
    #[tabled(rename = "Namespace")]
    namespace: String,
    #[tabled(rename = "Pods")]
    pods: u32,
    #[tabled(rename = "Deployments")]
    deployments: u32,
    #[tabled(rename = "Services")]
    services: u32,
}

/// Row for pod phase histogram
#[derive(Tabled)]
struct PhaseRow {
    #[tabled(rename = "Phase")]
    phase: String,
    #[tabled(rename = "Pods")]
    count: u32,
}

/// Render the age of a creation timestamp, e.g. `3d` or `5h`
fn format_age(timestamp: Option<&str>, now: DateTime<Utc>) -> String {
    let Some(created) = timestamp.and_then(|ts| DateTime::parse_from_rfc3339(ts).ok()) else {
        return or_dash(timestamp);
    };
    let elapsed = now.signed_duration_since(created.with_timezone(&Utc));

    if elapsed.num_days() > 0 {
        format!("{}d", elapsed.num_days())
    } else if elapsed.num_hours() > 0 {
        format!("{}h", elapsed.num_hours())
    } else if elapsed.num_minutes() > 0 {
        format!("{}m", elapsed.num_minutes())
    } else {
        format!("{}s", elapsed.num_seconds().max(0))
    }
}

/// One-line summary of the kind-specific fields
fn detail_summary(detail: &ResourceDetail) -> String {
    match detail {
        ResourceDetail::Pod(d) => format!(
            "ready {}, restarts {}, node {}",
            d.ready,
            d.restarts,
            or_dash(d.node.as_deref())
        ),
        ResourceDetail::Deployment(d) => format!(
            "ready {}, up-to-date {}, available {}",
            d.ready, d.up_to_date, d.available
        ),
        ResourceDetail::Service(d) => format!(
            "{} {} {}",
            d.service_type,
            or_dash(d.cluster_ip.as_deref()),
            join_or_dash(&d.ports)
        ),
        ResourceDetail::ConfigMap(d) => format!("{} keys", d.data_count),
        ResourceDetail::Secret(d) => format!("{}, {} keys", d.secret_type, d.data_keys.len()),
        ResourceDetail::Ingress(d) => format!(
            "hosts {}, address {}",
            join_or_dash(&d.hosts),
            or_dash(d.address.as_deref())
        ),
        ResourceDetail::PersistentVolumeClaim(d) => format!(
            "{} {}",
            or_dash(d.capacity.as_deref()),
            or_dash(d.storage_class.as_deref())
        ),
        ResourceDetail::Job(d) => format!("completions {}, active {}, failed {}", d.completions, d.active, d.failed),
        ResourceDetail::CronJob(d) => format!(
            "schedule {}, active {}{}",
            or_dash(d.schedule.as_deref()),
            d.active,
            if d.suspend { ", suspended" } else { "" }
        ),
        ResourceDetail::StatefulSet(d) => format!("ready {}", d.ready),
        ResourceDetail::DaemonSet(d) => format!("desired {}, ready {}, available {}", d.desired, d.ready, d.available),
        ResourceDetail::ReplicaSet(d) => format!("desired {}, current {}, ready {}", d.desired, d.current, d.ready),
        ResourceDetail::Node(d) => format!(
            "{} {} {}",
            join_or_dash(&d.roles),
            or_dash(d.version.as_deref()),
            or_dash(d.internal_ip.as_deref())
        ),
        ResourceDetail::Event(d) => format!(
            "{} {} x{}: {}",
            or_dash(d.event_type.as_deref()),
            d.object,
            d.count,
            or_dash(d.message.as_deref())
        ),
        ResourceDetail::Namespace(d) => format!("{} labels", d.labels.len()),
    }
}

fn resource_row(resource: &ResourceDescriptor, now: DateTime<Utc>) -> ResourceRow {
    ResourceRow {
        namespace: or_dash(resource.namespace.as_deref()),
        name: resource.name.clone(),
        status: resource
            .status
            .as_deref()
            .map(color_status)
            .unwrap_or_else(|| "-".to_string()),
        age: format_age(resource.age.as_deref(), now),
        details: detail_summary(&resource.detail),
    }
}

/// List one resource kind in a context
pub async fn get_resources(
    client: &ApiClient,
    kind: &str,
    context: &str,
    namespace: Option<String>,
    format: OutputFormat,
) -> Result<()> {
    let result = client.resources(context, kind, namespace.as_deref()).await?;

    match format {
        OutputFormat::Json => print_json(&result)?,
        OutputFormat::Table => {
            if let Some(error) = &result.error {
                print_warning(&format!("Failed to list {}: {}", kind, error));
                return Ok(());
            }
            let now = Utc::now();
            print_table(result.items.iter().map(|r| resource_row(r, now)).collect());
        }
    }

    Ok(())
}

/// Summarize a context, or one namespace within it
pub async fn show_summary(
    client: &ApiClient,
    context: &str,
    namespace: Option<String>,
    format: OutputFormat,
) -> Result<()> {
    match namespace {
        Some(ns) => {
            let result = client.namespace_summary(context, &ns).await?;
            match format {
                OutputFormat::Json => print_json(&result)?,
                OutputFormat::Table => {
                    print_heading(&format!("Namespace {}", result.namespace.cyan()));
                    println!("Pods:                   {}", result.counts.pods);
                    println!("Deployments:            {}", result.counts.deployments);
                    println!("Services:               {}", result.counts.services);
                    println!();
                    print_phases(result.pod_statuses.iter());
                    for (kind, error) in &result.errors {
                        print_warning(&format!("{} unavailable: {}", kind, error));
                    }
                }
            }
        }
        None => {
            let result = client.fleet_summary(context).await?;
            match format {
                OutputFormat::Json => print_json(&result)?,
                OutputFormat::Table => {
                    print_heading(&format!("Context {}", context.cyan()));
                    println!("Namespaces:             {}", result.total_counts.namespaces);
                    println!("Pods:                   {}", result.total_counts.pods);
                    println!("Deployments:            {}", result.total_counts.deployments);
                    println!("Services:               {}", result.total_counts.services);
                    println!();
                    print_phases(result.pod_statuses.iter());
                    println!();

                    let rows = result
                        .by_namespace
                        .iter()
                        .map(|(namespace, counts)| NamespaceCountRow {
                            namespace: namespace.clone(),
                            pods: counts.pods,
                            deployments: counts.deployments,
                            services: counts.services,
                        })
                        .collect();
                    print_table(rows);

                    for (kind, error) in &result.errors {
                        print_warning(&format!("{} unavailable: {}", kind, error));
                    }
                }
            }
        }
    }

    Ok(())
}

fn print_phases<'a>(phases: impl Iterator<Item = (&'a String, &'a u32)>) {
    let rows: Vec<PhaseRow> = phases
        .map(|(phase, count)| PhaseRow {
            phase: color_status(phase),
            count: *count,
        })
        .collect();
    if !rows.is_empty() {
        print_table(rows);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use fleet_core::normalizer::PodDetail;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_format_age() {
        assert_eq!(format_age(Some("2024-06-12T12:00:00Z"), now()), "3d");
        assert_eq!(format_age(Some("2024-06-15T07:00:00Z"), now()), "5h");
        assert_eq!(format_age(Some("2024-06-15T11:58:30Z"), now()), "1m");
        assert_eq!(format_age(None, now()), "-");
        assert_eq!(format_age(Some("yesterday"), now()), "yesterday");
    }

    #[test]
    fn test_pod_row() {
        let pod = ResourceDescriptor {
            namespace: Some("shop".to_string()),
            name: "web-0".to_string(),
            age: Some("2024-06-14T12:00:00Z".to_string()),
            status: Some("Running".to_string()),
            detail: ResourceDetail::Pod(PodDetail {
                ready: "1/2".to_string(),
                restarts: 3,
                node: None,
                containers: vec!["web".to_string(), "sidecar".to_string()],
            }),
        };

        let row = resource_row(&pod, now());
        assert_eq!(row.namespace, "shop");
        assert_eq!(row.age, "1d");
        assert_eq!(row.details, "ready 1/2, restarts 3, node -");
    }
}
