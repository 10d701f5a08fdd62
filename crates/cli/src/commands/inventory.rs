//! Tagged resource inventory command

use anyhow::Result;
use fleet_core::inventory::ResourceCount;
use tabled::Tabled;

use crate::client::ApiClient;
use crate::output::{print_heading, print_json, print_table, print_warning, OutputFormat};

#[derive(Tabled)]
struct ResourceRow {
    #[tabled(rename = "Service")]
    service: String,
    #[tabled(rename = "Resources")]
    count: u32,
}

fn resource_rows(counts: &[ResourceCount]) -> Vec<ResourceRow> {
    counts
        .iter()
        .map(|c| ResourceRow {
            service: c.service.clone(),
            count: c.count,
        })
        .collect()
}

/// Count account resources per service
pub async fn show_inventory(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let result = client.resource_counts().await?;

    match format {
        OutputFormat::Json => print_json(&result)?,
        OutputFormat::Table => {
            if let Some(error) = &result.error {
                print_warning(&format!("Failed to list tagged resources: {}", error));
                return Ok(());
            }
            print_heading("Tagged Resources");
            print_table(resource_rows(&result.items));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_keep_ranking() {
        let counts = vec![
            ResourceCount { service: "ec2".into(), count: 7 },
            ResourceCount { service: "s3".into(), count: 2 },
        ];

        let rows = resource_rows(&counts);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].service, "ec2");
        assert_eq!(rows[1].count, 2);
    }
}
