//! Kubeconfig context commands

use anyhow::Result;
use colored::Colorize;
use tabled::Tabled;

use crate::client::ApiClient;
use crate::output::{print_json, print_success, print_table, print_warning, OutputFormat};

/// Row for contexts table
#[derive(Tabled)]
struct ContextRow {
    #[tabled(rename = "Current")]
    current: String,
    #[tabled(rename = "Name")]
    name: String,
}

/// List contexts known to the console's kubeconfig
pub async fn list_contexts(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let result = client.contexts().await?;

    match format {
        OutputFormat::Json => print_json(&result)?,
        OutputFormat::Table => {
            if let Some(error) = &result.error {
                print_warning(&format!("Failed to list contexts: {}", error));
            }
            let rows = result
                .contexts
                .iter()
                .map(|c| ContextRow {
                    current: if c.is_current { "*".green().to_string() } else { String::new() },
                    name: c.name.clone(),
                })
                .collect();
            print_table(rows);
        }
    }

    Ok(())
}

/// Select the console's current context
pub async fn use_context(client: &ApiClient, context: &str, format: OutputFormat) -> Result<()> {
    let result = client.switch_context(context).await?;

    match format {
        OutputFormat::Json => print_json(&result)?,
        OutputFormat::Table => print_success(&result.message),
    }

    Ok(())
}

/// Show control-plane endpoints for a context
pub async fn show_info(client: &ApiClient, context: &str, format: OutputFormat) -> Result<()> {
    let result = client.cluster_info(context).await?;

    match format {
        OutputFormat::Json => print_json(&result)?,
        OutputFormat::Table => match (&result.info, &result.error) {
            (Some(info), _) => println!("{}", info.trim_end()),
            (None, Some(error)) => print_warning(&format!("Cluster info unavailable: {}", error)),
            (None, None) => print_warning("Cluster info unavailable"),
        },
    }

    Ok(())
}
