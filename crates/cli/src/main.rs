//! Fleet console CLI
//!
//! A command-line tool for browsing cluster resources, scaling node
//! groups, checking versions and estimating costs through the fleet console.

mod client;
mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{clusters, configure, contexts, costs, inventory, resources, scaling};
use fleet_core::scaling::{ScaleRequest, DEFAULT_SCALE_UP_SIZE};

const DEFAULT_API_URL: &str = "http://localhost:8080";

/// Fleet console CLI
#[derive(Parser)]
#[command(name = "fleetctl")]
#[command(author, version, about = "CLI for the Fleet Console", long_about = None)]
pub struct Cli {
    /// Console API URL (can also be set via FLEETCTL_API_URL env var)
    #[arg(long, env = "FLEETCTL_API_URL")]
    pub api_url: Option<String>,

    /// Output format
    #[arg(long, short)]
    pub format: Option<output::OutputFormat>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Inspect and switch kubeconfig contexts
    #[command(subcommand)]
    Contexts(ContextsCommands),

    /// List resources of one kind
    Get {
        /// Resource kind (pods, deployments, svc, pvc, nodes, events, ...)
        kind: String,

        /// Context to query
        #[arg(long, short)]
        context: String,

        /// Namespace (all namespaces if not specified)
        #[arg(long, short)]
        namespace: Option<String>,
    },

    /// Summarize pods, deployments and services
    Summary {
        /// Context to query
        #[arg(long, short)]
        context: String,

        /// Restrict the summary to one namespace
        #[arg(long, short)]
        namespace: Option<String>,
    },

    /// Managed cluster inventory
    #[command(subcommand)]
    Clusters(ClustersCommands),

    /// List supported cluster versions
    Versions,

    /// Node group scaling
    #[command(subcommand)]
    Scale(ScaleCommands),

    /// Add a cluster to kubeconfig and switch to it
    Connect {
        /// Cluster name
        cluster: String,
    },

    /// View cost estimates
    #[command(subcommand)]
    Costs(CostsCommands),

    /// Count tagged account resources per service
    Inventory,

    /// Manage local CLI settings
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
pub enum ContextsCommands {
    /// List contexts
    List,

    /// Switch the current context
    Use {
        /// Context name
        context: String,
    },

    /// Show control plane information for a context
    Info {
        /// Context name
        context: String,
    },
}

#[derive(Subcommand)]
pub enum ClustersCommands {
    /// List clusters
    List,

    /// Describe a cluster
    Describe {
        /// Cluster name
        name: String,
    },

    /// List node groups of a cluster
    Nodegroups {
        /// Cluster name
        cluster: String,
    },

    /// List add-ons of a cluster
    Addons {
        /// Cluster name
        cluster: String,
    },

    /// Check available version upgrades
    Upgrade {
        /// Cluster name
        cluster: String,
    },
}

#[derive(Subcommand)]
pub enum ScaleCommands {
    /// Set the capacity of one node group
    Set {
        /// Cluster name
        cluster: String,

        /// Node group name
        nodegroup: String,

        /// Desired node count
        #[arg(long)]
        desired: u32,

        /// Minimum node count (derived from current config if not specified)
        #[arg(long)]
        min: Option<u32>,

        /// Maximum node count (derived from current config if not specified)
        #[arg(long)]
        max: Option<u32>,
    },

    /// Scale every node group to zero
    Down {
        /// Cluster name
        cluster: String,
    },

    /// Scale every node group back up
    Up {
        /// Cluster name
        cluster: String,

        /// Desired nodes per node group
        #[arg(long, default_value_t = DEFAULT_SCALE_UP_SIZE)]
        per_nodegroup: u32,
    },

    /// Show current node group capacity
    Status {
        /// Cluster name
        cluster: String,
    },
}

#[derive(Subcommand)]
pub enum CostsCommands {
    /// Show estimated costs for one cluster
    Cluster {
        /// Cluster name
        name: String,
    },

    /// Show fleet-wide cost summary
    Summary,

    /// Show account spend per service over the last 30 days
    Services,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show stored settings
    Show,

    /// Store default settings
    Set {
        /// Default console API URL
        #[arg(long = "url")]
        api_url: Option<String>,

        /// Default output format
        #[arg(long = "default-format")]
        default_format: Option<output::OutputFormat>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = config::Config::load()?;

    let format = cli
        .format
        .or_else(|| config.default_format.as_deref().and_then(output::OutputFormat::from_name))
        .unwrap_or_default();

    if let Commands::Config(config_cmd) = cli.command {
        return match config_cmd {
            ConfigCommands::Show => configure::show(format),
            ConfigCommands::Set {
                api_url,
                default_format,
            } => configure::set(api_url, default_format),
        };
    }

    // Initialize client
    let api_url = cli
        .api_url
        .or(config.api_url)
        .unwrap_or_else(|| DEFAULT_API_URL.to_string());
    let client = client::ApiClient::new(&api_url)?;

    // Execute command
    let outcome = match cli.command {
        Commands::Contexts(cmd) => match cmd {
            ContextsCommands::List => contexts::list_contexts(&client, format).await,
            ContextsCommands::Use { context } => contexts::use_context(&client, &context, format).await,
            ContextsCommands::Info { context } => contexts::show_info(&client, &context, format).await,
        },
        Commands::Get {
            kind,
            context,
            namespace,
        } => resources::get_resources(&client, &kind, &context, namespace, format).await,
        Commands::Summary { context, namespace } => {
            resources::show_summary(&client, &context, namespace, format).await
        }
        Commands::Clusters(cmd) => match cmd {
            ClustersCommands::List => clusters::list_clusters(&client, format).await,
            ClustersCommands::Describe { name } => clusters::describe_cluster(&client, &name, format).await,
            ClustersCommands::Nodegroups { cluster } => {
                clusters::list_node_groups(&client, &cluster, format).await
            }
            ClustersCommands::Addons { cluster } => clusters::list_addons(&client, &cluster, format).await,
            ClustersCommands::Upgrade { cluster } => {
                clusters::show_upgrade_status(&client, &cluster, format).await
            }
        },
        Commands::Versions => clusters::list_versions(&client, format).await,
        Commands::Scale(cmd) => match cmd {
            ScaleCommands::Set {
                cluster,
                nodegroup,
                desired,
                min,
                max,
            } => {
                let request = ScaleRequest {
                    desired_size: desired,
                    min_size: min,
                    max_size: max,
                };
                scaling::scale_node_group(&client, &cluster, &nodegroup, request, format).await
            }
            ScaleCommands::Down { cluster } => scaling::scale_down(&client, &cluster, format).await,
            ScaleCommands::Up {
                cluster,
                per_nodegroup,
            } => scaling::scale_up(&client, &cluster, per_nodegroup, format).await,
            ScaleCommands::Status { cluster } => scaling::show_status(&client, &cluster, format).await,
        },
        Commands::Connect { cluster } => clusters::connect(&client, &cluster, format).await,
        Commands::Costs(cmd) => match cmd {
            CostsCommands::Cluster { name } => costs::show_cluster_costs(&client, &name, format).await,
            CostsCommands::Summary => costs::show_summary(&client, format).await,
            CostsCommands::Services => costs::show_services(&client, format).await,
        },
        Commands::Inventory => inventory::show_inventory(&client, format).await,
        Commands::Config(_) => Ok(()),
    };

    if let Err(e) = outcome {
        output::print_error(&format!("{:#}", e));
        std::process::exit(1);
    }

    Ok(())
}
