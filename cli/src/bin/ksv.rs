use anyhow::{Context, Result};
use clap::Parser;
use kube_service_viewer::{cluster, Settings, DEFAULT_GATEWAY_SERVICE};
use kube_service_viewer_cli::{check, list};
use kubert::ClientArgs;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
/// Lists the externally reachable services of a Kubernetes cluster.
struct Cli {
    #[command(flatten)]
    client: kubert::ClientArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::ValueEnum, Clone)]
enum OutputMode {
    Table,
    Json,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Check that the cluster grants what the viewer needs
    Check {
        /// Output format
        #[arg(short, long, default_value = "table")]
        output: OutputMode,
    },

    /// Discover and print externally reachable endpoints once
    List {
        /// Include NodePort services
        #[arg(
            long,
            env = "INCLUDE_NODEPORT",
            default_value = "true",
            action = clap::ArgAction::Set,
            value_parser = clap::builder::BoolishValueParser::new()
        )]
        include_node_port: bool,

        /// Name of the gateway service whose routes are read from VirtualServices
        #[arg(long, default_value = DEFAULT_GATEWAY_SERVICE)]
        gateway_service: String,

        /// Only print endpoints in this namespace
        #[arg(short, long)]
        namespace: Option<String>,

        /// Output format
        #[arg(short, long, default_value = "table")]
        output: OutputMode,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let Cli { client, command } = Cli::parse();

    match command {
        Commands::Check { output } => {
            let client = try_client(client).await?;

            let results = check::run_checks(client).await;
            let success = match output {
                OutputMode::Table => check::print_checks(results),
                OutputMode::Json => check::json_print_checks(results),
            };

            if !success {
                std::process::exit(1);
            }
        }

        Commands::List {
            include_node_port,
            gateway_service,
            namespace,
            output,
        } => {
            let cluster_name = cluster::cluster_name(&client).await;
            let client = try_client(client).await?;

            let settings = Settings {
                cluster_name,
                include_node_port,
                gateway_service,
                ..Default::default()
            };
            let state = list::list(&client, settings, namespace.as_deref()).await?;
            match output {
                OutputMode::Table => list::print_list(&state),
                OutputMode::Json => list::json_print_list(&state),
            }
        }
    };

    Ok(())
}

async fn try_client(client: ClientArgs) -> Result<kubert::client::Client> {
    client
        .try_client()
        .await
        .context("failed to load a Kubernetes client configuration")
}
