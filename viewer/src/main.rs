#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

use anyhow::{Context, Result};
use clap::Parser;
use kube_service_viewer::{cluster, http, poll, Settings, SharedState, DEFAULT_GATEWAY_SERVICE};
use std::net::SocketAddr;
use tokio::time;
use tracing::Instrument;

#[derive(Parser)]
#[command(version)]
struct Args {
    #[arg(
        long,
        env = "KUBE_SERVICE_VIEWER_LOG_LEVEL",
        default_value = "kube_service_viewer=info,warn"
    )]
    log_level: kubert::LogFilter,

    #[arg(long, default_value = "plain")]
    log_format: kubert::LogFormat,

    #[command(flatten)]
    client: kubert::ClientArgs,

    /// Port the HTTP server listens on
    #[arg(long, env = "PORT", default_value = "8080")]
    port: u16,

    /// Whether NodePort services are listed alongside LoadBalancer services
    #[arg(
        long,
        env = "INCLUDE_NODEPORT",
        default_value = "true",
        action = clap::ArgAction::Set,
        value_parser = clap::builder::BoolishValueParser::new()
    )]
    include_node_port: bool,

    /// Name shown for the cluster. Defaults to the API server's host name
    #[arg(long, env = "CLUSTER_NAME")]
    cluster_name: Option<String>,

    /// Name of the gateway service whose routes are read from VirtualServices
    #[arg(long, default_value = DEFAULT_GATEWAY_SERVICE)]
    gateway_service: String,

    /// Seconds between service lists
    #[arg(long, default_value = "60")]
    poll_interval: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let Args {
        log_level,
        log_format,
        client,
        port,
        include_node_port,
        cluster_name,
        gateway_service,
        poll_interval,
    } = Args::parse();

    log_format
        .try_init(log_level)
        .context("failed to initialize logging")?;

    let cluster_name = match cluster_name {
        Some(name) => name,
        None => cluster::cluster_name(&client).await,
    };

    let client = client
        .try_client()
        .await
        .context("failed to load a Kubernetes client configuration")?;

    let node_ip = cluster::node_ip(&client).await;
    let settings = Settings {
        cluster_name,
        node_ip,
        include_node_port,
        gateway_service,
    };
    tracing::info!(
        cluster = %settings.cluster_name,
        node = %settings.node_ip,
        include_node_port,
        gateway = %settings.gateway_service,
        "starting"
    );

    let state = SharedState::default();
    let (snapshots_tx, snapshots_rx) = poll::channel();

    // The HTTP server only ever reads `state`; cluster calls stay on these two tasks.
    tokio::spawn(
        poll::parse_services(snapshots_rx, client.clone(), settings, state.clone())
            .instrument(tracing::info_span!("parse")),
    );
    tokio::spawn(
        poll::fetch_services(
            client,
            time::Duration::from_secs(poll_interval),
            snapshots_tx,
        )
        .instrument(tracing::info_span!("fetch")),
    );

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    http::serve(addr, state)
        .await
        .with_context(|| format!("failed to serve on {}", addr))
}
