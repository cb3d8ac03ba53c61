use crate::table::{Column, Table};
use anyhow::{Context, Result};
use kube_service_viewer::{cluster, poll, Cluster, GlobalState, ParsedService, Settings, SharedState};

/// Runs a single fetch and parse pass, returning the state the viewer would publish.
///
/// When `namespace` is set, only that namespace's endpoints and namespace entry are kept.
pub async fn list<C: Cluster>(
    cluster: &C,
    mut settings: Settings,
    namespace: Option<&str>,
) -> Result<GlobalState> {
    let services = cluster
        .list_services()
        .await
        .context("failed to list services")?;
    settings.node_ip = cluster::node_ip(cluster).await;

    let state = SharedState::default();
    poll::publish(cluster, &services, &settings, &state).await;

    let mut state = GlobalState::clone(&state.read());
    if let Some(ns) = namespace {
        state.services.retain(|s| s.namespace == ns);
        state.namespaces = state.namespaces.iter().filter(|n| *n == ns).collect();
    }
    Ok(state)
}

pub fn print_list(state: &GlobalState) {
    let table = Table::new(
        vec![
            Column::new("NAMESPACE", |s: &ParsedService| s.namespace.clone()),
            Column::new("NAME", |s: &ParsedService| s.name.clone()),
            Column::new("PORT", port),
            Column::new("URL", ParsedService::url),
        ],
        &state.services,
    );
    println!("{} ({})", state.cluster_name, state.timestamp);
    println!();
    print!("{}", table);
}

pub fn json_print_list(state: &GlobalState) {
    serde_json::to_writer_pretty(std::io::stdout(), state).expect("serialization failed");
    println!();
}

fn port(svc: &ParsedService) -> String {
    match (svc.port_name.is_empty(), svc.node_port) {
        (true, None) => svc.port.to_string(),
        (true, Some(np)) => format!("{}:{}", svc.port, np),
        (false, None) => format!("{}/{}", svc.port_name, svc.port),
        (false, Some(np)) => format!("{}/{}:{}", svc.port_name, svc.port, np),
    }
}
