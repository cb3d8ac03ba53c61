use crate::{parse, Cluster, GlobalState, Settings, SharedState};
use k8s_openapi::api::core::v1::Service;
use std::sync::Arc;
use tokio::{sync::watch, time};

/// The complete result of one service list.
pub type ServiceSnapshot = Arc<Vec<Service>>;

/// Creates the handoff between the fetch and parse tasks.
///
/// The channel holds only the latest snapshot and a single changed flag, so any number of fetches
/// that complete before the parse task wakes result in one parse of the newest snapshot.
pub fn channel() -> (
    watch::Sender<ServiceSnapshot>,
    watch::Receiver<ServiceSnapshot>,
) {
    watch::channel(Arc::new(Vec::new()))
}

/// Lists services every `interval`, handing each successful result to the parse task.
///
/// A failed list is logged and otherwise ignored: the previous snapshot stays in place and the
/// parse task is not woken. The next attempt happens at the next interval.
pub async fn fetch_services<C: Cluster>(
    cluster: C,
    interval: time::Duration,
    snapshots: watch::Sender<ServiceSnapshot>,
) {
    let mut timer = time::interval(interval);
    timer.set_missed_tick_behavior(time::MissedTickBehavior::Delay);

    loop {
        timer.tick().await;
        tracing::trace!("listing services");

        match cluster.list_services().await {
            Ok(services) => {
                tracing::debug!(services = services.len(), "listed services");
                if snapshots.send(Arc::new(services)).is_err() {
                    tracing::error!("dropping snapshot because the parser is gone");
                    return;
                }
            }
            Err(error) => {
                tracing::warn!(%error, "failed to list services; keeping the previous snapshot");
            }
        }
    }
}

/// Parses each new snapshot and publishes the result.
///
/// The snapshot is marked as seen before parsing starts, so a fetch that completes during a parse
/// triggers exactly one more parse afterwards.
pub async fn parse_services<C: Cluster>(
    mut snapshots: watch::Receiver<ServiceSnapshot>,
    cluster: C,
    settings: Settings,
    state: SharedState,
) {
    while snapshots.changed().await.is_ok() {
        let snapshot = snapshots.borrow_and_update().clone();
        publish(&cluster, &snapshot, &settings, &state).await;
    }

    tracing::debug!("snapshot stream ended");
}

/// Runs one parse pass over `services` and publishes it.
pub async fn publish<C: Cluster>(
    cluster: &C,
    services: &[Service],
    settings: &Settings,
    state: &SharedState,
) {
    let parse::Parsed {
        services,
        namespaces,
    } = parse::parse(cluster, services, settings).await;

    tracing::info!(
        endpoints = services.len(),
        namespaces = namespaces.len(),
        "publishing services"
    );
    state.publish(GlobalState::new(
        settings.cluster_name.clone(),
        services,
        namespaces,
    ));
}
