use crate::{Settings, VirtualService};
use k8s_openapi::api::core::v1::{Node, Service};
use kube::{
    api::{Api, ListParams},
    config::{KubeConfigOptions, Kubeconfig, KubeconfigError},
};
use std::future::Future;

/// The cluster API calls the viewer depends on. Each call may fail independently.
pub trait Cluster {
    /// Lists services in all namespaces.
    fn list_services(&self) -> impl Future<Output = kube::Result<Vec<Service>>> + Send;

    fn list_virtual_services(
        &self,
        namespace: &str,
    ) -> impl Future<Output = kube::Result<Vec<VirtualService>>> + Send;

    fn list_nodes(&self) -> impl Future<Output = kube::Result<Vec<Node>>> + Send;
}

impl Cluster for kube::Client {
    async fn list_services(&self) -> kube::Result<Vec<Service>> {
        let api = Api::<Service>::all(self.clone());
        let list = api.list(&ListParams::default()).await?;
        Ok(list.items)
    }

    async fn list_virtual_services(&self, namespace: &str) -> kube::Result<Vec<VirtualService>> {
        let api = Api::<VirtualService>::namespaced(self.clone(), namespace);
        let list = api.list(&ListParams::default()).await?;
        Ok(list.items)
    }

    async fn list_nodes(&self) -> kube::Result<Vec<Node>> {
        let api = Api::<Node>::all(self.clone());
        let list = api.list(&ListParams::default()).await?;
        Ok(list.items)
    }
}

/// Looks up the address used to reach node-port services: the first address of the first node.
///
/// This is resolved once at startup. If nodes can't be listed, node-port URLs are rendered
/// without an address rather than failing.
pub async fn node_ip<C: Cluster>(cluster: &C) -> String {
    match cluster.list_nodes().await {
        Ok(nodes) => {
            let ip = first_node_address(&nodes).unwrap_or_default();
            tracing::debug!(nodes = nodes.len(), %ip, "resolved node address");
            ip
        }
        Err(error) => {
            tracing::warn!(%error, "failed to list nodes; node port URLs will have no address");
            String::new()
        }
    }
}

/// The host of the API server the client connects to, used as the cluster's display name.
///
/// The kubeconfig entry is selected from `args` the same way `ClientArgs::try_client` selects
/// it, falling back to the in-cluster configuration when no local configuration was requested.
pub async fn cluster_name(args: &kubert::ClientArgs) -> String {
    let local = match &args.kubeconfig {
        Some(path) => Kubeconfig::read_from(path),
        None => Kubeconfig::read(),
    };
    let local = match local {
        Ok(kubeconfig) => selected_config(kubeconfig, args).await,
        Err(error) => Err(error),
    };

    let config = match local {
        Ok(config) => Some(config),
        Err(error) if is_customized(args) => {
            tracing::debug!(%error, "failed to load the selected kubeconfig");
            None
        }
        Err(_) => match kube::Config::incluster() {
            Ok(config) => Some(config),
            Err(error) => {
                tracing::debug!(%error, "failed to infer the cluster URL");
                None
            }
        },
    };

    config
        .and_then(|c| c.cluster_url.host().map(str::to_string))
        .unwrap_or_else(|| Settings::default().cluster_name)
}

async fn selected_config(
    kubeconfig: Kubeconfig,
    args: &kubert::ClientArgs,
) -> Result<kube::Config, KubeconfigError> {
    let options = KubeConfigOptions {
        context: args.context.clone(),
        cluster: args.cluster.clone(),
        user: args.user.clone(),
    };
    kube::Config::from_custom_kubeconfig(kubeconfig, &options).await
}

fn is_customized(args: &kubert::ClientArgs) -> bool {
    args.context.is_some()
        || args.cluster.is_some()
        || args.user.is_some()
        || args.impersonate_user.is_some()
        || args.impersonate_group.is_some()
        || args.kubeconfig.is_some()
}

fn first_node_address(nodes: &[Node]) -> Option<String> {
    let node = nodes.first()?;
    let addresses = node.status.as_ref()?.addresses.as_ref()?;
    addresses.first().map(|a| a.address.clone())
}


#[cfg(test)]
mod tests {
    use super::test_util::*;
    use super::*;

    #[tokio::test]
    async fn node_ip_uses_first_address_of_first_node() {
        let cluster = FakeCluster::default();
        cluster.set_nodes(Ok(vec![
            node(&["10.0.0.5", "node-a.internal"]),
            node(&["10.0.0.6"]),
        ]));
        assert_eq!(node_ip(&cluster).await, "10.0.0.5");
    }

    #[tokio::test]
    async fn node_ip_empty_without_nodes() {
        let cluster = FakeCluster::default();
        cluster.set_nodes(Ok(vec![]));
        assert_eq!(node_ip(&cluster).await, "");

        cluster.set_nodes(Ok(vec![Node::default()]));
        assert_eq!(node_ip(&cluster).await, "");
    }

    const KUBECONFIG: &str = r#"
apiVersion: v1
kind: Config
current-context: a
clusters:
  - name: a
    cluster:
      server: https://cluster-a.example:6443
  - name: b
    cluster:
      server: https://cluster-b.example:6443
contexts:
  - name: a
    context:
      cluster: a
      user: admin
  - name: b
    context:
      cluster: b
      user: admin
users:
  - name: admin
    user:
      token: secret
"#;

    #[tokio::test]
    async fn cluster_name_follows_selected_context() {
        let path = std::env::temp_dir().join(format!("ksv-kubeconfig-{}", std::process::id()));
        std::fs::write(&path, KUBECONFIG).unwrap();

        let current = kubert::ClientArgs {
            kubeconfig: Some(path.clone()),
            ..Default::default()
        };
        let selected = kubert::ClientArgs {
            context: Some("b".to_string()),
            ..current.clone()
        };
        let a = cluster_name(&current).await;
        let b = cluster_name(&selected).await;
        std::fs::remove_file(&path).unwrap();

        assert_eq!(a, "cluster-a.example");
        assert_eq!(b, "cluster-b.example");
    }

    #[tokio::test]
    async fn cluster_override_wins_over_context() {
        let args = kubert::ClientArgs {
            context: Some("a".to_string()),
            cluster: Some("b".to_string()),
            ..Default::default()
        };
        let kubeconfig = Kubeconfig::from_yaml(KUBECONFIG).unwrap();
        let config = selected_config(kubeconfig, &args).await.unwrap();
        assert_eq!(config.cluster_url.host(), Some("cluster-b.example"));
    }

    #[tokio::test]
    async fn cluster_name_falls_back_when_selection_fails() {
        let missing_context = kubert::ClientArgs {
            context: Some("c".to_string()),
            ..Default::default()
        };
        let kubeconfig = Kubeconfig::from_yaml(KUBECONFIG).unwrap();
        assert!(selected_config(kubeconfig, &missing_context).await.is_err());

        let missing_file = kubert::ClientArgs {
            kubeconfig: Some(std::env::temp_dir().join("ksv-kubeconfig-does-not-exist")),
            ..Default::default()
        };
        assert_eq!(cluster_name(&missing_file).await, "Unknown Cluster");
    }

    #[tokio::test]
    async fn node_ip_empty_on_error() {
        let cluster = FakeCluster::default();
        cluster.set_nodes(Err(api_error(403)));
        assert_eq!(node_ip(&cluster).await, "");
    }
}
