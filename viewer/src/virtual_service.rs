use crate::{
    parse::{ExposedPort, ExposedService},
    Cluster, ParsedService,
};
use kube::ResourceExt;

/// The Gloo `gateway.solo.io/VirtualService` custom resource
#[derive(
    Clone,
    Debug,
    Default,
    kube::CustomResource,
    serde::Deserialize,
    serde::Serialize,
    schemars::JsonSchema,
)]
#[kube(
    group = "gateway.solo.io",
    version = "v1",
    kind = "VirtualService",
    shortname = "vs",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct VirtualServiceSpec {
    #[serde(default)]
    pub virtual_host: VirtualHost,
}

#[derive(Clone, Debug, Default, serde::Deserialize, serde::Serialize, schemars::JsonSchema)]
pub struct VirtualHost {
    #[serde(default)]
    pub domains: Vec<String>,

    #[serde(default)]
    pub routes: Vec<Route>,
}

#[derive(Clone, Debug, Default, serde::Deserialize, serde::Serialize, schemars::JsonSchema)]
pub struct Route {
    #[serde(default)]
    pub matchers: Vec<Matcher>,
}

/// A request matcher. Only prefix matchers contribute a path; other matchers resolve to the root.
#[derive(Clone, Debug, Default, serde::Deserialize, serde::Serialize, schemars::JsonSchema)]
pub struct Matcher {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
}

/// Returns the gateway listener protocol that serves a virtual service.
///
/// The resource doesn't declare this, so it is inferred from the resource's name: names
/// containing `https` are served over HTTPS, everything else over HTTP. The returned tag is
/// matched against the gateway's port names.
pub fn route_protocol(vs: &VirtualService) -> &'static str {
    if vs.name_any().contains("https") {
        "https"
    } else {
        "http"
    }
}

/// Expands the gateway service into one entry per routed path prefix, using the virtual services
/// in the gateway's namespace.
///
/// A failure to list virtual services only affects this namespace: it is logged and no routes are
/// returned.
#[tracing::instrument(skip_all, fields(namespace = %gateway.namespace, gateway = %gateway.name))]
pub async fn resolve_routes<C: Cluster>(
    cluster: &C,
    gateway: &ExposedService,
    node_ip: &str,
) -> Vec<ParsedService> {
    let virtual_services = match cluster.list_virtual_services(&gateway.namespace).await {
        Ok(vss) => vss,
        Err(error) => {
            tracing::warn!(%error, "failed to list virtual services");
            return Vec::new();
        }
    };

    let mut routes = Vec::new();
    for vs in &virtual_services {
        let name = vs.name_any();
        let protocol = route_protocol(vs);
        let port = match gateway_port(&gateway.ports, protocol) {
            Some(port) => port,
            None => {
                tracing::trace!(virtualservice = %name, %protocol, "no gateway port for protocol");
                continue;
            }
        };

        for matcher in vs.spec.virtual_host.routes.iter().flat_map(|r| &r.matchers) {
            let prefix = matcher.prefix.clone().unwrap_or_default();
            routes.push(gateway.entry(&name, port, prefix, protocol, node_ip));
        }
    }

    tracing::debug!(
        virtualservices = virtual_services.len(),
        routes = routes.len(),
        "resolved gateway routes"
    );
    routes
}

fn gateway_port<'p>(ports: &'p [ExposedPort], protocol: &str) -> Option<&'p ExposedPort> {
    ports.iter().find(|p| p.name == protocol)
}
