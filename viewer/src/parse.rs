use crate::{virtual_service, Cluster, NamespaceSet, ParsedService, Settings};
use k8s_openapi::api::core::v1::{Service, ServicePort};
use kube::ResourceExt;

/// The result of one parse pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Parsed {
    pub services: Vec<ParsedService>,
    pub namespaces: NamespaceSet,
}

/// A service that is reachable from outside the cluster, with its validated ports.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExposedService {
    pub name: String,
    pub namespace: String,

    /// The load balancer address; empty for node port services and pending load balancers.
    pub lb_ip: String,
    pub ports: Vec<ExposedPort>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExposedPort {
    pub name: String,
    pub protocol: String,
    pub port: u16,
    pub node_port: Option<u16>,
}

/// Describes why a single service could not be parsed.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum InvalidService {
    #[error("service has no name")]
    MissingName,

    #[error("service {0} has no namespace")]
    MissingNamespace(String),

    #[error("service {service} declares invalid port {port}")]
    InvalidPort { service: String, port: i32 },

    #[error("service {service} declares invalid node port {port}")]
    InvalidNodePort { service: String, port: i32 },
}

/// Builds the endpoint list from a service snapshot.
///
/// Only load balancer services, and node port services when enabled, are included. Each TCP port
/// of an included service yields one entry, except for the gateway service, which is expanded into
/// its virtual service routes instead. A service that fails to parse is logged and skipped
/// without affecting the others.
pub async fn parse<C: Cluster>(cluster: &C, services: &[Service], settings: &Settings) -> Parsed {
    let mut parsed = Parsed::default();
    let mut skipped = 0;

    for svc in services {
        let exposed = match exposed_service(svc, settings.include_node_port) {
            Ok(Some(exposed)) => exposed,
            Ok(None) => {
                skipped += 1;
                continue;
            }
            Err(error) => {
                tracing::warn!(%error, "skipping invalid service");
                skipped += 1;
                continue;
            }
        };

        if exposed.name == settings.gateway_service {
            let routes =
                virtual_service::resolve_routes(cluster, &exposed, &settings.node_ip).await;
            parsed.services.extend(routes);
        } else {
            parsed
                .services
                .extend(direct_entries(&exposed, &settings.node_ip));
        }
        parsed.namespaces.insert(exposed.namespace);
    }

    tracing::debug!(
        services = services.len(),
        skipped,
        endpoints = parsed.services.len(),
        namespaces = parsed.namespaces.len(),
        "parsed services"
    );
    parsed
}

/// Classifies a service by its type, returning `None` if it isn't reachable from outside the
/// cluster.
pub fn exposed_service(
    svc: &Service,
    include_node_port: bool,
) -> Result<Option<ExposedService>, InvalidService> {
    let spec = match svc.spec.as_ref() {
        Some(spec) => spec,
        None => return Ok(None),
    };

    let lb_ip = match spec.type_.as_deref() {
        Some("LoadBalancer") => load_balancer_address(svc),
        Some("NodePort") if include_node_port => String::new(),
        _ => return Ok(None),
    };

    let name = svc.metadata.name.clone().ok_or(InvalidService::MissingName)?;
    let namespace = svc
        .namespace()
        .ok_or_else(|| InvalidService::MissingNamespace(name.clone()))?;

    let ports = spec
        .ports
        .iter()
        .flatten()
        .map(|p| exposed_port(&name, p))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Some(ExposedService {
        name,
        namespace,
        lb_ip,
        ports,
    }))
}

/// The first ingress address of a load balancer, preferring its IP over its hostname.
fn load_balancer_address(svc: &Service) -> String {
    let ingress = svc
        .status
        .as_ref()
        .and_then(|s| s.load_balancer.as_ref())
        .and_then(|lb| lb.ingress.as_ref())
        .and_then(|ingress| ingress.first());

    let ingress = match ingress {
        Some(ingress) => ingress,
        None => return String::new(),
    };

    match (ingress.ip.as_deref(), ingress.hostname.as_deref()) {
        (Some(ip), _) if !ip.is_empty() => ip.to_string(),
        (_, Some(hostname)) => hostname.to_string(),
        _ => String::new(),
    }
}

fn exposed_port(service: &str, port: &ServicePort) -> Result<ExposedPort, InvalidService> {
    let number = valid_port(port.port).ok_or_else(|| InvalidService::InvalidPort {
        service: service.to_string(),
        port: port.port,
    })?;
    let node_port = match port.node_port {
        Some(np) => Some(valid_port(np).ok_or_else(|| InvalidService::InvalidNodePort {
            service: service.to_string(),
            port: np,
        })?),
        None => None,
    };

    Ok(ExposedPort {
        name: port.name.clone().unwrap_or_default(),
        // The API server defaults an unset protocol to TCP.
        protocol: port.protocol.clone().unwrap_or_else(|| "TCP".to_string()),
        port: number,
        node_port,
    })
}

fn valid_port(port: i32) -> Option<u16> {
    u16::try_from(port).ok().filter(|p| *p != 0)
}

fn direct_entries(svc: &ExposedService, node_ip: &str) -> Vec<ParsedService> {
    let mut entries = Vec::with_capacity(svc.ports.len());
    for port in &svc.ports {
        if port.protocol != "TCP" {
            tracing::info!(
                service = %svc.name,
                namespace = %svc.namespace,
                protocol = %port.protocol,
                "skipping non-TCP port"
            );
            continue;
        }
        entries.push(svc.entry(&svc.name, port, String::new(), &port.protocol, node_ip));
    }
    entries
}

// === impl ExposedService ===

impl ExposedService {
    /// Builds an endpoint reached through one of this service's ports.
    pub(crate) fn entry(
        &self,
        name: &str,
        port: &ExposedPort,
        prefix: String,
        protocol: &str,
        node_ip: &str,
    ) -> ParsedService {
        ParsedService {
            name: name.to_string(),
            namespace: self.namespace.clone(),
            lb_ip: self.lb_ip.clone(),
            port: port.port,
            node_port: port.node_port,
            port_name: port.name.clone(),
            prefix,
            protocol: protocol.to_string(),
            node_ip: node_ip.to_string(),
        }
    }
}
