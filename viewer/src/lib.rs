#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

pub mod cluster;
pub mod http;
pub mod parse;
pub mod poll;
pub mod service;
pub mod state;
pub mod virtual_service;

pub use self::{
    cluster::Cluster,
    service::ParsedService,
    state::{GlobalState, NamespaceSet, SharedState},
    virtual_service::VirtualService,
};

/// The name of the Gloo gateway service whose routes are expanded from
/// `VirtualService` resources.
pub const DEFAULT_GATEWAY_SERVICE: &str = "gateway-proxy";

/// Process-wide inputs to each parse pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settings {
    pub cluster_name: String,

    /// The address used for services that are reached through a node port.
    pub node_ip: String,

    pub include_node_port: bool,
    pub gateway_service: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            cluster_name: "Unknown Cluster".to_string(),
            node_ip: String::new(),
            include_node_port: true,
            gateway_service: DEFAULT_GATEWAY_SERVICE.to_string(),
        }
    }
}
