use serde::ser::{Serialize, SerializeStruct, Serializer};
use std::borrow::Cow;

/// A single externally reachable endpoint: one TCP port of an exposed service, or one route
/// prefix served by the gateway.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsedService {
    pub name: String,
    pub namespace: String,

    /// The load balancer ingress address, or empty when the service is reached through a node
    /// port (or its load balancer is still pending).
    pub lb_ip: String,

    /// The port declared on the service.
    pub port: u16,
    pub node_port: Option<u16>,
    pub port_name: String,

    /// A path prefix appended to the URL. Empty for direct entries.
    pub prefix: String,

    /// The transport hint used as the URL scheme when the port doesn't imply one.
    pub protocol: String,
    pub node_ip: String,
}

impl ParsedService {
    /// Builds the externally reachable URL for this endpoint.
    ///
    /// The load balancer address is preferred, with the declared port; otherwise the node address
    /// is used with the node port. Ports 443 and 80 pick the scheme and are omitted from the URL.
    /// When a node port is selected but the declared port is 80 or 443, the scheme still follows
    /// the declared port and the node port is rendered explicitly. Any other port uses the
    /// lowercased protocol hint as the scheme.
    pub fn url(&self) -> String {
        let (addr, port) = if self.lb_ip.is_empty() {
            (self.node_ip.as_str(), self.node_port)
        } else {
            (self.lb_ip.as_str(), Some(self.port))
        };

        let (scheme, show_port): (Cow<'_, str>, bool) = match (port, self.port) {
            (Some(443), _) => ("https".into(), false),
            (Some(80), _) => ("http".into(), false),
            (_, 80) => ("http".into(), true),
            (_, 443) => ("https".into(), true),
            _ => (self.protocol.to_lowercase().into(), true),
        };

        match port {
            Some(port) if show_port => format!("{}://{}:{}{}", scheme, addr, port, self.prefix),
            _ => format!("{}://{}{}", scheme, addr, self.prefix),
        }
    }
}

impl Serialize for ParsedService {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("ParsedService", 10)?;
        s.serialize_field("name", &self.name)?;
        s.serialize_field("namespace", &self.namespace)?;
        s.serialize_field("lb_ip", &self.lb_ip)?;
        s.serialize_field("port", &self.port)?;
        s.serialize_field("node_port", &self.node_port)?;
        s.serialize_field("port_name", &self.port_name)?;
        s.serialize_field("prefix", &self.prefix)?;
        s.serialize_field("protocol", &self.protocol)?;
        s.serialize_field("node_ip", &self.node_ip)?;
        s.serialize_field("url", &self.url())?;
        s.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn svc(lb_ip: &str, port: u16, node_port: Option<u16>, protocol: &str) -> ParsedService {
        ParsedService {
            name: "web".to_string(),
            namespace: "default".to_string(),
            lb_ip: lb_ip.to_string(),
            port,
            node_port,
            port_name: String::new(),
            prefix: String::new(),
            protocol: protocol.to_string(),
            node_ip: "10.0.0.5".to_string(),
        }
    }

    #[test]
    fn load_balancer_https_omits_port() {
        assert_eq!(
            svc("1.2.3.4", 443, Some(31443), "TCP").url(),
            "https://1.2.3.4"
        );
    }

    #[test]
    fn load_balancer_http_omits_port() {
        assert_eq!(svc("1.2.3.4", 80, Some(30080), "TCP").url(), "http://1.2.3.4");
    }

    #[test]
    fn other_port_uses_lowercased_protocol() {
        assert_eq!(
            svc("1.2.3.4", 8080, Some(30000), "TCP").url(),
            "tcp://1.2.3.4:8080"
        );
    }

    #[test]
    fn node_port_keeps_declared_http_scheme() {
        assert_eq!(
            svc("", 80, Some(30080), "TCP").url(),
            "http://10.0.0.5:30080"
        );
    }

    #[test]
    fn node_port_keeps_declared_https_scheme() {
        assert_eq!(
            svc("", 443, Some(30443), "TCP").url(),
            "https://10.0.0.5:30443"
        );
    }

    #[test]
    fn node_port_well_known_port_omitted() {
        // A node port that is itself 80 is treated like a load balancer port.
        assert_eq!(svc("", 8080, Some(80), "TCP").url(), "http://10.0.0.5");
    }

    #[test]
    fn node_port_other_port_uses_protocol() {
        assert_eq!(
            svc("", 9000, Some(30900), "TCP").url(),
            "tcp://10.0.0.5:30900"
        );
    }

    #[test]
    fn documented_quirk_protocol_hint_is_never_defaulted() {
        // Neither port is well known, so the hint is used verbatim (lowercased), even when empty
        // or mixed case.
        assert_eq!(svc("1.2.3.4", 9000, None, "").url(), "://1.2.3.4:9000");
        assert_eq!(svc("1.2.3.4", 9000, None, "HtTp").url(), "http://1.2.3.4:9000");
    }

    #[test]
    fn documented_quirk_declared_port_overrides_hint() {
        // The declared port wins over the protocol hint once the node port is selected.
        assert_eq!(
            svc("", 443, Some(30443), "http").url(),
            "https://10.0.0.5:30443"
        );
    }

    #[test]
    fn missing_node_port_renders_no_port() {
        assert_eq!(svc("", 9000, None, "TCP").url(), "tcp://10.0.0.5");
        assert_eq!(svc("", 80, None, "TCP").url(), "http://10.0.0.5");
    }

    #[test]
    fn prefix_is_appended() {
        let mut s = svc("gw.example.com", 443, Some(32443), "https");
        s.prefix = "/api".to_string();
        assert_eq!(s.url(), "https://gw.example.com/api");

        s.port = 8443;
        assert_eq!(s.url(), "https://gw.example.com:8443/api");
    }

    #[test]
    fn url_is_deterministic() {
        let s = svc("", 80, Some(30080), "TCP");
        assert_eq!(s.url(), s.clone().url());
        assert_eq!(s.url(), s.url());
    }

    #[test]
    fn serializes_url() {
        let value = serde_json::to_value(svc("1.2.3.4", 80, Some(30080), "TCP")).unwrap();
        assert_eq!(value["url"], "http://1.2.3.4");
        assert_eq!(value["node_port"], 30080);
        assert_eq!(value["namespace"], "default");
    }
}
