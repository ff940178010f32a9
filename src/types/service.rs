//! Service and load-balancer status types.

use serde::{Deserialize, Serialize};

/// A port exposed by a service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServicePort {
    /// Port name; may be empty.
    #[serde(default)]
    pub name: String,
    pub port: i32,
    /// Target port as a number or a named port (e.g. "8080" or "http").
    pub target_port: String,
    /// Transport protocol ("TCP", "UDP", "SCTP").
    #[serde(default = "default_protocol")]
    pub protocol: String,
    /// Allocated node port, 0 when unset.
    #[serde(default)]
    pub node_port: i32,
    #[serde(default)]
    pub app_protocol: Option<String>,
}

fn default_protocol() -> String {
    "TCP".to_string()
}

impl ServicePort {
    pub fn tcp(port: i32, target_port: impl Into<String>) -> Self {
        Self {
            name: String::new(),
            port,
            target_port: target_port.into(),
            protocol: default_protocol(),
            node_port: 0,
            app_protocol: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_node_port(mut self, node_port: i32) -> Self {
        self.node_port = node_port;
        self
    }

    pub fn with_app_protocol(mut self, app_protocol: impl Into<String>) -> Self {
        self.app_protocol = Some(app_protocol.into());
        self
    }
}

/// A service requesting an external load balancer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub name: String,
    pub namespace: String,
    /// Service UID (dash-separated UUID).
    pub uid: String,
    /// Service type, normally "LoadBalancer".
    #[serde(default = "default_service_type")]
    pub service_type: String,
    #[serde(default)]
    pub ports: Vec<ServicePort>,
}

fn default_service_type() -> String {
    "LoadBalancer".to_string()
}

impl Service {
    pub fn new(
        name: impl Into<String>,
        namespace: impl Into<String>,
        uid: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            uid: uid.into(),
            service_type: default_service_type(),
            ports: Vec::new(),
        }
    }

    pub fn with_port(mut self, port: ServicePort) -> Self {
        self.ports.push(port);
        self
    }
}

/// A single ingress point of a load balancer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadBalancerIngress {
    pub ip: String,
}

/// Observed state of a load balancer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadBalancerStatus {
    pub ingress: Vec<LoadBalancerIngress>,
}
