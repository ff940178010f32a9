//! Node identity and metadata as exchanged with the orchestration framework.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Kind of address reported for a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeAddressType {
    InternalIP,
    ExternalIP,
    Hostname,
}

/// A single node address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeAddress {
    #[serde(rename = "type")]
    pub address_type: NodeAddressType,
    pub address: String,
}

impl NodeAddress {
    /// Create an internal IP address entry.
    pub fn internal(address: impl Into<String>) -> Self {
        Self {
            address_type: NodeAddressType::InternalIP,
            address: address.into(),
        }
    }
}

/// The parts of a cluster node this provider reads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// Human-readable node name.
    pub name: String,
    /// Declared provider ID, e.g. `vcloud://instance-123`. May be empty.
    #[serde(default)]
    pub provider_id: String,
    /// Addresses reported in the node status.
    #[serde(default)]
    pub addresses: Vec<NodeAddress>,
}

impl Node {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_provider_id(mut self, provider_id: impl Into<String>) -> Self {
        self.provider_id = provider_id.into();
        self
    }

    pub fn with_address(mut self, address: NodeAddress) -> Self {
        self.addresses.push(address);
        self
    }

    /// First internal IP reported for the node, if any.
    pub fn internal_ip(&self) -> Option<&str> {
        self.addresses
            .iter()
            .find(|a| a.address_type == NodeAddressType::InternalIP)
            .map(|a| a.address.as_str())
    }
}

/// Metadata returned for an existing instance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceMetadata {
    pub provider_id: String,
    pub instance_type: String,
    pub zone: String,
    pub region: String,
    pub node_addresses: Vec<NodeAddress>,
    pub additional_labels: HashMap<String, String>,
}
