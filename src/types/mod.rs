//! Public types for the provider API.

mod instance;
mod node;
mod service;

pub use instance::{InstanceRecord, LABEL_CLUSTER_ID, LABEL_INSTANCE_TYPE, is_shutdown_state};
pub use node::{InstanceMetadata, Node, NodeAddress, NodeAddressType};
pub use service::{LoadBalancerIngress, LoadBalancerStatus, Service, ServicePort};
