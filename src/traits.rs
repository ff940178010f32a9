//! Contracts consumed by the orchestration framework.
//!
//! The framework polls each node on a timer through [`NodeInstances`] and
//! reconciles services through [`LoadBalancer`]. A returned
//! [`VCloudError::InstanceNotFound`](crate::VCloudError::InstanceNotFound)
//! is authoritative ("remove the node"); any other error is retried by the
//! framework's own loop.

use async_trait::async_trait;

use crate::Result;
use crate::types::{InstanceMetadata, LoadBalancerStatus, Node, Service};

/// Per-node instance queries.
#[async_trait]
pub trait NodeInstances: Send + Sync {
    /// Whether a backing instance exists for the node.
    async fn instance_exists(&self, node: &Node) -> Result<bool>;

    /// Whether the backing instance is powered down.
    ///
    /// Returns `InstanceNotFound` if the instance does not exist.
    async fn instance_shutdown(&self, node: &Node) -> Result<bool>;

    /// Placement and network metadata for the backing instance.
    ///
    /// Returns `InstanceNotFound` if the instance does not exist.
    async fn instance_metadata(&self, node: &Node) -> Result<InstanceMetadata>;
}

/// Load-balancer lifecycle for services.
#[async_trait]
pub trait LoadBalancer: Send + Sync {
    /// Name of the load balancer backing `service`.
    fn load_balancer_name(&self, service: &Service) -> String;

    /// Current status, or `None` if no load balancer exists.
    async fn get_load_balancer(&self, service: &Service) -> Result<Option<LoadBalancerStatus>>;

    /// Create or update the load balancer and return its status.
    async fn ensure_load_balancer(
        &self,
        service: &Service,
        nodes: &[Node],
    ) -> Result<LoadBalancerStatus>;

    /// Update the set of nodes serving the load balancer.
    async fn update_load_balancer(&self, service: &Service, nodes: &[Node]) -> Result<()>;

    /// Delete the load balancer. Succeeds if it is already gone.
    async fn ensure_load_balancer_deleted(&self, service: &Service) -> Result<()>;
}
