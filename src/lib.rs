//! vcloud-provider - cluster cloud-provider integration for VCloud
//!
//! The orchestration framework polls this crate for the state of every node
//! and reconciles service load balancers through it. Node queries are
//! answered by a TTL-differentiated [`InstanceCache`] that only goes to the
//! management API when an entry is missing or stale; every API call goes
//! through a cluster-scoped, authenticated [`ApiClient`] with bounded linear
//! retries.
//!
//! # Example
//!
//! ```rust,no_run
//! use vcloud_provider::{Node, VCloud, VCloudConfig};
//!
//! #[tokio::main]
//! async fn main() -> vcloud_provider::Result<()> {
//!     let provider = VCloud::builder()
//!         .config(VCloudConfig {
//!             cluster_id: "d73c6df2-f7fe-4f7c-bf70-9f94cce26430".into(),
//!             cluster_name: "prod".into(),
//!             mgmt_url: "https://api.vcloud.example.com".into(),
//!             provider_token: Some("token".into()),
//!         })
//!         .build()?;
//!
//!     let node = Node::new("worker-1").with_provider_id("vcloud://instance-123");
//!     let exists = provider.instances().instance_exists(&node).await?;
//!     println!("exists: {exists}");
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod instances;
pub mod loadbalancer;
pub mod provider;
pub mod telemetry;
pub mod traits;
pub mod types;
pub mod version;

// Re-export main types at crate root
pub use api::{ApiClient, RetryPolicy};
pub use cache::{CacheConfig, CacheEntry, InstanceCache};
pub use config::{Config, HttpConfig, VCloudConfig};
pub use error::{Result, VCloudError};
pub use instances::{ApiInstanceResolver, InstanceResolver, VCloudInstances, extract_id};
pub use loadbalancer::VCloudLoadBalancer;
pub use provider::{PROVIDER_NAME, VCloud, VCloudBuilder, VCloudProvider};
pub use traits::{LoadBalancer, NodeInstances};
pub use version::{PKG_VERSION, version_string};

pub use types::{
    InstanceMetadata, InstanceRecord, LoadBalancerIngress, LoadBalancerStatus, Node, NodeAddress,
    NodeAddressType, Service, ServicePort,
};
