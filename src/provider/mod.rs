//! Provider facade tying the client, cache and contracts together.

mod builder;

pub use builder::{VCloud, VCloudBuilder};

use std::sync::Arc;

use crate::api::ApiClient;
use crate::cache::InstanceCache;
use crate::config::VCloudConfig;
use crate::instances::VCloudInstances;
use crate::loadbalancer::VCloudLoadBalancer;
use crate::traits::{LoadBalancer, NodeInstances};

/// Name the provider registers under with the orchestration framework.
pub const PROVIDER_NAME: &str = "vcloud";

/// A configured VCloud provider.
///
/// Built with [`VCloud::builder`]. All handles share one HTTP connection pool
/// and one instance cache.
#[derive(Debug, Clone)]
pub struct VCloudProvider {
    pub(super) config: VCloudConfig,
    pub(super) client: ApiClient,
    pub(super) cache: Arc<InstanceCache>,
    pub(super) instances: Arc<VCloudInstances>,
    pub(super) load_balancer: Arc<VCloudLoadBalancer>,
}

impl VCloudProvider {
    pub fn instances(&self) -> Arc<dyn NodeInstances> {
        self.instances.clone()
    }

    pub fn load_balancer(&self) -> Arc<dyn LoadBalancer> {
        self.load_balancer.clone()
    }

    pub fn cache(&self) -> &Arc<InstanceCache> {
        &self.cache
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn provider_name(&self) -> &'static str {
        PROVIDER_NAME
    }

    pub fn has_cluster_id(&self) -> bool {
        !self.config.cluster_id.is_empty()
    }

    pub fn cluster_name(&self) -> &str {
        &self.config.cluster_name
    }
}
