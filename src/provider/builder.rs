//! Builder for configuring provider instances

use std::sync::Arc;

use tracing::info;

use super::VCloudProvider;
use crate::api::ApiClient;
use crate::cache::{CacheConfig, InstanceCache};
use crate::config::{Config, HttpConfig, TOKEN_ENV_VAR, VCloudConfig};
use crate::instances::{ApiInstanceResolver, InstanceResolver, VCloudInstances};
use crate::loadbalancer::VCloudLoadBalancer;
use crate::{Result, VCloudError};

/// Main entry point for creating provider instances.
pub struct VCloud;

impl VCloud {
    /// Create a new builder for configuring the provider.
    pub fn builder() -> VCloudBuilder {
        VCloudBuilder::new()
    }
}

/// Builder for configuring provider instances.
pub struct VCloudBuilder {
    config: Option<VCloudConfig>,
    cache_config: CacheConfig,
    http_config: HttpConfig,
    resolver: Option<Arc<dyn InstanceResolver>>,
}

impl VCloudBuilder {
    pub fn new() -> Self {
        Self {
            config: None,
            cache_config: CacheConfig::default(),
            http_config: HttpConfig::default(),
            resolver: None,
        }
    }

    /// Take every section from a loaded configuration file.
    pub fn from_config(self, config: Config) -> Self {
        self.config(config.vcloud)
            .cache_config(config.cache.into())
            .http_config(config.http)
    }

    /// Cluster identity, management URL and token.
    pub fn config(mut self, config: VCloudConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// TTLs, sweep threshold and stampede behaviour of the instance cache.
    pub fn cache_config(mut self, config: CacheConfig) -> Self {
        self.cache_config = config;
        self
    }

    /// Request timeout and retry settings.
    pub fn http_config(mut self, config: HttpConfig) -> Self {
        self.http_config = config;
        self
    }

    /// Resolve instances through `resolver` instead of the management API.
    pub fn resolver(mut self, resolver: Arc<dyn InstanceResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Validate the configuration and wire up the provider.
    pub fn build(self) -> Result<VCloudProvider> {
        let config = self.config.ok_or_else(|| {
            VCloudError::Configuration("no vcloud configuration provided".to_string())
        })?;
        config.validate()?;

        let token = config.token().ok_or_else(|| {
            VCloudError::Configuration(format!(
                "invalid vcloud config: provider_token is required (or set {TOKEN_ENV_VAR})"
            ))
        })?;
        let client = ApiClient::with_http_config(
            &config.mgmt_url,
            &config.cluster_id,
            token,
            &self.http_config,
        )?;

        let resolver = self
            .resolver
            .unwrap_or_else(|| Arc::new(ApiInstanceResolver::new(client.clone())));
        let cache = Arc::new(InstanceCache::new(resolver, self.cache_config));
        let instances = Arc::new(VCloudInstances::new(Arc::clone(&cache)));
        let load_balancer = Arc::new(VCloudLoadBalancer::new(
            client.clone(),
            config.cluster_name.clone(),
        ));

        info!(
            cluster_id = %config.cluster_id,
            cluster_name = %config.cluster_name,
            base_url = %client.base_url(),
            single_flight = cache.config().single_flight,
            "initialized vcloud provider"
        );

        Ok(VCloudProvider {
            config,
            client,
            cache,
            instances,
            load_balancer,
        })
    }
}

impl Default for VCloudBuilder {
    fn default() -> Self {
        Self::new()
    }
}
