//! Node polling contract backed by the instance cache.

mod identity;
mod resolver;

pub use identity::extract_id;
pub use resolver::{
    ApiInstanceResolver, ClusterPayload, Instance, InstanceMetadataPayload, InstanceResolver,
    ResourcesPayload, classify, decode_instance,
};

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error};

use crate::cache::InstanceCache;
use crate::traits::NodeInstances;
use crate::types::{InstanceMetadata, InstanceRecord, Node, NodeAddress};
use crate::{Result, VCloudError};

/// [`NodeInstances`] implementation answering every query from the cache.
#[derive(Debug, Clone)]
pub struct VCloudInstances {
    cache: Arc<InstanceCache>,
}

impl VCloudInstances {
    pub fn new(cache: Arc<InstanceCache>) -> Self {
        Self { cache }
    }

    async fn lookup(&self, node: &Node) -> Result<InstanceRecord> {
        let id = extract_id(node);
        if id.is_empty() {
            error!(node = %node.name, "cannot derive instance identifier");
            return Err(VCloudError::InvalidIdentifier(node.name.clone()));
        }

        self.cache.get(&id).await.inspect_err(|e| {
            error!(node = %node.name, instance_id = %id, error = %e, "instance lookup failed");
        })
    }

    async fn lookup_existing(&self, node: &Node) -> Result<InstanceRecord> {
        let record = self.lookup(node).await?;
        if !record.exists {
            debug!(node = %node.name, "instance does not exist");
            return Err(VCloudError::InstanceNotFound);
        }
        Ok(record)
    }
}

#[async_trait]
impl NodeInstances for VCloudInstances {
    async fn instance_exists(&self, node: &Node) -> Result<bool> {
        Ok(self.lookup(node).await?.exists)
    }

    async fn instance_shutdown(&self, node: &Node) -> Result<bool> {
        Ok(self.lookup_existing(node).await?.shutdown)
    }

    async fn instance_metadata(&self, node: &Node) -> Result<InstanceMetadata> {
        let record = self.lookup_existing(node).await?;
        Ok(metadata_from_record(record))
    }
}

/// Build node metadata from an existing instance record.
///
/// An empty internal address yields no node address rather than an empty one.
pub fn metadata_from_record(record: InstanceRecord) -> InstanceMetadata {
    let node_addresses = if record.internal_address.is_empty() {
        Vec::new()
    } else {
        vec![NodeAddress::internal(record.internal_address)]
    };

    InstanceMetadata {
        provider_id: record.provider_id,
        instance_type: record.instance_type,
        zone: record.zone,
        region: record.region,
        node_addresses,
        additional_labels: record.extra_labels,
    }
}
