//! Translate management-API instance responses into [`InstanceRecord`]s.
//!
//! Status interpretation:
//!
//! | Response                              | Result                      |
//! |---------------------------------------|-----------------------------|
//! | 404                                   | `Ok(absent)`                |
//! | 200, `instance.status == "terminated"`| `Ok(absent)`                |
//! | 200, anything else                    | `Ok(present)`               |
//! | 200 with an undecodable body          | `Err(Decode)`               |
//! | any other status                      | `Err(Api)`                  |
//!
//! Absence is a normal, cacheable outcome. Errors are never cached.

use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, error, info, warn};

use crate::api::{ApiClient, body_text};
use crate::telemetry;
use crate::types::{InstanceRecord, LABEL_CLUSTER_ID, LABEL_INSTANCE_TYPE, is_shutdown_state};
use crate::{Result, VCloudError};

/// Remote status marking an instance as permanently gone.
const TERMINATED_STATUS: &str = "terminated";

/// Source of instance state for the cache.
#[async_trait]
pub trait InstanceResolver: Send + Sync {
    /// Fetch the current state of instance `id`.
    async fn resolve(&self, id: &str) -> Result<InstanceRecord>;
}

/// Instance as reported by the management API.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Instance {
    pub name: String,
    pub id: String,
    pub uid: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub zone: String,
    /// Lifecycle status, e.g. "active" or "terminated".
    pub status: String,
    /// Power state, e.g. "POWERED_ON" or "POWERED_OFF".
    pub state: String,
    pub owned: bool,
    pub metadata: InstanceMetadataPayload,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct InstanceMetadataPayload {
    pub ip: String,
    pub flavor: String,
    pub cluster: ClusterPayload,
    pub resources: ResourcesPayload,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ClusterPayload {
    pub id: String,
    pub zone: String,
    pub tenant: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ResourcesPayload {
    pub cores: i64,
    pub memory: i64,
    pub volumes: i64,
}

#[derive(Deserialize)]
struct InstanceEnvelope {
    data: InstanceData,
}

#[derive(Deserialize)]
struct InstanceData {
    instance: Instance,
}

/// Parse the `{status, data: {instance}}` envelope.
pub fn decode_instance(body: &[u8]) -> Result<Instance> {
    let envelope: InstanceEnvelope = serde_json::from_slice(body)?;
    Ok(envelope.data.instance)
}

/// Map a decoded instance onto the internal record.
pub fn classify(id: &str, instance: &Instance) -> InstanceRecord {
    if instance.status == TERMINATED_STATUS {
        return InstanceRecord::absent();
    }

    let meta = &instance.metadata;
    let extra_labels = HashMap::from([
        (LABEL_INSTANCE_TYPE.to_string(), meta.flavor.clone()),
        (LABEL_CLUSTER_ID.to_string(), meta.cluster.id.clone()),
    ]);

    InstanceRecord {
        exists: true,
        shutdown: is_shutdown_state(&instance.state),
        provider_id: id.to_string(),
        instance_type: meta.flavor.clone(),
        zone: instance.zone.clone(),
        region: meta.cluster.tenant.clone(),
        internal_address: meta.ip.clone(),
        extra_labels,
    }
}

/// [`InstanceResolver`] backed by `GET /instances/{id}`.
#[derive(Debug, Clone)]
pub struct ApiInstanceResolver {
    client: ApiClient,
}

impl ApiInstanceResolver {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl InstanceResolver for ApiInstanceResolver {
    async fn resolve(&self, id: &str) -> Result<InstanceRecord> {
        let path = format!("/instances/{id}");
        debug!(instance_id = id, path = %path, "resolving instance");

        let resp = self.client.get(&path).await.map_err(|e| {
            error!(instance_id = id, error = %e, "instance request failed");
            e.for_instance(id)
        })?;

        match resp.status() {
            StatusCode::OK => {}
            StatusCode::NOT_FOUND => {
                warn!(instance_id = id, "instance not found (404)");
                record_outcome("absent");
                return Ok(InstanceRecord::absent());
            }
            status => {
                let message = body_text(resp).await;
                error!(
                    instance_id = id,
                    status = status.as_u16(),
                    body = %message,
                    "unexpected status resolving instance"
                );
                return Err(VCloudError::Api {
                    status: status.as_u16(),
                    message,
                }
                .for_instance(id));
            }
        }

        let body = resp
            .bytes()
            .await
            .map_err(|e| VCloudError::from(e).for_instance(id))?;
        let instance = decode_instance(&body).map_err(|e| {
            error!(instance_id = id, error = %e, "failed to decode instance response");
            e.for_instance(id)
        })?;
        debug!(
            instance_id = id,
            name = %instance.name,
            status = %instance.status,
            state = %instance.state,
            "decoded instance"
        );

        let record = classify(id, &instance);
        if record.exists {
            record_outcome("present");
        } else {
            info!(instance_id = id, status = %instance.status, "instance is terminated");
            record_outcome("absent");
        }
        Ok(record)
    }
}

fn record_outcome(outcome: &'static str) {
    metrics::counter!(telemetry::INSTANCES_RESOLVED_TOTAL, "outcome" => outcome).increment(1);
}
