//! Service load balancers exposed as management-API ingresses.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::api::{ApiClient, body_text};
use crate::traits::LoadBalancer;
use crate::types::{LoadBalancerIngress, LoadBalancerStatus, Node, Service};
use crate::{Result, VCloudError};

/// Body of `POST /ingresses` and `PUT /ingresses/{name}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngressRequest {
    pub name: String,
    pub ports: Vec<IngressPort>,
    pub nodes: Vec<String>,
    pub namespace: String,
    #[serde(rename = "type")]
    pub service_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngressPort {
    pub name: String,
    pub port: i32,
    pub target_port: String,
    pub protocol: String,
    #[serde(skip_serializing_if = "is_zero")]
    pub node_port: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_protocol: Option<String>,
}

fn is_zero(n: &i32) -> bool {
    *n == 0
}

#[derive(Deserialize)]
struct IngressResponse {
    #[serde(default)]
    data: IngressData,
}

#[derive(Default, Deserialize)]
struct IngressData {
    #[serde(default)]
    ingress: Vec<IngressAddress>,
}

#[derive(Deserialize)]
struct IngressAddress {
    #[serde(default)]
    ip: String,
}

/// Name of the ingress backing `service`.
///
/// Format: `{cluster}-ingress-{uid prefix}-{service}` where the uid prefix is
/// everything before the first `-` of the service uid.
pub fn ingress_name(cluster_name: &str, service: &Service) -> String {
    let uid_prefix = service.uid.split('-').next().unwrap_or_default();
    format!("{cluster_name}-ingress-{uid_prefix}-{}", service.name)
}

/// Build the create/update body for `service` served by `nodes`.
///
/// Each node contributes its first internal IP; nodes without one are
/// skipped. Unnamed ports are named `port-{port}`.
pub fn build_request(name: &str, service: &Service, nodes: &[Node]) -> IngressRequest {
    let nodes = nodes
        .iter()
        .filter_map(|n| n.internal_ip().map(str::to_string))
        .collect();

    let ports = service
        .ports
        .iter()
        .map(|p| IngressPort {
            name: if p.name.is_empty() {
                format!("port-{}", p.port)
            } else {
                p.name.clone()
            },
            port: p.port,
            target_port: p.target_port.clone(),
            protocol: p.protocol.clone(),
            node_port: p.node_port,
            app_protocol: p.app_protocol.clone(),
        })
        .collect();

    IngressRequest {
        name: name.to_string(),
        ports,
        nodes,
        namespace: service.namespace.clone(),
        service_type: service.service_type.clone(),
    }
}

/// Parse `{status, data: {ingress: [{ip}]}}` into a status.
pub fn decode_status(body: &[u8]) -> Result<LoadBalancerStatus> {
    let resp: IngressResponse = serde_json::from_slice(body)?;
    Ok(LoadBalancerStatus {
        ingress: resp
            .data
            .ingress
            .into_iter()
            .map(|a| LoadBalancerIngress { ip: a.ip })
            .collect(),
    })
}

/// [`LoadBalancer`] backed by the `/ingresses` endpoints.
#[derive(Debug, Clone)]
pub struct VCloudLoadBalancer {
    client: ApiClient,
    cluster_name: String,
}

impl VCloudLoadBalancer {
    pub fn new(client: ApiClient, cluster_name: impl Into<String>) -> Self {
        Self {
            client,
            cluster_name: cluster_name.into(),
        }
    }
}

#[async_trait]
impl LoadBalancer for VCloudLoadBalancer {
    fn load_balancer_name(&self, service: &Service) -> String {
        ingress_name(&self.cluster_name, service)
    }

    async fn get_load_balancer(&self, service: &Service) -> Result<Option<LoadBalancerStatus>> {
        let name = self.load_balancer_name(service);
        debug!(load_balancer = %name, "getting load balancer");

        let resp = self.client.get(&format!("/ingresses/{name}")).await?;
        match resp.status() {
            StatusCode::OK => {
                let body = resp.bytes().await?;
                Ok(Some(decode_status(&body)?))
            }
            StatusCode::NOT_FOUND => {
                debug!(load_balancer = %name, "load balancer not found");
                Ok(None)
            }
            status => Err(unexpected(&name, status, resp).await),
        }
    }

    async fn ensure_load_balancer(
        &self,
        service: &Service,
        nodes: &[Node],
    ) -> Result<LoadBalancerStatus> {
        let name = self.load_balancer_name(service);
        info!(
            load_balancer = %name,
            namespace = %service.namespace,
            service = %service.name,
            nodes = nodes.len(),
            "ensuring load balancer"
        );

        let request = build_request(&name, service, nodes);
        let resp = self.client.post_json("/ingresses", &request).await?;
        match resp.status() {
            StatusCode::OK | StatusCode::CREATED => {
                let body = resp.bytes().await?;
                let status = decode_status(&body)?;
                info!(load_balancer = %name, ingress = status.ingress.len(), "ensured load balancer");
                Ok(status)
            }
            status => Err(unexpected(&name, status, resp).await),
        }
    }

    async fn update_load_balancer(&self, service: &Service, nodes: &[Node]) -> Result<()> {
        let name = self.load_balancer_name(service);
        info!(load_balancer = %name, nodes = nodes.len(), "updating load balancer");

        let request = build_request(&name, service, nodes);
        let resp = self
            .client
            .put_json(&format!("/ingresses/{name}"), &request)
            .await?;
        match resp.status() {
            StatusCode::OK => {
                info!(load_balancer = %name, "updated load balancer");
                Ok(())
            }
            status => Err(unexpected(&name, status, resp).await),
        }
    }

    async fn ensure_load_balancer_deleted(&self, service: &Service) -> Result<()> {
        let name = self.load_balancer_name(service);
        info!(load_balancer = %name, "deleting load balancer");

        let resp = self.client.delete(&format!("/ingresses/{name}")).await?;
        match resp.status() {
            StatusCode::OK => {
                info!(load_balancer = %name, "deleted load balancer");
                Ok(())
            }
            StatusCode::NOT_FOUND => {
                debug!(load_balancer = %name, "load balancer already deleted");
                Ok(())
            }
            status => Err(unexpected(&name, status, resp).await),
        }
    }
}

async fn unexpected(name: &str, status: StatusCode, resp: reqwest::Response) -> VCloudError {
    let message = body_text(resp).await;
    error!(
        load_balancer = %name,
        status = status.as_u16(),
        body = %message,
        "unexpected load balancer response"
    );
    VCloudError::Api {
        status: status.as_u16(),
        message,
    }
}
