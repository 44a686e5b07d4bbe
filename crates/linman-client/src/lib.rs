//! Linode v4 REST API binding.
//!
//! Thin transport adapter implementing [`LinodeApi`]: bearer-token auth,
//! JSON bodies, the Linode paged envelope for list calls, and status-code
//! error mapping. No retries; backoff policy belongs to callers.

use async_trait::async_trait;
use linman_core::catalog::{Image, InstanceType, Region};
use linman_core::dns::{
    Domain, DomainRecord, DomainRecordCreateOptions, DomainRecordUpdateOptions,
};
use linman_core::instance::{
    Disk, DiskCreateOptions, Instance, InstanceConfig, InstanceConfigUpdateOptions,
    InstanceCreateOptions, InstanceIps,
};
use linman_core::network::Vpc;
use linman_core::nodebalancer::{
    NodeBalancer, NodeBalancerConfig, NodeBalancerConfigCreateOptions, NodeBalancerCreateOptions,
    NodeBalancerNode, NodeBalancerNodeCreateOptions,
};
use linman_core::objectstorage::{
    ObjectStorageBucket, ObjectStorageBucketCreateOptions, ObjectStorageKey,
    ObjectStorageKeyCreateOptions,
};
use linman_core::{ClientError, LinodeApi, Result};
use reqwest::{Method, Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;

pub const DEFAULT_API_URL: &str = "https://api.linode.com/v4";

const USER_AGENT: &str = concat!("linman/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub token: String,
    pub api_url: String,
    pub timeout: std::time::Duration,
}

impl ClientConfig {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            api_url: DEFAULT_API_URL.to_string(),
            timeout: std::time::Duration::from_secs(30),
        }
    }

    #[must_use]
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }
}

/// Paged response envelope used by every Linode list endpoint.
#[derive(Debug, Deserialize)]
struct Paged<T> {
    data: Vec<T>,
    page: u32,
    pages: u32,
}

/// Error envelope: `{"errors": [{"reason": "...", "field": "..."}]}`.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    errors: Vec<ApiErrorEntry>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEntry {
    reason: String,
    #[serde(default)]
    field: Option<String>,
}

pub struct HttpClient {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl HttpClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            token: config.token,
        })
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        self.client
            .request(method, &url)
            .header("Authorization", format!("Bearer {}", self.token))
    }

    async fn send(&self, req: reqwest::RequestBuilder) -> Result<Response> {
        let res = req
            .send()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        match res.status() {
            status if status.is_success() => Ok(res),
            StatusCode::NOT_FOUND => Err(ClientError::NotFound(error_reason(res).await)),
            StatusCode::UNAUTHORIZED => Err(ClientError::Unauthorized),
            status => Err(ClientError::Api {
                status: status.as_u16(),
                message: error_reason(res).await,
            }),
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let res = self.send(self.request(Method::GET, path)).await?;
        decode(res).await
    }

    async fn post_json<B: serde::Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let res = self.send(self.request(Method::POST, path).json(body)).await?;
        decode(res).await
    }

    async fn put_json<B: serde::Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let res = self.send(self.request(Method::PUT, path).json(body)).await?;
        decode(res).await
    }

    async fn post_action<B: serde::Serialize>(&self, path: &str, body: &B) -> Result<()> {
        self.send(self.request(Method::POST, path).json(body)).await?;
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<()> {
        self.send(self.request(Method::DELETE, path)).await?;
        Ok(())
    }

    /// Collect every page of a list endpoint.
    async fn get_paged<T: DeserializeOwned>(
        &self,
        path: &str,
        filter: Option<&str>,
    ) -> Result<Vec<T>> {
        let mut items = Vec::new();
        let mut page = 1;
        loop {
            let mut req = self
                .request(Method::GET, path)
                .query(&[("page", page.to_string())]);
            if let Some(filter) = filter {
                req = req.header("X-Filter", filter);
            }
            let res = self.send(req).await?;
            let envelope: Paged<T> = decode(res).await?;
            items.extend(envelope.data);
            if envelope.page >= envelope.pages {
                return Ok(items);
            }
            page = envelope.page + 1;
        }
    }
}

async fn decode<T: DeserializeOwned>(res: Response) -> Result<T> {
    res.json().await.map_err(|e| ClientError::Decode(e.to_string()))
}

/// Best-effort extraction of the first reason from the error envelope.
async fn error_reason(res: Response) -> String {
    let status = res.status();
    match res.json::<ErrorEnvelope>().await {
        Ok(envelope) => envelope
            .errors
            .into_iter()
            .next()
            .map(|e| match e.field {
                Some(field) => format!("{} (field: {field})", e.reason),
                None => e.reason,
            })
            .unwrap_or_else(|| status.to_string()),
        Err(_) => status.to_string(),
    }
}

#[async_trait]
impl LinodeApi for HttpClient {
    async fn list_instances(&self, filter: Option<String>) -> Result<Vec<Instance>> {
        self.get_paged("/linode/instances", filter.as_deref()).await
    }

    async fn get_instance(&self, linode_id: i64) -> Result<Instance> {
        self.get_json(&format!("/linode/instances/{linode_id}")).await
    }

    async fn create_instance(&self, opts: InstanceCreateOptions) -> Result<Instance> {
        self.post_json("/linode/instances", &opts).await
    }

    async fn delete_instance(&self, linode_id: i64) -> Result<()> {
        self.delete(&format!("/linode/instances/{linode_id}")).await
    }

    async fn boot_instance(&self, linode_id: i64, config_id: Option<i64>) -> Result<()> {
        let body = match config_id {
            Some(config_id) => json!({ "config_id": config_id }),
            None => json!({}),
        };
        self.post_action(&format!("/linode/instances/{linode_id}/boot"), &body)
            .await
    }

    async fn shutdown_instance(&self, linode_id: i64) -> Result<()> {
        self.post_action(&format!("/linode/instances/{linode_id}/shutdown"), &json!({}))
            .await
    }

    async fn list_instance_configs(&self, linode_id: i64) -> Result<Vec<InstanceConfig>> {
        self.get_paged(&format!("/linode/instances/{linode_id}/configs"), None)
            .await
    }

    async fn update_instance_config(
        &self,
        linode_id: i64,
        config_id: i64,
        opts: InstanceConfigUpdateOptions,
    ) -> Result<InstanceConfig> {
        self.put_json(
            &format!("/linode/instances/{linode_id}/configs/{config_id}"),
            &opts,
        )
        .await
    }

    async fn get_instance_disk(&self, linode_id: i64, disk_id: i64) -> Result<Disk> {
        self.get_json(&format!("/linode/instances/{linode_id}/disks/{disk_id}"))
            .await
    }

    async fn create_instance_disk(&self, linode_id: i64, opts: DiskCreateOptions) -> Result<Disk> {
        self.post_json(&format!("/linode/instances/{linode_id}/disks"), &opts)
            .await
    }

    async fn resize_instance_disk(&self, linode_id: i64, disk_id: i64, size: i64) -> Result<()> {
        self.post_action(
            &format!("/linode/instances/{linode_id}/disks/{disk_id}/resize"),
            &json!({ "size": size }),
        )
        .await
    }

    async fn get_instance_ips(&self, linode_id: i64) -> Result<InstanceIps> {
        self.get_json(&format!("/linode/instances/{linode_id}/ips")).await
    }

    async fn get_region(&self, region_id: &str) -> Result<Region> {
        self.get_json(&format!("/regions/{region_id}")).await
    }

    async fn get_image(&self, image_id: &str) -> Result<Image> {
        self.get_json(&format!("/images/{image_id}")).await
    }

    async fn get_type(&self, type_id: &str) -> Result<InstanceType> {
        self.get_json(&format!("/linode/types/{type_id}")).await
    }

    async fn create_node_balancer(&self, opts: NodeBalancerCreateOptions) -> Result<NodeBalancer> {
        self.post_json("/nodebalancers", &opts).await
    }

    async fn get_node_balancer(&self, nodebalancer_id: i64) -> Result<NodeBalancer> {
        self.get_json(&format!("/nodebalancers/{nodebalancer_id}")).await
    }

    async fn delete_node_balancer(&self, nodebalancer_id: i64) -> Result<()> {
        self.delete(&format!("/nodebalancers/{nodebalancer_id}")).await
    }

    async fn create_node_balancer_config(
        &self,
        nodebalancer_id: i64,
        opts: NodeBalancerConfigCreateOptions,
    ) -> Result<NodeBalancerConfig> {
        self.post_json(&format!("/nodebalancers/{nodebalancer_id}/configs"), &opts)
            .await
    }

    async fn get_node_balancer_config(
        &self,
        nodebalancer_id: i64,
        config_id: i64,
    ) -> Result<NodeBalancerConfig> {
        self.get_json(&format!("/nodebalancers/{nodebalancer_id}/configs/{config_id}"))
            .await
    }

    async fn delete_node_balancer_config(
        &self,
        nodebalancer_id: i64,
        config_id: i64,
    ) -> Result<()> {
        self.delete(&format!("/nodebalancers/{nodebalancer_id}/configs/{config_id}"))
            .await
    }

    async fn create_node_balancer_node(
        &self,
        nodebalancer_id: i64,
        config_id: i64,
        opts: NodeBalancerNodeCreateOptions,
    ) -> Result<NodeBalancerNode> {
        self.post_json(
            &format!("/nodebalancers/{nodebalancer_id}/configs/{config_id}/nodes"),
            &opts,
        )
        .await
    }

    async fn list_node_balancer_nodes(
        &self,
        nodebalancer_id: i64,
        config_id: i64,
    ) -> Result<Vec<NodeBalancerNode>> {
        self.get_paged(
            &format!("/nodebalancers/{nodebalancer_id}/configs/{config_id}/nodes"),
            None,
        )
        .await
    }

    async fn delete_node_balancer_node(
        &self,
        nodebalancer_id: i64,
        config_id: i64,
        node_id: i64,
    ) -> Result<()> {
        self.delete(&format!(
            "/nodebalancers/{nodebalancer_id}/configs/{config_id}/nodes/{node_id}"
        ))
        .await
    }

    async fn get_object_storage_bucket(
        &self,
        region_id: &str,
        bucket_label: &str,
    ) -> Result<ObjectStorageBucket> {
        self.get_json(&format!("/object-storage/buckets/{region_id}/{bucket_label}"))
            .await
    }

    async fn create_object_storage_bucket(
        &self,
        opts: ObjectStorageBucketCreateOptions,
    ) -> Result<ObjectStorageBucket> {
        self.post_json("/object-storage/buckets", &opts).await
    }

    async fn get_object_storage_key(&self, key_id: i64) -> Result<ObjectStorageKey> {
        self.get_json(&format!("/object-storage/keys/{key_id}")).await
    }

    async fn create_object_storage_key(
        &self,
        opts: ObjectStorageKeyCreateOptions,
    ) -> Result<ObjectStorageKey> {
        self.post_json("/object-storage/keys", &opts).await
    }

    async fn delete_object_storage_key(&self, key_id: i64) -> Result<()> {
        self.delete(&format!("/object-storage/keys/{key_id}")).await
    }

    async fn list_domains(&self) -> Result<Vec<Domain>> {
        self.get_paged("/domains", None).await
    }

    async fn list_domain_records(&self, domain_id: i64) -> Result<Vec<DomainRecord>> {
        self.get_paged(&format!("/domains/{domain_id}/records"), None).await
    }

    async fn create_domain_record(
        &self,
        domain_id: i64,
        opts: DomainRecordCreateOptions,
    ) -> Result<DomainRecord> {
        self.post_json(&format!("/domains/{domain_id}/records"), &opts).await
    }

    async fn update_domain_record(
        &self,
        domain_id: i64,
        record_id: i64,
        opts: DomainRecordUpdateOptions,
    ) -> Result<DomainRecord> {
        self.put_json(&format!("/domains/{domain_id}/records/{record_id}"), &opts)
            .await
    }

    async fn delete_domain_record(&self, domain_id: i64, record_id: i64) -> Result<()> {
        self.delete(&format!("/domains/{domain_id}/records/{record_id}")).await
    }

    async fn get_vpc(&self, vpc_id: i64) -> Result<Vpc> {
        self.get_json(&format!("/vpcs/{vpc_id}")).await
    }

    async fn delete_vpc(&self, vpc_id: i64) -> Result<()> {
        self.delete(&format!("/vpcs/{vpc_id}")).await
    }
}
