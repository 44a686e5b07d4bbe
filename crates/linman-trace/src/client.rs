//! Tracing decorator over [`LinodeApi`].
//!
//! One wrapper per API operation, all structurally identical: open a span
//! named `LinodeApi.<Operation>` under the caller's context, delegate to the
//! wrapped client unmodified, then on every exit path build a parameter bag
//! from the inputs and a result bag from the output and hand both to the
//! configured [`AttributeDecorator`]. Without a decorator, errors are
//! recorded on the span directly so failures never go untraced. The wrapper
//! is transparent: results and errors pass through exactly as returned.

use crate::attrs::{AttributeDecorator, Bag};
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
use linman_core::{LinodeApi, Result};
use opentelemetry::Context;
use opentelemetry::global::{self, BoxedSpan, BoxedTracer};
use opentelemetry::trace::{Span, Status, Tracer};
use std::any::Any;

/// Span-name namespace shared by every wrapped operation.
pub const TRACE_NAMESPACE: &str = "LinodeApi";

/// Result-bag key holding the cloned success value.
pub const RESULT_OUTPUT_KEY: &str = "output";
/// Result-bag key holding the error message, when the call failed.
pub const RESULT_ERROR_KEY: &str = "error";

/// [`LinodeApi`] implementation that wraps another client with spans.
pub struct TracedClient<C> {
    inner: C,
    tracer: BoxedTracer,
    decorator: Option<AttributeDecorator>,
}

impl<C> TracedClient<C> {
    /// Wrap `inner`, taking the tracer from the installed global provider.
    pub fn new(inner: C, decorator: Option<AttributeDecorator>) -> Self {
        Self::with_tracer(inner, decorator, global::tracer(TRACE_NAMESPACE))
    }

    /// Wrap `inner` with an explicit tracer. Used by tests to capture spans
    /// in a local provider instead of the global one.
    pub fn with_tracer(
        inner: C,
        decorator: Option<AttributeDecorator>,
        tracer: BoxedTracer,
    ) -> Self {
        Self {
            inner,
            tracer,
            decorator,
        }
    }

    /// Consume the wrapper and return the inner client.
    pub fn into_inner(self) -> C {
        self.inner
    }

    fn span(&self, operation: &'static str) -> BoxedSpan {
        self.tracer.start_with_context(
            format!("{TRACE_NAMESPACE}.{operation}"),
            &Context::current(),
        )
    }

    /// Guaranteed finalization step: decorate and close the span.
    ///
    /// With a decorator configured it is trusted fully, including error
    /// recording. Without one, a failed call is mirrored onto the span as an
    /// error status plus exception event.
    fn finish<T>(&self, mut span: BoxedSpan, params: Bag, result: &Result<T>)
    where
        T: Any + Clone + Send + Sync,
    {
        let mut results = Bag::new();
        match result {
            Ok(value) => results.insert(RESULT_OUTPUT_KEY, value.clone()),
            Err(err) => results.insert(RESULT_ERROR_KEY, err.to_string()),
        }

        match &self.decorator {
            Some(decorate) => decorate(&mut span, &params, &results),
            None => {
                if let Err(err) = result {
                    span.record_error(err);
                    span.set_status(Status::error(err.to_string()));
                }
            }
        }

        span.end();
    }
}

#[async_trait]
impl<C: LinodeApi> LinodeApi for TracedClient<C> {
    async fn list_instances(&self, filter: Option<String>) -> Result<Vec<Instance>> {
        let span = self.span("ListInstances");
        let result = self.inner.list_instances(filter.clone()).await;
        let mut params = Bag::new();
        if let Some(filter) = filter {
            params.insert("filter", filter);
        }
        self.finish(span, params, &result);
        result
    }

    async fn get_instance(&self, linode_id: i64) -> Result<Instance> {
        let span = self.span("GetInstance");
        let result = self.inner.get_instance(linode_id).await;
        let mut params = Bag::new();
        params.insert("linodeID", linode_id);
        self.finish(span, params, &result);
        result
    }

    async fn create_instance(&self, opts: InstanceCreateOptions) -> Result<Instance> {
        let span = self.span("CreateInstance");
        let result = self.inner.create_instance(opts.clone()).await;
        let mut params = Bag::new();
        params.insert("regionID", opts.region.clone());
        params.insert("typeID", opts.type_id.clone());
        params.insert("instanceCreateOpts", opts);
        self.finish(span, params, &result);
        result
    }

    async fn delete_instance(&self, linode_id: i64) -> Result<()> {
        let span = self.span("DeleteInstance");
        let result = self.inner.delete_instance(linode_id).await;
        let mut params = Bag::new();
        params.insert("linodeID", linode_id);
        self.finish(span, params, &result);
        result
    }

    async fn boot_instance(&self, linode_id: i64, config_id: Option<i64>) -> Result<()> {
        let span = self.span("BootInstance");
        let result = self.inner.boot_instance(linode_id, config_id).await;
        let mut params = Bag::new();
        params.insert("linodeID", linode_id);
        if let Some(config_id) = config_id {
            params.insert("configID", config_id);
        }
        self.finish(span, params, &result);
        result
    }

    async fn shutdown_instance(&self, linode_id: i64) -> Result<()> {
        let span = self.span("ShutdownInstance");
        let result = self.inner.shutdown_instance(linode_id).await;
        let mut params = Bag::new();
        params.insert("linodeID", linode_id);
        self.finish(span, params, &result);
        result
    }

    async fn list_instance_configs(&self, linode_id: i64) -> Result<Vec<InstanceConfig>> {
        let span = self.span("ListInstanceConfigs");
        let result = self.inner.list_instance_configs(linode_id).await;
        let mut params = Bag::new();
        params.insert("linodeID", linode_id);
        self.finish(span, params, &result);
        result
    }

    async fn update_instance_config(
        &self,
        linode_id: i64,
        config_id: i64,
        opts: InstanceConfigUpdateOptions,
    ) -> Result<InstanceConfig> {
        let span = self.span("UpdateInstanceConfig");
        let result = self
            .inner
            .update_instance_config(linode_id, config_id, opts.clone())
            .await;
        let mut params = Bag::new();
        params.insert("linodeID", linode_id);
        params.insert("configID", config_id);
        params.insert("configUpdateOpts", opts);
        self.finish(span, params, &result);
        result
    }

    async fn get_instance_disk(&self, linode_id: i64, disk_id: i64) -> Result<Disk> {
        let span = self.span("GetInstanceDisk");
        let result = self.inner.get_instance_disk(linode_id, disk_id).await;
        let mut params = Bag::new();
        params.insert("linodeID", linode_id);
        params.insert("diskID", disk_id);
        self.finish(span, params, &result);
        result
    }

    async fn create_instance_disk(&self, linode_id: i64, opts: DiskCreateOptions) -> Result<Disk> {
        let span = self.span("CreateInstanceDisk");
        let result = self.inner.create_instance_disk(linode_id, opts.clone()).await;
        let mut params = Bag::new();
        params.insert("linodeID", linode_id);
        params.insert("diskCreateOpts", opts);
        self.finish(span, params, &result);
        result
    }

    async fn resize_instance_disk(&self, linode_id: i64, disk_id: i64, size: i64) -> Result<()> {
        let span = self.span("ResizeInstanceDisk");
        let result = self.inner.resize_instance_disk(linode_id, disk_id, size).await;
        let mut params = Bag::new();
        params.insert("linodeID", linode_id);
        params.insert("diskID", disk_id);
        params.insert("size", size);
        self.finish(span, params, &result);
        result
    }

    async fn get_instance_ips(&self, linode_id: i64) -> Result<InstanceIps> {
        let span = self.span("GetInstanceIPs");
        let result = self.inner.get_instance_ips(linode_id).await;
        let mut params = Bag::new();
        params.insert("linodeID", linode_id);
        self.finish(span, params, &result);
        result
    }

    async fn get_region(&self, region_id: &str) -> Result<Region> {
        let span = self.span("GetRegion");
        let result = self.inner.get_region(region_id).await;
        let mut params = Bag::new();
        params.insert("regionID", region_id.to_owned());
        self.finish(span, params, &result);
        result
    }

    async fn get_image(&self, image_id: &str) -> Result<Image> {
        let span = self.span("GetImage");
        let result = self.inner.get_image(image_id).await;
        let mut params = Bag::new();
        params.insert("imageID", image_id.to_owned());
        self.finish(span, params, &result);
        result
    }

    async fn get_type(&self, type_id: &str) -> Result<InstanceType> {
        let span = self.span("GetType");
        let result = self.inner.get_type(type_id).await;
        let mut params = Bag::new();
        params.insert("typeID", type_id.to_owned());
        self.finish(span, params, &result);
        result
    }

    async fn create_node_balancer(&self, opts: NodeBalancerCreateOptions) -> Result<NodeBalancer> {
        let span = self.span("CreateNodeBalancer");
        let result = self.inner.create_node_balancer(opts.clone()).await;
        let mut params = Bag::new();
        params.insert("regionID", opts.region.clone());
        params.insert("nodebalancerCreateOpts", opts);
        self.finish(span, params, &result);
        result
    }

    async fn get_node_balancer(&self, nodebalancer_id: i64) -> Result<NodeBalancer> {
        let span = self.span("GetNodeBalancer");
        let result = self.inner.get_node_balancer(nodebalancer_id).await;
        let mut params = Bag::new();
        params.insert("nodebalancerID", nodebalancer_id);
        self.finish(span, params, &result);
        result
    }

    async fn delete_node_balancer(&self, nodebalancer_id: i64) -> Result<()> {
        let span = self.span("DeleteNodeBalancer");
        let result = self.inner.delete_node_balancer(nodebalancer_id).await;
        let mut params = Bag::new();
        params.insert("nodebalancerID", nodebalancer_id);
        self.finish(span, params, &result);
        result
    }

    async fn create_node_balancer_config(
        &self,
        nodebalancer_id: i64,
        opts: NodeBalancerConfigCreateOptions,
    ) -> Result<NodeBalancerConfig> {
        let span = self.span("CreateNodeBalancerConfig");
        let result = self
            .inner
            .create_node_balancer_config(nodebalancer_id, opts.clone())
            .await;
        let mut params = Bag::new();
        params.insert("nodebalancerID", nodebalancer_id);
        params.insert("configCreateOpts", opts);
        self.finish(span, params, &result);
        result
    }

    async fn get_node_balancer_config(
        &self,
        nodebalancer_id: i64,
        config_id: i64,
    ) -> Result<NodeBalancerConfig> {
        let span = self.span("GetNodeBalancerConfig");
        let result = self
            .inner
            .get_node_balancer_config(nodebalancer_id, config_id)
            .await;
        let mut params = Bag::new();
        params.insert("nodebalancerID", nodebalancer_id);
        params.insert("configID", config_id);
        self.finish(span, params, &result);
        result
    }

    async fn delete_node_balancer_config(
        &self,
        nodebalancer_id: i64,
        config_id: i64,
    ) -> Result<()> {
        let span = self.span("DeleteNodeBalancerConfig");
        let result = self
            .inner
            .delete_node_balancer_config(nodebalancer_id, config_id)
            .await;
        let mut params = Bag::new();
        params.insert("nodebalancerID", nodebalancer_id);
        params.insert("configID", config_id);
        self.finish(span, params, &result);
        result
    }

    async fn create_node_balancer_node(
        &self,
        nodebalancer_id: i64,
        config_id: i64,
        opts: NodeBalancerNodeCreateOptions,
    ) -> Result<NodeBalancerNode> {
        let span = self.span("CreateNodeBalancerNode");
        let result = self
            .inner
            .create_node_balancer_node(nodebalancer_id, config_id, opts.clone())
            .await;
        let mut params = Bag::new();
        params.insert("nodebalancerID", nodebalancer_id);
        params.insert("configID", config_id);
        params.insert("nodeCreateOpts", opts);
        self.finish(span, params, &result);
        result
    }

    async fn list_node_balancer_nodes(
        &self,
        nodebalancer_id: i64,
        config_id: i64,
    ) -> Result<Vec<NodeBalancerNode>> {
        let span = self.span("ListNodeBalancerNodes");
        let result = self
            .inner
            .list_node_balancer_nodes(nodebalancer_id, config_id)
            .await;
        let mut params = Bag::new();
        params.insert("nodebalancerID", nodebalancer_id);
        params.insert("configID", config_id);
        self.finish(span, params, &result);
        result
    }

    async fn delete_node_balancer_node(
        &self,
        nodebalancer_id: i64,
        config_id: i64,
        node_id: i64,
    ) -> Result<()> {
        let span = self.span("DeleteNodeBalancerNode");
        let result = self
            .inner
            .delete_node_balancer_node(nodebalancer_id, config_id, node_id)
            .await;
        let mut params = Bag::new();
        params.insert("nodebalancerID", nodebalancer_id);
        params.insert("configID", config_id);
        params.insert("nodeID", node_id);
        self.finish(span, params, &result);
        result
    }

    async fn get_object_storage_bucket(
        &self,
        region_id: &str,
        bucket_label: &str,
    ) -> Result<ObjectStorageBucket> {
        let span = self.span("GetObjectStorageBucket");
        let result = self
            .inner
            .get_object_storage_bucket(region_id, bucket_label)
            .await;
        let mut params = Bag::new();
        params.insert("regionID", region_id.to_owned());
        params.insert("bucketLabel", bucket_label.to_owned());
        self.finish(span, params, &result);
        result
    }

    async fn create_object_storage_bucket(
        &self,
        opts: ObjectStorageBucketCreateOptions,
    ) -> Result<ObjectStorageBucket> {
        let span = self.span("CreateObjectStorageBucket");
        let result = self.inner.create_object_storage_bucket(opts.clone()).await;
        let mut params = Bag::new();
        params.insert("regionID", opts.region.clone());
        params.insert("bucketLabel", opts.label.clone());
        params.insert("bucketCreateOpts", opts);
        self.finish(span, params, &result);
        result
    }

    async fn get_object_storage_key(&self, key_id: i64) -> Result<ObjectStorageKey> {
        let span = self.span("GetObjectStorageKey");
        let result = self.inner.get_object_storage_key(key_id).await;
        let mut params = Bag::new();
        params.insert("keyID", key_id);
        self.finish(span, params, &result);
        result
    }

    async fn create_object_storage_key(
        &self,
        opts: ObjectStorageKeyCreateOptions,
    ) -> Result<ObjectStorageKey> {
        let span = self.span("CreateObjectStorageKey");
        let result = self.inner.create_object_storage_key(opts.clone()).await;
        let mut params = Bag::new();
        params.insert("keyCreateOpts", opts);
        self.finish(span, params, &result);
        result
    }

    async fn delete_object_storage_key(&self, key_id: i64) -> Result<()> {
        let span = self.span("DeleteObjectStorageKey");
        let result = self.inner.delete_object_storage_key(key_id).await;
        let mut params = Bag::new();
        params.insert("keyID", key_id);
        self.finish(span, params, &result);
        result
    }

    async fn list_domains(&self) -> Result<Vec<Domain>> {
        let span = self.span("ListDomains");
        let result = self.inner.list_domains().await;
        self.finish(span, Bag::new(), &result);
        result
    }

    async fn list_domain_records(&self, domain_id: i64) -> Result<Vec<DomainRecord>> {
        let span = self.span("ListDomainRecords");
        let result = self.inner.list_domain_records(domain_id).await;
        let mut params = Bag::new();
        params.insert("domainID", domain_id);
        self.finish(span, params, &result);
        result
    }

    async fn create_domain_record(
        &self,
        domain_id: i64,
        opts: DomainRecordCreateOptions,
    ) -> Result<DomainRecord> {
        let span = self.span("CreateDomainRecord");
        let result = self.inner.create_domain_record(domain_id, opts.clone()).await;
        let mut params = Bag::new();
        params.insert("domainID", domain_id);
        params.insert("recordCreateOpts", opts);
        self.finish(span, params, &result);
        result
    }

    async fn update_domain_record(
        &self,
        domain_id: i64,
        record_id: i64,
        opts: DomainRecordUpdateOptions,
    ) -> Result<DomainRecord> {
        let span = self.span("UpdateDomainRecord");
        let result = self
            .inner
            .update_domain_record(domain_id, record_id, opts.clone())
            .await;
        let mut params = Bag::new();
        params.insert("domainID", domain_id);
        params.insert("domainRecordID", record_id);
        params.insert("recordReq", opts);
        self.finish(span, params, &result);
        result
    }

    async fn delete_domain_record(&self, domain_id: i64, record_id: i64) -> Result<()> {
        let span = self.span("DeleteDomainRecord");
        let result = self.inner.delete_domain_record(domain_id, record_id).await;
        let mut params = Bag::new();
        params.insert("domainID", domain_id);
        params.insert("domainRecordID", record_id);
        self.finish(span, params, &result);
        result
    }

    async fn get_vpc(&self, vpc_id: i64) -> Result<Vpc> {
        let span = self.span("GetVPC");
        let result = self.inner.get_vpc(vpc_id).await;
        let mut params = Bag::new();
        params.insert("vpcID", vpc_id);
        self.finish(span, params, &result);
        result
    }

    async fn delete_vpc(&self, vpc_id: i64) -> Result<()> {
        let span = self.span("DeleteVPC");
        let result = self.inner.delete_vpc(vpc_id).await;
        let mut params = Bag::new();
        params.insert("vpcID", vpc_id);
        self.finish(span, params, &result);
        result
    }
}
