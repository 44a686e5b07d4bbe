//! Port traits (hexagonal architecture).
//!
//! `LinodeApi` is the full operation surface of the Linode v4 API that the
//! provisioning reconcilers consume. Adapters (the HTTP binding, the tracing
//! decorator, test fakes) all implement this trait, so callers are agnostic
//! to transport and instrumentation.

use crate::Result;
use crate::catalog::{Image, InstanceType, Region};
use crate::dns::{Domain, DomainRecord, DomainRecordCreateOptions, DomainRecordUpdateOptions};
use crate::instance::{
    Disk, DiskCreateOptions, Instance, InstanceConfig, InstanceConfigUpdateOptions,
    InstanceCreateOptions, InstanceIps,
};
use crate::network::Vpc;
use crate::nodebalancer::{
    NodeBalancer, NodeBalancerConfig, NodeBalancerConfigCreateOptions, NodeBalancerCreateOptions,
    NodeBalancerNode, NodeBalancerNodeCreateOptions,
};
use crate::objectstorage::{
    ObjectStorageBucket, ObjectStorageBucketCreateOptions, ObjectStorageKey,
    ObjectStorageKeyCreateOptions,
};
use async_trait::async_trait;

/// Client for the Linode v4 API.
#[async_trait]
pub trait LinodeApi: Send + Sync {
    // Compute instances

    /// List instances, optionally constrained by an X-Filter expression.
    async fn list_instances(&self, filter: Option<String>) -> Result<Vec<Instance>>;

    /// Get a single instance by ID.
    async fn get_instance(&self, linode_id: i64) -> Result<Instance>;

    /// Provision a new instance.
    async fn create_instance(&self, opts: InstanceCreateOptions) -> Result<Instance>;

    /// Delete an instance.
    async fn delete_instance(&self, linode_id: i64) -> Result<()>;

    /// Boot an instance, optionally with a specific config.
    async fn boot_instance(&self, linode_id: i64, config_id: Option<i64>) -> Result<()>;

    /// Shut an instance down.
    async fn shutdown_instance(&self, linode_id: i64) -> Result<()>;

    /// List boot configs of an instance.
    async fn list_instance_configs(&self, linode_id: i64) -> Result<Vec<InstanceConfig>>;

    /// Update a boot config.
    async fn update_instance_config(
        &self,
        linode_id: i64,
        config_id: i64,
        opts: InstanceConfigUpdateOptions,
    ) -> Result<InstanceConfig>;

    /// Get a disk attached to an instance.
    async fn get_instance_disk(&self, linode_id: i64, disk_id: i64) -> Result<Disk>;

    /// Create a disk on an instance.
    async fn create_instance_disk(&self, linode_id: i64, opts: DiskCreateOptions) -> Result<Disk>;

    /// Resize a disk to `size` MB.
    async fn resize_instance_disk(&self, linode_id: i64, disk_id: i64, size: i64) -> Result<()>;

    /// Get the IP assignments of an instance.
    async fn get_instance_ips(&self, linode_id: i64) -> Result<InstanceIps>;

    // Catalog

    /// Get a region descriptor.
    async fn get_region(&self, region_id: &str) -> Result<Region>;

    /// Get an image descriptor.
    async fn get_image(&self, image_id: &str) -> Result<Image>;

    /// Get an instance type descriptor.
    async fn get_type(&self, type_id: &str) -> Result<InstanceType>;

    // NodeBalancers

    /// Create a NodeBalancer.
    async fn create_node_balancer(&self, opts: NodeBalancerCreateOptions) -> Result<NodeBalancer>;

    /// Get a NodeBalancer by ID.
    async fn get_node_balancer(&self, nodebalancer_id: i64) -> Result<NodeBalancer>;

    /// Delete a NodeBalancer.
    async fn delete_node_balancer(&self, nodebalancer_id: i64) -> Result<()>;

    /// Create a port config on a NodeBalancer.
    async fn create_node_balancer_config(
        &self,
        nodebalancer_id: i64,
        opts: NodeBalancerConfigCreateOptions,
    ) -> Result<NodeBalancerConfig>;

    /// Get a port config.
    async fn get_node_balancer_config(
        &self,
        nodebalancer_id: i64,
        config_id: i64,
    ) -> Result<NodeBalancerConfig>;

    /// Delete a port config.
    async fn delete_node_balancer_config(
        &self,
        nodebalancer_id: i64,
        config_id: i64,
    ) -> Result<()>;

    /// Attach a backend node to a port config.
    async fn create_node_balancer_node(
        &self,
        nodebalancer_id: i64,
        config_id: i64,
        opts: NodeBalancerNodeCreateOptions,
    ) -> Result<NodeBalancerNode>;

    /// List backend nodes of a port config.
    async fn list_node_balancer_nodes(
        &self,
        nodebalancer_id: i64,
        config_id: i64,
    ) -> Result<Vec<NodeBalancerNode>>;

    /// Detach a backend node.
    async fn delete_node_balancer_node(
        &self,
        nodebalancer_id: i64,
        config_id: i64,
        node_id: i64,
    ) -> Result<()>;

    // Object storage

    /// Get a bucket by region and label.
    async fn get_object_storage_bucket(
        &self,
        region_id: &str,
        bucket_label: &str,
    ) -> Result<ObjectStorageBucket>;

    /// Create a bucket.
    async fn create_object_storage_bucket(
        &self,
        opts: ObjectStorageBucketCreateOptions,
    ) -> Result<ObjectStorageBucket>;

    /// Get an access key by ID.
    async fn get_object_storage_key(&self, key_id: i64) -> Result<ObjectStorageKey>;

    /// Create an access key.
    async fn create_object_storage_key(
        &self,
        opts: ObjectStorageKeyCreateOptions,
    ) -> Result<ObjectStorageKey>;

    /// Revoke an access key.
    async fn delete_object_storage_key(&self, key_id: i64) -> Result<()>;

    // DNS

    /// List all domains.
    async fn list_domains(&self) -> Result<Vec<Domain>>;

    /// List records of a domain.
    async fn list_domain_records(&self, domain_id: i64) -> Result<Vec<DomainRecord>>;

    /// Create a record in a domain.
    async fn create_domain_record(
        &self,
        domain_id: i64,
        opts: DomainRecordCreateOptions,
    ) -> Result<DomainRecord>;

    /// Update a record.
    async fn update_domain_record(
        &self,
        domain_id: i64,
        record_id: i64,
        opts: DomainRecordUpdateOptions,
    ) -> Result<DomainRecord>;

    /// Delete a record.
    async fn delete_domain_record(&self, domain_id: i64, record_id: i64) -> Result<()>;

    // VPC

    /// Get a VPC by ID.
    async fn get_vpc(&self, vpc_id: i64) -> Result<Vpc>;

    /// Delete a VPC.
    async fn delete_vpc(&self, vpc_id: i64) -> Result<()>;
}

/// A resource reconciler driven by the manager.
///
/// Reconcilers converge one class of cloud resource toward its desired
/// state. The manager calls `reconcile` on a fixed interval; implementations
/// must be safe to re-run.
#[async_trait]
pub trait Reconciler: Send + Sync {
    /// Stable name, used for span naming and logs.
    fn name(&self) -> &str;

    /// Run one reconciliation pass.
    async fn reconcile(&self) -> Result<()>;
}
