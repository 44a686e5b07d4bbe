//! Decorator behavior against an in-memory span exporter: transparency,
//! span naming, and error recording with and without a custom decorator.

use async_trait::async_trait;
use linman_core::catalog::{Image, InstanceType, Region};
use linman_core::dns::{
    Domain, DomainRecord, DomainRecordCreateOptions, DomainRecordUpdateOptions,
};
use linman_core::instance::{
    Disk, DiskCreateOptions, Instance, InstanceConfig, InstanceConfigUpdateOptions,
    InstanceCreateOptions, InstanceIps, InstanceStatus,
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
use linman_trace::{Bag, TracedClient, default_decorator};
use opentelemetry::Value;
use opentelemetry::global::BoxedTracer;
use opentelemetry::trace::{Status, TracerProvider as _};
use opentelemetry_sdk::export::trace::SpanData;
use opentelemetry_sdk::testing::trace::InMemorySpanExporter;
use opentelemetry_sdk::trace::TracerProvider;
use std::sync::Arc;

fn sample_instance() -> Instance {
    Instance {
        id: 42,
        label: "worker-0".into(),
        region: "eu-central".into(),
        type_id: "g6-standard-2".into(),
        status: InstanceStatus::Running,
        ipv4: vec!["203.0.113.10".into()],
        ipv6: None,
        tags: vec![],
    }
}

/// Fake upstream client. Only the operations exercised by these tests are
/// implemented; the rest are unreachable.
struct FakeApi {
    fail_deletes: bool,
}

#[async_trait]
impl LinodeApi for FakeApi {
    async fn list_instances(&self, _filter: Option<String>) -> Result<Vec<Instance>> {
        Ok(vec![sample_instance()])
    }

    async fn get_instance(&self, linode_id: i64) -> Result<Instance> {
        if linode_id == 42 {
            Ok(sample_instance())
        } else {
            Err(ClientError::NotFound(format!("Linode {linode_id}")))
        }
    }

    async fn create_instance(&self, _opts: InstanceCreateOptions) -> Result<Instance> {
        unreachable!()
    }

    async fn delete_instance(&self, linode_id: i64) -> Result<()> {
        if self.fail_deletes {
            Err(ClientError::Api {
                status: 500,
                message: format!("cannot delete {linode_id}"),
            })
        } else {
            Ok(())
        }
    }

    async fn boot_instance(&self, _linode_id: i64, _config_id: Option<i64>) -> Result<()> {
        unreachable!()
    }

    async fn shutdown_instance(&self, _linode_id: i64) -> Result<()> {
        unreachable!()
    }

    async fn list_instance_configs(&self, _linode_id: i64) -> Result<Vec<InstanceConfig>> {
        unreachable!()
    }

    async fn update_instance_config(
        &self,
        _linode_id: i64,
        _config_id: i64,
        _opts: InstanceConfigUpdateOptions,
    ) -> Result<InstanceConfig> {
        unreachable!()
    }

    async fn get_instance_disk(&self, _linode_id: i64, _disk_id: i64) -> Result<Disk> {
        unreachable!()
    }

    async fn create_instance_disk(
        &self,
        _linode_id: i64,
        _opts: DiskCreateOptions,
    ) -> Result<Disk> {
        unreachable!()
    }

    async fn resize_instance_disk(
        &self,
        _linode_id: i64,
        _disk_id: i64,
        _size: i64,
    ) -> Result<()> {
        unreachable!()
    }

    async fn get_instance_ips(&self, _linode_id: i64) -> Result<InstanceIps> {
        unreachable!()
    }

    async fn get_region(&self, _region_id: &str) -> Result<Region> {
        unreachable!()
    }

    async fn get_image(&self, _image_id: &str) -> Result<Image> {
        unreachable!()
    }

    async fn get_type(&self, _type_id: &str) -> Result<InstanceType> {
        unreachable!()
    }

    async fn create_node_balancer(
        &self,
        _opts: NodeBalancerCreateOptions,
    ) -> Result<NodeBalancer> {
        unreachable!()
    }

    async fn get_node_balancer(&self, _nodebalancer_id: i64) -> Result<NodeBalancer> {
        unreachable!()
    }

    async fn delete_node_balancer(&self, _nodebalancer_id: i64) -> Result<()> {
        unreachable!()
    }

    async fn create_node_balancer_config(
        &self,
        _nodebalancer_id: i64,
        _opts: NodeBalancerConfigCreateOptions,
    ) -> Result<NodeBalancerConfig> {
        unreachable!()
    }

    async fn get_node_balancer_config(
        &self,
        _nodebalancer_id: i64,
        _config_id: i64,
    ) -> Result<NodeBalancerConfig> {
        unreachable!()
    }

    async fn delete_node_balancer_config(
        &self,
        _nodebalancer_id: i64,
        _config_id: i64,
    ) -> Result<()> {
        unreachable!()
    }

    async fn create_node_balancer_node(
        &self,
        _nodebalancer_id: i64,
        _config_id: i64,
        _opts: NodeBalancerNodeCreateOptions,
    ) -> Result<NodeBalancerNode> {
        unreachable!()
    }

    async fn list_node_balancer_nodes(
        &self,
        _nodebalancer_id: i64,
        _config_id: i64,
    ) -> Result<Vec<NodeBalancerNode>> {
        unreachable!()
    }

    async fn delete_node_balancer_node(
        &self,
        _nodebalancer_id: i64,
        _config_id: i64,
        _node_id: i64,
    ) -> Result<()> {
        unreachable!()
    }

    async fn get_object_storage_bucket(
        &self,
        _region_id: &str,
        _bucket_label: &str,
    ) -> Result<ObjectStorageBucket> {
        unreachable!()
    }

    async fn create_object_storage_bucket(
        &self,
        _opts: ObjectStorageBucketCreateOptions,
    ) -> Result<ObjectStorageBucket> {
        unreachable!()
    }

    async fn get_object_storage_key(&self, _key_id: i64) -> Result<ObjectStorageKey> {
        unreachable!()
    }

    async fn create_object_storage_key(
        &self,
        _opts: ObjectStorageKeyCreateOptions,
    ) -> Result<ObjectStorageKey> {
        unreachable!()
    }

    async fn delete_object_storage_key(&self, _key_id: i64) -> Result<()> {
        unreachable!()
    }

    async fn list_domains(&self) -> Result<Vec<Domain>> {
        unreachable!()
    }

    async fn list_domain_records(&self, _domain_id: i64) -> Result<Vec<DomainRecord>> {
        unreachable!()
    }

    async fn create_domain_record(
        &self,
        _domain_id: i64,
        _opts: DomainRecordCreateOptions,
    ) -> Result<DomainRecord> {
        unreachable!()
    }

    async fn update_domain_record(
        &self,
        _domain_id: i64,
        record_id: i64,
        opts: DomainRecordUpdateOptions,
    ) -> Result<DomainRecord> {
        Ok(DomainRecord {
            id: record_id,
            record_type: opts.record_type.unwrap_or_else(|| "A".into()),
            name: opts.name.unwrap_or_default(),
            target: opts.target.unwrap_or_default(),
            priority: opts.priority,
            weight: opts.weight,
            port: opts.port,
            ttl_sec: opts.ttl_sec.unwrap_or(0),
        })
    }

    async fn delete_domain_record(&self, _domain_id: i64, _record_id: i64) -> Result<()> {
        unreachable!()
    }

    async fn get_vpc(&self, _vpc_id: i64) -> Result<Vpc> {
        unreachable!()
    }

    async fn delete_vpc(&self, _vpc_id: i64) -> Result<()> {
        unreachable!()
    }
}

fn traced(
    fail_deletes: bool,
    decorator: Option<linman_trace::AttributeDecorator>,
) -> (TracedClient<FakeApi>, InMemorySpanExporter, TracerProvider) {
    let exporter = InMemorySpanExporter::default();
    let provider = TracerProvider::builder()
        .with_simple_exporter(exporter.clone())
        .build();
    let tracer = BoxedTracer::new(Box::new(provider.tracer("test")));
    let client = TracedClient::with_tracer(FakeApi { fail_deletes }, decorator, tracer);
    // The provider is handed back so the test keeps it alive: dropping the
    // last provider reference shuts it down, which resets the exporter.
    (client, exporter, provider)
}

fn finished(exporter: &InMemorySpanExporter) -> Vec<SpanData> {
    exporter.get_finished_spans().expect("finished spans")
}

fn has_exception_event(span: &SpanData) -> bool {
    span.events.iter().any(|e| e.name == "exception")
}

#[tokio::test]
async fn success_result_is_transparent() {
    let (client, exporter, _provider) = traced(false, None);

    let instance = client.get_instance(42).await.expect("instance");
    assert_eq!(instance, sample_instance());

    let spans = finished(&exporter);
    assert_eq!(spans.len(), 1);
    assert_eq!(spans[0].name, "LinodeApi.GetInstance");
    assert_eq!(spans[0].status, Status::Unset);

    // Unwrapping the decorator hands back the same client, untouched.
    let inner = client.into_inner();
    let direct = inner.get_instance(42).await.expect("instance");
    assert_eq!(direct, instance);
    assert_eq!(finished(&exporter).len(), 1);
}

#[tokio::test]
async fn error_result_is_transparent() {
    let (client, exporter, _provider) = traced(false, None);

    let err = client.get_instance(7).await.expect_err("not found");
    assert!(matches!(err, ClientError::NotFound(_)));

    let spans = finished(&exporter);
    assert_eq!(spans.len(), 1);
    assert_eq!(spans[0].name, "LinodeApi.GetInstance");
}

#[tokio::test]
async fn one_span_per_call() {
    let (client, exporter, _provider) = traced(false, None);

    client.get_instance(42).await.expect("instance");
    client.list_instances(None).await.expect("instances");
    client.delete_instance(42).await.expect("delete");

    let names: Vec<_> = finished(&exporter)
        .into_iter()
        .map(|s| s.name.into_owned())
        .collect();
    assert_eq!(
        names,
        vec![
            "LinodeApi.GetInstance",
            "LinodeApi.ListInstances",
            "LinodeApi.DeleteInstance",
        ]
    );
}

#[tokio::test]
async fn errors_are_recorded_without_a_decorator() {
    let (client, exporter, _provider) = traced(true, None);

    let err = client.delete_instance(42).await.expect_err("api error");
    assert!(matches!(err, ClientError::Api { status: 500, .. }));

    let spans = finished(&exporter);
    assert_eq!(spans.len(), 1);
    assert!(matches!(spans[0].status, Status::Error { .. }));
    assert!(has_exception_event(&spans[0]));
}

#[tokio::test]
async fn configured_decorator_suppresses_default_error_recording() {
    let (client, exporter, _provider) = traced(true, Some(default_decorator()));

    client.delete_instance(42).await.expect_err("api error");

    let spans = finished(&exporter);
    assert_eq!(spans.len(), 1);
    // The decorator is trusted fully; no fallback error recording fires.
    assert_eq!(spans[0].status, Status::Unset);
    assert!(!has_exception_event(&spans[0]));
    // The default decorator still emitted its request attributes.
    assert!(
        spans[0]
            .attributes
            .iter()
            .any(|kv| kv.key.as_str() == "req.linode_id" && kv.value == Value::I64(42))
    );
}

#[tokio::test]
async fn custom_decorator_sees_params_and_results() {
    let captured: Arc<std::sync::Mutex<Vec<(usize, bool)>>> =
        Arc::new(std::sync::Mutex::new(Vec::new()));
    let sink = captured.clone();
    let decorator: linman_trace::AttributeDecorator =
        Arc::new(move |_span, params: &Bag, results: &Bag| {
            let errored = results.get::<String>("error").is_some();
            sink.lock().expect("lock").push((params.len(), errored));
        });

    let (client, _exporter, _provider) = traced(true, Some(decorator));
    client.get_instance(42).await.expect("instance");
    client.delete_instance(9).await.expect_err("api error");

    let calls = captured.lock().expect("lock").clone();
    // get_instance: one param, no error; delete_instance: one param, error.
    assert_eq!(calls, vec![(1, false), (1, true)]);
}

#[tokio::test]
async fn update_record_bags_the_composite_request() {
    let (client, exporter, _provider) = traced(false, Some(default_decorator()));

    let opts = DomainRecordUpdateOptions {
        target: Some("198.51.100.4".into()),
        ..Default::default()
    };
    client
        .update_domain_record(11, 12, opts)
        .await
        .expect("record");

    let spans = finished(&exporter);
    assert_eq!(spans[0].name, "LinodeApi.UpdateDomainRecord");
    let attr = |key: &str| {
        spans[0]
            .attributes
            .iter()
            .find(|kv| kv.key.as_str() == key)
            .map(|kv| kv.value.clone())
    };
    assert_eq!(attr("req.domain_id"), Some(Value::I64(11)));
    assert_eq!(attr("req.domain_record_id"), Some(Value::I64(12)));
    assert_eq!(attr("req.record_target"), Some(Value::from("198.51.100.4")));
    assert_eq!(attr("req.record_name"), Some(Value::from("")));
}
