//! Reference attribute decorator.
//!
//! Reads a fixed table of well-known parameter-bag keys and emits one
//! `req.<snake_case>` span attribute per key present. Keys that are absent,
//! or present with an unexpected type, emit nothing. Output depends only on
//! which keys are present and their values.

use crate::attrs::{AttributeDecorator, Bag, or_default};
use linman_core::dns::DomainRecordUpdateOptions;
use opentelemetry::KeyValue;
use opentelemetry::global::BoxedSpan;
use opentelemetry::trace::Span;
use std::sync::Arc;

/// Integer-valued well-known keys and the attribute each maps to.
const INT_KEYS: &[(&str, &str)] = &[
    ("linodeID", "req.linode_id"),
    ("diskID", "req.disk_id"),
    ("configID", "req.config_id"),
    ("nodeID", "req.node_id"),
    ("nodebalancerID", "req.nodebalancer_id"),
    ("domainID", "req.domain_id"),
    ("domainRecordID", "req.domain_record_id"),
    ("keyID", "req.key_id"),
    ("vpcID", "req.vpc_id"),
    ("size", "req.size"),
];

/// String-valued well-known keys.
const STR_KEYS: &[(&str, &str)] = &[
    ("regionID", "req.region_id"),
    ("imageID", "req.image_id"),
    ("typeID", "req.type_id"),
    ("bucketLabel", "req.bucket_label"),
    ("filter", "req.filter"),
];

/// Composite domain-record update request, decomposed field by field.
const RECORD_REQ_KEY: &str = "recordReq";

/// The default [`AttributeDecorator`] wired in by the manager bootstrap.
pub fn default_decorator() -> AttributeDecorator {
    Arc::new(|span, params, _results| apply_default_attributes(span, params))
}

fn apply_default_attributes(span: &mut BoxedSpan, params: &Bag) {
    for (key, attr) in INT_KEYS {
        if let Some(value) = params.get::<i64>(key) {
            span.set_attribute(KeyValue::new(*attr, *value));
        }
    }
    for (key, attr) in STR_KEYS {
        if let Some(value) = params.get::<String>(key) {
            span.set_attribute(KeyValue::new(*attr, value.clone()));
        }
    }
    if let Some(req) = params.get::<DomainRecordUpdateOptions>(RECORD_REQ_KEY) {
        // Every field is optional; absent fields collapse to the zero value.
        span.set_attribute(KeyValue::new(
            "req.record_type",
            or_default(req.record_type.as_ref()),
        ));
        span.set_attribute(KeyValue::new("req.record_name", or_default(req.name.as_ref())));
        span.set_attribute(KeyValue::new(
            "req.record_target",
            or_default(req.target.as_ref()),
        ));
        span.set_attribute(KeyValue::new(
            "req.record_priority",
            or_default(req.priority.as_ref()),
        ));
        span.set_attribute(KeyValue::new(
            "req.record_weight",
            or_default(req.weight.as_ref()),
        ));
        span.set_attribute(KeyValue::new("req.record_port", or_default(req.port.as_ref())));
        span.set_attribute(KeyValue::new(
            "req.record_ttl_sec",
            or_default(req.ttl_sec.as_ref()),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opentelemetry::Value;
    use opentelemetry::global::BoxedTracer;
    use opentelemetry::trace::{Tracer, TracerProvider as _};
    use opentelemetry_sdk::testing::trace::InMemorySpanExporter;
    use opentelemetry_sdk::trace::TracerProvider;

    fn test_tracer() -> (BoxedTracer, InMemorySpanExporter) {
        let exporter = InMemorySpanExporter::default();
        let provider = TracerProvider::builder()
            .with_simple_exporter(exporter.clone())
            .build();
        let tracer = BoxedTracer::new(Box::new(provider.tracer("test")));
        (tracer, exporter)
    }

    fn decorate(params: &Bag) -> Vec<KeyValue> {
        let (tracer, exporter) = test_tracer();
        let mut span = tracer.start("test-span");
        let decorator = default_decorator();
        decorator(&mut span, params, &Bag::new());
        span.end();

        let spans = exporter.get_finished_spans().expect("finished spans");
        assert_eq!(spans.len(), 1);
        spans[0].attributes.clone()
    }

    #[test]
    fn emits_exactly_the_present_keys() {
        let mut params = Bag::new();
        params.insert("linodeID", 42_i64);
        params.insert("configID", 7_i64);

        let attrs = decorate(&params);
        assert_eq!(attrs.len(), 2);
        assert!(
            attrs
                .iter()
                .any(|kv| kv.key.as_str() == "req.linode_id" && kv.value == Value::I64(42))
        );
        assert!(
            attrs
                .iter()
                .any(|kv| kv.key.as_str() == "req.config_id" && kv.value == Value::I64(7))
        );
    }

    #[test]
    fn empty_bag_emits_nothing() {
        let attrs = decorate(&Bag::new());
        assert!(attrs.is_empty());
    }

    #[test]
    fn type_mismatched_key_emits_nothing() {
        let mut params = Bag::new();
        // linodeID is a well-known integer key; a string value is ignored.
        params.insert("linodeID", String::from("42"));
        let attrs = decorate(&params);
        assert!(attrs.is_empty());
    }

    #[test]
    fn string_keys_are_emitted() {
        let mut params = Bag::new();
        params.insert("regionID", String::from("eu-central"));
        params.insert("bucketLabel", String::from("backups"));

        let attrs = decorate(&params);
        assert_eq!(attrs.len(), 2);
        assert!(attrs.iter().any(|kv| {
            kv.key.as_str() == "req.region_id" && kv.value == Value::from("eu-central")
        }));
    }

    #[test]
    fn record_request_decomposes_with_defaults() {
        let mut params = Bag::new();
        params.insert(
            "recordReq",
            DomainRecordUpdateOptions {
                record_type: Some("A".into()),
                target: Some("203.0.113.9".into()),
                ttl_sec: Some(300),
                ..Default::default()
            },
        );

        let attrs = decorate(&params);
        let get = |key: &str| {
            attrs
                .iter()
                .find(|kv| kv.key.as_str() == key)
                .map(|kv| kv.value.clone())
        };
        assert_eq!(get("req.record_type"), Some(Value::from("A")));
        assert_eq!(get("req.record_target"), Some(Value::from("203.0.113.9")));
        assert_eq!(get("req.record_ttl_sec"), Some(Value::I64(300)));
        // Absent optional fields collapse to zero values, not omission.
        assert_eq!(get("req.record_name"), Some(Value::from("")));
        assert_eq!(get("req.record_priority"), Some(Value::I64(0)));
        assert_eq!(get("req.record_weight"), Some(Value::I64(0)));
        assert_eq!(get("req.record_port"), Some(Value::I64(0)));
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let mut params = Bag::new();
        params.insert("instanceCreateOpts", 1_i64);
        params.insert("somethingElse", String::from("x"));
        let attrs = decorate(&params);
        assert!(attrs.is_empty());
    }
}
