//! OpenTelemetry integration for linman.
//!
//! Provides the process-wide tracer lifecycle (OTLP export, W3C trace
//! context propagation, bounded shutdown) and the tracing decorator that
//! wraps every Linode API call in a span with pluggable attribute
//! extraction.

pub mod attrs;
pub mod client;
pub mod decorator;
pub mod tracer;

pub use attrs::{AttributeDecorator, Bag, or_default};
pub use client::{TRACE_NAMESPACE, TracedClient};
pub use decorator::default_decorator;
pub use tracer::{
    ResourceMetadata, TelemetryError, TelemetryShutdown, setup, start, start_with_context,
};
