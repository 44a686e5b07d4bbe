//! Tracer lifecycle: setup, ad hoc span creation, and bounded shutdown.

use opentelemetry::trace::{TraceContextExt, Tracer};
use opentelemetry::{Context, KeyValue, global};
use opentelemetry_sdk::Resource;
use opentelemetry_sdk::propagation::TraceContextPropagator;
use opentelemetry_sdk::{runtime, trace as sdktrace};
use std::borrow::Cow;
use std::env;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;
use url::Url;

/// Instrumentation scope reported on every span this process emits.
const SCOPE_NAME: &str = "linman";

/// Environment variables with this prefix are surfaced to logs at setup,
/// uninterpreted; the exporter discovers its own configuration from them.
const TELEMETRY_ENV_PREFIX: &str = "OTEL_";

const ENDPOINT_ENV: &str = "OTEL_EXPORTER_OTLP_ENDPOINT";

const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("Failed to build span exporter: {0}")]
    Exporter(String),

    #[error("Invalid {ENDPOINT_ENV} value {endpoint:?}: {source}")]
    InvalidEndpoint {
        endpoint: String,
        source: url::ParseError,
    },

    #[error("Telemetry shutdown incomplete after {elapsed:?}: {pending:?} still flushing")]
    ShutdownTimeout {
        elapsed: Duration,
        pending: Vec<&'static str>,
    },

    #[error("Telemetry flush failed: {0}")]
    Flush(String),
}

/// Static identity attached to every span the process emits.
#[derive(Debug, Clone)]
pub struct ResourceMetadata {
    pub service_name: String,
    pub service_version: String,
    pub node_name: Option<String>,
    pub pod_name: Option<String>,
}

impl ResourceMetadata {
    fn to_resource(&self) -> Resource {
        let mut attrs = vec![
            KeyValue::new("service.name", self.service_name.clone()),
            KeyValue::new("service.version", self.service_version.clone()),
        ];
        if let Some(node) = &self.node_name {
            attrs.push(KeyValue::new("k8s.node.name", node.clone()));
        }
        if let Some(pod) = &self.pod_name {
            attrs.push(KeyValue::new("k8s.pod.name", pod.clone()));
        }
        Resource::new(attrs)
    }
}

/// Install the process-wide tracer provider and W3C trace-context
/// propagator, exporting through a batching OTLP span processor.
///
/// Exporter settings are discovered from the `OTEL_*` environment per the
/// exporter's own convention; nothing is enumerated here. Errors are
/// non-fatal by contract: the caller logs and continues untraced, and later
/// span creation degrades to no-ops against the default provider.
pub fn setup(meta: &ResourceMetadata) -> Result<TelemetryShutdown, TelemetryError> {
    log_telemetry_env();

    if let Ok(endpoint) = env::var(ENDPOINT_ENV) {
        Url::parse(&endpoint).map_err(|source| TelemetryError::InvalidEndpoint {
            endpoint: endpoint.clone(),
            source,
        })?;
    }

    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .build()
        .map_err(|e| TelemetryError::Exporter(e.to_string()))?;

    let provider = sdktrace::TracerProvider::builder()
        .with_batch_exporter(exporter, runtime::Tokio)
        .with_resource(meta.to_resource())
        .build();

    global::set_tracer_provider(provider.clone());
    global::set_text_map_propagator(TraceContextPropagator::new());

    Ok(TelemetryShutdown::for_provider(provider))
}

/// Open a span named `name` as a child of the current context.
///
/// The span lives inside the returned context; manipulate and end it through
/// `cx.span()`. Constant-time bookkeeping only, never blocks.
pub fn start(name: impl Into<Cow<'static, str>>) -> Context {
    start_with_context(name, &Context::current())
}

/// Open a span named `name` as a child of `parent`.
pub fn start_with_context(name: impl Into<Cow<'static, str>>, parent: &Context) -> Context {
    let span = global::tracer(SCOPE_NAME).start_with_context(name, parent);
    parent.with_span(span)
}

fn log_telemetry_env() {
    for (name, value) in env::vars().filter(|(name, _)| name.starts_with(TELEMETRY_ENV_PREFIX)) {
        debug!(%name, %value, "telemetry environment");
    }
}

type ShutdownRoutine = Pin<Box<dyn Future<Output = Result<(), TelemetryError>> + Send>>;

/// Handle returned by [`setup`]; flushes telemetry at process teardown.
///
/// `shutdown` consumes the handle, so it runs at most once. Each registered
/// subsystem routine is spawned as an independent task and awaited under one
/// shared deadline measured from shutdown entry. The deadline is deliberately
/// decoupled from any outer cancellation signal: flush is still attempted
/// after the triggering signal has fired. Routines that outlive the deadline
/// are abandoned, not cancelled.
pub struct TelemetryShutdown {
    timeout: Duration,
    routines: Vec<(&'static str, ShutdownRoutine)>,
}

impl TelemetryShutdown {
    /// An empty handle with no subsystems registered.
    pub fn new() -> Self {
        Self {
            timeout: DEFAULT_SHUTDOWN_TIMEOUT,
            routines: Vec::new(),
        }
    }

    fn for_provider(provider: sdktrace::TracerProvider) -> Self {
        let mut handle = Self::new();
        handle.register("tracer-provider", async move {
            // Provider shutdown blocks while the batch processor drains.
            tokio::task::spawn_blocking(move || {
                provider
                    .shutdown()
                    .map_err(|e| TelemetryError::Flush(e.to_string()))
            })
            .await
            .map_err(|e| TelemetryError::Flush(e.to_string()))?
        });
        handle
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Register an additional subsystem to flush at shutdown.
    pub fn register<F>(&mut self, name: &'static str, routine: F)
    where
        F: Future<Output = Result<(), TelemetryError>> + Send + 'static,
    {
        self.routines.push((name, Box::pin(routine)));
    }

    /// Flush every registered subsystem, bounded by the configured timeout.
    ///
    /// Returns `ShutdownTimeout` naming the subsystems still running at the
    /// deadline, or the first flush error. Callers log the error; it never
    /// alters the process exit status.
    pub async fn shutdown(self) -> Result<(), TelemetryError> {
        let started = tokio::time::Instant::now();
        let deadline = started + self.timeout;

        let tasks: Vec<_> = self
            .routines
            .into_iter()
            .map(|(name, routine)| (name, tokio::spawn(routine)))
            .collect();

        let mut pending = Vec::new();
        let mut first_error = None;
        for (name, task) in tasks {
            match tokio::time::timeout_at(deadline, task).await {
                Ok(Ok(Ok(()))) => {}
                Ok(Ok(Err(err))) => {
                    first_error.get_or_insert(err);
                }
                Ok(Err(join_err)) => {
                    first_error.get_or_insert(TelemetryError::Flush(join_err.to_string()));
                }
                // Deadline elapsed; the task keeps running detached.
                Err(_) => pending.push(name),
            }
        }

        if !pending.is_empty() {
            return Err(TelemetryError::ShutdownTimeout {
                elapsed: started.elapsed(),
                pending,
            });
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl Default for TelemetryShutdown {
    fn default() -> Self {
        Self::new()
    }
}

// Manual impl: the boxed routine futures are opaque, so only their names
// and the timeout are shown.
impl std::fmt::Debug for TelemetryShutdown {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelemetryShutdown")
            .field("timeout", &self.timeout)
            .field(
                "routines",
                &self.routines.iter().map(|(name, _)| *name).collect::<Vec<_>>(),
            )
            .finish()
    }
}
