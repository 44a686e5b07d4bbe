//! Reconciler registry and drive loop.

use linman_core::Reconciler;
use opentelemetry::trace::{FutureExt, TraceContextExt};
use std::future::Future;
use std::time::Duration;
use tracing::{error, info};

/// Drives registered reconcilers on a fixed interval until shut down.
///
/// Each pass of each reconciler runs inside a span named
/// `reconcile.<name>`; a failing reconciler is logged and recorded on its
/// span but never stops the loop or its peers.
pub struct Manager {
    reconcilers: Vec<Box<dyn Reconciler>>,
    interval: Duration,
}

impl Manager {
    pub fn new(interval: Duration) -> Self {
        Self {
            reconcilers: Vec::new(),
            interval,
        }
    }

    pub fn register(&mut self, reconciler: Box<dyn Reconciler>) {
        info!(name = reconciler.name(), "registered reconciler");
        self.reconcilers.push(reconciler);
    }

    /// Run until `shutdown` resolves. The first pass starts immediately.
    pub async fn run(&self, shutdown: impl Future<Output = ()>) {
        let mut ticker = tokio::time::interval(self.interval);
        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                () = &mut shutdown => {
                    info!("shutdown signal received, stopping manager");
                    return;
                }
                _ = ticker.tick() => self.reconcile_all().await,
            }
        }
    }

    async fn reconcile_all(&self) {
        for reconciler in &self.reconcilers {
            let cx = linman_trace::start(format!("reconcile.{}", reconciler.name()));
            // Attach the pass context so spans opened inside the pass,
            // including the traced client's API-call spans, parent under it.
            let result = reconciler.reconcile().with_context(cx.clone()).await;
            if let Err(err) = result {
                error!(name = reconciler.name(), %err, "reconcile pass failed");
                cx.span().record_error(&err);
                cx.span()
                    .set_status(opentelemetry::trace::Status::error(err.to_string()));
            }
            cx.span().end();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use linman_core::Result;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingReconciler {
        passes: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Reconciler for CountingReconciler {
        fn name(&self) -> &str {
            "counting"
        }

        async fn reconcile(&self) -> Result<()> {
            self.passes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn drives_reconcilers_and_stops_on_signal() {
        let passes = Arc::new(AtomicUsize::new(0));
        let mut manager = Manager::new(Duration::from_millis(10));
        manager.register(Box::new(CountingReconciler {
            passes: passes.clone(),
        }));

        manager
            .run(async {
                tokio::time::sleep(Duration::from_millis(55)).await;
            })
            .await;

        // First tick fires immediately; several more fit in the window.
        assert!(passes.load(Ordering::SeqCst) >= 2);
    }

    struct FailingReconciler;

    #[async_trait]
    impl Reconciler for FailingReconciler {
        fn name(&self) -> &str {
            "failing"
        }

        async fn reconcile(&self) -> Result<()> {
            Err(linman_core::ClientError::Transport("unreachable".into()))
        }
    }

    struct SpanningReconciler;

    #[async_trait]
    impl Reconciler for SpanningReconciler {
        fn name(&self) -> &str {
            "spanning"
        }

        async fn reconcile(&self) -> Result<()> {
            let cx = linman_trace::start("worker.op");
            cx.span().end();
            Ok(())
        }
    }

    #[tokio::test]
    async fn pass_span_parents_spans_opened_during_reconcile() {
        use opentelemetry_sdk::testing::trace::InMemorySpanExporter;

        let exporter = InMemorySpanExporter::default();
        let provider = opentelemetry_sdk::trace::TracerProvider::builder()
            .with_simple_exporter(exporter.clone())
            .build();
        opentelemetry::global::set_tracer_provider(provider);

        let mut manager = Manager::new(Duration::from_millis(10));
        manager.register(Box::new(SpanningReconciler));
        manager.reconcile_all().await;

        let spans = exporter.get_finished_spans().expect("finished spans");
        let pass = spans
            .iter()
            .find(|s| s.name == "reconcile.spanning")
            .expect("pass span");
        let worker = spans
            .iter()
            .find(|s| s.name == "worker.op")
            .expect("worker span");
        assert_eq!(worker.parent_span_id, pass.span_context.span_id());
    }

    #[tokio::test]
    async fn failing_reconciler_does_not_stop_its_peers() {
        let passes = Arc::new(AtomicUsize::new(0));
        let mut manager = Manager::new(Duration::from_millis(10));
        manager.register(Box::new(FailingReconciler));
        manager.register(Box::new(CountingReconciler {
            passes: passes.clone(),
        }));

        manager
            .run(async {
                tokio::time::sleep(Duration::from_millis(35)).await;
            })
            .await;

        assert!(passes.load(Ordering::SeqCst) >= 1);
    }
}
