//! Built-in API connectivity probe.

use async_trait::async_trait;
use linman_core::{LinodeApi, Reconciler, Result};
use std::sync::Arc;
use tracing::debug;

/// Verifies the API is reachable through the traced client. Resource
/// reconcilers are registered alongside this by deployment-specific
/// bootstrap code.
pub struct ApiProbe {
    client: Arc<dyn LinodeApi>,
}

impl ApiProbe {
    pub fn new(client: Arc<dyn LinodeApi>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Reconciler for ApiProbe {
    fn name(&self) -> &str {
        "api-probe"
    }

    async fn reconcile(&self) -> Result<()> {
        let instances = self.client.list_instances(None).await?;
        debug!(count = instances.len(), "linode api reachable");
        Ok(())
    }
}
