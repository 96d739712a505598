use std::sync::Arc;

use crate::directory::ResourceDirectory;
use crate::errors::TeardownError;
use crate::types::{Resource, ResourceKind, StackResources};

pub struct ResourceCollector<D: ResourceDirectory + ?Sized> {
    directory: Arc<D>,
}

impl<D: ResourceDirectory + ?Sized> ResourceCollector<D> {
    pub fn new(directory: Arc<D>) -> Self {
        Self { directory }
    }

    /// Lists every resource labeled with `stack`. Secrets and configs are
    /// skipped, not queried, when the directory's API version predates them.
    pub async fn collect(&self, stack: &str) -> Result<StackResources, TeardownError> {
        let version = self.directory.api_version();

        let services = self.list(ResourceKind::Service, stack).await?;
        let networks = self.list(ResourceKind::Network, stack).await?;

        let secrets = if version.supports_secrets() {
            self.list(ResourceKind::Secret, stack).await?
        } else {
            log::debug!("API {} has no secrets, skipping for stack {}", version, stack);
            Vec::new()
        };

        let configs = if version.supports_configs() {
            self.list(ResourceKind::Config, stack).await?
        } else {
            log::debug!("API {} has no configs, skipping for stack {}", version, stack);
            Vec::new()
        };

        let resources = StackResources {
            services,
            networks,
            secrets,
            configs,
        };
        log::debug!("Collected {} resources for stack {}", resources.len(), stack);
        Ok(resources)
    }

    async fn list(&self, kind: ResourceKind, stack: &str) -> Result<Vec<Resource>, TeardownError> {
        self.directory
            .list(kind, stack)
            .await
            .map_err(|source| TeardownError::Query {
                stack: stack.to_string(),
                kind,
                source,
            })
    }
}
