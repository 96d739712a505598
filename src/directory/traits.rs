use async_trait::async_trait;

use super::ApiVersion;
use crate::errors::DirectoryError;
use crate::types::{Resource, ResourceKind, Task};

/// Read side of the cluster: every listing is already filtered to one stack.
#[async_trait]
pub trait ResourceDirectory: Send + Sync {
    fn api_version(&self) -> ApiVersion;

    async fn list_services(&self, stack: &str) -> Result<Vec<Resource>, DirectoryError>;
    async fn list_networks(&self, stack: &str) -> Result<Vec<Resource>, DirectoryError>;
    async fn list_secrets(&self, stack: &str) -> Result<Vec<Resource>, DirectoryError>;
    async fn list_configs(&self, stack: &str) -> Result<Vec<Resource>, DirectoryError>;
    async fn list_tasks(&self, stack: &str) -> Result<Vec<Task>, DirectoryError>;

    async fn list(&self, kind: ResourceKind, stack: &str) -> Result<Vec<Resource>, DirectoryError> {
        match kind {
            ResourceKind::Service => self.list_services(stack).await,
            ResourceKind::Network => self.list_networks(stack).await,
            ResourceKind::Secret => self.list_secrets(stack).await,
            ResourceKind::Config => self.list_configs(stack).await,
        }
    }
}

#[async_trait]
pub trait ResourceMutator: Send + Sync {
    async fn remove_service(&self, id: &str) -> Result<(), DirectoryError>;
    async fn remove_network(&self, id: &str) -> Result<(), DirectoryError>;
    async fn remove_secret(&self, id: &str) -> Result<(), DirectoryError>;
    async fn remove_config(&self, id: &str) -> Result<(), DirectoryError>;

    async fn remove(&self, kind: ResourceKind, id: &str) -> Result<(), DirectoryError> {
        match kind {
            ResourceKind::Service => self.remove_service(id).await,
            ResourceKind::Network => self.remove_network(id).await,
            ResourceKind::Secret => self.remove_secret(id).await,
            ResourceKind::Config => self.remove_config(id).await,
        }
    }
}
