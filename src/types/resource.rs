use serde::{Deserialize, Serialize};
use std::fmt;

use super::ResourceId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Service,
    Network,
    Secret,
    Config,
}

impl ResourceKind {
    /// Services may reference every other kind, and networks are the least
    /// likely to be referenced by anything still alive, so they go last.
    pub const REMOVAL_ORDER: [ResourceKind; 4] = [
        ResourceKind::Service,
        ResourceKind::Secret,
        ResourceKind::Config,
        ResourceKind::Network,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            ResourceKind::Service => "service",
            ResourceKind::Network => "network",
            ResourceKind::Secret => "secret",
            ResourceKind::Config => "config",
        }
    }

    /// Only services are removed in display-name order.
    pub fn sorts_by_name(&self) -> bool {
        matches!(self, ResourceKind::Service)
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub id: ResourceId,
    pub name: String,
    pub stack: String,
}

impl Resource {
    pub fn new(stack: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().simple().to_string(),
            name: name.into(),
            stack: stack.into(),
        }
    }

    pub fn with_id(
        id: impl Into<ResourceId>,
        stack: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            stack: stack.into(),
        }
    }
}

/// Everything the directory reported for one stack, grouped by kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StackResources {
    pub services: Vec<Resource>,
    pub networks: Vec<Resource>,
    pub secrets: Vec<Resource>,
    pub configs: Vec<Resource>,
}

impl StackResources {
    pub fn len(&self) -> usize {
        self.services.len() + self.networks.len() + self.secrets.len() + self.configs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn of_kind(&self, kind: ResourceKind) -> &[Resource] {
        match kind {
            ResourceKind::Service => &self.services,
            ResourceKind::Network => &self.networks,
            ResourceKind::Secret => &self.secrets,
            ResourceKind::Config => &self.configs,
        }
    }

    pub fn take(&mut self, kind: ResourceKind) -> Vec<Resource> {
        let slot = match kind {
            ResourceKind::Service => &mut self.services,
            ResourceKind::Network => &mut self.networks,
            ResourceKind::Secret => &mut self.secrets,
            ResourceKind::Config => &mut self.configs,
        };
        std::mem::take(slot)
    }
}
