use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::{ApiVersion, ResourceDirectory, ResourceMutator};
use crate::errors::DirectoryError;
use crate::lifecycle::TaskLifecycle;
use crate::types::{Resource, ResourceId, ResourceKind, Task, TaskState};

/// Cluster snapshot used to seed an [`InMemoryDirectory`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Fixture {
    pub api_version: Option<ApiVersion>,
    pub services: Vec<Resource>,
    pub networks: Vec<Resource>,
    pub secrets: Vec<Resource>,
    pub configs: Vec<Resource>,
    pub tasks: Vec<Task>,
}

impl Fixture {
    /// Reads a fixture from JSON, or YAML when the extension is `.yaml`/`.yml`.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read fixture {}", path.display()))?;

        let is_yaml = matches!(
            path.extension().and_then(|ext| ext.to_str()),
            Some("yaml") | Some("yml")
        );

        let fixture = if is_yaml {
            serde_yaml::from_str(&contents)
                .with_context(|| format!("Failed to parse YAML fixture {}", path.display()))?
        } else {
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse JSON fixture {}", path.display()))?
        };

        Ok(fixture)
    }
}

#[derive(Default)]
struct DirectoryState {
    resources: HashMap<ResourceKind, Vec<Resource>>,
    tasks: Vec<Task>,
    task_script: HashMap<String, VecDeque<Vec<Task>>>,
    list_failures: HashMap<ResourceKind, DirectoryError>,
    task_list_failure: Option<DirectoryError>,
    removal_failures: HashMap<ResourceId, DirectoryError>,
    removal_attempts: Vec<(ResourceKind, ResourceId)>,
    list_calls: HashMap<ResourceKind, usize>,
    task_list_calls: usize,
}

/// Directory and mutator backed by process memory. Listings come back in
/// insertion order. Removing a service shuts down its unfinished tasks.
#[derive(Clone)]
pub struct InMemoryDirectory {
    api_version: ApiVersion,
    state: Arc<RwLock<DirectoryState>>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::with_api_version(ApiVersion::default())
    }

    pub fn with_api_version(api_version: ApiVersion) -> Self {
        Self {
            api_version,
            state: Arc::new(RwLock::new(DirectoryState::default())),
        }
    }

    pub fn from_fixture(fixture: Fixture, default_version: ApiVersion) -> Self {
        let directory = Self::with_api_version(fixture.api_version.unwrap_or(default_version));
        for (kind, items) in [
            (ResourceKind::Service, fixture.services),
            (ResourceKind::Network, fixture.networks),
            (ResourceKind::Secret, fixture.secrets),
            (ResourceKind::Config, fixture.configs),
        ] {
            for item in items {
                directory.add(kind, item);
            }
        }
        for task in fixture.tasks {
            directory.add_task(task);
        }
        directory
    }

    pub fn add(&self, kind: ResourceKind, resource: Resource) {
        self.write()
            .resources
            .entry(kind)
            .or_default()
            .push(resource);
    }

    pub fn add_task(&self, task: Task) {
        self.write().tasks.push(task);
    }

    /// Queues task snapshots for `stack`. Each listing pops the next one;
    /// the last snapshot keeps being returned once the queue runs dry.
    pub fn script_tasks(&self, stack: &str, snapshots: Vec<Vec<Task>>) {
        self.write()
            .task_script
            .insert(stack.to_string(), snapshots.into());
    }

    pub fn fail_list(&self, kind: ResourceKind, error: DirectoryError) {
        self.write().list_failures.insert(kind, error);
    }

    pub fn fail_task_list(&self, error: DirectoryError) {
        self.write().task_list_failure = Some(error);
    }

    pub fn fail_removal(&self, id: &str, error: DirectoryError) {
        self.write().removal_failures.insert(id.to_string(), error);
    }

    pub fn resources(&self, kind: ResourceKind) -> Vec<Resource> {
        self.read()
            .resources
            .get(&kind)
            .cloned()
            .unwrap_or_default()
    }

    pub fn tasks(&self) -> Vec<Task> {
        self.read().tasks.clone()
    }

    /// Every removal attempted so far, failed ones included, in call order.
    pub fn removal_attempts(&self) -> Vec<(ResourceKind, ResourceId)> {
        self.read().removal_attempts.clone()
    }

    pub fn list_calls(&self, kind: ResourceKind) -> usize {
        self.read().list_calls.get(&kind).copied().unwrap_or(0)
    }

    pub fn task_list_calls(&self) -> usize {
        self.read().task_list_calls
    }

    fn read(&self) -> RwLockReadGuard<'_, DirectoryState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, DirectoryState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn list_kind(&self, kind: ResourceKind, stack: &str) -> Result<Vec<Resource>, DirectoryError> {
        let mut state = self.write();
        *state.list_calls.entry(kind).or_default() += 1;

        if let Some(error) = state.list_failures.get(&kind) {
            return Err(error.clone());
        }

        Ok(state
            .resources
            .get(&kind)
            .map(|items| {
                items
                    .iter()
                    .filter(|r| r.stack == stack)
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default())
    }

    fn remove_kind(&self, kind: ResourceKind, id: &str) -> Result<(), DirectoryError> {
        let mut state = self.write();
        state.removal_attempts.push((kind, id.to_string()));

        if let Some(error) = state.removal_failures.get(id) {
            return Err(error.clone());
        }

        let items = state.resources.entry(kind).or_default();
        let position = items
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| DirectoryError::NotFound {
                kind,
                id: id.to_string(),
            })?;
        items.remove(position);

        if kind == ResourceKind::Service {
            for task in state.tasks.iter_mut().filter(|t| t.service_id == id) {
                if !TaskLifecycle::is_terminal(task.state) {
                    task.state = TaskState::Shutdown;
                }
            }
        }

        Ok(())
    }
}

impl Default for InMemoryDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ResourceDirectory for InMemoryDirectory {
    fn api_version(&self) -> ApiVersion {
        self.api_version
    }

    async fn list_services(&self, stack: &str) -> Result<Vec<Resource>, DirectoryError> {
        self.list_kind(ResourceKind::Service, stack)
    }

    async fn list_networks(&self, stack: &str) -> Result<Vec<Resource>, DirectoryError> {
        self.list_kind(ResourceKind::Network, stack)
    }

    async fn list_secrets(&self, stack: &str) -> Result<Vec<Resource>, DirectoryError> {
        self.list_kind(ResourceKind::Secret, stack)
    }

    async fn list_configs(&self, stack: &str) -> Result<Vec<Resource>, DirectoryError> {
        self.list_kind(ResourceKind::Config, stack)
    }

    async fn list_tasks(&self, stack: &str) -> Result<Vec<Task>, DirectoryError> {
        let mut state = self.write();
        state.task_list_calls += 1;

        if let Some(error) = &state.task_list_failure {
            return Err(error.clone());
        }

        if let Some(script) = state.task_script.get_mut(stack) {
            if script.len() > 1 {
                if let Some(snapshot) = script.pop_front() {
                    return Ok(snapshot);
                }
            }
            if let Some(last) = script.front() {
                return Ok(last.clone());
            }
        }

        Ok(state
            .tasks
            .iter()
            .filter(|t| t.stack == stack)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ResourceMutator for InMemoryDirectory {
    async fn remove_service(&self, id: &str) -> Result<(), DirectoryError> {
        self.remove_kind(ResourceKind::Service, id)
    }

    async fn remove_network(&self, id: &str) -> Result<(), DirectoryError> {
        self.remove_kind(ResourceKind::Network, id)
    }

    async fn remove_secret(&self, id: &str) -> Result<(), DirectoryError> {
        self.remove_kind(ResourceKind::Secret, id)
    }

    async fn remove_config(&self, id: &str) -> Result<(), DirectoryError> {
        self.remove_kind(ResourceKind::Config, id)
    }
}
