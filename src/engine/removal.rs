use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::directory::ResourceMutator;
use crate::errors::{RemovalFailure, TeardownError};
use crate::progress::ProgressSink;
use crate::types::{Resource, ResourceKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovalOutcome {
    pub kind: ResourceKind,
    pub attempted: usize,
    pub failures: Vec<RemovalFailure>,
}

impl RemovalOutcome {
    pub fn had_error(&self) -> bool {
        !self.failures.is_empty()
    }
}

pub struct RemovalExecutor<M: ResourceMutator + ?Sized> {
    mutator: Arc<M>,
    sink: Arc<dyn ProgressSink>,
}

impl<M: ResourceMutator + ?Sized> RemovalExecutor<M> {
    pub fn new(mutator: Arc<M>, sink: Arc<dyn ProgressSink>) -> Self {
        Self { mutator, sink }
    }

    /// Removes every item, one at a time, recording failures and moving on.
    /// Only cancellation stops the run early.
    pub async fn remove_all(
        &self,
        kind: ResourceKind,
        mut items: Vec<Resource>,
        cancel: &CancellationToken,
    ) -> Result<RemovalOutcome, TeardownError> {
        if kind.sorts_by_name() {
            items.sort_by(|a, b| a.name.cmp(&b.name));
        }

        let mut outcome = RemovalOutcome {
            kind,
            attempted: 0,
            failures: Vec::new(),
        };

        for item in items {
            if cancel.is_cancelled() {
                return Err(TeardownError::cancelled());
            }

            self.sink.out(&format!("removing {} {}", kind, item.name));
            outcome.attempted += 1;

            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(TeardownError::cancelled()),
                result = self.mutator.remove(kind, &item.id) => result,
            };

            match result {
                Ok(()) => log::debug!("Removed {} {} ({})", kind, item.name, item.id),
                Err(error) => {
                    self.sink
                        .err(&format!("failed to remove {} {}: {}", kind, item.id, error));
                    log::warn!("Failed to remove {} {}: {}", kind, item.id, error);
                    outcome.failures.push(RemovalFailure {
                        kind,
                        id: item.id,
                        name: item.name,
                        error,
                    });
                }
            }
        }

        Ok(outcome)
    }
}
