use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::directory::{ResourceDirectory, ResourceMutator};
use crate::engine::collector::ResourceCollector;
use crate::engine::convergence::{ConvergenceWaiter, WaitOutcome, WaitPolicy};
use crate::engine::removal::{RemovalExecutor, RemovalOutcome};
use crate::errors::{StackFailure, StackFailures, TeardownError, WaitError};
use crate::progress::ProgressSink;
use crate::types::{ResourceKind, StackResources};
use crate::validation::validate_stack_names;

/// What happened to one stack during a teardown run.
#[derive(Debug)]
pub struct StackReport {
    pub stack: String,
    /// Empty when nothing was found for the stack.
    pub removals: Vec<RemovalOutcome>,
    /// `None` when detached or when the stack was empty.
    pub wait: Option<Result<WaitOutcome, WaitError>>,
}

impl StackReport {
    pub fn nothing_found(&self) -> bool {
        self.removals.is_empty()
    }

    pub fn had_error(&self) -> bool {
        self.removals.iter().any(RemovalOutcome::had_error)
    }

    pub fn attempted(&self) -> usize {
        self.removals.iter().map(|o| o.attempted).sum()
    }
}

#[derive(Debug, Default)]
pub struct TeardownReport {
    pub stacks: Vec<StackReport>,
}

pub struct TeardownCoordinator<D, M>
where
    D: ResourceDirectory + ?Sized,
    M: ResourceMutator + ?Sized,
{
    collector: ResourceCollector<D>,
    executor: RemovalExecutor<M>,
    waiter: ConvergenceWaiter<D>,
    sink: Arc<dyn ProgressSink>,
}

impl<D, M> TeardownCoordinator<D, M>
where
    D: ResourceDirectory + ?Sized,
    M: ResourceMutator + ?Sized,
{
    pub fn new(
        directory: Arc<D>,
        mutator: Arc<M>,
        sink: Arc<dyn ProgressSink>,
        policy: WaitPolicy,
    ) -> Self {
        Self {
            collector: ResourceCollector::new(directory.clone()),
            executor: RemovalExecutor::new(mutator, sink.clone()),
            waiter: ConvergenceWaiter::new(directory, policy),
            sink,
        }
    }

    /// Tears down each stack in order. A failed listing aborts the whole run
    /// and cancellation aborts it as well; removal failures are collected and
    /// returned together once every stack has been attempted. Wait failures
    /// are reported to the sink only. A cancelled run still carries the
    /// failures of the stacks whose removal had finished.
    pub async fn remove<S: AsRef<str>>(
        &self,
        stacks: &[S],
        detach: bool,
        cancel: &CancellationToken,
    ) -> Result<TeardownReport, TeardownError> {
        validate_stack_names(stacks)?;

        let mut failures = StackFailures::default();
        let mut report = TeardownReport::default();

        for stack in stacks {
            match self
                .remove_stack(stack.as_ref(), detach, cancel, &mut failures)
                .await
            {
                Ok(stack_report) => report.stacks.push(stack_report),
                Err(TeardownError::Cancelled { .. }) => {
                    return Err(TeardownError::Cancelled { partial: failures })
                }
                Err(error) => return Err(error),
            }
        }

        if failures.is_empty() {
            Ok(report)
        } else {
            Err(TeardownError::PartialFailure(failures))
        }
    }

    async fn remove_stack(
        &self,
        stack: &str,
        detach: bool,
        cancel: &CancellationToken,
        failures: &mut StackFailures,
    ) -> Result<StackReport, TeardownError> {
        if cancel.is_cancelled() {
            return Err(TeardownError::cancelled());
        }

        let resources = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(TeardownError::cancelled()),
            collected = self.collector.collect(stack) => collected?,
        };

        if resources.is_empty() {
            self.sink.err(&format!("nothing found in stack: {}", stack));
            return Ok(StackReport {
                stack: stack.to_string(),
                removals: Vec::new(),
                wait: None,
            });
        }

        let removals = self.remove_resources(resources, cancel).await?;

        let had_error = removals
            .iter()
            .fold(false, |acc, outcome| outcome.had_error() || acc);
        if had_error {
            log::warn!("Stack {} was only partially removed", stack);
            failures.push(StackFailure {
                stack: stack.to_string(),
                failures: removals
                    .iter()
                    .flat_map(|outcome| outcome.failures.iter().cloned())
                    .collect(),
            });
        }

        let wait = if detach {
            None
        } else {
            Some(self.wait_for_stack(stack, cancel).await?)
        };

        Ok(StackReport {
            stack: stack.to_string(),
            removals,
            wait,
        })
    }

    async fn remove_resources(
        &self,
        mut resources: StackResources,
        cancel: &CancellationToken,
    ) -> Result<Vec<RemovalOutcome>, TeardownError> {
        let mut outcomes = Vec::with_capacity(ResourceKind::REMOVAL_ORDER.len());
        for kind in ResourceKind::REMOVAL_ORDER {
            let items = resources.take(kind);
            outcomes.push(self.executor.remove_all(kind, items, cancel).await?);
        }
        Ok(outcomes)
    }

    /// Cancellation is the only wait outcome that escapes as an error.
    async fn wait_for_stack(
        &self,
        stack: &str,
        cancel: &CancellationToken,
    ) -> Result<Result<WaitOutcome, WaitError>, TeardownError> {
        match self.waiter.wait(stack, cancel).await {
            Err(WaitError::Cancelled { .. }) => Err(TeardownError::cancelled()),
            Err(error) => {
                self.sink.err(&error.to_string());
                log::warn!("Wait for stack {} failed: {}", stack, error);
                Ok(Err(error))
            }
            Ok(outcome) => Ok(Ok(outcome)),
        }
    }
}
