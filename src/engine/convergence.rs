use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

use crate::directory::ResourceDirectory;
use crate::errors::WaitError;
use crate::lifecycle::{PollBackoff, TaskLifecycle};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitPolicy {
    pub poll_interval: Duration,
    pub max_poll_interval: Duration,
    /// `None` waits for as long as it takes.
    pub timeout: Option<Duration>,
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(250),
            max_poll_interval: Duration::from_secs(4),
            timeout: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOutcome {
    pub rounds: u32,
    pub tasks: usize,
}

pub struct ConvergenceWaiter<D: ResourceDirectory + ?Sized> {
    directory: Arc<D>,
    policy: WaitPolicy,
}

impl<D: ResourceDirectory + ?Sized> ConvergenceWaiter<D> {
    pub fn new(directory: Arc<D>, policy: WaitPolicy) -> Self {
        Self { directory, policy }
    }

    /// Polls the stack's tasks until every one observed in a round is
    /// terminal. A stack without tasks converges on the first round.
    pub async fn wait(&self, stack: &str, cancel: &CancellationToken) -> Result<WaitOutcome, WaitError> {
        let started = Instant::now();
        let mut backoff = PollBackoff::new(self.policy.poll_interval, self.policy.max_poll_interval);
        let mut rounds = 0u32;

        loop {
            if cancel.is_cancelled() {
                return Err(WaitError::Cancelled {
                    stack: stack.to_string(),
                });
            }
            rounds += 1;

            let listed = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    return Err(WaitError::Cancelled { stack: stack.to_string() });
                }
                listed = self.directory.list_tasks(stack) => listed,
            };
            let tasks = listed.map_err(|source| WaitError::Query {
                stack: stack.to_string(),
                source,
            })?;

            let terminal = TaskLifecycle::count_terminal(&tasks);
            log::debug!(
                "Stack {}: {}/{} tasks terminal after round {}",
                stack,
                terminal,
                tasks.len(),
                rounds
            );
            if terminal == tasks.len() {
                return Ok(WaitOutcome {
                    rounds,
                    tasks: tasks.len(),
                });
            }

            let mut delay = backoff.next_delay();
            if let Some(timeout) = self.policy.timeout {
                let elapsed = started.elapsed();
                if elapsed >= timeout {
                    return Err(WaitError::TimedOut {
                        stack: stack.to_string(),
                        elapsed,
                    });
                }
                delay = delay.min(timeout - elapsed);
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    return Err(WaitError::Cancelled { stack: stack.to_string() });
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }
}
