use std::fmt;
use std::time::Duration;

use crate::types::{ResourceId, ResourceKind};

/// Failure reported by a resource directory or mutator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DirectoryError {
    #[error("{kind} {id} not found")]
    NotFound { kind: ResourceKind, id: ResourceId },

    #[error("{kind} {id} is in use: {message}")]
    InUse {
        kind: ResourceKind,
        id: ResourceId,
        message: String,
    },

    #[error("permission denied: {message}")]
    PermissionDenied { message: String },

    #[error("transport error: {message}")]
    Transport { message: String },
}

impl DirectoryError {
    pub fn error_code(&self) -> &'static str {
        match self {
            DirectoryError::NotFound { .. } => "DIRECTORY_NOT_FOUND",
            DirectoryError::InUse { .. } => "DIRECTORY_IN_USE",
            DirectoryError::PermissionDenied { .. } => "DIRECTORY_PERMISSION_DENIED",
            DirectoryError::Transport { .. } => "DIRECTORY_TRANSPORT",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum WaitError {
    #[error("failed to get tasks for stack: {stack}: {source}")]
    Query {
        stack: String,
        #[source]
        source: DirectoryError,
    },

    #[error("timed out after {elapsed:?} waiting for tasks of stack: {stack}")]
    TimedOut { stack: String, elapsed: Duration },

    #[error("wait for stack {stack} was cancelled")]
    Cancelled { stack: String },
}

/// One resource that could not be removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovalFailure {
    pub kind: ResourceKind,
    pub id: ResourceId,
    pub name: String,
    pub error: DirectoryError,
}

impl fmt::Display for RemovalFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to remove {} {}: {}", self.kind, self.id, self.error)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackFailure {
    pub stack: String,
    pub failures: Vec<RemovalFailure>,
}

impl fmt::Display for StackFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to remove some resources from stack: {}", self.stack)
    }
}

/// Per-stack removal failures, kept structured until rendered. Renders one
/// line per failing stack.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StackFailures(Vec<StackFailure>);

impl StackFailures {
    pub fn push(&mut self, failure: StackFailure) {
        self.0.push(failure);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &StackFailure> {
        self.0.iter()
    }

    pub fn stacks(&self) -> Vec<&str> {
        self.0.iter().map(|f| f.stack.as_str()).collect()
    }
}

impl fmt::Display for StackFailures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lines: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        f.write_str(&lines.join("\n"))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TeardownError {
    #[error("invalid stack name: {name:?}")]
    InvalidStackName { name: String },

    #[error("failed to list {kind}s for stack {stack}: {source}")]
    Query {
        stack: String,
        kind: ResourceKind,
        #[source]
        source: DirectoryError,
    },

    /// `partial` holds the failures of stacks finished before the abort.
    #[error("teardown cancelled")]
    Cancelled { partial: StackFailures },

    #[error("{0}")]
    PartialFailure(StackFailures),
}

impl TeardownError {
    pub fn cancelled() -> Self {
        TeardownError::Cancelled {
            partial: StackFailures::default(),
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            TeardownError::InvalidStackName { .. } => "TEARDOWN_INVALID_STACK_NAME",
            TeardownError::Query { .. } => "TEARDOWN_QUERY_FAILED",
            TeardownError::Cancelled { .. } => "TEARDOWN_CANCELLED",
            TeardownError::PartialFailure(_) => "TEARDOWN_PARTIAL_FAILURE",
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, TeardownError::Cancelled { .. })
    }

    pub fn stack_failures(&self) -> Option<&StackFailures> {
        match self {
            TeardownError::PartialFailure(failures)
            | TeardownError::Cancelled { partial: failures } => Some(failures),
            _ => None,
        }
    }
}
