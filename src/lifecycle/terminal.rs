use crate::types::{Task, TaskState};

/// Rank table over task states. A task has finished, successfully or not,
/// once its state ranks strictly above `Running`.
pub struct TaskLifecycle;

impl TaskLifecycle {
    pub const fn rank(state: TaskState) -> u8 {
        match state {
            TaskState::New => 1,
            TaskState::Allocated => 2,
            TaskState::Pending => 3,
            TaskState::Assigned => 4,
            TaskState::Accepted => 5,
            TaskState::Preparing => 6,
            TaskState::Ready => 7,
            TaskState::Starting => 8,
            TaskState::Running => 9,
            TaskState::Complete => 10,
            TaskState::Shutdown => 11,
            TaskState::Failed => 12,
            TaskState::Rejected => 13,
        }
    }

    pub const fn is_terminal(state: TaskState) -> bool {
        Self::rank(state) > Self::rank(TaskState::Running)
    }

    pub fn count_terminal(tasks: &[Task]) -> usize {
        tasks
            .iter()
            .filter(|task| Self::is_terminal(task.state))
            .count()
    }
}
