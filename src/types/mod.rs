pub mod resource;
pub mod task;

pub use resource::{Resource, ResourceKind, StackResources};
pub use task::{Task, TaskState};

pub type ResourceId = String;
pub type TaskId = String;
