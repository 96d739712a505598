pub mod collector;
pub mod convergence;
pub mod coordination;
pub mod removal;

pub use collector::ResourceCollector;
pub use convergence::{ConvergenceWaiter, WaitOutcome, WaitPolicy};
pub use coordination::{StackReport, TeardownCoordinator, TeardownReport};
pub use removal::{RemovalExecutor, RemovalOutcome};
