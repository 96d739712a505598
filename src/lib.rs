pub mod config;
pub mod directory;
pub mod engine;
pub mod errors;
pub mod lifecycle;
pub mod logging;
pub mod progress;
pub mod types;
pub mod validation;

pub use config::Config;
pub use engine::TeardownCoordinator;
pub use errors::{DirectoryError, StackFailures, TeardownError, WaitError};
pub use types::*;
