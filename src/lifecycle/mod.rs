pub mod backoff;
pub mod terminal;

pub use backoff::PollBackoff;
pub use terminal::TaskLifecycle;
