pub mod memory;
pub mod traits;
pub mod version;

pub use memory::{Fixture, InMemoryDirectory};
pub use traits::{ResourceDirectory, ResourceMutator};
pub use version::{ApiVersion, ParseApiVersionError};
