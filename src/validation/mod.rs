pub mod stack_name;

pub use stack_name::{validate_stack_name, validate_stack_names};
