use crate::errors::TeardownError;

/// A stack name must be non-empty and carry no surrounding whitespace.
pub fn validate_stack_name(name: &str) -> Result<(), TeardownError> {
    let trimmed = name.trim();
    if trimmed.is_empty() || trimmed != name {
        return Err(TeardownError::InvalidStackName {
            name: name.to_string(),
        });
    }
    Ok(())
}

pub fn validate_stack_names<S: AsRef<str>>(names: &[S]) -> Result<(), TeardownError> {
    names
        .iter()
        .try_for_each(|name| validate_stack_name(name.as_ref()))
}
