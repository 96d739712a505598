use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// API version negotiated with the directory. Orders by major, then minor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ApiVersion {
    pub major: u32,
    pub minor: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid API version {input:?}: expected MAJOR.MINOR")]
pub struct ParseApiVersionError {
    input: String,
}

impl ApiVersion {
    /// First version that exposes secrets.
    pub const SECRETS: ApiVersion = ApiVersion::new(1, 25);
    /// First version that exposes configs.
    pub const CONFIGS: ApiVersion = ApiVersion::new(1, 30);

    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    pub fn supports_secrets(&self) -> bool {
        *self >= Self::SECRETS
    }

    pub fn supports_configs(&self) -> bool {
        *self >= Self::CONFIGS
    }
}

impl Default for ApiVersion {
    fn default() -> Self {
        Self::new(1, 41)
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl FromStr for ApiVersion {
    type Err = ParseApiVersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseApiVersionError {
            input: s.to_string(),
        };
        let (major, minor) = s.trim().split_once('.').ok_or_else(invalid)?;
        Ok(Self {
            major: major.parse().map_err(|_| invalid())?,
            minor: minor.parse().map_err(|_| invalid())?,
        })
    }
}

impl TryFrom<String> for ApiVersion {
    type Error = ParseApiVersionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ApiVersion> for String {
    fn from(version: ApiVersion) -> Self {
        version.to_string()
    }
}
