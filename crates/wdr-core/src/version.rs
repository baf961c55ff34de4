use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{RegistryError, Result};

/// Protocol revision implemented by this crate family.
pub const PROTOCOL_VERSION: &str = "2.0.0";

/// Semantic version of the implemented protocol revision.
///
/// Callers use it for backward-compatibility negotiation; nothing inside the
/// core branches on it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ApiVersionInfo {
    major: u64,
    minor: u64,
    patch: u64,
    pre_release: Option<String>,
}

impl ApiVersionInfo {
    /// Parses `MAJOR.MINOR.PATCH` with an optional `-pre` suffix.
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        let (core, pre_release) = match raw.split_once('-') {
            Some((core, pre)) if !pre.is_empty() => (core, Some(pre.to_string())),
            Some(_) => return Err(RegistryError::invalid_version(raw)),
            None => (raw, None),
        };

        let parts: Vec<&str> = core.split('.').collect();
        if parts.len() != 3 {
            return Err(RegistryError::invalid_version(raw));
        }

        let mut numbers = [0u64; 3];
        for (slot, part) in numbers.iter_mut().zip(&parts) {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(RegistryError::invalid_version(raw));
            }
            *slot = part
                .parse()
                .map_err(|_| RegistryError::invalid_version(raw))?;
        }

        Ok(Self {
            major: numbers[0],
            minor: numbers[1],
            patch: numbers[2],
            pre_release,
        })
    }

    /// The version shipped with this build.
    pub fn current() -> Self {
        Self {
            major: 2,
            minor: 0,
            patch: 0,
            pre_release: None,
        }
    }

    pub fn major(&self) -> u64 {
        self.major
    }

    pub fn minor(&self) -> u64 {
        self.minor
    }

    pub fn patch(&self) -> u64 {
        self.patch
    }

    pub fn pre_release(&self) -> Option<&str> {
        self.pre_release.as_deref()
    }
}

impl Default for ApiVersionInfo {
    fn default() -> Self {
        Self::current()
    }
}

impl fmt::Display for ApiVersionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if let Some(pre) = &self.pre_release {
            write!(f, "-{pre}")?;
        }
        Ok(())
    }
}

impl TryFrom<String> for ApiVersionInfo {
    type Error = RegistryError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<ApiVersionInfo> for String {
    fn from(value: ApiVersionInfo) -> Self {
        value.to_string()
    }
}
