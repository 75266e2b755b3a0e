//! API version type and parsing
//!
//! Versions are `major.minor` pairs. The canonical text form is always
//! `"{major}.{minor}"` and parsing only accepts that form.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// API version identifier
///
/// Ordered by `major`, then `minor`. Accepted text:
/// - `1.0`, `2.0`, `1.5`, `0.9`
///
/// Rejected text: `1`, `v1.0`, `01.0`, `1.0.0`, `+1.0`, ` 1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ApiVersion {
    /// Major version number
    pub major: u32,
    /// Minor version number
    pub minor: u32,
}

impl ApiVersion {
    /// Create a new version
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// Create version 1.0
    pub const fn v1() -> Self {
        Self::new(1, 0)
    }

    /// Create version 2.0
    pub const fn v2() -> Self {
        Self::new(2, 0)
    }

    /// Documentation group name (e.g., "v1", "v1.5")
    ///
    /// The minor number is omitted when it is zero.
    pub fn group_name(&self) -> String {
        if self.minor == 0 {
            format!("v{}", self.major)
        } else {
            format!("v{}.{}", self.major, self.minor)
        }
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl FromStr for ApiVersion {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(VersionParseError::Empty);
        }

        let (major, minor) = s
            .split_once('.')
            .ok_or_else(|| VersionParseError::InvalidFormat(s.to_string()))?;

        Ok(ApiVersion::new(
            parse_component(major, s)?,
            parse_component(minor, s)?,
        ))
    }
}

/// Parse one numeric component, rejecting signs, whitespace and leading zeros
fn parse_component(part: &str, whole: &str) -> Result<u32, VersionParseError> {
    let canonical = !part.is_empty()
        && part.bytes().all(|b| b.is_ascii_digit())
        && (part == "0" || !part.starts_with('0'));

    if !canonical {
        return Err(VersionParseError::InvalidFormat(whole.to_string()));
    }

    part.parse()
        .map_err(|_| VersionParseError::InvalidNumber(whole.to_string()))
}

impl PartialOrd for ApiVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ApiVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.major
            .cmp(&other.major)
            .then_with(|| self.minor.cmp(&other.minor))
    }
}

impl Serialize for ApiVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ApiVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// Malformed version text
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VersionParseError {
    /// Empty version string
    #[error("empty version string")]
    Empty,
    /// Not of the form `<major>.<minor>`
    #[error("malformed version '{0}': expected '<major>.<minor>'")]
    InvalidFormat(String),
    /// A component does not fit in a u32
    #[error("version number out of range in '{0}'")]
    InvalidNumber(String),
}
