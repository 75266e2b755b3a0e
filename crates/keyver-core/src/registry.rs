//! Version registry
//!
//! Holds every API version a deployment supports together with its
//! lifecycle state. The registry is filled during startup, sealed, and then
//! shared read-only (usually behind an `Arc`) for the rest of the process.

use crate::version::ApiVersion;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

/// Media type of links meant for people rather than machines
pub const HTML_MEDIA_TYPE: &str = "text/html";

/// Informational link attached to a sunset policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SunsetLink {
    /// Optional link title
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Link target URL
    pub target: String,
    /// Media type of the target (e.g., "text/html")
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
}

impl SunsetLink {
    /// Create a link with only a target
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            title: None,
            target: target.into(),
            media_type: None,
        }
    }

    /// Set the link title
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the media type
    pub fn media_type(mut self, media_type: impl Into<String>) -> Self {
        self.media_type = Some(media_type.into());
        self
    }

    /// Whether this link points at a human-readable page
    pub fn is_human_readable(&self) -> bool {
        self.media_type.as_deref() == Some(HTML_MEDIA_TYPE)
    }

    /// Title, or the target when no title is set
    pub fn display_text(&self) -> &str {
        match self.title.as_deref() {
            Some(title) if !title.is_empty() => title,
            _ => &self.target,
        }
    }
}

/// Declared withdrawal plan for a version
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SunsetPolicy {
    /// Date after which the version may be withdrawn
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    /// Informational links, in declaration order
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<SunsetLink>,
}

impl SunsetPolicy {
    /// Create an empty policy
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the effective date
    pub fn effective(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    /// Append an informational link
    pub fn link(mut self, link: SunsetLink) -> Self {
        self.links.push(link);
        self
    }

    /// Check if any links are declared
    pub fn has_links(&self) -> bool {
        !self.links.is_empty()
    }
}

/// Metadata describing one supported API version
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionRecord {
    pub version: ApiVersion,
    pub deprecated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sunset: Option<SunsetPolicy>,
}

/// Startup-time registry errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("API version {0} is already registered")]
    DuplicateVersion(ApiVersion),
    #[error("API version {0} is not registered")]
    UnknownVersion(ApiVersion),
    #[error("version registry is sealed and can no longer be modified")]
    RegistryClosed,
}

/// The set of versions a deployment supports
#[derive(Debug, Clone, Default)]
pub struct VersionRegistry {
    records: BTreeMap<ApiVersion, VersionRecord>,
    default_version: Option<ApiVersion>,
    sealed: bool,
}

impl VersionRegistry {
    /// Create an empty, unsealed registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a version
    pub fn register(
        &mut self,
        version: ApiVersion,
        deprecated: bool,
        sunset: Option<SunsetPolicy>,
    ) -> Result<(), RegistryError> {
        self.ensure_open()?;

        if self.records.contains_key(&version) {
            return Err(RegistryError::DuplicateVersion(version));
        }

        tracing::debug!(
            version = %version,
            deprecated,
            sunset = ?sunset.as_ref().and_then(|p| p.date),
            "Registered API version"
        );

        self.records.insert(
            version,
            VersionRecord {
                version,
                deprecated,
                sunset,
            },
        );
        Ok(())
    }

    /// Register a supported (non-deprecated) version
    pub fn supported(&mut self, version: ApiVersion) -> Result<(), RegistryError> {
        self.register(version, false, None)
    }

    /// Register a deprecated version with an optional sunset policy
    pub fn deprecated(
        &mut self,
        version: ApiVersion,
        sunset: Option<SunsetPolicy>,
    ) -> Result<(), RegistryError> {
        self.register(version, true, sunset)
    }

    /// Designate the version used when a request names none
    pub fn set_default(&mut self, version: ApiVersion) -> Result<(), RegistryError> {
        self.ensure_open()?;

        if !self.records.contains_key(&version) {
            return Err(RegistryError::UnknownVersion(version));
        }

        self.default_version = Some(version);
        Ok(())
    }

    /// Freeze the registry; every later mutation fails with `RegistryClosed`
    pub fn seal(&mut self) {
        self.sealed = true;
    }

    /// Check if the registry has been sealed
    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    fn ensure_open(&self) -> Result<(), RegistryError> {
        if self.sealed {
            Err(RegistryError::RegistryClosed)
        } else {
            Ok(())
        }
    }

    /// All records, newest version first
    pub fn describe_all(&self) -> Vec<&VersionRecord> {
        self.records.values().rev().collect()
    }

    /// All versions, newest first
    pub fn versions(&self) -> Vec<ApiVersion> {
        self.records.keys().rev().copied().collect()
    }

    /// Look up a record
    pub fn get(&self, version: &ApiVersion) -> Option<&VersionRecord> {
        self.records.get(version)
    }

    /// Check if a version is registered
    pub fn contains(&self, version: &ApiVersion) -> bool {
        self.records.contains_key(version)
    }

    /// Check if a version is registered and deprecated
    pub fn is_deprecated(&self, version: &ApiVersion) -> bool {
        self.records
            .get(version)
            .map(|r| r.deprecated)
            .unwrap_or(false)
    }

    /// The configured default version
    pub fn default_version(&self) -> Option<ApiVersion> {
        self.default_version
    }

    /// Number of registered versions
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if no versions are registered
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
