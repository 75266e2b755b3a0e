//! Version extraction strategies
//!
//! A [`VersionResolver`] tries its readers in order. Each reader either
//! extracts raw text from the request or reports that nothing is there.
//! The first present value is parsed; a parse failure is terminal and is
//! never replaced by the default version.

use crate::error::{ApiError, FieldError};
use crate::version::{ApiVersion, VersionParseError};
use http::header::{HeaderName, ACCEPT, CONTENT_TYPE};
use http::request::Parts;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Placeholder marking the version inside a path pattern
pub const VERSION_PLACEHOLDER: &str = "{version}";

/// Default query parameter name
pub const DEFAULT_QUERY_PARAM: &str = "api-version";

/// Default header name
pub const DEFAULT_HEADER_NAME: &str = "x-api-version";

/// Default media type parameter name
pub const DEFAULT_MEDIA_TYPE_PARAM: &str = "api-version";

/// Default path segment pattern
pub const DEFAULT_PATH_PATTERN: &str = "v{version}";

/// Where a resolved version came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum VersionSource {
    /// URL path segment
    Path,
    /// Query string parameter
    Query,
    /// HTTP header
    Header,
    /// Media type parameter of Accept / Content-Type
    MediaType,
    /// Custom reader
    Custom,
    /// Default version was used
    Default,
}

impl fmt::Display for VersionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Path => "path",
            Self::Query => "query",
            Self::Header => "header",
            Self::MediaType => "media-type",
            Self::Custom => "custom",
            Self::Default => "default",
        };
        f.write_str(name)
    }
}

/// Extracts raw version text from a request
///
/// Readers must return `None` when the request carries no version for them;
/// they never fail for absence.
pub trait VersionReader: Send + Sync + fmt::Debug {
    /// Extract raw version text, or `None` if not present
    fn read(&self, parts: &Parts) -> Option<String>;

    /// Kind of request data this reader inspects
    fn source(&self) -> VersionSource;

    /// Name of the parameter this reader inspects, used in error bodies
    fn parameter(&self) -> &str;

    /// Downcast hook for path-segment readers
    fn as_url_segment(&self) -> Option<&UrlSegmentReader> {
        None
    }
}

/// Invalid reader configuration
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StrategyError {
    #[error("path pattern '{0}' must contain exactly one '{{version}}' placeholder")]
    MissingPlaceholder(String),
    #[error("path pattern '{0}' must describe a single path segment")]
    MultiSegmentPattern(String),
    #[error("invalid header name '{0}'")]
    InvalidHeaderName(String),
    #[error("parameter name must not be empty")]
    EmptyParameter,
    #[error("unknown version reader '{0}' (expected path, query, header or media-type)")]
    UnknownReader(String),
}

/// Reads the version from a path segment such as `v2.0`
///
/// The pattern describes one segment, e.g. `v{version}`. A segment counts
/// as a version only if its captured part starts with an ASCII digit, so
/// `/verify` is not mistaken for a version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlSegmentReader {
    pattern: String,
    prefix: String,
    suffix: String,
}

impl UrlSegmentReader {
    /// Create a reader for a single-segment pattern
    pub fn new(pattern: impl Into<String>) -> Result<Self, StrategyError> {
        let pattern = pattern.into();

        if pattern.contains('/') {
            return Err(StrategyError::MultiSegmentPattern(pattern));
        }
        if pattern.matches(VERSION_PLACEHOLDER).count() != 1 {
            return Err(StrategyError::MissingPlaceholder(pattern));
        }

        let (prefix, suffix) = pattern
            .split_once(VERSION_PLACEHOLDER)
            .ok_or_else(|| StrategyError::MissingPlaceholder(pattern.clone()))?;

        Ok(Self {
            prefix: prefix.to_string(),
            suffix: suffix.to_string(),
            pattern,
        })
    }

    /// The pattern, e.g. `v{version}`
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Capture the version text from a single segment
    fn capture<'a>(&self, segment: &'a str) -> Option<&'a str> {
        let captured = segment
            .strip_prefix(self.prefix.as_str())?
            .strip_suffix(self.suffix.as_str())?;

        match captured.as_bytes().first() {
            Some(b) if b.is_ascii_digit() => Some(captured),
            _ => None,
        }
    }

    /// Extract the version text from a request path
    pub fn extract<'a>(&self, path: &'a str) -> Option<&'a str> {
        path.split('/').find_map(|segment| self.capture(segment))
    }

    /// Indices (in `path.split('/')`) of the segments that look like a version
    pub fn positions(&self, path: &str) -> Vec<usize> {
        path.split('/')
            .enumerate()
            .filter(|(_, segment)| self.capture(segment).is_some())
            .map(|(position, _)| position)
            .collect()
    }

    /// Index of the version placeholder segment in a route template
    pub fn template_position(&self, template: &str) -> Option<usize> {
        template.split('/').position(|segment| segment == self.pattern)
    }

    /// Version text of the segment at `position`, if it is a version segment
    pub fn extract_at<'a>(&self, path: &'a str, position: usize) -> Option<&'a str> {
        self.capture(path.split('/').nth(position)?)
    }

    /// Remove the segment at `position` from a request path
    pub fn strip_at(&self, path: &str, position: usize) -> String {
        let kept: Vec<&str> = path
            .split('/')
            .enumerate()
            .filter(|(index, _)| *index != position)
            .map(|(_, segment)| segment)
            .collect();

        rejoin(&kept, path)
    }

    /// Remove the literal version placeholder segment from a route template
    pub fn strip_template(&self, template: &str) -> String {
        let kept: Vec<&str> = template
            .split('/')
            .filter(|segment| *segment != self.pattern)
            .collect();

        rejoin(&kept, template)
    }

    /// Substitute a concrete version into a route template
    pub fn substitute(&self, template: &str, version: &ApiVersion) -> String {
        let concrete = format!("{}{}{}", self.prefix, version, self.suffix);
        template
            .split('/')
            .map(|segment| {
                if segment == self.pattern {
                    concrete.as_str()
                } else {
                    segment
                }
            })
            .collect::<Vec<_>>()
            .join("/")
    }
}

fn rejoin(segments: &[&str], original: &str) -> String {
    let joined = segments.join("/");
    if joined.is_empty() && original.starts_with('/') {
        "/".to_string()
    } else {
        joined
    }
}

impl VersionReader for UrlSegmentReader {
    fn read(&self, parts: &Parts) -> Option<String> {
        self.extract(parts.uri.path()).map(str::to_string)
    }

    fn source(&self) -> VersionSource {
        VersionSource::Path
    }

    fn parameter(&self) -> &str {
        "version"
    }

    fn as_url_segment(&self) -> Option<&UrlSegmentReader> {
        Some(self)
    }
}

/// Reads the version from a query parameter such as `?api-version=2.0`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryStringReader {
    param: String,
}

impl QueryStringReader {
    pub fn new(param: impl Into<String>) -> Result<Self, StrategyError> {
        let param = param.into();
        if param.is_empty() {
            return Err(StrategyError::EmptyParameter);
        }
        Ok(Self { param })
    }
}

impl VersionReader for QueryStringReader {
    fn read(&self, parts: &Parts) -> Option<String> {
        let query = parts.uri.query()?;
        let pairs: Vec<(String, String)> = serde_urlencoded::from_str(query).ok()?;

        pairs
            .into_iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(&self.param))
            .map(|(_, value)| value)
    }

    fn source(&self) -> VersionSource {
        VersionSource::Query
    }

    fn parameter(&self) -> &str {
        &self.param
    }
}

/// Reads the version from a request header such as `X-Api-Version: 2.0`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderReader {
    name: HeaderName,
}

impl HeaderReader {
    pub fn new(name: &str) -> Result<Self, StrategyError> {
        let name = HeaderName::from_str(&name.to_ascii_lowercase())
            .map_err(|_| StrategyError::InvalidHeaderName(name.to_string()))?;
        Ok(Self { name })
    }
}

impl VersionReader for HeaderReader {
    fn read(&self, parts: &Parts) -> Option<String> {
        parts
            .headers
            .get(&self.name)
            .map(|value| String::from_utf8_lossy(value.as_bytes()).trim().to_string())
    }

    fn source(&self) -> VersionSource {
        VersionSource::Header
    }

    fn parameter(&self) -> &str {
        self.name.as_str()
    }
}

/// Reads the version from a media type parameter
///
/// Example: `Accept: application/json; api-version=2.0`. `Accept` is
/// inspected before `Content-Type`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaTypeReader {
    param: String,
}

impl MediaTypeReader {
    pub fn new(param: impl Into<String>) -> Result<Self, StrategyError> {
        let param = param.into();
        if param.is_empty() {
            return Err(StrategyError::EmptyParameter);
        }
        Ok(Self { param })
    }

    fn find_in(&self, header_value: &str) -> Option<String> {
        header_value
            .split(',')
            .flat_map(|media_type| media_type.split(';').skip(1))
            .filter_map(|param| param.split_once('='))
            .find(|(name, _)| name.trim().eq_ignore_ascii_case(&self.param))
            .map(|(_, value)| value.trim().trim_matches('"').to_string())
    }
}

impl VersionReader for MediaTypeReader {
    fn read(&self, parts: &Parts) -> Option<String> {
        [ACCEPT, CONTENT_TYPE].iter().find_map(|name| {
            parts
                .headers
                .get_all(name)
                .iter()
                .filter_map(|value| value.to_str().ok())
                .find_map(|value| self.find_in(value))
        })
    }

    fn source(&self) -> VersionSource {
        VersionSource::MediaType
    }

    fn parameter(&self) -> &str {
        &self.param
    }
}

/// Configuration-level description of a reader
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum VersionStrategy {
    /// Path segment, e.g. `/api/v2.0/users` with pattern `v{version}`
    Path { pattern: String },
    /// Query parameter, e.g. `?api-version=2.0`
    Query { param: String },
    /// Header, e.g. `X-Api-Version: 2.0`
    Header { name: String },
    /// Media type parameter, e.g. `Accept: application/json;api-version=2.0`
    MediaType { param: String },
}

impl VersionStrategy {
    /// Path strategy with the default `v{version}` pattern
    pub fn path() -> Self {
        Self::Path {
            pattern: DEFAULT_PATH_PATTERN.to_string(),
        }
    }

    /// Query strategy with the default `api-version` parameter
    pub fn query() -> Self {
        Self::Query {
            param: DEFAULT_QUERY_PARAM.to_string(),
        }
    }

    /// Header strategy with the default `x-api-version` header
    pub fn header() -> Self {
        Self::Header {
            name: DEFAULT_HEADER_NAME.to_string(),
        }
    }

    /// Media type strategy with the default `api-version` parameter
    pub fn media_type() -> Self {
        Self::MediaType {
            param: DEFAULT_MEDIA_TYPE_PARAM.to_string(),
        }
    }

    /// Build the reader this strategy describes
    pub fn into_reader(self) -> Result<Arc<dyn VersionReader>, StrategyError> {
        Ok(match self {
            Self::Path { pattern } => Arc::new(UrlSegmentReader::new(pattern)?),
            Self::Query { param } => Arc::new(QueryStringReader::new(param)?),
            Self::Header { name } => Arc::new(HeaderReader::new(&name)?),
            Self::MediaType { param } => Arc::new(MediaTypeReader::new(param)?),
        })
    }
}

impl FromStr for VersionStrategy {
    type Err = StrategyError;

    /// Parse a reader name with default settings
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "path" | "url" | "url-segment" => Ok(Self::path()),
            "query" | "query-string" => Ok(Self::query()),
            "header" => Ok(Self::header()),
            "media-type" | "mediatype" | "accept" => Ok(Self::media_type()),
            other => Err(StrategyError::UnknownReader(other.to_string())),
        }
    }
}

/// A version extracted from (or defaulted for) a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedVersion {
    pub version: ApiVersion,
    pub source: VersionSource,
}

/// Request-time resolution failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    /// A reader found version text that does not parse
    #[error("malformed API version '{raw}' in {location} parameter '{parameter}': {reason}")]
    MalformedVersion {
        location: VersionSource,
        parameter: String,
        raw: String,
        reason: VersionParseError,
    },
    /// No reader found a version and no default is configured
    #[error("no API version specified; use one of: {}", .parameters.join(", "))]
    NoVersionSpecified { parameters: Vec<String> },
}

impl From<ResolveError> for ApiError {
    fn from(err: ResolveError) -> Self {
        let message = err.to_string();
        match err {
            ResolveError::MalformedVersion {
                parameter, reason, ..
            } => ApiError::bad_request(message)
                .with_type("malformed_api_version")
                .with_fields(vec![FieldError {
                    field: parameter,
                    code: "malformed_version".to_string(),
                    message: reason.to_string(),
                }]),
            ResolveError::NoVersionSpecified { parameters } => ApiError::bad_request(message)
                .with_type("api_version_unspecified")
                .with_fields(
                    parameters
                        .into_iter()
                        .map(|field| FieldError {
                            field,
                            code: "required".to_string(),
                            message: "an API version is required".to_string(),
                        })
                        .collect(),
                ),
        }
    }
}

/// Ordered set of readers plus an optional default version
#[derive(Debug, Clone)]
pub struct VersionResolver {
    readers: Vec<Arc<dyn VersionReader>>,
    default: Option<ApiVersion>,
}

impl VersionResolver {
    /// Resolver with the single default path reader
    pub fn new() -> Self {
        Self {
            readers: vec![Arc::new(default_url_segment())],
            default: None,
        }
    }

    /// Resolver trying the given strategies in order
    pub fn with_strategies(
        strategies: impl IntoIterator<Item = VersionStrategy>,
    ) -> Result<Self, StrategyError> {
        let readers = strategies
            .into_iter()
            .map(VersionStrategy::into_reader)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            readers,
            default: None,
        })
    }

    /// Append a reader (tried after the existing ones)
    pub fn reader(mut self, reader: impl VersionReader + 'static) -> Self {
        self.readers.push(Arc::new(reader));
        self
    }

    /// Set or clear the default version
    pub fn default_version(mut self, version: Option<ApiVersion>) -> Self {
        self.default = version;
        self
    }

    /// The configured default version
    pub fn get_default(&self) -> Option<ApiVersion> {
        self.default
    }

    /// Readers in the order they are tried
    pub fn readers(&self) -> &[Arc<dyn VersionReader>] {
        &self.readers
    }

    /// The first path-segment reader, if any
    pub fn url_segment(&self) -> Option<&UrlSegmentReader> {
        self.readers.iter().find_map(|r| r.as_url_segment())
    }

    /// Resolve the version for a request
    ///
    /// Path readers scan every segment of the request path.
    pub fn resolve(&self, parts: &Parts) -> Result<ResolvedVersion, ResolveError> {
        self.resolve_with(|reader| reader.read(parts))
    }

    /// Resolve the version for a request matched to a route
    ///
    /// `version_segment` is the version text at the route's version segment;
    /// path readers report nothing for routes without one.
    pub fn resolve_route(
        &self,
        parts: &Parts,
        version_segment: Option<&str>,
    ) -> Result<ResolvedVersion, ResolveError> {
        self.resolve_with(|reader| match reader.as_url_segment() {
            Some(_) => version_segment.map(str::to_string),
            None => reader.read(parts),
        })
    }

    fn resolve_with<F>(&self, read: F) -> Result<ResolvedVersion, ResolveError>
    where
        F: Fn(&dyn VersionReader) -> Option<String>,
    {
        for reader in &self.readers {
            let Some(raw) = read(reader.as_ref()) else {
                continue;
            };

            return match raw.parse::<ApiVersion>() {
                Ok(version) => Ok(ResolvedVersion {
                    version,
                    source: reader.source(),
                }),
                Err(reason) => Err(ResolveError::MalformedVersion {
                    location: reader.source(),
                    parameter: reader.parameter().to_string(),
                    raw,
                    reason,
                }),
            };
        }

        match self.default {
            Some(version) => Ok(ResolvedVersion {
                version,
                source: VersionSource::Default,
            }),
            None => Err(ResolveError::NoVersionSpecified {
                parameters: self
                    .readers
                    .iter()
                    .map(|r| r.parameter().to_string())
                    .collect(),
            }),
        }
    }

    /// Remove the version placeholder segment from a route template
    pub fn strip_template(&self, template: &str) -> String {
        match self.url_segment() {
            Some(reader) => reader.strip_template(template),
            None => template.to_string(),
        }
    }

    /// Substitute a version into a route template
    pub fn versioned_path(&self, template: &str, version: &ApiVersion) -> String {
        match self.url_segment() {
            Some(reader) => reader.substitute(template, version),
            None => template.to_string(),
        }
    }
}

impl Default for VersionResolver {
    fn default() -> Self {
        Self::new()
    }
}

fn default_url_segment() -> UrlSegmentReader {
    UrlSegmentReader {
        pattern: DEFAULT_PATH_PATTERN.to_string(),
        prefix: "v".to_string(),
        suffix: String::new(),
    }
}
