//! Error schemas for OpenAPI documentation
//!
//! These mirror the JSON error body rendered by `keyver-core`.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Error response body
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorSchema {
    pub error: ErrorBodySchema,
    /// Request id, also sent in `x-request-id`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

/// Error details
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorBodySchema {
    /// Error type identifier (e.g. "malformed_api_version", "unsupported_api_version")
    #[serde(rename = "type")]
    pub error_type: String,
    pub message: String,
    /// Offending request parameters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<FieldErrorSchema>>,
    /// Present on "unsupported_api_version" errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<VersionDetailsSchema>,
}

/// Parameter-level error
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FieldErrorSchema {
    /// Parameter name (e.g. "api-version", "x-api-version", "version")
    pub field: String,
    pub code: String,
    pub message: String,
}

/// Versions a route accepts
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct VersionDetailsSchema {
    #[schema(example = "1.0")]
    pub requested_version: String,
    /// Newest first
    #[schema(example = json!(["2.0"]))]
    pub supported_versions: Vec<String>,
}
