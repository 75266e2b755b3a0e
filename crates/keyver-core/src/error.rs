//! Error types for Keyver

use http::StatusCode;
use serde::Serialize;
use std::fmt;
use std::sync::OnceLock;

/// Result type alias for request handling
pub type Result<T, E = ApiError> = std::result::Result<T, E>;

/// Standard API error type
///
/// Rendered as a structured JSON body; see [`ErrorResponse`].
#[derive(Debug, Clone)]
pub struct ApiError {
    /// HTTP status code
    pub status: StatusCode,
    /// Error type identifier
    pub error_type: String,
    /// Human-readable error message
    pub message: String,
    /// Optional parameter-level errors
    pub fields: Option<Vec<FieldError>>,
    /// Optional structured details (e.g. supported versions)
    pub details: Option<serde_json::Value>,
    /// Internal details (hidden in production)
    pub(crate) internal: Option<String>,
}

/// Parameter-level error
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// Parameter name (e.g. "api-version", "x-api-version")
    pub field: String,
    /// Error code (e.g. "malformed_version", "required")
    pub code: String,
    /// Human-readable message
    pub message: String,
}

impl ApiError {
    /// Create a new API error
    pub fn new(
        status: StatusCode,
        error_type: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            status,
            error_type: error_type.into(),
            message: message.into(),
            fields: None,
            details: None,
            internal: None,
        }
    }

    /// Create a 400 Bad Request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "bad_request", message)
    }

    /// Create a 404 Not Found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "not_found", message)
    }

    /// Create a 413 Payload Too Large error
    pub fn payload_too_large(message: impl Into<String>) -> Self {
        Self::new(StatusCode::PAYLOAD_TOO_LARGE, "payload_too_large", message)
    }

    /// Create a 405 Method Not Allowed error
    pub fn method_not_allowed(message: impl Into<String>) -> Self {
        Self::new(StatusCode::METHOD_NOT_ALLOWED, "method_not_allowed", message)
    }

    /// Create a 500 Internal Server Error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", message)
    }

    /// Replace the error type identifier
    pub fn with_type(mut self, error_type: impl Into<String>) -> Self {
        self.error_type = error_type.into();
        self
    }

    /// Attach parameter-level errors
    pub fn with_fields(mut self, fields: Vec<FieldError>) -> Self {
        self.fields = Some(fields);
        self
    }

    /// Attach structured details
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Add internal details (for logging, hidden from response in prod)
    pub fn with_internal(mut self, details: impl Into<String>) -> Self {
        self.internal = Some(details.into());
        self
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.error_type, self.message)
    }
}

impl std::error::Error for ApiError {}

/// Deployment environment, read once from `KEYVER_ENV`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
    Custom(String),
}

impl Environment {
    /// Parse an environment name
    pub fn from_name(name: &str) -> Self {
        match name {
            "production" | "prod" => Self::Production,
            "development" | "dev" | "" => Self::Development,
            other => Self::Custom(other.to_string()),
        }
    }

    /// Check if running in production mode
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    /// Check if running in development mode
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }

    /// Environment name
    pub fn as_str(&self) -> &str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Custom(name) => name,
        }
    }
}

static ENVIRONMENT: OnceLock<Environment> = OnceLock::new();

/// Current environment (`KEYVER_ENV`, defaults to development)
pub fn get_environment() -> &'static Environment {
    ENVIRONMENT.get_or_init(|| {
        Environment::from_name(std::env::var("KEYVER_ENV").as_deref().unwrap_or(""))
    })
}

/// JSON representation of an API error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    #[serde(rename = "type")]
    pub error_type: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<FieldError>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub internal: Option<String>,
}

impl ErrorResponse {
    /// Build the response body, masking server-side details in production
    pub fn from_error(err: ApiError, environment: &Environment) -> Self {
        let masked = environment.is_production() && err.status.is_server_error();
        let message = if masked {
            "An internal error occurred".to_string()
        } else {
            err.message
        };
        let internal = if environment.is_production() {
            None
        } else {
            err.internal
        };

        Self {
            error: ErrorBody {
                error_type: err.error_type,
                message,
                fields: err.fields,
                details: err.details,
                internal,
            },
            request_id: None,
        }
    }

    /// Attach the request id
    pub fn request_id(mut self, id: impl Into<String>) -> Self {
        self.request_id = Some(id.into());
        self
    }
}

impl From<ApiError> for ErrorResponse {
    fn from(err: ApiError) -> Self {
        Self::from_error(err, get_environment())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::bad_request(format!("Invalid JSON: {}", err))
    }
}

impl From<hyper::Error> for ApiError {
    fn from(err: hyper::Error) -> Self {
        ApiError::internal("HTTP error").with_internal(err.to_string())
    }
}
