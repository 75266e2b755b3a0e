//! Request types for Keyver

use crate::strategy::ResolvedVersion;
use crate::version::ApiVersion;
use bytes::Bytes;
use http::{request::Parts, Extensions, HeaderMap, Method, Uri, Version};
use std::collections::HashMap;

/// Identifier assigned to every request by the server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(pub String);

impl RequestId {
    /// Generate a new time-ordered request id
    pub fn generate() -> Self {
        Self(uuid::Uuid::now_v7().to_string())
    }
}

/// HTTP Request wrapper
///
/// Provides access to all parts of an incoming HTTP request together with
/// the matched path parameters and, for versioned routes, the resolved
/// API version.
pub struct Request {
    pub(crate) parts: Parts,
    pub(crate) body: Option<Bytes>,
    pub(crate) path_params: HashMap<String, String>,
}

impl Request {
    /// Create a request from its parts
    pub fn new(parts: Parts, body: Bytes, path_params: HashMap<String, String>) -> Self {
        Self {
            parts,
            body: Some(body),
            path_params,
        }
    }

    /// Create a request with no path parameters from a plain `http::Request`
    pub fn from_http(request: http::Request<Bytes>) -> Self {
        let (parts, body) = request.into_parts();
        Self::new(parts, body, HashMap::new())
    }

    /// Get the HTTP method
    pub fn method(&self) -> &Method {
        &self.parts.method
    }

    /// Get the URI
    pub fn uri(&self) -> &Uri {
        &self.parts.uri
    }

    /// Get the HTTP version
    pub fn version(&self) -> Version {
        self.parts.version
    }

    /// Get the headers
    pub fn headers(&self) -> &HeaderMap {
        &self.parts.headers
    }

    /// Get the request head
    pub fn parts(&self) -> &Parts {
        &self.parts
    }

    /// Get request extensions
    pub fn extensions(&self) -> &Extensions {
        &self.parts.extensions
    }

    /// Get mutable extensions
    pub fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.parts.extensions
    }

    /// Get the request path
    pub fn path(&self) -> &str {
        self.parts.uri.path()
    }

    /// Get the query string
    pub fn query_string(&self) -> Option<&str> {
        self.parts.uri.query()
    }

    /// Take the body bytes (can only be called once)
    pub fn take_body(&mut self) -> Option<Bytes> {
        self.body.take()
    }

    /// Get path parameters
    pub fn path_params(&self) -> &HashMap<String, String> {
        &self.path_params
    }

    /// Get a specific path parameter
    pub fn path_param(&self, name: &str) -> Option<&String> {
        self.path_params.get(name)
    }

    /// The version this request was dispatched with
    ///
    /// `None` for version-neutral routes.
    pub fn api_version(&self) -> Option<ApiVersion> {
        self.resolved_version().map(|resolved| resolved.version)
    }

    /// The resolved version together with where it came from
    pub fn resolved_version(&self) -> Option<&ResolvedVersion> {
        self.parts.extensions.get::<ResolvedVersion>()
    }

    /// The server-assigned request id, if any
    pub fn request_id(&self) -> Option<&str> {
        self.parts
            .extensions
            .get::<RequestId>()
            .map(|id| id.0.as_str())
    }
}

impl std::fmt::Debug for Request {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Request")
            .field("method", &self.parts.method)
            .field("uri", &self.parts.uri)
            .field("version", &self.parts.version)
            .field("api_version", &self.api_version())
            .finish()
    }
}
