//! TestClient for integration testing without network binding
//!
//! Requests go through the same dispatch pipeline the server uses
//! (path matching, version resolution, handler, version headers), so the
//! full response including headers and extensions can be inspected.
//!
//! ```rust,ignore
//! #[tokio::test]
//! async fn test_hello() {
//!     let client = TestClient::new(app);
//!
//!     let response = client.get("/v2.0/hello").await;
//!     response.assert_status(200);
//!     assert_eq!(response.text(), "Hello, World! - v2.0");
//! }
//! ```

use crate::app::KeyverApp;
use crate::dispatch::{Dispatcher, VersionAnnotations};
use crate::request::{Request, RequestId};
use crate::response::{error_response, Response};
use crate::server::{read_body, tag_request_id};
use bytes::Bytes;
use http::{HeaderMap, HeaderValue, Method, StatusCode};
use http_body_util::{BodyExt, Full};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::Arc;

/// Test client for integration testing without network binding
pub struct TestClient {
    dispatcher: Arc<Dispatcher>,
    body_limit: Option<usize>,
}

impl TestClient {
    /// Create a test client for an application, with its body limit
    pub fn new(app: KeyverApp) -> Self {
        Self {
            dispatcher: app.dispatcher().clone(),
            body_limit: app.get_body_limit(),
        }
    }

    /// Send a GET request
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request(TestRequest::get(path)).await
    }

    /// Send a request with full control
    ///
    /// ```rust,ignore
    /// let response = client
    ///     .request(TestRequest::get("/employee").header("x-api-version", "2.0"))
    ///     .await;
    /// ```
    pub async fn request(&self, req: TestRequest) -> TestResponse {
        let uri: http::Uri = match req.path.parse() {
            Ok(uri) => uri,
            Err(_) => http::Uri::from_static("/"),
        };

        let mut http_req = http::Request::new(req.body.unwrap_or_default());
        *http_req.method_mut() = req.method;
        *http_req.uri_mut() = uri;
        *http_req.headers_mut() = req.headers;

        let request_id = RequestId::generate();
        let (mut parts, body) = http_req.into_parts();
        parts.extensions.insert(request_id.clone());

        let mut response = match read_body(Full::new(body), self.body_limit).await {
            Ok(body) => {
                self.dispatcher
                    .handle(Request::new(parts, body, HashMap::new()))
                    .await
            }
            Err(err) => error_response(err, Some(&request_id)),
        };
        tag_request_id(&mut response, &request_id);

        TestResponse::from_response(response).await
    }
}

/// Test request builder
#[derive(Debug, Clone)]
pub struct TestRequest {
    method: Method,
    path: String,
    headers: HeaderMap,
    body: Option<Bytes>,
}

impl TestRequest {
    /// Create a request with any method
    pub fn new(method: Method, path: &str) -> Self {
        Self {
            method,
            path: path.to_string(),
            headers: HeaderMap::new(),
            body: None,
        }
    }

    /// Create a GET request
    pub fn get(path: &str) -> Self {
        Self::new(Method::GET, path)
    }

    /// Add a header to the request
    pub fn header(mut self, key: &str, value: &str) -> Self {
        if let (Ok(name), Ok(val)) = (
            key.parse::<http::header::HeaderName>(),
            HeaderValue::from_str(value),
        ) {
            self.headers.append(name, val);
        }
        self
    }

    /// Set the request body
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }
}

/// Test response with assertion helpers
#[derive(Debug)]
pub struct TestResponse {
    status: StatusCode,
    headers: HeaderMap,
    annotations: Option<VersionAnnotations>,
    body: Bytes,
}

impl TestResponse {
    async fn from_response(response: Response) -> Self {
        let (parts, body) = response.into_parts();
        let body = body
            .collect()
            .await
            .map(|b| b.to_bytes())
            .unwrap_or_default();

        Self {
            status: parts.status,
            annotations: parts.extensions.get::<VersionAnnotations>().cloned(),
            headers: parts.headers,
            body,
        }
    }

    /// Get the response status code
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Get the response headers
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Get a header as a string
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(key).and_then(|v| v.to_str().ok())
    }

    /// Version metadata attached by the dispatcher
    pub fn annotations(&self) -> Option<&VersionAnnotations> {
        self.annotations.as_ref()
    }

    /// Get the response body as bytes
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Get the response body as a string
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }

    /// Parse the response body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }

    /// Assert that the response has the expected status code
    ///
    /// # Panics
    ///
    /// Panics if the status code doesn't match.
    pub fn assert_status(&self, expected: u16) -> &Self {
        assert_eq!(
            self.status.as_u16(),
            expected,
            "Expected status {}, got {}. Body: {}",
            expected,
            self.status,
            self.text()
        );
        self
    }

    /// Assert that the response has the expected header value
    ///
    /// # Panics
    ///
    /// Panics if the header doesn't exist or doesn't match.
    pub fn assert_header(&self, key: &str, expected: &str) -> &Self {
        let actual = self.header(key).unwrap_or("");
        assert_eq!(
            actual, expected,
            "Expected header '{}' to be '{}', got '{}'",
            key, expected, actual
        );
        self
    }

    /// Assert that the response body contains the expected string
    ///
    /// # Panics
    ///
    /// Panics if the body doesn't contain the expected string.
    pub fn assert_body_contains(&self, expected: &str) -> &Self {
        let body = self.text();
        assert!(
            body.contains(expected),
            "Expected body to contain '{}', got '{}'",
            expected,
            body
        );
        self
    }
}
