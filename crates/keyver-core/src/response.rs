//! Response types for Keyver
//!
//! The core trait is [`IntoResponse`]; handlers may return anything that
//! implements it.
//!
//! | Type | Status | Content-Type |
//! |------|--------|--------------|
//! | `String` / `&str` | 200 | text/plain |
//! | `()` | 200 | - |
//! | [`Json<T>`] | 200 | application/json |
//! | `StatusCode` | given | - |
//! | `(StatusCode, R)` | given | from `R` |
//! | [`ApiError`] | varies | application/json |
//! | `Result<T, E>` | from `T` or `E` | from `T` or `E` |

use crate::error::{ApiError, ErrorResponse};
use crate::request::RequestId;
use bytes::Bytes;
use http::{header, HeaderMap, HeaderValue, StatusCode};
use http_body_util::Full;
use serde::Serialize;

/// HTTP Response type
pub type Response = http::Response<Full<Bytes>>;

/// Trait for types that can be converted into an HTTP response
pub trait IntoResponse {
    /// Convert self into a Response
    fn into_response(self) -> Response;
}

fn with_body(status: StatusCode, content_type: Option<&'static str>, body: Bytes) -> Response {
    let mut response = http::Response::new(Full::new(body));
    *response.status_mut() = status;
    if let Some(content_type) = content_type {
        response
            .headers_mut()
            .insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    }
    response
}

impl IntoResponse for Response {
    fn into_response(self) -> Response {
        self
    }
}

impl IntoResponse for () {
    fn into_response(self) -> Response {
        with_body(StatusCode::OK, None, Bytes::new())
    }
}

impl IntoResponse for &'static str {
    fn into_response(self) -> Response {
        with_body(
            StatusCode::OK,
            Some("text/plain; charset=utf-8"),
            Bytes::from_static(self.as_bytes()),
        )
    }
}

impl IntoResponse for String {
    fn into_response(self) -> Response {
        with_body(
            StatusCode::OK,
            Some("text/plain; charset=utf-8"),
            Bytes::from(self),
        )
    }
}

impl IntoResponse for StatusCode {
    fn into_response(self) -> Response {
        with_body(self, None, Bytes::new())
    }
}

impl<R: IntoResponse> IntoResponse for (StatusCode, R) {
    fn into_response(self) -> Response {
        let mut response = self.1.into_response();
        *response.status_mut() = self.0;
        response
    }
}

impl<R: IntoResponse> IntoResponse for (StatusCode, HeaderMap, R) {
    fn into_response(self) -> Response {
        let mut response = self.2.into_response();
        *response.status_mut() = self.0;
        response.headers_mut().extend(self.1);
        response
    }
}

impl<T: IntoResponse, E: IntoResponse> IntoResponse for Result<T, E> {
    fn into_response(self) -> Response {
        match self {
            Ok(v) => v.into_response(),
            Err(e) => e.into_response(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        error_response(self, None)
    }
}

/// Render an error, tagging the body with a request id when known
pub(crate) fn error_response(err: ApiError, request_id: Option<&RequestId>) -> Response {
    let status = err.status;
    if status.is_server_error() {
        tracing::error!(error_type = %err.error_type, internal = ?err.internal, "{}", err.message);
    }

    let mut error_response = ErrorResponse::from(err);
    if let Some(id) = request_id {
        error_response = error_response.request_id(id.0.clone());
    }

    let body = serde_json::to_vec(&error_response).unwrap_or_else(|_| {
        br#"{"error":{"type":"internal_error","message":"Failed to serialize error"}}"#.to_vec()
    });

    with_body(status, Some("application/json"), Bytes::from(body))
}

/// JSON response body
///
/// ```rust,ignore
/// async fn list() -> Json<Vec<Employee>> {
///     Json(employees())
/// }
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct Json<T>(pub T);

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        match serde_json::to_vec(&self.0) {
            Ok(body) => with_body(StatusCode::OK, Some("application/json"), Bytes::from(body)),
            Err(err) => ApiError::internal(format!("Failed to serialize response: {}", err))
                .into_response(),
        }
    }
}

/// JSON body for a `application/problem+json` response (RFC 7807)
///
/// Handlers use this to return their own error shape; the dispatcher passes
/// it through untouched.
#[derive(Debug, Clone)]
pub struct Problem<T> {
    pub status: StatusCode,
    pub body: T,
}

impl<T> Problem<T> {
    pub fn new(status: StatusCode, body: T) -> Self {
        Self { status, body }
    }
}

impl<T: Serialize> IntoResponse for Problem<T> {
    fn into_response(self) -> Response {
        match serde_json::to_vec(&self.body) {
            Ok(body) => with_body(
                self.status,
                Some("application/problem+json"),
                Bytes::from(body),
            ),
            Err(err) => ApiError::internal(format!("Failed to serialize problem: {}", err))
                .into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_to_bytes(body: Full<Bytes>) -> Bytes {
        body.collect().await.unwrap().to_bytes()
    }

    #[tokio::test]
    async fn test_string_response() {
        let response = "Hello, World! - v2.0".into_response();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "text/plain; charset=utf-8"
        );
        assert_eq!(
            body_to_bytes(response.into_body()).await,
            Bytes::from_static(b"Hello, World! - v2.0")
        );
    }

    #[tokio::test]
    async fn test_json_response() {
        let response = Json(serde_json::json!({ "Message": "hi" })).into_response();

        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
        let body = body_to_bytes(response.into_body()).await;
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["Message"], "hi");
    }

    #[tokio::test]
    async fn test_problem_response_keeps_status() {
        let response = Problem::new(
            StatusCode::BAD_REQUEST,
            serde_json::json!({ "title": "Bad Request", "status": 400 }),
        )
        .into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/problem+json"
        );
    }

    #[tokio::test]
    async fn test_error_response_carries_request_id() {
        let id = RequestId("req-42".to_string());
        let response = error_response(ApiError::not_found("nothing here"), Some(&id));

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_to_bytes(response.into_body()).await;
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["error"]["type"], "not_found");
        assert_eq!(value["request_id"], "req-42");
    }

    #[test]
    fn test_tuple_and_result_responses() {
        let response = (StatusCode::ACCEPTED, "queued").into_response();
        assert_eq!(response.status(), StatusCode::ACCEPTED);

        let result: Result<&'static str, ApiError> = Err(ApiError::bad_request("nope"));
        assert_eq!(result.into_response().status(), StatusCode::BAD_REQUEST);
    }
}
