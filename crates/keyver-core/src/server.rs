//! HTTP server implementation

use crate::dispatch::Dispatcher;
use crate::error::ApiError;
use crate::request::{Request, RequestId};
use crate::response::{error_response, Response};
use bytes::Bytes;
use http::header::{HeaderName, HeaderValue, CONTENT_LENGTH};
use http::StatusCode;
use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper::body::{Body, Incoming};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::collections::HashMap;
use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

/// Response header echoing the request id
pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Default request body limit: 1MB
pub const DEFAULT_BODY_LIMIT: usize = 1024 * 1024;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Internal server struct
pub(crate) struct Server {
    dispatcher: Arc<Dispatcher>,
    body_limit: Option<usize>,
}

impl Server {
    pub fn new(dispatcher: Arc<Dispatcher>, body_limit: Option<usize>) -> Self {
        Self {
            dispatcher,
            body_limit,
        }
    }

    /// Serve connections until `shutdown` completes
    pub async fn run_until<F>(
        self,
        listener: TcpListener,
        shutdown: F,
    ) -> Result<(), BoxError>
    where
        F: Future<Output = ()> + Send,
    {
        let addr = listener.local_addr()?;
        info!(address = %addr, "Keyver server listening on http://{}", addr);

        tokio::pin!(shutdown);

        loop {
            let (stream, remote_addr) = tokio::select! {
                accepted = listener.accept() => accepted?,
                _ = &mut shutdown => {
                    info!("Shutdown signal received, no longer accepting connections");
                    return Ok(());
                }
            };

            let io = TokioIo::new(stream);
            let dispatcher = self.dispatcher.clone();
            let body_limit = self.body_limit;

            tokio::spawn(async move {
                let service = service_fn(move |req: hyper::Request<Incoming>| {
                    let dispatcher = dispatcher.clone();
                    async move {
                        let response = handle_request(dispatcher, req, remote_addr, body_limit).await;
                        Ok::<_, Infallible>(response)
                    }
                });

                if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                    error!("Connection error: {}", err);
                }
            });
        }
    }
}

/// Handle a single HTTP request
async fn handle_request(
    dispatcher: Arc<Dispatcher>,
    req: hyper::Request<Incoming>,
    remote_addr: SocketAddr,
    body_limit: Option<usize>,
) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let start = std::time::Instant::now();
    let request_id = RequestId::generate();

    let (mut parts, body) = req.into_parts();
    let declared = parts
        .headers
        .get(CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<usize>().ok());

    let body = match (declared, body_limit) {
        (Some(length), Some(limit)) if length > limit => Err(too_large(limit)),
        _ => read_body(body, body_limit).await,
    };
    let body = match body {
        Ok(body) => body,
        Err(err) => {
            let response = error_response(err, Some(&request_id));
            log_request(&method, &path, remote_addr, response.status(), start);
            return response;
        }
    };

    parts.extensions.insert(request_id.clone());
    let request = Request::new(parts, body, HashMap::new());

    let mut response = dispatcher.handle(request).await;
    tag_request_id(&mut response, &request_id);

    log_request(&method, &path, remote_addr, response.status(), start);
    response
}

/// Collect a request body, failing with 413 past `limit` bytes
pub(crate) async fn read_body<B>(body: B, limit: Option<usize>) -> Result<Bytes, ApiError>
where
    B: Body,
    B::Error: Into<BoxError>,
{
    let collected: Result<Bytes, BoxError> = match limit {
        Some(limit) => Limited::new(body, limit)
            .collect()
            .await
            .map(|collected| collected.to_bytes()),
        None => body
            .collect()
            .await
            .map(|collected| collected.to_bytes())
            .map_err(Into::into),
    };

    collected.map_err(|err| match limit {
        Some(limit) if err.downcast_ref::<LengthLimitError>().is_some() => too_large(limit),
        _ => ApiError::bad_request("Failed to read request body").with_internal(err.to_string()),
    })
}

fn too_large(limit: usize) -> ApiError {
    ApiError::payload_too_large(format!("Request body exceeds limit of {} bytes", limit))
}

pub(crate) fn tag_request_id(response: &mut Response, request_id: &RequestId) {
    if let Ok(value) = HeaderValue::from_str(&request_id.0) {
        response.headers_mut().insert(X_REQUEST_ID, value);
    }
}

/// Log request completion
fn log_request(
    method: &http::Method,
    path: &str,
    remote_addr: SocketAddr,
    status: StatusCode,
    start: std::time::Instant,
) {
    let elapsed = start.elapsed();

    if status.is_success() {
        info!(
            method = %method,
            path = %path,
            remote = %remote_addr,
            status = %status.as_u16(),
            duration_ms = %elapsed.as_millis(),
            "Request completed"
        );
    } else if status.is_server_error() {
        error!(
            method = %method,
            path = %path,
            remote = %remote_addr,
            status = %status.as_u16(),
            duration_ms = %elapsed.as_millis(),
            "Request failed"
        );
    } else {
        warn!(
            method = %method,
            path = %path,
            remote = %remote_addr,
            status = %status.as_u16(),
            duration_ms = %elapsed.as_millis(),
            "Request rejected"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::Full;

    #[tokio::test]
    async fn test_body_within_limit_is_read() {
        let body = read_body(Full::new(Bytes::from_static(b"hello")), Some(5))
            .await
            .unwrap();
        assert_eq!(body, Bytes::from_static(b"hello"));
    }

    #[tokio::test]
    async fn test_body_over_limit_is_413() {
        let err = read_body(Full::new(Bytes::from(vec![0u8; 16])), Some(8))
            .await
            .unwrap_err();

        assert_eq!(err.status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(err.error_type, "payload_too_large");
    }

    #[tokio::test]
    async fn test_no_limit_reads_everything() {
        let body = read_body(Full::new(Bytes::from(vec![1u8; DEFAULT_BODY_LIMIT + 1])), None)
            .await
            .unwrap();
        assert_eq!(body.len(), DEFAULT_BODY_LIMIT + 1);
    }
}
