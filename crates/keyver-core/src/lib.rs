//! # Keyver Core
//!
//! API version resolution, keyed service location and version-aware
//! dispatch for hyper-based HTTP services.
//!
//! Request flow:
//!
//! 1. The path router strips the version segment and matches the route template.
//! 2. [`VersionResolver`] extracts the requested [`ApiVersion`] (path, query,
//!    header or media type, first present value wins) or falls back to the
//!    registry default.
//! 3. [`Dispatcher`] looks up the handler for `(route, version)` and reports
//!    the route's supported and deprecated versions in response headers.
//!
//! Everything is built once at startup ([`VersionRegistry`],
//! [`RouteVersionTable`], [`ServiceLocator`]) and read concurrently afterwards.

mod app;
mod dispatch;
mod error;
mod handler;
pub mod locator;
mod registry;
mod request;
mod response;
mod router;
mod server;
pub mod strategy;
#[cfg(any(test, feature = "test-utils"))]
mod test_client;
mod version;

// Public API
pub use app::KeyverApp;
pub use dispatch::{
    Dispatcher, RouteEntry, RouteVersionTable, UnsupportedVersionForRoute, VersionAnnotations,
    API_DEPRECATED_VERSIONS, API_SUPPORTED_VERSIONS, DEPRECATION, SUNSET,
};
pub use error::{get_environment, ApiError, Environment, ErrorResponse, FieldError, Result};
pub use handler::{BoxedHandler, Handler};
pub use locator::{Capability, FromLocator, LocatorError, ServiceLocator, ServiceLocatorBuilder};
pub use registry::{
    RegistryError, SunsetLink, SunsetPolicy, VersionRecord, VersionRegistry, HTML_MEDIA_TYPE,
};
pub use request::{Request, RequestId};
pub use response::{IntoResponse, Json, Problem, Response};
pub use router::{get, post, MethodRouter, OperationDoc, ResponseDoc, RouteError};
pub use server::{DEFAULT_BODY_LIMIT, X_REQUEST_ID};
pub use strategy::{
    ResolveError, ResolvedVersion, StrategyError, VersionReader, VersionResolver, VersionSource,
    VersionStrategy,
};
#[cfg(any(test, feature = "test-utils"))]
pub use test_client::{TestClient, TestRequest, TestResponse};
pub use version::{ApiVersion, VersionParseError};
