//! Version-aware dispatch
//!
//! A [`RouteVersionTable`] maps `(route template, version)` to a
//! [`MethodRouter`]. The [`Dispatcher`] resolves the requested version,
//! picks the handler, and reports the route's versions back to the caller:
//!
//! - `api-supported-versions: 2.0, 1.0` on every response of a versioned route
//! - `api-deprecated-versions: 1.0` when the route has deprecated versions
//! - `deprecation: true`, `sunset: <date>` and `link: <..>; rel="sunset"` when
//!   the request was served by a deprecated version
//!
//! Handler responses, including handler errors, are passed through untouched
//! apart from these headers.

use crate::error::ApiError;
use crate::registry::{SunsetLink, VersionRegistry};
use crate::request::{Request, RequestId};
use crate::response::{error_response, Response};
use crate::router::{MethodRouter, PathRouter, RouteError};
use crate::strategy::{ResolvedVersion, VersionResolver, VersionSource};
use crate::version::ApiVersion;
use chrono::NaiveDate;
use http::header::{HeaderName, HeaderValue, ALLOW, LINK};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Header listing every version a route supports
pub const API_SUPPORTED_VERSIONS: HeaderName = HeaderName::from_static("api-supported-versions");

/// Header listing the deprecated versions of a route
pub const API_DEPRECATED_VERSIONS: HeaderName =
    HeaderName::from_static("api-deprecated-versions");

/// Deprecation header (draft-ietf-httpapi-deprecation-header)
pub const DEPRECATION: HeaderName = HeaderName::from_static("deprecation");

/// Sunset header (RFC 8594)
pub const SUNSET: HeaderName = HeaderName::from_static("sunset");

#[derive(Debug, Clone)]
enum RouteKind {
    Versioned(BTreeMap<ApiVersion, MethodRouter>),
    Neutral(MethodRouter),
}

/// All handlers registered for one route template
#[derive(Debug, Clone)]
pub struct RouteEntry {
    template: String,
    kind: RouteKind,
}

impl RouteEntry {
    /// The route template, e.g. `/api/v{version}/KeyedService/employee`
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Check if the route is served regardless of version
    pub fn is_neutral(&self) -> bool {
        matches!(self.kind, RouteKind::Neutral(_))
    }

    /// Versions with a handler, newest first
    pub fn versions(&self) -> Vec<ApiVersion> {
        match &self.kind {
            RouteKind::Versioned(by_version) => by_version.keys().rev().copied().collect(),
            RouteKind::Neutral(_) => Vec::new(),
        }
    }

    /// Handlers for one version
    pub fn methods_for(&self, version: &ApiVersion) -> Option<&MethodRouter> {
        match &self.kind {
            RouteKind::Versioned(by_version) => by_version.get(version),
            RouteKind::Neutral(_) => None,
        }
    }

    /// Handlers of a version-neutral route
    pub fn neutral_methods(&self) -> Option<&MethodRouter> {
        match &self.kind {
            RouteKind::Neutral(methods) => Some(methods),
            RouteKind::Versioned(_) => None,
        }
    }
}

/// Mapping from (route template, version) to handlers
///
/// ```rust,ignore
/// let mut table = RouteVersionTable::new();
/// table
///     .route("/v{version}/hello", ApiVersion::v1(), get(hello))?
///     .route("/v{version}/hello", ApiVersion::v2(), get(hello))?
///     .neutral("/health", get(health))?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct RouteVersionTable {
    routes: BTreeMap<String, RouteEntry>,
}

impl RouteVersionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register handlers for one (template, version) pair
    ///
    /// Registering the same pair again adds methods; a method registered
    /// twice fails with `DuplicateRoute`.
    pub fn route(
        &mut self,
        template: &str,
        version: ApiVersion,
        methods: MethodRouter,
    ) -> Result<&mut Self, RouteError> {
        let entry = self
            .routes
            .entry(template.to_string())
            .or_insert_with(|| RouteEntry {
                template: template.to_string(),
                kind: RouteKind::Versioned(BTreeMap::new()),
            });

        let RouteKind::Versioned(by_version) = &mut entry.kind else {
            return Err(RouteError::Conflict {
                new: template.to_string(),
                existing: template.to_string(),
                details: "route is already registered as version-neutral".to_string(),
            });
        };

        match by_version.get_mut(&version) {
            Some(existing) => {
                existing
                    .merge(methods)
                    .map_err(|method| RouteError::DuplicateRoute {
                        template: template.to_string(),
                        version,
                        method,
                    })?;
            }
            None => {
                by_version.insert(version, methods);
            }
        }

        Ok(self)
    }

    /// Register the same handlers for several versions
    pub fn route_versions(
        &mut self,
        template: &str,
        versions: impl IntoIterator<Item = ApiVersion>,
        methods: MethodRouter,
    ) -> Result<&mut Self, RouteError> {
        for version in versions {
            self.route(template, version, methods.clone())?;
        }
        Ok(self)
    }

    /// Register a version-neutral route
    pub fn neutral(
        &mut self,
        template: &str,
        methods: MethodRouter,
    ) -> Result<&mut Self, RouteError> {
        match self.routes.get_mut(template) {
            Some(RouteEntry {
                kind: RouteKind::Neutral(existing),
                ..
            }) => {
                existing
                    .merge(methods)
                    .map_err(|method| RouteError::DuplicateNeutralRoute {
                        template: template.to_string(),
                        method,
                    })?;
            }
            Some(_) => {
                return Err(RouteError::Conflict {
                    new: template.to_string(),
                    existing: template.to_string(),
                    details: "route is already registered for specific versions".to_string(),
                });
            }
            None => {
                self.routes.insert(
                    template.to_string(),
                    RouteEntry {
                        template: template.to_string(),
                        kind: RouteKind::Neutral(methods),
                    },
                );
            }
        }
        Ok(self)
    }

    /// Look up a route
    pub fn get(&self, template: &str) -> Option<&RouteEntry> {
        self.routes.get(template)
    }

    /// Look up the handlers for a (template, version) pair
    pub fn lookup(&self, template: &str, version: &ApiVersion) -> Option<&MethodRouter> {
        self.routes.get(template)?.methods_for(version)
    }

    /// Versions registered for a route, newest first
    pub fn versions_for(&self, template: &str) -> Vec<ApiVersion> {
        self.routes
            .get(template)
            .map(RouteEntry::versions)
            .unwrap_or_default()
    }

    /// All routes, ordered by template
    pub fn entries(&self) -> impl Iterator<Item = &RouteEntry> {
        self.routes.values()
    }

    /// Number of route templates
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Check if no routes are registered
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

/// The requested version does not exist for the matched route
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error(
    "API version {requested} is not supported by '{route}'; supported versions: {}",
    join_versions(.supported)
)]
pub struct UnsupportedVersionForRoute {
    pub route: String,
    pub requested: ApiVersion,
    /// Newest first
    pub supported: Vec<ApiVersion>,
}

impl From<UnsupportedVersionForRoute> for ApiError {
    fn from(err: UnsupportedVersionForRoute) -> Self {
        let details = serde_json::json!({
            "requested_version": err.requested,
            "supported_versions": err.supported,
        });
        ApiError::bad_request(err.to_string())
            .with_type("unsupported_api_version")
            .with_details(details)
    }
}

/// Version metadata attached to the extensions of a dispatched response
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionAnnotations {
    /// Version the request was served with
    pub requested: ApiVersion,
    /// Where the version came from
    pub source: VersionSource,
    /// Every version of the route, newest first
    pub supported: Vec<ApiVersion>,
    /// Deprecated versions of the route, newest first
    pub deprecated_versions: Vec<ApiVersion>,
    /// Whether `requested` is deprecated
    pub deprecated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sunset_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<SunsetLink>,
}

/// Supported / deprecated versions of one route
struct VersionReport {
    supported: Vec<ApiVersion>,
    deprecated: Vec<ApiVersion>,
}

impl VersionReport {
    fn new(entry: &RouteEntry, registry: &VersionRegistry) -> Self {
        let supported = entry.versions();
        let deprecated = supported
            .iter()
            .copied()
            .filter(|v| registry.is_deprecated(v))
            .collect();
        Self {
            supported,
            deprecated,
        }
    }

    fn apply(&self, response: &mut Response) {
        let headers = response.headers_mut();
        if let Ok(value) = HeaderValue::from_str(&join_versions(&self.supported)) {
            headers.insert(API_SUPPORTED_VERSIONS, value);
        }
        if !self.deprecated.is_empty() {
            if let Ok(value) = HeaderValue::from_str(&join_versions(&self.deprecated)) {
                headers.insert(API_DEPRECATED_VERSIONS, value);
            }
        }
    }
}

fn join_versions(versions: &[ApiVersion]) -> String {
    versions
        .iter()
        .map(ApiVersion::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Sunset dates are reported as midnight UTC in IMF-fixdate form
fn http_date(date: NaiveDate) -> String {
    date.format("%a, %d %b %Y 00:00:00 GMT").to_string()
}

fn link_header(link: &SunsetLink) -> String {
    let mut value = format!("<{}>; rel=\"sunset\"", link.target);
    if let Some(title) = &link.title {
        value.push_str(&format!("; title=\"{}\"", title));
    }
    if let Some(media_type) = &link.media_type {
        value.push_str(&format!("; type=\"{}\"", media_type));
    }
    value
}

/// Matches requests to version-specific handlers
pub struct Dispatcher {
    registry: Arc<VersionRegistry>,
    resolver: VersionResolver,
    table: RouteVersionTable,
    paths: PathRouter,
    /// Segment route templates and the index of their version segment
    segment_routes: HashMap<String, usize>,
}

impl Dispatcher {
    /// Validate the route table against the registry and build the path index
    ///
    /// The registry is sealed here. Its default version, if any, becomes the
    /// resolver's default.
    pub fn new(
        mut registry: VersionRegistry,
        resolver: VersionResolver,
        table: RouteVersionTable,
    ) -> Result<Self, RouteError> {
        registry.seal();
        let resolver = match registry.default_version() {
            Some(default) => resolver.default_version(Some(default)),
            None => resolver,
        };

        let mut paths = PathRouter::default();
        let mut segment_routes = HashMap::new();

        for entry in table.entries() {
            for version in entry.versions() {
                if !registry.contains(&version) {
                    return Err(RouteError::UnknownVersion {
                        template: entry.template.clone(),
                        version,
                    });
                }
                tracing::debug!(route = %entry.template, version = %version, "Registered versioned route");
            }
            if entry.is_neutral() {
                tracing::debug!(route = %entry.template, "Registered version-neutral route");
            }

            if let Some(position) = resolver
                .url_segment()
                .and_then(|reader| reader.template_position(&entry.template))
            {
                segment_routes.insert(entry.template.clone(), position);
            }
            paths.insert(&resolver.strip_template(&entry.template), &entry.template)?;
        }

        Ok(Self {
            registry: Arc::new(registry),
            resolver,
            table,
            paths,
            segment_routes,
        })
    }

    /// The sealed registry
    pub fn registry(&self) -> &VersionRegistry {
        &self.registry
    }

    /// The version resolver
    pub fn resolver(&self) -> &VersionResolver {
        &self.resolver
    }

    /// The route table
    pub fn table(&self) -> &RouteVersionTable {
        &self.table
    }

    /// Match a request path to a route template and dispatch it
    pub async fn handle(&self, mut request: Request) -> Response {
        let path = request.path().to_string();

        // A segment that only looks like a version (`/openApi/v2.json`) falls
        // back to the raw path against routes without a version segment.
        let matched = self.match_segment_route(&path).or_else(|| {
            self.paths
                .at(&path)
                .filter(|(template, _)| !self.segment_routes.contains_key(*template))
        });

        match matched {
            Some((template, params)) => {
                request.path_params = params;
                self.dispatch(template, request).await
            }
            None => error_response(
                ApiError::not_found(format!(
                    "No route found for {} {}",
                    request.method(),
                    path
                )),
                request.extensions().get::<RequestId>(),
            ),
        }
    }

    /// Match a segment route whose version segment sits where the template has it
    fn match_segment_route(&self, path: &str) -> Option<(&str, HashMap<String, String>)> {
        let reader = self.resolver.url_segment()?;

        reader.positions(path).into_iter().find_map(|position| {
            self.paths
                .at(&reader.strip_at(path, position))
                .filter(|(template, _)| self.segment_routes.get(*template) == Some(&position))
        })
    }

    /// Dispatch a request to the handlers of a known route template
    pub async fn dispatch(&self, template: &str, mut request: Request) -> Response {
        let request_id = request.extensions().get::<RequestId>().cloned();

        let Some(entry) = self.table.get(template) else {
            return error_response(
                ApiError::not_found(format!("No route registered for '{}'", template)),
                request_id.as_ref(),
            );
        };

        let by_version = match &entry.kind {
            RouteKind::Neutral(methods) => return invoke(methods, request).await,
            RouteKind::Versioned(by_version) => by_version,
        };

        let report = VersionReport::new(entry, &self.registry);

        let version_segment = self
            .segment_routes
            .get(template)
            .zip(self.resolver.url_segment())
            .and_then(|(&position, reader)| reader.extract_at(request.path(), position));

        let resolved = match self.resolver.resolve_route(request.parts(), version_segment) {
            Ok(resolved) => resolved,
            Err(err) => {
                tracing::debug!(route = %template, error = %err, "API version resolution failed");
                let mut response = error_response(err.into(), request_id.as_ref());
                report.apply(&mut response);
                return response;
            }
        };

        let Some(methods) = by_version.get(&resolved.version) else {
            let err = UnsupportedVersionForRoute {
                route: template.to_string(),
                requested: resolved.version,
                supported: report.supported.clone(),
            };
            tracing::debug!(route = %template, version = %resolved.version, "Unsupported API version");
            let mut response = error_response(err.into(), request_id.as_ref());
            report.apply(&mut response);
            return response;
        };

        request.extensions_mut().insert(resolved);
        let mut response = invoke(methods, request).await;
        report.apply(&mut response);
        self.annotate(&mut response, resolved, report);
        response
    }

    fn annotate(&self, response: &mut Response, resolved: ResolvedVersion, report: VersionReport) {
        let record = self.registry.get(&resolved.version);
        let deprecated = record.map(|r| r.deprecated).unwrap_or(false);
        let sunset = record.and_then(|r| r.sunset.as_ref());

        if deprecated {
            tracing::debug!(
                version = %resolved.version,
                sunset = ?sunset.and_then(|p| p.date),
                "Request served by deprecated API version"
            );

            let headers = response.headers_mut();
            headers.insert(DEPRECATION, HeaderValue::from_static("true"));

            if let Some(policy) = sunset {
                if let Some(date) = policy.date {
                    if let Ok(value) = HeaderValue::from_str(&http_date(date)) {
                        headers.insert(SUNSET, value);
                    }
                }
                for link in &policy.links {
                    match HeaderValue::from_str(&link_header(link)) {
                        Ok(value) => {
                            headers.append(LINK, value);
                        }
                        Err(_) => {
                            tracing::warn!(target = %link.target, "Sunset link is not a valid header value")
                        }
                    }
                }
            }
        }

        response.extensions_mut().insert(VersionAnnotations {
            requested: resolved.version,
            source: resolved.source,
            supported: report.supported,
            deprecated_versions: report.deprecated,
            deprecated,
            sunset_date: sunset.filter(|_| deprecated).and_then(|p| p.date),
            links: sunset
                .filter(|_| deprecated)
                .map(|p| p.links.clone())
                .unwrap_or_default(),
        });
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("registry", &self.registry)
            .field("resolver", &self.resolver)
            .field("table", &self.table)
            .finish()
    }
}

/// Call the handler for the request method, or answer 405
async fn invoke(methods: &MethodRouter, request: Request) -> Response {
    if let Some(handler) = methods.handler(request.method()) {
        return handler(request).await;
    }

    let allowed = methods
        .methods()
        .iter()
        .map(|m| m.as_str().to_string())
        .collect::<Vec<_>>()
        .join(", ");
    let mut response = error_response(
        ApiError::method_not_allowed(format!(
            "Method {} not allowed for {}",
            request.method(),
            request.path()
        )),
        request.extensions().get::<RequestId>(),
    );
    if let Ok(value) = HeaderValue::from_str(&allowed) {
        response.headers_mut().insert(ALLOW, value);
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::SunsetPolicy;
    use crate::router::{get, post};
    use crate::strategy::VersionStrategy;
    use bytes::Bytes;
    use http::StatusCode;
    use http_body_util::BodyExt;

    async fn hello(req: Request) -> String {
        match req.api_version() {
            Some(version) => format!("Hello, World! - v{}", version),
            None => "Hello, World!".to_string(),
        }
    }

    async fn teapot() -> (StatusCode, &'static str) {
        (StatusCode::IM_A_TEAPOT, "short and stout")
    }

    fn registry() -> VersionRegistry {
        let mut registry = VersionRegistry::new();
        registry
            .deprecated(
                ApiVersion::v1(),
                Some(
                    SunsetPolicy::new()
                        .effective(NaiveDate::from_ymd_opt(2026, 1, 1).unwrap())
                        .link(
                            SunsetLink::new("https://example.com/policy.html")
                                .title("Versioning Policy")
                                .media_type("text/html"),
                        ),
                ),
            )
            .unwrap();
        registry.supported(ApiVersion::v2()).unwrap();
        registry
    }

    fn dispatcher() -> Dispatcher {
        let mut table = RouteVersionTable::new();
        table
            .route_versions(
                "/v{version}/hello",
                [ApiVersion::v1(), ApiVersion::v2()],
                get(hello),
            )
            .unwrap()
            .route("/v{version}/employee", ApiVersion::v2(), get(hello))
            .unwrap()
            .route("/v{version}/teapot", ApiVersion::v2(), get(teapot))
            .unwrap()
            .neutral("/health", get(|| async { "ok" }))
            .unwrap();

        let resolver = VersionResolver::with_strategies([
            VersionStrategy::path(),
            VersionStrategy::query(),
        ])
        .unwrap();
        Dispatcher::new(registry(), resolver, table).unwrap()
    }

    fn request(method: &str, uri: &str) -> Request {
        Request::from_http(
            http::Request::builder()
                .method(method)
                .uri(uri)
                .body(Bytes::new())
                .unwrap(),
        )
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn header<'a>(response: &'a Response, name: &str) -> Option<&'a str> {
        response.headers().get(name).and_then(|v| v.to_str().ok())
    }

    #[tokio::test]
    async fn test_unsupported_version_lists_route_versions() {
        let response = dispatcher()
            .dispatch("/v{version}/employee", request("GET", "/v1.0/employee"))
            .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(header(&response, "api-supported-versions"), Some("2.0"));
        let body = body_json(response).await;
        assert_eq!(body["error"]["type"], "unsupported_api_version");
        assert_eq!(body["error"]["details"]["requested_version"], "1.0");
        assert_eq!(
            body["error"]["details"]["supported_versions"],
            serde_json::json!(["2.0"])
        );
    }

    #[tokio::test]
    async fn test_deprecated_version_succeeds_with_sunset() {
        let response = dispatcher().handle(request("GET", "/v1.0/hello")).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(header(&response, "deprecation"), Some("true"));
        assert_eq!(
            header(&response, "sunset"),
            Some("Thu, 01 Jan 2026 00:00:00 GMT")
        );
        assert_eq!(
            header(&response, "link"),
            Some(
                "<https://example.com/policy.html>; rel=\"sunset\"; title=\"Versioning Policy\"; type=\"text/html\""
            )
        );
        assert_eq!(header(&response, "api-supported-versions"), Some("2.0, 1.0"));
        assert_eq!(header(&response, "api-deprecated-versions"), Some("1.0"));

        let annotations = response.extensions().get::<VersionAnnotations>().unwrap();
        assert!(annotations.deprecated);
        assert_eq!(annotations.requested, ApiVersion::v1());
        assert_eq!(annotations.sunset_date.unwrap().to_string(), "2026-01-01");
    }

    #[tokio::test]
    async fn test_current_version_has_no_deprecation_headers() {
        let response = dispatcher().handle(request("GET", "/v2.0/hello")).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get("deprecation").is_none());
        assert!(response.headers().get("sunset").is_none());
        let annotations = response.extensions().get::<VersionAnnotations>().unwrap();
        assert!(!annotations.deprecated);
        assert_eq!(annotations.source, VersionSource::Path);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], b"Hello, World! - v2.0");
    }

    #[tokio::test]
    async fn test_malformed_version_still_reports_versions() {
        let response = dispatcher().handle(request("GET", "/v2.x/hello")).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(header(&response, "api-supported-versions"), Some("2.0, 1.0"));
        let body = body_json(response).await;
        assert_eq!(body["error"]["type"], "malformed_api_version");
        assert_eq!(body["error"]["fields"][0]["field"], "version");
    }

    #[tokio::test]
    async fn test_handler_result_passes_through() {
        let response = dispatcher().handle(request("GET", "/v2.0/teapot")).await;

        assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
        assert_eq!(header(&response, "api-supported-versions"), Some("2.0"));
    }

    #[tokio::test]
    async fn test_wrong_method_is_405_with_allow() {
        let response = dispatcher().handle(request("POST", "/v2.0/hello")).await;

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(header(&response, "allow"), Some("GET"));
    }

    #[tokio::test]
    async fn test_neutral_route_has_no_version_headers() {
        let response = dispatcher().handle(request("GET", "/health")).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get("api-supported-versions").is_none());
        assert!(response.extensions().get::<VersionAnnotations>().is_none());
    }

    #[tokio::test]
    async fn test_unknown_and_unversioned_paths_are_404() {
        let dispatcher = dispatcher();

        let response = dispatcher.handle(request("GET", "/nowhere")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = dispatcher.handle(request("GET", "/hello")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = dispatcher.handle(request("GET", "/v2.0/health")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_version_lookalike_segment_matches_neutral_route() {
        let mut table = RouteVersionTable::new();
        table
            .neutral("/openApi/{document}", get(|req: Request| async move {
                req.path_param("document").cloned().unwrap_or_default()
            }))
            .unwrap();
        let dispatcher = Dispatcher::new(registry(), VersionResolver::new(), table).unwrap();

        let response = dispatcher.handle(request("GET", "/openApi/v2.json")).await;
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], b"v2.json");
    }

    #[test]
    fn test_route_for_unregistered_version_rejected() {
        let mut table = RouteVersionTable::new();
        table
            .route("/v{version}/hello", ApiVersion::new(3, 0), get(hello))
            .unwrap();

        let err = Dispatcher::new(registry(), VersionResolver::new(), table).unwrap_err();
        assert_eq!(
            err,
            RouteError::UnknownVersion {
                template: "/v{version}/hello".to_string(),
                version: ApiVersion::new(3, 0),
            }
        );
    }

    #[test]
    fn test_duplicate_route_method_rejected() {
        let mut table = RouteVersionTable::new();
        table
            .route("/v{version}/hello", ApiVersion::v2(), get(hello))
            .unwrap()
            .route("/v{version}/hello", ApiVersion::v2(), post(hello))
            .unwrap();

        assert!(matches!(
            table.route("/v{version}/hello", ApiVersion::v2(), get(hello)),
            Err(RouteError::DuplicateRoute { .. })
        ));
        assert!(matches!(
            table.neutral("/v{version}/hello", get(hello)),
            Err(RouteError::Conflict { .. })
        ));
        assert_eq!(table.versions_for("/v{version}/hello"), vec![ApiVersion::v2()]);
    }

    #[test]
    fn test_registry_default_flows_into_resolver() {
        let mut registry = registry();
        registry.set_default(ApiVersion::v2()).unwrap();

        let dispatcher =
            Dispatcher::new(registry, VersionResolver::new(), RouteVersionTable::new()).unwrap();
        assert_eq!(dispatcher.resolver().get_default(), Some(ApiVersion::v2()));
        assert!(dispatcher.registry().is_sealed());
    }
}
