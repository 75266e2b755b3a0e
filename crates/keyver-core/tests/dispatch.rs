//! End-to-end dispatch through the public API

use bytes::Bytes;
use chrono::NaiveDate;
use http::StatusCode;
use http_body_util::BodyExt;
use keyver_core::{
    get, ApiVersion, Capability, Dispatcher, Json, LocatorError, Request, Response,
    RouteVersionTable, ServiceLocator, SunsetLink, SunsetPolicy, VersionAnnotations,
    VersionRegistry, VersionResolver, VersionSource, VersionStrategy,
};
use std::sync::Arc;

trait Employee: Send + Sync {
    fn message(&self) -> String;
}

impl Capability for dyn Employee {
    const NAME: &'static str = "employee";
}

struct Repo;

impl Employee for Repo {
    fn message(&self) -> String {
        "Hello from EmployeeRepo".to_string()
    }
}

fn locator() -> Arc<ServiceLocator> {
    let mut builder = ServiceLocator::builder();
    builder
        .bind::<dyn Employee>("employeeRepo", Arc::new(Repo))
        .unwrap();
    Arc::new(builder.build().unwrap())
}

fn registry() -> VersionRegistry {
    let mut registry = VersionRegistry::new();
    registry
        .deprecated(
            ApiVersion::v1(),
            Some(
                SunsetPolicy::new()
                    .effective(NaiveDate::from_ymd_opt(2026, 1, 1).unwrap())
                    .link(SunsetLink::new("https://example.com/sunset.json").media_type("application/json")),
            ),
        )
        .unwrap();
    registry.supported(ApiVersion::v2()).unwrap();
    registry.set_default(ApiVersion::v2()).unwrap();
    registry
}

fn dispatcher() -> Dispatcher {
    let repo = locator().resolve::<dyn Employee>("employeeRepo").unwrap();

    let mut routes = RouteVersionTable::new();
    routes
        .route(
            "/employee",
            ApiVersion::v2(),
            get(move |req: Request| {
                let repo = repo.clone();
                async move {
                    Json(serde_json::json!({
                        "Message": format!("{} - v{}", repo.message(), req.api_version().unwrap())
                    }))
                }
            }),
        )
        .unwrap()
        .route_versions(
            "/greeting",
            [ApiVersion::v1(), ApiVersion::v2()],
            get(|| async { "hi" }),
        )
        .unwrap();

    let resolver = VersionResolver::with_strategies([
        VersionStrategy::path(),
        VersionStrategy::query(),
        VersionStrategy::header(),
    ])
    .unwrap();

    Dispatcher::new(registry(), resolver, routes).unwrap()
}

fn request(uri: &str, headers: &[(&str, &str)]) -> Request {
    let mut builder = http::Request::builder().uri(uri);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    Request::from_http(builder.body(Bytes::new()).unwrap())
}

async fn json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn header_version_reaches_handler() {
    let response = dispatcher()
        .handle(request("/employee", &[("x-api-version", "2.0")]))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let annotations = response.extensions().get::<VersionAnnotations>().unwrap();
    assert_eq!(annotations.requested, ApiVersion::new(2, 0));
    assert_eq!(annotations.source, VersionSource::Header);
    assert_eq!(
        json(response).await["Message"],
        "Hello from EmployeeRepo - v2.0"
    );
}

#[tokio::test]
async fn missing_version_uses_registry_default() {
    let response = dispatcher().handle(request("/employee", &[])).await;

    assert_eq!(response.status(), StatusCode::OK);
    let annotations = response.extensions().get::<VersionAnnotations>().unwrap();
    assert_eq!(annotations.source, VersionSource::Default);
}

#[tokio::test]
async fn unsupported_version_for_route() {
    let response = dispatcher()
        .handle(request("/employee?api-version=1.0", &[]))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json(response).await;
    assert_eq!(body["error"]["type"], "unsupported_api_version");
    assert_eq!(body["error"]["details"]["supported_versions"], serde_json::json!(["2.0"]));
}

#[tokio::test]
async fn first_reader_wins_over_later_readers() {
    let response = dispatcher()
        .handle(request("/greeting?api-version=1.0", &[("x-api-version", "2.0")]))
        .await;

    let annotations = response.extensions().get::<VersionAnnotations>().unwrap();
    assert_eq!(annotations.requested, ApiVersion::v1());
    assert_eq!(annotations.source, VersionSource::Query);
    assert!(annotations.deprecated);
    assert_eq!(annotations.sunset_date.unwrap().to_string(), "2026-01-01");
    assert_eq!(annotations.links.len(), 1);
}

#[tokio::test]
async fn malformed_header_is_not_defaulted() {
    let response = dispatcher()
        .handle(request("/greeting", &[("x-api-version", "latest")]))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        response.headers().get("api-supported-versions").unwrap(),
        "2.0, 1.0"
    );
    let body = json(response).await;
    assert_eq!(body["error"]["type"], "malformed_api_version");
    assert_eq!(body["error"]["fields"][0]["field"], "x-api-version");
}

fn item_dispatcher(default: Option<ApiVersion>) -> Dispatcher {
    let mut registry = VersionRegistry::new();
    registry.supported(ApiVersion::v1()).unwrap();
    registry.supported(ApiVersion::v2()).unwrap();
    if let Some(version) = default {
        registry.set_default(version).unwrap();
    }

    let mut routes = RouteVersionTable::new();
    routes
        .route_versions(
            "/items/{id}",
            [ApiVersion::v1(), ApiVersion::v2()],
            get(|req: Request| async move {
                format!(
                    "{}|{}",
                    req.path_param("id").cloned().unwrap_or_default(),
                    req.api_version().unwrap()
                )
            }),
        )
        .unwrap()
        .route(
            "/tenants/{tenant}/v{version}/items",
            ApiVersion::v2(),
            get(|req: Request| async move {
                format!(
                    "{}|{}",
                    req.path_param("tenant").cloned().unwrap_or_default(),
                    req.api_version().unwrap()
                )
            }),
        )
        .unwrap();

    let resolver = VersionResolver::with_strategies([
        VersionStrategy::path(),
        VersionStrategy::query(),
        VersionStrategy::header(),
    ])
    .unwrap();

    Dispatcher::new(registry, resolver, routes).unwrap()
}

async fn text(response: Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8_lossy(&bytes).to_string()
}

#[tokio::test]
async fn path_params_that_look_like_versions_are_not_versions() {
    let dispatcher = item_dispatcher(None);

    let response = dispatcher
        .handle(request("/items/v1abc?api-version=2.0", &[]))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(text(response).await, "v1abc|2.0");

    let response = dispatcher
        .handle(request("/items/v1.0?api-version=2.0", &[]))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let annotations = response.extensions().get::<VersionAnnotations>().unwrap();
    assert_eq!(annotations.source, VersionSource::Query);
    assert_eq!(text(response).await, "v1.0|2.0");
}

#[tokio::test]
async fn version_is_read_from_the_template_segment_position() {
    let response = item_dispatcher(None)
        .handle(request("/tenants/v1.0/v2.0/items", &[]))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(text(response).await, "v1.0|2.0");
}

#[tokio::test]
async fn missing_version_without_default_names_every_reader() {
    let response = item_dispatcher(None).handle(request("/items/42", &[])).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        response.headers().get("api-supported-versions").unwrap(),
        "2.0, 1.0"
    );
    let body = json(response).await;
    assert_eq!(body["error"]["type"], "api_version_unspecified");
    let fields: Vec<&str> = body["error"]["fields"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["version", "api-version", "x-api-version"]);
}

#[tokio::test]
async fn supported_version_carries_no_sunset_annotation() {
    let mut registry = VersionRegistry::new();
    registry
        .register(
            ApiVersion::v2(),
            false,
            Some(SunsetPolicy::new().effective(NaiveDate::from_ymd_opt(2030, 1, 1).unwrap())),
        )
        .unwrap();
    let mut routes = RouteVersionTable::new();
    routes
        .route("/v{version}/ping", ApiVersion::v2(), get(|| async { "pong" }))
        .unwrap();

    let response = Dispatcher::new(registry, VersionResolver::new(), routes)
        .unwrap()
        .handle(request("/v2.0/ping", &[]))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get("sunset").is_none());
    let annotations = response.extensions().get::<VersionAnnotations>().unwrap();
    assert!(!annotations.deprecated);
    assert_eq!(annotations.sunset_date, None);
    assert!(annotations.links.is_empty());
}

#[test]
fn locator_resolves_bound_key_only() {
    let locator = locator();

    assert_eq!(
        locator
            .resolve::<dyn Employee>("employeeRepo")
            .unwrap()
            .message(),
        "Hello from EmployeeRepo"
    );
    assert!(locator.resolve_named("employee", "employeeRepo").is_ok());
    assert_eq!(
        locator.resolve_named("employee", "missingKey").err(),
        Some(LocatorError::UnregisteredCapability {
            capability: "employee".to_string(),
            key: "missingKey".to_string(),
        })
    );
}
