//! Documentation routes served through the dispatch pipeline

use chrono::NaiveDate;
use keyver_core::{
    get, ApiVersion, KeyverApp, ResponseDoc, RouteVersionTable, SunsetLink, SunsetPolicy,
    TestClient, VersionRegistry, VersionResolver,
};
use keyver_openapi::{ApiDocs, OpenApiConfig, Schema};
use serde::Serialize;
use std::sync::Arc;

#[derive(Serialize, Schema)]
struct Message {
    #[serde(rename = "Message")]
    message: String,
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
    registry.set_default(ApiVersion::v2()).unwrap();
    registry
}

fn client() -> TestClient {
    let registry = registry();
    let resolver = VersionResolver::new();

    let mut routes = RouteVersionTable::new();
    routes
        .route_versions(
            "/v{version}/hello",
            [ApiVersion::v1(), ApiVersion::v2()],
            get(|| async { "Hello, World!" })
                .summary("Hello, World!")
                .response(200, ResponseDoc::new("Success").schema("Message")),
        )
        .unwrap();

    let docs = Arc::new(
        ApiDocs::builder(OpenApiConfig::new("Demo").description("Demo API."))
            .schema::<Message>()
            .build(&registry, &resolver, &routes),
    );
    docs.mount(&mut routes).unwrap();

    TestClient::new(KeyverApp::new(registry, resolver, routes).unwrap())
}

#[tokio::test]
async fn catalog_lists_versions_newest_first() {
    let response = client().get("/openApi/documents.json").await;

    response.assert_status(200);
    let catalog: serde_json::Value = response.json().unwrap();
    assert_eq!(
        catalog,
        serde_json::json!([
            { "name": "V2", "url": "/openApi/v2.json" },
            { "name": "V1 (DEPRECATED)", "url": "/openApi/v1.json" },
        ])
    );
    assert!(response.header("api-supported-versions").is_none());
}

#[tokio::test]
async fn version_document_is_served_by_group() {
    let response = client().get("/openApi/v1.json").await;

    response.assert_status(200);
    let spec: serde_json::Value = response.json().unwrap();
    assert_eq!(spec["openapi"], "3.0.3");
    assert_eq!(spec["info"]["version"], "1.0");
    assert!(spec["info"]["description"]
        .as_str()
        .unwrap()
        .contains("The API will be sunset on 2026-01-01."));
    assert_eq!(spec["paths"]["/v1.0/hello"]["get"]["deprecated"], true);
    assert!(spec["components"]["schemas"].get("Message").is_some());
    assert!(spec["paths"].get("/openApi/documents.json").is_none());
}

#[tokio::test]
async fn unknown_group_is_404() {
    let response = client().get("/openApi/v3.json").await;

    response.assert_status(404);
    response.assert_body_contains("not_found");
}

#[tokio::test]
async fn api_routes_still_versioned() {
    let response = client().get("/v1.0/hello").await;

    response
        .assert_status(200)
        .assert_header("deprecation", "true")
        .assert_header("api-supported-versions", "2.0, 1.0");
}
