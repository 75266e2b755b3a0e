//! Application assembly
//!
//! Everything is registered here once, before the server accepts requests;
//! any misconfiguration fails startup.

use crate::config::{AppConfig, ConfigError};
use crate::controllers::keyed_v1::KeyedServiceV1;
use crate::controllers::keyed_v2::KeyedServiceV2;
use crate::controllers::{health, hello, weather, RouteTemplates};
use crate::{docs, services};
use chrono::NaiveDate;
use keyver_core::{
    ApiVersion, FromLocator, KeyverApp, LocatorError, RegistryError, RouteError,
    RouteVersionTable, SunsetLink, SunsetPolicy, VersionRegistry, HTML_MEDIA_TYPE,
};

/// Fatal startup failures
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("version registry: {0}")]
    Registry(#[from] RegistryError),
    #[error("service bindings: {0}")]
    Locator(#[from] LocatorError),
    #[error("route table: {0}")]
    Route(#[from] RouteError),
    #[error("server error: {0}")]
    Server(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Sunset policy advertised for version 1.0
pub fn v1_sunset_policy() -> SunsetPolicy {
    let policy = SunsetPolicy::new()
        .link(
            SunsetLink::new("https://example.com/api/versioning-policy.html")
                .title("API Versioning Policy")
                .media_type(HTML_MEDIA_TYPE),
        )
        .link(
            SunsetLink::new("https://example.com/api/versioning-policy.json")
                .title("API Versioning Policy (JSON)")
                .media_type("application/json"),
        );

    match NaiveDate::from_ymd_opt(2026, 1, 1) {
        Some(date) => policy.effective(date),
        None => policy,
    }
}

/// Version 1.0 (deprecated) and 2.0
pub fn registry(default_version: Option<ApiVersion>) -> Result<VersionRegistry, RegistryError> {
    let mut registry = VersionRegistry::new();
    registry.deprecated(ApiVersion::v1(), Some(v1_sunset_policy()))?;
    registry.supported(ApiVersion::v2())?;
    if let Some(version) = default_version {
        registry.set_default(version)?;
    }
    Ok(registry)
}

/// Build the complete application from configuration
pub fn build_app(config: &AppConfig) -> Result<KeyverApp, StartupError> {
    let resolver = config.resolver()?;
    let registry = registry(config.default_version()?)?;

    let locator = services::locator()?;
    for (capability, keys) in locator.describe() {
        tracing::debug!(capability, keys = ?keys, "Keyed services bound");
    }

    let templates = RouteTemplates::new(&resolver);
    let mut routes = RouteVersionTable::new();

    KeyedServiceV1::from_locator(&locator)?.register(&mut routes, &templates)?;
    KeyedServiceV2::from_locator(&locator)?.register(&mut routes, &templates)?;
    hello::register(&mut routes, &templates)?;
    weather::register(&mut routes)?;
    health::register(
        &mut routes,
        config.environment(),
        registry.versions().iter().map(ToString::to_string).collect(),
    )?;

    if config.docs_enabled() {
        docs::mount(&registry, &resolver, &mut routes)?;
    } else {
        tracing::info!(env = %config.env, "Documentation routes disabled");
    }

    let app = KeyverApp::new(registry, resolver, routes)?;
    Ok(match config.body_limit {
        0 => app.no_body_limit(),
        limit => app.body_limit(limit),
    })
}

/// Build and serve until Ctrl+C
pub async fn run(config: AppConfig) -> Result<(), StartupError> {
    let app = build_app(&config)?;
    let address = config.address();

    tracing::info!(address = %address, env = %config.env, "Starting Keyed Services Demo");
    app.run(&address).await.map_err(StartupError::Server)
}
