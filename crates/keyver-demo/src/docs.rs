//! OpenAPI documentation for the demo API

use crate::dto::{CustomProblemDetails, EmployeeRecord, HealthReport, Message, WeatherForecast};
use keyver_core::{RouteError, RouteVersionTable, VersionRegistry, VersionResolver};
use keyver_openapi::{ApiDocs, Contact, License, OpenApiConfig};
use std::sync::Arc;

pub fn openapi_config() -> OpenApiConfig {
    OpenApiConfig::new("Keyed Services Demo")
        .description(
            "This API contains all the endpoints demonstrating Keyed Services and its injection. \
             An example application with OpenAPI documentation and API versioning.",
        )
        .contact(Contact::new("Jiten Shahani").email("shahani.jiten@gmail.com"))
        .license(License::new("MIT").url("https://opensource.org/licenses/MIT"))
}

/// Build one document per registered version and mount the documentation routes
pub fn mount(
    registry: &VersionRegistry,
    resolver: &VersionResolver,
    table: &mut RouteVersionTable,
) -> Result<Arc<ApiDocs>, RouteError> {
    let docs = Arc::new(
        ApiDocs::builder(openapi_config())
            .schema::<Message>()
            .schema::<EmployeeRecord>()
            .schema::<WeatherForecast>()
            .schema::<CustomProblemDetails>()
            .schema::<HealthReport>()
            .build(registry, resolver, table),
    );
    Arc::clone(&docs).mount(table)?;
    Ok(docs)
}
