//! Version-neutral liveness endpoint

use crate::dto::HealthReport;
use keyver_core::{get, Environment, Json, ResponseDoc, RouteError, RouteVersionTable};

pub fn register(
    table: &mut RouteVersionTable,
    environment: Environment,
    api_versions: Vec<String>,
) -> Result<(), RouteError> {
    table.neutral(
        "/health",
        get(move || async move {
            Json(HealthReport {
                status: "healthy".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                environment: environment.as_str().to_string(),
                api_versions,
                timestamp: chrono::Utc::now().to_rfc3339(),
            })
        })
        .summary("Liveness")
        .tag("Health")
        .response(200, ResponseDoc::new("Healthy").schema("HealthReport")),
    )?;
    Ok(())
}
