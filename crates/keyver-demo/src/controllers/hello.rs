//! Minimal hello endpoints (1.0 deprecated, 2.0 current)

use super::{version_label, RouteTemplates};
use keyver_core::{get, ApiVersion, Request, RouteError, RouteVersionTable};

async fn hello(req: Request) -> String {
    format!("Hello, World! - {}", version_label(&req))
}

pub fn register(table: &mut RouteVersionTable, templates: &RouteTemplates) -> Result<(), RouteError> {
    table.route_versions(
        &templates.versioned("", "/hello"),
        [ApiVersion::v1(), ApiVersion::v2()],
        get(hello).summary("Hello, World!").tag("Minimal Endpoints"),
    )?;
    Ok(())
}
