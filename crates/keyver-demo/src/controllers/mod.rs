//! Route registration for every controller

pub mod health;
pub mod hello;
pub mod keyed_v1;
pub mod keyed_v2;
pub mod weather;

use keyver_core::{Request, VersionResolver};

/// Prefix of the keyed service controllers
pub const API_PREFIX: &str = "/api";

/// Builds route templates with the resolver's version segment
///
/// Without a path reader the segment is left out, and the version comes
/// from the other readers or the default.
#[derive(Debug, Clone)]
pub struct RouteTemplates {
    segment: Option<String>,
}

impl RouteTemplates {
    pub fn new(resolver: &VersionResolver) -> Self {
        Self {
            segment: resolver
                .url_segment()
                .map(|reader| reader.pattern().to_string()),
        }
    }

    /// `versioned("/api", "/KeyedService/employee")` gives
    /// `/api/v{version}/KeyedService/employee`
    pub fn versioned(&self, prefix: &str, rest: &str) -> String {
        match &self.segment {
            Some(segment) => format!("{}/{}{}", prefix, segment, rest),
            None => format!("{}{}", prefix, rest),
        }
    }
}

/// `v2.0` for a request resolved to version 2.0
pub(crate) fn version_label(req: &Request) -> String {
    req.api_version()
        .map(|version| format!("v{}", version))
        .unwrap_or_default()
}
