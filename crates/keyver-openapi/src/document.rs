//! Version documents
//!
//! One [`VersionDocument`] per registered version, newest first. The
//! narrative spells out deprecation, the sunset date and the human-readable
//! sunset links so a documentation renderer can show them as prose.

use crate::config::{Contact, License, OpenApiConfig};
use chrono::NaiveDate;
use keyver_core::{SunsetLink, VersionRecord, VersionRegistry};
use serde::Serialize;

/// Appended to the narrative of deprecated versions
pub const DEPRECATION_NOTICE: &str = "\n\nThis API version has been deprecated.";

/// Documentation metadata for one API version
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionDocument {
    /// Document group, e.g. `v1` or `v1.5`
    pub group_name: String,
    pub title: String,
    pub version: String,
    /// Narrative including deprecation and sunset prose
    pub description: String,
    pub deprecated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sunset_date: Option<NaiveDate>,
    /// All sunset links, including machine-readable ones left out of the narrative
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<SunsetLink>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<Contact>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license: Option<License>,
}

/// Builds [`VersionDocument`]s from a registry
///
/// Pure and deterministic: the same registry and configuration always
/// produce the same documents.
#[derive(Debug, Clone, Default)]
pub struct DocumentAssembler {
    config: OpenApiConfig,
}

impl DocumentAssembler {
    pub fn new(config: OpenApiConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &OpenApiConfig {
        &self.config
    }

    /// One document per registered version, newest first
    pub fn build(&self, registry: &VersionRegistry) -> Vec<VersionDocument> {
        registry
            .describe_all()
            .into_iter()
            .map(|record| self.document(record))
            .collect()
    }

    /// Document for a single version record
    pub fn document(&self, record: &VersionRecord) -> VersionDocument {
        let sunset = record.sunset.as_ref();

        VersionDocument {
            group_name: record.version.group_name(),
            title: self.config.title.clone(),
            version: record.version.to_string(),
            description: narrative(&self.config.description, record),
            deprecated: record.deprecated,
            sunset_date: sunset.and_then(|policy| policy.date),
            links: sunset.map(|policy| policy.links.clone()).unwrap_or_default(),
            contact: self.config.contact.clone(),
            license: self.config.license.clone(),
        }
    }
}

/// Base text, then deprecation notice, sunset date and html link list
fn narrative(base: &str, record: &VersionRecord) -> String {
    let mut text = String::from(base);

    if record.deprecated {
        text.push_str(DEPRECATION_NOTICE);
    }

    let Some(policy) = &record.sunset else {
        return text;
    };

    if let Some(date) = policy.date {
        text.push_str(&format!(" The API will be sunset on {}.", date));
    }

    if policy.has_links() {
        text.push('\n');

        let items: Vec<String> = policy
            .links
            .iter()
            .filter(|link| link.is_human_readable())
            .map(|link| format!("<li><a href=\"{}\">{}</a></li>", link.target, link.display_text()))
            .collect();

        if !items.is_empty() {
            text.push_str("<h4>Links</h4><ul>");
            text.push_str(&items.concat());
            text.push_str("</ul>");
        }
    }

    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use keyver_core::{ApiVersion, SunsetPolicy};

    const BASE: &str = "Keyed services demo.";

    fn registry() -> VersionRegistry {
        let mut registry = VersionRegistry::new();
        registry.supported(ApiVersion::v2()).unwrap();
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
                        )
                        .link(
                            SunsetLink::new("https://example.com/policy.json")
                                .title("Machine Policy")
                                .media_type("application/json"),
                        ),
                ),
            )
            .unwrap();
        registry
    }

    fn assembler() -> DocumentAssembler {
        DocumentAssembler::new(
            OpenApiConfig::new("Keyed Services Demo")
                .description(BASE)
                .license(License::new("MIT").url("https://opensource.org/licenses/MIT")),
        )
    }

    #[test]
    fn test_documents_newest_first() {
        let docs = assembler().build(&registry());

        let groups: Vec<&str> = docs.iter().map(|d| d.group_name.as_str()).collect();
        assert_eq!(groups, vec!["v2", "v1"]);
        assert_eq!(docs[0].version, "2.0");
        assert_eq!(docs[0].title, "Keyed Services Demo");
        assert_eq!(docs[0].license.as_ref().map(|l| l.name.as_str()), Some("MIT"));
    }

    #[test]
    fn test_current_version_narrative_is_base_only() {
        let docs = assembler().build(&registry());

        assert_eq!(docs[0].description, BASE);
        assert!(!docs[0].deprecated);
        assert!(docs[0].links.is_empty());
    }

    #[test]
    fn test_deprecated_narrative_lists_html_links_only() {
        let docs = assembler().build(&registry());

        assert_eq!(
            docs[1].description,
            "Keyed services demo.\n\nThis API version has been deprecated. \
             The API will be sunset on 2026-01-01.\n\
             <h4>Links</h4><ul><li><a href=\"https://example.com/policy.html\">Versioning Policy</a></li></ul>"
        );
        assert!(docs[1].deprecated);
        assert_eq!(docs[1].sunset_date, NaiveDate::from_ymd_opt(2026, 1, 1));
        assert_eq!(docs[1].links.len(), 2);
    }

    #[test]
    fn test_link_without_title_shows_target() {
        let record = VersionRecord {
            version: ApiVersion::v1(),
            deprecated: false,
            sunset: Some(
                SunsetPolicy::new().link(SunsetLink::new("https://example.com/a").media_type("text/html")),
            ),
        };

        assert_eq!(
            narrative("", &record),
            "\n<h4>Links</h4><ul><li><a href=\"https://example.com/a\">https://example.com/a</a></li></ul>"
        );
    }

    #[test]
    fn test_machine_links_only_add_line_break() {
        let record = VersionRecord {
            version: ApiVersion::v1(),
            deprecated: true,
            sunset: Some(
                SunsetPolicy::new()
                    .link(SunsetLink::new("https://example.com/a.json").media_type("application/json")),
            ),
        };

        assert_eq!(narrative("Base", &record), format!("Base{}\n", DEPRECATION_NOTICE));
    }

    #[test]
    fn test_build_is_deterministic() {
        let registry = registry();
        let assembler = assembler();

        let first = serde_json::to_vec(&assembler.build(&registry)).unwrap();
        let second = serde_json::to_vec(&assembler.build(&registry)).unwrap();
        assert_eq!(first, second);
    }
}
