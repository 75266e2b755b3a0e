//! Document catalog for documentation UIs

use crate::config::OpenApiConfig;
use crate::document::VersionDocument;
use serde::Serialize;

/// A version document as listed in a documentation UI
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogEntry {
    /// Display name, e.g. `V2` or `V1 (DEPRECATED)`
    pub name: String,
    pub url: String,
}

/// Ordered list of version documents, newest first
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DocumentCatalog {
    entries: Vec<CatalogEntry>,
}

impl DocumentCatalog {
    pub fn new(documents: &[VersionDocument], config: &OpenApiConfig) -> Self {
        let entries = documents
            .iter()
            .map(|doc| {
                let group = doc.group_name.to_uppercase();
                CatalogEntry {
                    name: if doc.deprecated {
                        format!("{} (DEPRECATED)", group)
                    } else {
                        group
                    },
                    url: config.document_url(&doc.group_name),
                }
            })
            .collect();

        Self { entries }
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::DocumentAssembler;
    use keyver_core::{ApiVersion, VersionRegistry};

    #[test]
    fn test_catalog_names_and_urls() {
        let mut registry = VersionRegistry::new();
        registry.deprecated(ApiVersion::v1(), None).unwrap();
        registry.supported(ApiVersion::v2()).unwrap();
        registry.supported(ApiVersion::new(1, 5)).unwrap();

        let config = OpenApiConfig::default();
        let documents = DocumentAssembler::new(config.clone()).build(&registry);
        let catalog = DocumentCatalog::new(&documents, &config);

        assert_eq!(
            catalog.entries(),
            &[
                CatalogEntry {
                    name: "V2".to_string(),
                    url: "/openApi/v2.json".to_string(),
                },
                CatalogEntry {
                    name: "V1.5".to_string(),
                    url: "/openApi/v1.5.json".to_string(),
                },
                CatalogEntry {
                    name: "V1 (DEPRECATED)".to_string(),
                    url: "/openApi/v1.json".to_string(),
                },
            ]
        );
        assert_eq!(
            serde_json::to_value(&catalog).unwrap()[0]["name"],
            "V2"
        );
    }
}
