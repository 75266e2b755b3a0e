//! OpenAPI configuration

use serde::Serialize;

/// Placeholder for the version group in [`OpenApiConfig::document_path`]
pub const GROUP_PLACEHOLDER: &str = "{group}";

/// Contact information published in every version document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Contact {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl Contact {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: None,
            url: None,
        }
    }

    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }
}

/// License information published in every version document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct License {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl License {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: None,
        }
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }
}

/// Configuration for per-version documentation
#[derive(Debug, Clone)]
pub struct OpenApiConfig {
    /// Document title, shared by all versions
    pub title: String,
    /// Base narrative every version description starts with
    pub description: String,
    pub contact: Option<Contact>,
    pub license: Option<License>,
    /// Path of a version document; must contain `{group}`
    pub document_path: String,
    /// Path of the document catalog
    pub catalog_path: String,
}

impl Default for OpenApiConfig {
    fn default() -> Self {
        Self {
            title: "Keyver API".to_string(),
            description: String::new(),
            contact: None,
            license: None,
            document_path: "/openApi/{group}.json".to_string(),
            catalog_path: "/openApi/documents.json".to_string(),
        }
    }
}

impl OpenApiConfig {
    /// Create a configuration with a title
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    /// Set the base narrative
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn contact(mut self, contact: Contact) -> Self {
        self.contact = Some(contact);
        self
    }

    pub fn license(mut self, license: License) -> Self {
        self.license = Some(license);
        self
    }

    /// Set the path template of version documents
    pub fn document_path(mut self, path: impl Into<String>) -> Self {
        self.document_path = path.into();
        self
    }

    /// Set the path of the document catalog
    pub fn catalog_path(mut self, path: impl Into<String>) -> Self {
        self.catalog_path = path.into();
        self
    }

    /// URL of the document for a version group
    pub fn document_url(&self, group: &str) -> String {
        self.document_path.replace(GROUP_PLACEHOLDER, group)
    }
}
