//! Per-version OpenAPI specification

use crate::config::{Contact, License};
use crate::document::VersionDocument;
use http::Method;
use keyver_core::{
    ApiVersion, MethodRouter, OperationDoc, RouteVersionTable, VersionResolver, VersionSource,
};
use serde::Serialize;
use std::collections::BTreeMap;

const JSON_MEDIA_TYPE: &str = "application/json";

/// API information for an OpenAPI document
#[derive(Debug, Clone, Serialize)]
pub struct ApiInfo {
    pub title: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<Contact>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license: Option<License>,
}

/// OpenAPI specification for one API version
#[derive(Debug, Clone)]
pub struct OpenApiSpec {
    pub info: ApiInfo,
    pub paths: BTreeMap<String, PathItem>,
    pub schemas: BTreeMap<String, serde_json::Value>,
}

/// Path item in OpenAPI spec
#[derive(Debug, Clone, Serialize, Default)]
pub struct PathItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub get: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub put: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patch: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete: Option<Operation>,
}

/// Operation (endpoint) in OpenAPI spec
#[derive(Debug, Clone, Serialize)]
pub struct Operation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Parameter>,
    pub responses: BTreeMap<String, ResponseSpec>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub deprecated: bool,
}

/// Parameter in OpenAPI spec
#[derive(Debug, Clone, Serialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "in")]
    pub location: String,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub schema: SchemaRef,
}

/// Media type in OpenAPI spec
#[derive(Debug, Clone, Serialize)]
pub struct MediaType {
    pub schema: SchemaRef,
}

/// Response specification
#[derive(Debug, Clone, Serialize, Default)]
pub struct ResponseSpec {
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<BTreeMap<String, MediaType>>,
}

/// Schema reference or inline schema
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum SchemaRef {
    Ref {
        #[serde(rename = "$ref")]
        reference: String,
    },
    Inline(serde_json::Value),
}

impl SchemaRef {
    /// Reference to a component schema
    pub fn component(name: &str) -> Self {
        Self::Ref {
            reference: format!("#/components/schemas/{}", name),
        }
    }

    fn string() -> Self {
        Self::Inline(serde_json::json!({ "type": "string" }))
    }
}

impl OpenApiSpec {
    /// Create a new OpenAPI specification
    pub fn new(title: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            info: ApiInfo {
                title: title.into(),
                version: version.into(),
                description: None,
                contact: None,
                license: None,
            },
            paths: BTreeMap::new(),
            schemas: BTreeMap::new(),
        }
    }

    /// Start a specification from a version document
    pub fn from_document(document: &VersionDocument) -> Self {
        let mut spec = Self::new(document.title.clone(), document.version.clone());
        if !document.description.is_empty() {
            spec.info.description = Some(document.description.clone());
        }
        spec.info.contact = document.contact.clone();
        spec.info.license = document.license.clone();
        spec
    }

    /// Set description
    pub fn description(mut self, desc: impl Into<String>) -> Self {
        self.info.description = Some(desc.into());
        self
    }

    /// Add a path operation
    pub fn path(mut self, path: &str, method: &Method, operation: Operation) -> Self {
        let item = self.paths.entry(path.to_string()).or_default();
        match method.as_str() {
            "GET" => item.get = Some(operation),
            "POST" => item.post = Some(operation),
            "PUT" => item.put = Some(operation),
            "PATCH" => item.patch = Some(operation),
            "DELETE" => item.delete = Some(operation),
            _ => tracing::debug!(%method, path, "Method not representable in OpenAPI path item"),
        }
        self
    }

    /// Add a schema definition
    pub fn schema(mut self, name: &str, schema: serde_json::Value) -> Self {
        self.schemas.insert(name.to_string(), schema);
        self
    }

    /// Register a type that implements `utoipa::ToSchema`
    pub fn register<T: for<'a> utoipa::ToSchema<'a>>(mut self) -> Self {
        let (name, schema) = schema_of::<T>();
        if let Some(schema) = schema {
            self.schemas.insert(name, schema);
        }
        self
    }

    /// Add every route of the table that serves `version`
    ///
    /// Version-neutral routes appear in every version's document. The
    /// version is substituted into templates with a path segment; other
    /// templates document the query and header readers as parameters.
    pub fn routes(
        mut self,
        table: &RouteVersionTable,
        resolver: &VersionResolver,
        version: &ApiVersion,
        deprecated: bool,
    ) -> Self {
        for entry in table.entries() {
            let template = entry.template();

            let (path, methods, version_params, deprecated) = match entry.neutral_methods() {
                Some(methods) => (template.to_string(), methods, Vec::new(), false),
                None => {
                    let Some(methods) = entry.methods_for(version) else {
                        continue;
                    };
                    let path = resolver.versioned_path(template, version);
                    let version_params = if path == template {
                        version_parameters(resolver, version)
                    } else {
                        Vec::new()
                    };
                    (path, methods, version_params, deprecated)
                }
            };

            let versioned = !entry.is_neutral();
            for method in methods.methods() {
                let operation =
                    Operation::from_doc(methods, &path, &version_params, deprecated, versioned);
                self = self.path(&path, &method, operation);
            }
        }
        self
    }

    /// Convert to JSON value
    pub fn to_json(&self) -> serde_json::Value {
        let mut spec = serde_json::json!({
            "openapi": "3.0.3",
            "info": self.info,
            "paths": self.paths,
        });

        if !self.schemas.is_empty() {
            spec["components"] = serde_json::json!({
                "schemas": self.schemas
            });
        }

        spec
    }
}

/// Name and JSON schema of a `utoipa::ToSchema` type
pub(crate) fn schema_of<T: for<'a> utoipa::ToSchema<'a>>() -> (String, Option<serde_json::Value>) {
    let (name, schema) = T::schema();
    match serde_json::to_value(schema) {
        Ok(value) => (name.to_string(), Some(value)),
        Err(err) => {
            tracing::warn!(schema = name, error = %err, "Failed to serialize schema");
            (name.to_string(), None)
        }
    }
}

impl Operation {
    /// Create an operation with a default 200 response
    pub fn new() -> Self {
        Self {
            summary: None,
            description: None,
            tags: Vec::new(),
            parameters: Vec::new(),
            responses: BTreeMap::from([(
                "200".to_string(),
                ResponseSpec {
                    description: "Success".to_string(),
                    content: None,
                },
            )]),
            deprecated: false,
        }
    }

    fn from_doc(
        methods: &MethodRouter,
        path: &str,
        version_params: &[Parameter],
        deprecated: bool,
        versioned: bool,
    ) -> Self {
        let OperationDoc {
            summary,
            description,
            tags,
            responses,
        } = methods.doc().clone();

        let mut operation = Self {
            summary,
            description,
            tags,
            deprecated,
            ..Self::new()
        };

        operation.parameters = path_parameters(path);
        operation.parameters.extend(version_params.iter().cloned());

        if !responses.is_empty() {
            operation.responses = responses
                .into_iter()
                .map(|(status, doc)| {
                    let content = doc.schema.map(|name| {
                        let schema = if doc.list {
                            SchemaRef::Inline(serde_json::json!({
                                "type": "array",
                                "items": { "$ref": format!("#/components/schemas/{}", name) }
                            }))
                        } else {
                            SchemaRef::component(&name)
                        };
                        BTreeMap::from([(JSON_MEDIA_TYPE.to_string(), MediaType { schema })])
                    });
                    (
                        status.to_string(),
                        ResponseSpec {
                            description: doc.description,
                            content,
                        },
                    )
                })
                .collect();
        }

        if versioned {
            operation
                .responses
                .entry("400".to_string())
                .or_insert_with(|| ResponseSpec {
                    description: "Malformed, missing or unsupported API version".to_string(),
                    content: Some(BTreeMap::from([(
                        JSON_MEDIA_TYPE.to_string(),
                        MediaType {
                            schema: SchemaRef::component("ErrorSchema"),
                        },
                    )])),
                });
        }

        operation
    }
}

impl Default for Operation {
    fn default() -> Self {
        Self::new()
    }
}

/// `{name}` segments of a concrete path
fn path_parameters(path: &str) -> Vec<Parameter> {
    path.split('/')
        .filter_map(|segment| segment.strip_prefix('{')?.strip_suffix('}'))
        .map(|name| Parameter {
            name: name.to_string(),
            location: "path".to_string(),
            required: true,
            description: None,
            schema: SchemaRef::string(),
        })
        .collect()
}

/// Query and header readers of the resolver, with the version as default value
fn version_parameters(resolver: &VersionResolver, version: &ApiVersion) -> Vec<Parameter> {
    resolver
        .readers()
        .iter()
        .filter_map(|reader| {
            let location = match reader.source() {
                VersionSource::Query => "query",
                VersionSource::Header => "header",
                _ => return None,
            };
            Some(Parameter {
                name: reader.parameter().to_string(),
                location: location.to_string(),
                required: false,
                description: Some("Requested API version".to_string()),
                schema: SchemaRef::Inline(serde_json::json!({
                    "type": "string",
                    "default": version.to_string(),
                })),
            })
        })
        .collect()
}
