//! Prebuilt documentation for an application
//!
//! [`ApiDocs`] is built once at startup from the registry, resolver and
//! route table, then served read-only from version-neutral routes.

use crate::catalog::DocumentCatalog;
use crate::config::{OpenApiConfig, GROUP_PLACEHOLDER};
use crate::document::{DocumentAssembler, VersionDocument};
use crate::schemas::{ErrorBodySchema, ErrorSchema, FieldErrorSchema, VersionDetailsSchema};
use crate::spec::{schema_of, OpenApiSpec};
use keyver_core::{
    get, ApiError, ApiVersion, IntoResponse, Json, Request, Response, RouteError,
    RouteVersionTable, VersionRegistry, VersionResolver,
};
use std::collections::BTreeMap;
use std::sync::Arc;

const DOCUMENT_PARAM: &str = "document";

/// Builder for [`ApiDocs`]
#[derive(Debug, Clone)]
pub struct ApiDocsBuilder {
    assembler: DocumentAssembler,
    schemas: BTreeMap<String, serde_json::Value>,
}

impl ApiDocsBuilder {
    /// Register a component schema shared by every version document
    pub fn schema<T: for<'a> utoipa::ToSchema<'a>>(mut self) -> Self {
        let (name, schema) = schema_of::<T>();
        if let Some(schema) = schema {
            self.schemas.insert(name, schema);
        }
        self
    }

    /// Assemble documents, catalog and one OpenAPI spec per version
    pub fn build(
        self,
        registry: &VersionRegistry,
        resolver: &VersionResolver,
        table: &RouteVersionTable,
    ) -> ApiDocs {
        let documents = self.assembler.build(registry);
        let catalog = DocumentCatalog::new(&documents, self.assembler.config());

        let specs = registry
            .describe_all()
            .into_iter()
            .zip(&documents)
            .map(|(record, document)| {
                let mut spec = OpenApiSpec::from_document(document)
                    .register::<ErrorSchema>()
                    .register::<ErrorBodySchema>()
                    .register::<FieldErrorSchema>()
                    .register::<VersionDetailsSchema>()
                    .routes(table, resolver, &record.version, record.deprecated);
                spec.schemas.extend(self.schemas.clone());

                tracing::debug!(
                    group = %document.group_name,
                    paths = spec.paths.len(),
                    "OpenAPI document built"
                );
                (document.group_name.clone(), spec.to_json())
            })
            .collect();

        ApiDocs {
            config: self.assembler.config().clone(),
            documents,
            catalog,
            specs,
        }
    }
}

/// Documents, catalog and OpenAPI JSON for every registered version
#[derive(Debug, Clone)]
pub struct ApiDocs {
    config: OpenApiConfig,
    documents: Vec<VersionDocument>,
    catalog: DocumentCatalog,
    specs: BTreeMap<String, serde_json::Value>,
}

impl ApiDocs {
    pub fn builder(config: OpenApiConfig) -> ApiDocsBuilder {
        ApiDocsBuilder {
            assembler: DocumentAssembler::new(config),
            schemas: BTreeMap::new(),
        }
    }

    pub fn config(&self) -> &OpenApiConfig {
        &self.config
    }

    /// Version documents, newest first
    pub fn documents(&self) -> &[VersionDocument] {
        &self.documents
    }

    pub fn catalog(&self) -> &DocumentCatalog {
        &self.catalog
    }

    /// OpenAPI JSON of a version group (`v1`, `v2`, ...)
    pub fn spec(&self, group: &str) -> Option<&serde_json::Value> {
        self.specs.get(group)
    }

    /// OpenAPI JSON of a version
    pub fn spec_for(&self, version: &ApiVersion) -> Option<&serde_json::Value> {
        self.spec(&version.group_name())
    }

    /// Register the catalog and document routes as version-neutral routes
    ///
    /// With the default configuration these are `/openApi/documents.json`
    /// and `/openApi/{group}.json`.
    pub fn mount(self: Arc<Self>, table: &mut RouteVersionTable) -> Result<(), RouteError> {
        let (template, prefix, suffix) = document_route(&self.config.document_path);

        let catalog = Arc::clone(&self);
        table.neutral(
            &self.config.catalog_path,
            get(move || async move { Json(catalog.catalog.clone()) })
            .summary("Documentation catalog")
            .tag("Documentation"),
        )?;

        let docs = Arc::clone(&self);
        table.neutral(
            &template,
            get(move |req: Request| async move { docs.serve_document(&req, &prefix, &suffix) })
            .summary("OpenAPI document of one API version")
            .tag("Documentation"),
        )?;

        tracing::debug!(
            catalog = %self.config.catalog_path,
            documents = %template,
            "Documentation routes mounted"
        );
        Ok(())
    }

    fn serve_document(&self, req: &Request, prefix: &str, suffix: &str) -> Response {
        let group = req
            .path_param(DOCUMENT_PARAM)
            .and_then(|segment| segment.strip_prefix(prefix)?.strip_suffix(suffix));

        match group.and_then(|group| self.spec(group)) {
            Some(spec) => Json(spec.clone()).into_response(),
            None => ApiError::not_found(format!("No API document at '{}'", req.path()))
                .into_response(),
        }
    }
}

/// Route template for the document path, plus the text around `{group}`
///
/// `/openApi/{group}.json` becomes `/openApi/{document}` with prefix `""`
/// and suffix `".json"`.
fn document_route(document_path: &str) -> (String, String, String) {
    let mut prefix = String::new();
    let mut suffix = String::new();

    let template = document_path
        .split('/')
        .map(|segment| match segment.split_once(GROUP_PLACEHOLDER) {
            Some((before, after)) => {
                prefix = before.to_string();
                suffix = after.to_string();
                format!("{{{}}}", DOCUMENT_PARAM)
            }
            None => segment.to_string(),
        })
        .collect::<Vec<_>>()
        .join("/");

    (template, prefix, suffix)
}
