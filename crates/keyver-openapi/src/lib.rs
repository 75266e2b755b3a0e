//! OpenAPI documentation for Keyver
//!
//! One document per registered API version, built from the version
//! registry and the route table:
//!
//! - [`DocumentAssembler`] turns version records into [`VersionDocument`]s
//!   whose narrative covers deprecation, sunset date and sunset links.
//! - [`OpenApiSpec`] renders the OpenAPI 3.0 JSON of one version, with the
//!   version substituted into route templates.
//! - [`DocumentCatalog`] lists the documents for a documentation UI.
//! - [`ApiDocs`] bundles all of the above and serves it from
//!   version-neutral routes.
//!
//! # Usage
//!
//! ```rust,ignore
//! let docs = Arc::new(
//!     ApiDocs::builder(OpenApiConfig::new("Keyed Services Demo"))
//!         .schema::<Message>()
//!         .build(&registry, &resolver, &routes),
//! );
//! docs.mount(&mut routes)?;
//! ```

mod catalog;
mod config;
mod docs;
mod document;
mod schemas;
mod spec;

pub use catalog::{CatalogEntry, DocumentCatalog};
pub use config::{Contact, License, OpenApiConfig, GROUP_PLACEHOLDER};
pub use docs::{ApiDocs, ApiDocsBuilder};
pub use document::{DocumentAssembler, VersionDocument, DEPRECATION_NOTICE};
pub use schemas::{ErrorBodySchema, ErrorSchema, FieldErrorSchema, VersionDetailsSchema};
pub use spec::{ApiInfo, MediaType, OpenApiSpec, Operation, Parameter, PathItem, ResponseSpec, SchemaRef};

// Re-export utoipa's ToSchema derive macro as Schema
pub use utoipa::ToSchema as Schema;
