//! Path routing using a radix tree (matchit)
//!
//! Route templates use `{param}` segments and may contain the literal
//! version segment of the path reader (e.g. `/api/v{version}/KeyedService/employee`).
//! The version segment is stripped before a template is inserted, so every
//! version of a template shares one tree entry; the dispatcher picks the
//! version-specific handler afterwards.
//!
//! ```rust,ignore
//! let methods = get(list_employees)
//!     .post(create_employee)
//!     .summary("Employees")
//!     .tag("KeyedService");
//! ```

use crate::handler::{into_boxed_handler, BoxedHandler, Handler};
use crate::version::ApiVersion;
use http::Method;
use matchit::Router as MatchitRouter;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Route table construction errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RouteError {
    #[error("{method} '{template}' is already registered for version {version}")]
    DuplicateRoute {
        template: String,
        version: ApiVersion,
        method: Method,
    },
    #[error("{method} '{template}' is already registered as version-neutral")]
    DuplicateNeutralRoute { template: String, method: Method },
    #[error("route '{template}' targets API version {version}, which is not registered")]
    UnknownVersion {
        template: String,
        version: ApiVersion,
    },
    #[error("route '{new}' conflicts with '{existing}': {details}")]
    Conflict {
        new: String,
        existing: String,
        details: String,
    },
}

/// Documentation attached to an operation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OperationDoc {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Declared responses by status code
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub responses: BTreeMap<u16, ResponseDoc>,
}

/// A documented response of an operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResponseDoc {
    pub description: String,
    /// Component schema name of the body
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    /// Body is an array of `schema`
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub list: bool,
}

impl ResponseDoc {
    /// A response without a documented body
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            schema: None,
            list: false,
        }
    }

    /// Set the body schema
    pub fn schema(mut self, name: impl Into<String>) -> Self {
        self.schema = Some(name.into());
        self
    }

    /// Mark the body as an array of the schema
    pub fn list(mut self) -> Self {
        self.list = true;
        self
    }
}

/// HTTP method router for a single (route, version) pair
#[derive(Clone, Default)]
pub struct MethodRouter {
    handlers: HashMap<Method, BoxedHandler>,
    doc: OperationDoc,
}

impl MethodRouter {
    /// Create a new empty method router
    pub fn new() -> Self {
        Self::default()
    }

    fn on<H, T>(mut self, method: Method, handler: H) -> Self
    where
        H: Handler<T>,
        T: 'static,
    {
        self.handlers.insert(method, into_boxed_handler(handler));
        self
    }

    /// Add a GET handler
    pub fn get<H: Handler<T>, T: 'static>(self, handler: H) -> Self {
        self.on(Method::GET, handler)
    }

    /// Add a POST handler
    pub fn post<H: Handler<T>, T: 'static>(self, handler: H) -> Self {
        self.on(Method::POST, handler)
    }

    /// Set the operation summary
    pub fn summary(mut self, summary: impl Into<String>) -> Self {
        self.doc.summary = Some(summary.into());
        self
    }

    /// Set the operation description
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.doc.description = Some(description.into());
        self
    }

    /// Add a documentation tag
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.doc.tags.push(tag.into());
        self
    }

    /// Document a response
    ///
    /// ```rust,ignore
    /// get(list).response(200, ResponseDoc::new("Success").schema("Employee").list())
    /// ```
    pub fn response(mut self, status: u16, response: ResponseDoc) -> Self {
        self.doc.responses.insert(status, response);
        self
    }

    /// Merge the handlers of another method router into this one
    ///
    /// Fails with the first method both routers handle; nothing is merged then.
    pub(crate) fn merge(&mut self, other: MethodRouter) -> Result<(), Method> {
        if let Some(method) = other.handlers.keys().find(|m| self.handlers.contains_key(*m)) {
            return Err(method.clone());
        }
        self.handlers.extend(other.handlers);
        if self.doc == OperationDoc::default() {
            self.doc = other.doc;
        }
        Ok(())
    }

    /// Get handler for a method
    pub(crate) fn handler(&self, method: &Method) -> Option<&BoxedHandler> {
        self.handlers.get(method)
    }

    /// Registered methods, sorted by name
    pub fn methods(&self) -> Vec<Method> {
        let mut methods: Vec<Method> = self.handlers.keys().cloned().collect();
        methods.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        methods
    }

    /// Operation documentation
    pub fn doc(&self) -> &OperationDoc {
        &self.doc
    }
}

impl std::fmt::Debug for MethodRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MethodRouter")
            .field("methods", &self.methods())
            .field("doc", &self.doc)
            .finish()
    }
}

/// Create a GET method router
pub fn get<H: Handler<T>, T: 'static>(handler: H) -> MethodRouter {
    MethodRouter::new().get(handler)
}

/// Create a POST method router
pub fn post<H: Handler<T>, T: 'static>(handler: H) -> MethodRouter {
    MethodRouter::new().post(handler)
}

/// Radix tree from version-free paths to route templates
pub(crate) struct PathRouter {
    inner: MatchitRouter<String>,
    /// matchit path -> template that owns it
    registered: BTreeMap<String, String>,
}

impl Default for PathRouter {
    fn default() -> Self {
        Self {
            inner: MatchitRouter::new(),
            registered: BTreeMap::new(),
        }
    }
}

impl PathRouter {
    /// Insert a version-free path for a template
    ///
    /// Re-inserting the same path for the same template is a no-op.
    pub(crate) fn insert(&mut self, stripped: &str, template: &str) -> Result<(), RouteError> {
        let matchit_path = convert_path_params(stripped);

        match self.registered.get(&matchit_path) {
            Some(owner) if owner == template => return Ok(()),
            Some(owner) => {
                return Err(RouteError::Conflict {
                    new: template.to_string(),
                    existing: owner.clone(),
                    details: format!("both routes match '{}'", stripped),
                })
            }
            None => {}
        }

        if let Err(err) = self.inner.insert(matchit_path.clone(), template.to_string()) {
            return Err(RouteError::Conflict {
                new: template.to_string(),
                existing: self
                    .find_conflicting(&matchit_path)
                    .unwrap_or("<unknown>")
                    .to_string(),
                details: err.to_string(),
            });
        }

        self.registered.insert(matchit_path, template.to_string());
        Ok(())
    }

    /// Match a version-free request path
    pub(crate) fn at(&self, path: &str) -> Option<(&str, HashMap<String, String>)> {
        let matched = self.inner.at(path).ok()?;
        let params = matched
            .params
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Some((matched.value.as_str(), params))
    }

    fn find_conflicting(&self, matchit_path: &str) -> Option<&str> {
        let normalized = normalize_path_for_comparison(matchit_path);
        self.registered
            .iter()
            .find(|(path, _)| normalize_path_for_comparison(path) == normalized)
            .map(|(_, template)| template.as_str())
    }
}

/// Convert {param} style to :param for matchit
pub(crate) fn convert_path_params(path: &str) -> String {
    let mut result = String::with_capacity(path.len());

    for ch in path.chars() {
        match ch {
            '{' => result.push(':'),
            '}' => {}
            _ => result.push(ch),
        }
    }

    result
}

/// Replace parameter names with a placeholder
fn normalize_path_for_comparison(path: &str) -> String {
    let mut result = String::with_capacity(path.len());
    let mut in_param = false;

    for ch in path.chars() {
        match ch {
            ':' => {
                in_param = true;
                result.push_str(":_");
            }
            '/' => {
                in_param = false;
                result.push('/');
            }
            _ if in_param => {}
            _ => result.push(ch),
        }
    }

    result
}
