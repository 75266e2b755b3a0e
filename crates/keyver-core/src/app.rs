//! Keyver application

use crate::dispatch::{Dispatcher, RouteVersionTable};
use crate::registry::VersionRegistry;
use crate::router::RouteError;
use crate::server::{Server, DEFAULT_BODY_LIMIT};
use crate::strategy::VersionResolver;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A validated, ready-to-serve application
///
/// # Example
///
/// ```rust,ignore
/// let mut registry = VersionRegistry::new();
/// registry.deprecated(ApiVersion::v1(), None)?;
/// registry.supported(ApiVersion::v2())?;
///
/// let mut routes = RouteVersionTable::new();
/// routes.route_versions("/v{version}/hello", [ApiVersion::v1(), ApiVersion::v2()], get(hello))?;
///
/// KeyverApp::new(registry, VersionResolver::new(), routes)?
///     .run("127.0.0.1:8080")
///     .await
/// ```
#[derive(Debug, Clone)]
pub struct KeyverApp {
    dispatcher: Arc<Dispatcher>,
    body_limit: Option<usize>,
}

impl KeyverApp {
    /// Seal the registry and validate the route table against it
    pub fn new(
        registry: VersionRegistry,
        resolver: VersionResolver,
        routes: RouteVersionTable,
    ) -> Result<Self, RouteError> {
        let dispatcher = Dispatcher::new(registry, resolver, routes)?;

        for record in dispatcher.registry().describe_all() {
            tracing::info!(
                version = %record.version,
                deprecated = record.deprecated,
                sunset = ?record.sunset.as_ref().and_then(|p| p.date),
                "API version available"
            );
        }
        tracing::info!(
            routes = dispatcher.table().len(),
            default_version = ?dispatcher.resolver().get_default(),
            readers = ?dispatcher
                .resolver()
                .readers()
                .iter()
                .map(|r| r.source().to_string())
                .collect::<Vec<_>>(),
            "Route table ready"
        );

        Ok(Self {
            dispatcher: Arc::new(dispatcher),
            body_limit: Some(DEFAULT_BODY_LIMIT),
        })
    }

    /// Set the request body limit in bytes (default 1MB)
    ///
    /// Larger bodies are answered with 413 Payload Too Large.
    pub fn body_limit(mut self, limit: usize) -> Self {
        self.body_limit = Some(limit);
        self
    }

    /// Accept request bodies of any size
    pub fn no_body_limit(mut self) -> Self {
        self.body_limit = None;
        self
    }

    /// The configured request body limit
    pub fn get_body_limit(&self) -> Option<usize> {
        self.body_limit
    }

    /// The dispatcher serving this application
    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    /// Run the server until Ctrl+C
    pub async fn run(self, addr: &str) -> Result<(), BoxError> {
        self.run_until(addr, shutdown_signal()).await
    }

    /// Run the server until `shutdown` completes
    pub async fn run_until<F>(self, addr: &str, shutdown: F) -> Result<(), BoxError>
    where
        F: Future<Output = ()> + Send,
    {
        let addr: SocketAddr = addr.parse()?;
        let listener = TcpListener::bind(addr).await?;
        self.serve(listener, shutdown).await
    }

    /// Serve on an already bound listener
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> Result<(), BoxError>
    where
        F: Future<Output = ()> + Send,
    {
        Server::new(self.dispatcher, self.body_limit).run_until(listener, shutdown).await
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }
}
