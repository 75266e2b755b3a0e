//! Application configuration
//!
//! Read from `KEYVER_*` environment variables (optionally seeded from a
//! `.env` file):
//!
//! ```text
//! KEYVER_HOST=0.0.0.0
//! KEYVER_PORT=8080
//! KEYVER_DEFAULT_VERSION=2.0
//! KEYVER_VERSION_READERS=path,query,header
//! KEYVER_LOG_FORMAT=pretty
//! KEYVER_BODY_LIMIT=0          # no request body limit
//! ```

use keyver_core::{
    ApiVersion, Environment, DEFAULT_BODY_LIMIT, StrategyError, VersionParseError, VersionResolver, VersionStrategy,
};
use serde::Deserialize;

/// Prefix of every configuration variable
pub const ENV_PREFIX: &str = "KEYVER_";

/// Configuration loading failures
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("configuration error: {0}")]
    Env(#[from] envy::Error),
    #[error("invalid default version '{value}': {source}")]
    DefaultVersion {
        value: String,
        source: VersionParseError,
    },
    #[error("invalid version reader configuration: {0}")]
    Reader(#[from] StrategyError),
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Pretty,
}

/// Typed application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// `development`, `production` or a custom name
    #[serde(default = "default_env")]
    pub env: String,
    /// Version used when a request names none; empty for no default
    #[serde(default = "default_version")]
    pub default_version: String,
    /// Readers in the order they are tried
    #[serde(default = "default_readers")]
    pub version_readers: Vec<String>,
    #[serde(default = "default_query_param")]
    pub query_param: String,
    #[serde(default = "default_header_name")]
    pub header_name: String,
    #[serde(default = "default_query_param")]
    pub media_type_param: String,
    #[serde(default = "default_path_pattern")]
    pub path_pattern: String,
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
    #[serde(default)]
    pub log_format: LogFormat,
    /// Serve documentation routes; defaults to development only
    #[serde(default)]
    pub docs_enabled: Option<bool>,
    /// Request body limit in bytes; 0 disables the limit
    #[serde(default = "default_body_limit")]
    pub body_limit: usize,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_env() -> String {
    "development".to_string()
}

fn default_version() -> String {
    "2.0".to_string()
}

fn default_readers() -> Vec<String> {
    vec!["path".to_string()]
}

fn default_query_param() -> String {
    "api-version".to_string()
}

fn default_header_name() -> String {
    "x-api-version".to_string()
}

fn default_path_pattern() -> String {
    "v{version}".to_string()
}

fn default_body_limit() -> usize {
    DEFAULT_BODY_LIMIT
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            env: default_env(),
            default_version: default_version(),
            version_readers: default_readers(),
            query_param: default_query_param(),
            header_name: default_header_name(),
            media_type_param: default_query_param(),
            path_pattern: default_path_pattern(),
            log_filter: default_log_filter(),
            log_format: LogFormat::default(),
            docs_enabled: None,
            body_limit: default_body_limit(),
        }
    }
}

/// Load variables from `.env` if present; existing variables win
pub fn load_dotenv() {
    let _ = dotenvy::dotenv();
}

impl AppConfig {
    /// Read the configuration from `KEYVER_*` environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let config: Self = envy::prefixed(ENV_PREFIX).from_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Read the configuration from explicit `(name, value)` pairs
    pub fn from_vars<I>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let config: Self = envy::prefixed(ENV_PREFIX).from_iter(vars)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every derived setting
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.resolver().map(|_| ())
    }

    /// Socket address to bind
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn environment(&self) -> Environment {
        Environment::from_name(&self.env)
    }

    pub fn docs_enabled(&self) -> bool {
        self.docs_enabled
            .unwrap_or_else(|| self.environment().is_development())
    }

    /// Parsed default version, `None` when unset
    pub fn default_version(&self) -> Result<Option<ApiVersion>, ConfigError> {
        let value = self.default_version.trim();
        if value.is_empty() {
            return Ok(None);
        }
        value
            .parse()
            .map(Some)
            .map_err(|source| ConfigError::DefaultVersion {
                value: value.to_string(),
                source,
            })
    }

    /// Reader strategies in configured order
    pub fn strategies(&self) -> Result<Vec<VersionStrategy>, ConfigError> {
        self.version_readers
            .iter()
            .filter(|name| !name.trim().is_empty())
            .map(|name| -> Result<VersionStrategy, ConfigError> {
                let strategy = match name.parse::<VersionStrategy>()? {
                    VersionStrategy::Path { .. } => VersionStrategy::Path {
                        pattern: self.path_pattern.clone(),
                    },
                    VersionStrategy::Query { .. } => VersionStrategy::Query {
                        param: self.query_param.clone(),
                    },
                    VersionStrategy::Header { .. } => VersionStrategy::Header {
                        name: self.header_name.clone(),
                    },
                    VersionStrategy::MediaType { .. } => VersionStrategy::MediaType {
                        param: self.media_type_param.clone(),
                    },
                };
                Ok(strategy)
            })
            .collect()
    }

    /// Resolver built from the reader settings and default version
    pub fn resolver(&self) -> Result<VersionResolver, ConfigError> {
        let resolver = VersionResolver::with_strategies(self.strategies()?)?;
        Ok(resolver.default_version(self.default_version()?))
    }
}
