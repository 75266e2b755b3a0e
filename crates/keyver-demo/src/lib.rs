//! # Keyed Services Demo
//!
//! Versioned controllers over keyed employee services:
//!
//! - `/api/v{version}/KeyedService/*` resolves `Employee` implementations by key
//!   (services in 1.0, repositories in 2.0)
//! - `/v{version}/hello` is served by both versions
//! - `/WeatherForecast` and `/health` are version-neutral
//! - `/openApi/*` serves one OpenAPI document per version (development only
//!   unless `KEYVER_DOCS_ENABLED` is set)

pub mod config;
pub mod controllers;
pub mod docs;
pub mod dto;
pub mod services;
pub mod startup;
pub mod telemetry;

pub use config::{AppConfig, ConfigError, LogFormat};
pub use startup::{build_app, run, StartupError};
