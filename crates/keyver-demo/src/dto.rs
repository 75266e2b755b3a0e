//! Response bodies
//!
//! Field names are PascalCase on the wire and `None` fields are omitted.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use utoipa::ToSchema;
use uuid::Uuid;

/// Message produced by a keyed employee service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct Message {
    #[schema(example = "Hello from EmployeeRepository - v2.0")]
    pub message: String,
}

impl Message {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct EmployeeRecord {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub age: u32,
}

impl EmployeeRecord {
    pub fn new(first_name: &str, last_name: &str, age: u32) -> Self {
        Self {
            id: Uuid::now_v7(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            age,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct WeatherForecast {
    pub date: NaiveDate,
    pub temperature_c: i32,
    pub temperature_f: i32,
    pub summary: Option<String>,
}

impl WeatherForecast {
    pub fn new(date: NaiveDate, temperature_c: i32, summary: &str) -> Self {
        Self {
            date,
            temperature_c,
            temperature_f: 32 + (f64::from(temperature_c) / 0.5556) as i32,
            summary: Some(summary.to_string()),
        }
    }
}

/// RFC 7807 problem body with request correlation fields
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct CustomProblemDetails {
    #[serde(rename = "Type", skip_serializing_if = "Option::is_none")]
    pub problem_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// `METHOD /path` of the rejected request
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<BTreeMap<String, String>>,
}

/// Liveness report
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct HealthReport {
    #[schema(example = "healthy")]
    pub status: String,
    pub version: String,
    pub environment: String,
    /// Registered API versions, newest first
    pub api_versions: Vec<String>,
    /// RFC 3339
    pub timestamp: String,
}
