//! Keyed employee services
//!
//! Four implementations of [`Employee`] are bound under distinct keys; the
//! controllers and [`ServiceValidator`] pick theirs by key.

use keyver_core::{Capability, FromLocator, LocatorError, ServiceLocator};
use std::sync::Arc;

pub const EMPLOYEE_REPO: &str = "employeeRepo";
pub const TEMP_EMPLOYEE_REPO: &str = "tempEmployeeRepo";
pub const EMPLOYEE_SERVICE: &str = "employeeService";
pub const TEMP_EMPLOYEE_SERVICE: &str = "tempEmployeeService";

/// A message-producing employee service
pub trait Employee: Send + Sync {
    fn message(&self) -> String;
}

impl Capability for dyn Employee {
    const NAME: &'static str = "employee";
}

#[derive(Debug, Default)]
pub struct EmployeeRepository;

impl Employee for EmployeeRepository {
    fn message(&self) -> String {
        "Hello from EmployeeRepository".to_string()
    }
}

#[derive(Debug, Default)]
pub struct TempEmployeeRepository;

impl Employee for TempEmployeeRepository {
    fn message(&self) -> String {
        "Hello from TempEmployeeRepository".to_string()
    }
}

#[derive(Debug, Default)]
pub struct EmployeeService;

impl Employee for EmployeeService {
    fn message(&self) -> String {
        "Hello from EmployeeService".to_string()
    }
}

#[derive(Debug, Default)]
pub struct TempEmployeeService;

impl Employee for TempEmployeeService {
    fn message(&self) -> String {
        "Hello from TempEmployeeService".to_string()
    }
}

/// Depends on both repositories; constructed once during startup so a
/// missing binding fails before the server starts
pub struct ServiceValidator {
    pub employee_repository: Arc<dyn Employee>,
    pub temp_employee_repository: Arc<dyn Employee>,
}

impl FromLocator for ServiceValidator {
    fn from_locator(locator: &ServiceLocator) -> Result<Self, LocatorError> {
        Ok(Self {
            employee_repository: locator.resolve::<dyn Employee>(EMPLOYEE_REPO)?,
            temp_employee_repository: locator.resolve::<dyn Employee>(TEMP_EMPLOYEE_REPO)?,
        })
    }
}

/// Bind all employee services and validate their consumers
pub fn locator() -> Result<ServiceLocator, LocatorError> {
    let mut builder = ServiceLocator::builder();
    builder.bind::<dyn Employee>(EMPLOYEE_REPO, Arc::new(EmployeeRepository))?;
    builder.bind::<dyn Employee>(TEMP_EMPLOYEE_REPO, Arc::new(TempEmployeeRepository))?;
    builder.bind::<dyn Employee>(EMPLOYEE_SERVICE, Arc::new(EmployeeService))?;
    builder.bind::<dyn Employee>(TEMP_EMPLOYEE_SERVICE, Arc::new(TempEmployeeService))?;
    builder.validate_consumer::<ServiceValidator>();
    builder.build()
}
