//! Keyed service controller, version 1.0 (deprecated)
//!
//! Served by the `employeeService` and `tempEmployeeService` bindings.

use super::{version_label, RouteTemplates, API_PREFIX};
use crate::dto::Message;
use crate::services::{Employee, EMPLOYEE_SERVICE, TEMP_EMPLOYEE_SERVICE};
use keyver_core::{
    get, ApiVersion, FromLocator, Json, LocatorError, Request, ResponseDoc, RouteError,
    RouteVersionTable, ServiceLocator,
};
use std::sync::Arc;

const TAG: &str = "Controller Endpoints";

pub struct KeyedServiceV1 {
    employee_service: Arc<dyn Employee>,
    temp_employee_service: Arc<dyn Employee>,
}

impl FromLocator for KeyedServiceV1 {
    fn from_locator(locator: &ServiceLocator) -> Result<Self, LocatorError> {
        Ok(Self {
            employee_service: locator.resolve::<dyn Employee>(EMPLOYEE_SERVICE)?,
            temp_employee_service: locator.resolve::<dyn Employee>(TEMP_EMPLOYEE_SERVICE)?,
        })
    }
}

impl KeyedServiceV1 {
    pub fn register(
        &self,
        table: &mut RouteVersionTable,
        templates: &RouteTemplates,
    ) -> Result<(), RouteError> {
        let version = ApiVersion::v1();

        let employee = Arc::clone(&self.employee_service);
        table.route(
            &templates.versioned(API_PREFIX, "/KeyedService/employee"),
            version,
            get(move |req: Request| async move {
                Json(Message::new(format!("{} - {}", employee.message(), version_label(&req))))
            })
            .summary("Get Employee Message")
            .description("This endpoint gets the message from the Employee keyed service.")
            .tag(TAG)
            .response(200, ResponseDoc::new("Success").schema("Message")),
        )?;

        let temp = Arc::clone(&self.temp_employee_service);
        table.route(
            &templates.versioned(API_PREFIX, "/KeyedService/tempEmployee"),
            version,
            get(move |req: Request| async move {
                Json(Message::new(format!("{} - {}", temp.message(), version_label(&req))))
            })
            .summary("Get Temporary Employee Message")
            .description("This endpoint gets the message from the Temporary Employee keyed service.")
            .tag(TAG)
            .response(200, ResponseDoc::new("Success").schema("Message")),
        )?;

        let employee = Arc::clone(&self.employee_service);
        let temp = Arc::clone(&self.temp_employee_service);
        table.route(
            &templates.versioned(API_PREFIX, "/KeyedService/both"),
            version,
            get(move |req: Request| async move {
                let label = version_label(&req);
                Json(vec![
                    Message::new(format!("{} - {}", employee.message(), label)),
                    Message::new(format!("{} - {}", temp.message(), label)),
                ])
            })
            .summary("Get Messages from Both")
            .description(
                "This endpoint gets the message from both Employee & Temporary Employee keyed services.",
            )
            .tag(TAG)
            .response(200, ResponseDoc::new("Success").schema("Message").list()),
        )?;

        Ok(())
    }
}
