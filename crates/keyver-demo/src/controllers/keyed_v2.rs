//! Keyed service controller, version 2.0
//!
//! Served by the `employeeRepo` and `tempEmployeeRepo` bindings.

use super::{version_label, RouteTemplates, API_PREFIX};
use crate::dto::{CustomProblemDetails, EmployeeRecord, Message};
use crate::services::{Employee, EMPLOYEE_REPO, TEMP_EMPLOYEE_REPO};
use http::StatusCode;
use keyver_core::{
    get, ApiVersion, FromLocator, Json, LocatorError, Problem, Request, ResponseDoc, RouteError,
    RouteVersionTable, ServiceLocator,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use uuid::Uuid;

const TAG: &str = "Keyed Services";
const BAD_REQUEST_TYPE: &str = "https://tools.ietf.org/html/rfc9110#section-15.5.1";

pub struct KeyedServiceV2 {
    employee_repository: Arc<dyn Employee>,
    temp_employee_repository: Arc<dyn Employee>,
}

impl FromLocator for KeyedServiceV2 {
    fn from_locator(locator: &ServiceLocator) -> Result<Self, LocatorError> {
        Ok(Self {
            employee_repository: locator.resolve::<dyn Employee>(EMPLOYEE_REPO)?,
            temp_employee_repository: locator.resolve::<dyn Employee>(TEMP_EMPLOYEE_REPO)?,
        })
    }
}

impl KeyedServiceV2 {
    pub fn register(
        &self,
        table: &mut RouteVersionTable,
        templates: &RouteTemplates,
    ) -> Result<(), RouteError> {
        let version = ApiVersion::v2();

        let employee = Arc::clone(&self.employee_repository);
        table.route(
            &templates.versioned(API_PREFIX, "/KeyedService/employee"),
            version,
            get(move |req: Request| async move {
                Json(Message::new(format!("{} - {}", employee.message(), version_label(&req))))
            })
            .summary("Get Employee")
            .description("This endpoint get's the message from the Employee keyed service.")
            .tag(TAG)
            .response(200, ResponseDoc::new("Success").schema("Message")),
        )?;

        let temp = Arc::clone(&self.temp_employee_repository);
        table.route(
            &templates.versioned(API_PREFIX, "/KeyedService/tempEmployee"),
            version,
            get(move |req: Request| async move {
                Json(Message::new(format!("{} - {}", temp.message(), version_label(&req))))
            })
            .summary("Get Temporary Employee")
            .description(
                "This endpoint get's the message from the Temporary Employee keyed service.",
            )
            .tag(TAG)
            .response(200, ResponseDoc::new("Success").schema("Message")),
        )?;

        let employee = Arc::clone(&self.employee_repository);
        let temp = Arc::clone(&self.temp_employee_repository);
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
            .summary("Get Employees")
            .description(
                "This endpoint get's the message from both Employee & Temporary Employee keyed services.",
            )
            .tag(TAG)
            .response(200, ResponseDoc::new("Success").schema("Message").list()),
        )?;

        table.route(
            &templates.versioned(API_PREFIX, "/KeyedService/Employees"),
            version,
            get(|req: Request| async move { employees(rand::random(), &req) })
                .summary("List of Employees")
                .description("This endpoint get's the list of employees from the database.")
                .tag(TAG)
                .response(
                    200,
                    ResponseDoc::new("Success").schema("EmployeeRecord").list(),
                )
                .response(
                    400,
                    ResponseDoc::new("Bad Request").schema("CustomProblemDetails"),
                ),
        )?;

        Ok(())
    }
}

/// The employee list, or a problem body when the request is rejected
pub fn employees(
    accepted: bool,
    req: &Request,
) -> Result<Json<Vec<EmployeeRecord>>, Problem<CustomProblemDetails>> {
    if accepted {
        return Ok(Json(vec![
            EmployeeRecord::new("Durgesh", "Shukla", 48),
            EmployeeRecord::new("Dhruv", "Trivedi", 51),
            EmployeeRecord::new("Jiten", "Shahani", 49),
            EmployeeRecord::new("Rahul", "Pal", 32),
        ]));
    }

    tracing::debug!(path = %req.path(), "Employees request randomly rejected");
    Err(Problem::new(
        StatusCode::BAD_REQUEST,
        CustomProblemDetails {
            problem_type: Some(BAD_REQUEST_TYPE.to_string()),
            title: Some("Bad Request".to_string()),
            status: Some(StatusCode::BAD_REQUEST.as_u16()),
            detail: None,
            instance: Some(format!("{} {}", req.method(), req.path())),
            trace_id: Some(Uuid::new_v4().simple().to_string()),
            request_id: req.request_id().map(str::to_string),
            errors: Some(BTreeMap::from([(
                "Message".to_string(),
                "The request was randomly rejected to simulate a Bad Request scenario."
                    .to_string(),
            )])),
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(uri: &str) -> Request {
        Request::from_http(
            http::Request::builder()
                .uri(uri)
                .body(Default::default())
                .unwrap(),
        )
    }

    #[test]
    fn test_accepted_lists_four_employees() {
        let Ok(Json(list)) = employees(true, &request("/api/v2.0/KeyedService/Employees"))
        else {
            panic!("expected employee list");
        };

        assert_eq!(list.len(), 4);
        assert_eq!(list[2].first_name, "Jiten");
    }

    #[test]
    fn test_rejected_returns_problem() {
        let Err(problem) = employees(false, &request("/api/v2.0/KeyedService/Employees"))
        else {
            panic!("expected problem");
        };

        assert_eq!(problem.status, StatusCode::BAD_REQUEST);
        assert_eq!(
            problem.body.instance.as_deref(),
            Some("GET /api/v2.0/KeyedService/Employees")
        );
        assert_eq!(problem.body.status, Some(400));
        assert!(problem.body.errors.unwrap().contains_key("Message"));
    }
}
