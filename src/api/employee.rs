use actix_web::{HttpResponse, Responder, error::ErrorForbidden, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;
use utoipa::{IntoParams, ToSchema};

use crate::api::{Store, window};
use crate::auth::auth::AuthUser;
use crate::core::report::Page;
use crate::model::employee::{Employee, EmployeePatch, EmployeeStatus};
use crate::service::employee::{self as employees, EmployeeSubmission};
use crate::store::EmployeeFilter;

#[derive(Debug, Deserialize, IntoParams)]
pub struct EmployeeQuery {
    /// Pagination page number (start with 1)
    pub page: Option<u64>,
    pub per_page: Option<u64>,
    #[param(example = "R&D")]
    pub department: Option<String>,
    #[param(value_type = Option<String>, example = "ACTIVE")]
    pub status: Option<EmployeeStatus>,
    /// Matches first name, last name or email
    pub search: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct MeQuery {
    #[param(example = "john.doe@company.com")]
    pub email: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct EmployeeListResponse {
    pub data: Vec<Employee>,
    #[schema(example = 1)]
    pub page: u64,
    #[schema(example = 10)]
    pub per_page: u64,
    #[schema(example = 1)]
    pub total: u64,
    #[schema(example = 1)]
    pub pages: u64,
}

impl From<Page<Employee>> for EmployeeListResponse {
    fn from(p: Page<Employee>) -> Self {
        Self {
            data: p.data,
            page: p.page,
            per_page: p.per_page,
            total: p.total,
            pages: p.pages,
        }
    }
}

/// Create Employee
#[utoipa::path(
    post,
    path = "/api/employees",
    request_body = EmployeeSubmission,
    responses(
        (status = 201, description = "Employee created successfully", body = Object, example = json!({
            "message": "Employee created successfully",
            "data": { "id": 1, "email": "john.doe@company.com", "status": "ACTIVE" }
        })),
        (status = 400, description = "Missing email, malformed user_id or duplicate email"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_employee(
    auth: AuthUser,
    store: Store,
    payload: web::Json<EmployeeSubmission>,
) -> actix_web::Result<impl Responder> {
    let payload = payload.into_inner();

    // self-registration right after signup: the profile must be the caller's own
    if !auth.is_admin() && payload.user_id.as_deref() != Some(auth.user_id.as_str()) {
        return Err(ErrorForbidden("Employees may only register their own profile"));
    }

    let employee = employees::create(store.get_ref(), payload).await?;

    Ok(HttpResponse::Created().json(json!({
        "message": "Employee created successfully",
        "data": employee
    })))
}

/// Employee list with filter and pagination
#[utoipa::path(
    get,
    path = "/api/employees",
    params(EmployeeQuery),
    responses(
        (status = 200, description = "Paginated employee list", body = EmployeeListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_employees(
    auth: AuthUser,
    store: Store,
    query: web::Query<EmployeeQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let query = query.into_inner();
    let (offset, limit) = window(query.page, query.per_page, 10);
    let filter = EmployeeFilter {
        department: query.department,
        status: query.status,
        search: query.search.filter(|s| !s.trim().is_empty()),
    };
    debug!(?filter, offset, limit, "Listing employees");

    let page = employees::list(store.get_ref(), &filter, offset, limit).await?;
    Ok(HttpResponse::Ok().json(EmployeeListResponse::from(page)))
}

/// Profile of the signed-in user, looked up by email
#[utoipa::path(
    get,
    path = "/api/employees/me",
    params(MeQuery),
    responses(
        (status = 200, description = "Employee found", body = Employee),
        (status = 400, description = "email query param is required"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Employee not found")
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn me(
    auth: AuthUser,
    store: Store,
    query: web::Query<MeQuery>,
) -> actix_web::Result<impl Responder> {
    let email = query.email.as_deref().unwrap_or_default();
    let employee = employees::by_email(store.get_ref(), email).await?;

    let own = employee.user_id.as_deref() == Some(auth.user_id.as_str())
        || auth.employee_id == Some(employee.id);
    if !auth.is_admin() && !own {
        return Err(ErrorForbidden("Not allowed to access another employee's profile"));
    }

    Ok(HttpResponse::Ok().json(employee))
}

/// Get Employee
#[utoipa::path(
    get,
    path = "/api/employees/{id}",
    params(
        ("id" = u64, Path, description = "Employee id")
    ),
    responses(
        (status = 200, description = "Employee found", body = Employee),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Employee not found")
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_employee(
    auth: AuthUser,
    store: Store,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let id = path.into_inner();
    auth.require_self_or_admin(id)?;

    let employee = employees::get(store.get_ref(), id).await?;
    Ok(HttpResponse::Ok().json(employee))
}

/// Update Employee
#[utoipa::path(
    put,
    path = "/api/employees/{id}",
    params(
        ("id" = u64, Path, description = "Employee id")
    ),
    request_body = EmployeePatch,
    responses(
        (status = 200, description = "Employee updated", body = Employee),
        (status = 400, description = "No fields to update"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Employee not found")
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_employee(
    auth: AuthUser,
    store: Store,
    path: web::Path<u64>,
    payload: web::Json<EmployeePatch>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let employee = employees::update(store.get_ref(), path.into_inner(), payload.into_inner()).await?;
    Ok(HttpResponse::Ok().json(employee))
}

/// Deactivate Employee
#[utoipa::path(
    delete,
    path = "/api/employees/{id}",
    params(
        ("id" = u64, Path, description = "Employee id")
    ),
    responses(
        (status = 200, description = "Employee deactivated", body = Object, example = json!({
            "message": "Employee deactivated"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Employee not found")
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_employee(
    auth: AuthUser,
    store: Store,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let employee = employees::deactivate(store.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({
        "message": "Employee deactivated",
        "data": employee
    })))
}
