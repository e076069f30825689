use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::{IntoParams, ToSchema};

use crate::api::{PageQuery, Store, window};
use crate::auth::auth::AuthUser;
use crate::config::Config;
use crate::core::leave::LeaveBalance;
use crate::core::report::{LeaveSummary, Page};
use crate::error::AppError;
use crate::model::leave_request::{LeaveRequest, LeaveStatus, LeaveType};
use crate::service::leave::{self as leaves, LeaveReport, LeaveSubmission};
use crate::store::LeaveFilter;

#[derive(Debug, Deserialize, IntoParams)]
pub struct MyLeavesQuery {
    #[param(value_type = Option<String>, example = "PENDING")]
    pub status: Option<LeaveStatus>,
    #[param(value_type = Option<String>, example = "SICK")]
    pub leave_type: Option<LeaveType>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct LeaveReportQuery {
    #[param(example = "R&D")]
    pub department: Option<String>,
    #[param(value_type = Option<String>, example = "APPROVED")]
    pub status: Option<LeaveStatus>,
    /// Leaves starting on or after this date
    #[param(example = "2026-01-01", value_type = Option<String>)]
    pub from_date: Option<NaiveDate>,
    /// Leaves ending on or before this date
    #[param(example = "2026-12-31", value_type = Option<String>)]
    pub to_date: Option<NaiveDate>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LeaveDecision {
    #[schema(example = "APPROVED")]
    pub status: Option<LeaveStatus>,
}

#[derive(Serialize, ToSchema)]
#[schema(example = json!({
    "data": [
        {
            "id": 1,
            "employee_id": 1000,
            "leave_type": "SICK",
            "start_date": "2026-01-06",
            "end_date": "2026-01-07",
            "reason": "flu",
            "status": "PENDING",
            "days_requested": 2
        }
    ],
    "page": 1,
    "per_page": 50,
    "total": 1,
    "pages": 1
}))]
pub struct LeaveListResponse {
    pub data: Vec<LeaveRequest>,
    pub page: u64,
    pub per_page: u64,
    pub total: u64,
    pub pages: u64,
}

impl From<Page<LeaveRequest>> for LeaveListResponse {
    fn from(p: Page<LeaveRequest>) -> Self {
        Self {
            data: p.data,
            page: p.page,
            per_page: p.per_page,
            total: p.total,
            pages: p.pages,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct LeaveReportResponse {
    pub summary: LeaveSummary,
    pub data: Vec<LeaveRequest>,
    pub page: u64,
    pub per_page: u64,
    pub total: u64,
    pub pages: u64,
}

impl From<LeaveReport> for LeaveReportResponse {
    fn from(r: LeaveReport) -> Self {
        Self {
            summary: r.summary,
            data: r.page.data,
            page: r.page.page,
            per_page: r.page.per_page,
            total: r.page.total,
            pages: r.page.pages,
        }
    }
}

/* =========================
Request leave
========================= */
#[utoipa::path(
    post,
    path = "/api/leaves/request",
    request_body(
        content = LeaveSubmission,
        description = "Leave request payload",
        content_type = "application/json"
    ),
    responses(
        (status = 201, description = "Leave requested successfully", body = Object, example = json!({
            "message": "Leave requested successfully",
            "data": { "id": 1, "status": "PENDING", "days_requested": 2 }
        })),
        (status = 400, description = "Missing field or end date before start date"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Employee not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn request_leave(
    auth: AuthUser,
    store: Store,
    payload: web::Json<LeaveSubmission>,
) -> actix_web::Result<impl Responder> {
    let mut submission = payload.into_inner();
    if submission.employee_id.is_none() && !auth.is_admin() {
        submission.employee_id = auth.employee_id;
    }
    if let Some(id) = submission.employee_id {
        auth.require_self_or_admin(id)?;
    }

    let leave = leaves::request_leave(store.get_ref(), submission).await?;

    Ok(HttpResponse::Created().json(json!({
        "message": "Leave requested successfully",
        "data": leave
    })))
}

/* =========================
Employee's own leaves
========================= */
#[utoipa::path(
    get,
    path = "/api/leaves/my-leaves/{employee_id}",
    params(
        ("employee_id" = u64, Path, description = "Employee id"),
        MyLeavesQuery
    ),
    responses(
        (status = 200, description = "Leaves of the employee, newest first", body = Vec<LeaveRequest>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn my_leaves(
    auth: AuthUser,
    store: Store,
    path: web::Path<u64>,
    query: web::Query<MyLeavesQuery>,
) -> actix_web::Result<impl Responder> {
    let employee_id = path.into_inner();
    auth.require_self_or_admin(employee_id)?;

    let rows =
        leaves::employee_leaves(store.get_ref(), employee_id, query.status, query.leave_type)
            .await?;
    Ok(HttpResponse::Ok().json(rows))
}

/* =========================
Pending queue (Admin)
========================= */
#[utoipa::path(
    get,
    path = "/api/leaves/pending",
    params(PageQuery),
    responses(
        (status = 200, description = "Pending leave requests", body = LeaveListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn pending(
    auth: AuthUser,
    store: Store,
    query: web::Query<PageQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let (offset, limit) = query.window(50);
    let page = leaves::pending(store.get_ref(), offset, limit).await?;

    Ok(HttpResponse::Ok().json(LeaveListResponse::from(page)))
}

/* =========================
Balance per leave type
========================= */
#[utoipa::path(
    get,
    path = "/api/leaves/balance/{employee_id}",
    params(
        ("employee_id" = u64, Path, description = "Employee id")
    ),
    responses(
        (status = 200, description = "Quota, usage and remainder per leave type", body = Object, example = json!({
            "SICK": { "total": 5, "used": 2, "remaining": 3 },
            "CASUAL": { "total": 10, "used": 0, "remaining": 10 },
            "VACATION": { "total": 15, "used": 0, "remaining": 15 },
            "OTHERS": { "total": 5, "used": 0, "remaining": 5 }
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Employee not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn balance(
    auth: AuthUser,
    store: Store,
    config: web::Data<Config>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let employee_id = path.into_inner();
    auth.require_self_or_admin(employee_id)?;

    let balance: LeaveBalance =
        leaves::balance(store.get_ref(), employee_id, &config.leave_quotas).await?;
    Ok(HttpResponse::Ok().json(balance))
}

/* =========================
Approve / reject (Admin)
========================= */
#[utoipa::path(
    put,
    path = "/api/leaves/status/{leave_id}",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to decide")
    ),
    request_body = LeaveDecision,
    responses(
        (status = 200, description = "Leave decided", body = Object, example = json!({
            "message": "Leave APPROVED",
            "data": { "id": 1, "status": "APPROVED" }
        })),
        (status = 400, description = "Invalid status or leave request already processed", body = Object, example = json!({
            "error": "ConflictError",
            "message": "Leave request already processed"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave request not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn update_status(
    auth: AuthUser,
    store: Store,
    path: web::Path<u64>,
    payload: web::Json<LeaveDecision>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let leave_id = path.into_inner();
    let decision = payload.status.ok_or_else(|| {
        AppError::Validation("Invalid status. Must be APPROVED or REJECTED".to_string())
    })?;

    let leave = leaves::decide_leave(store.get_ref(), leave_id, decision).await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": format!("Leave {}", leave.status),
        "data": leave
    })))
}

/* =========================
Leave report (Admin)
========================= */
#[utoipa::path(
    get,
    path = "/api/leaves/report",
    params(LeaveReportQuery),
    responses(
        (status = 200, description = "Status counts plus one page of leave requests", body = LeaveReportResponse),
        (status = 400, description = "end date cannot be before start date"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn report(
    auth: AuthUser,
    store: Store,
    query: web::Query<LeaveReportQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let query = query.into_inner();
    let (offset, limit) = window(query.page, query.per_page, 100);
    let filter = LeaveFilter {
        department: query.department,
        status: query.status,
        from_date: query.from_date,
        to_date: query.to_date,
        ..LeaveFilter::default()
    };

    let report = leaves::report(store.get_ref(), &filter, offset, limit).await?;
    Ok(HttpResponse::Ok().json(LeaveReportResponse::from(report)))
}
