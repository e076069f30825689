use actix_web::{HttpResponse, Responder, web};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::{IntoParams, ToSchema};

use crate::api::{PageQuery, Store, window};
use crate::auth::auth::AuthUser;
use crate::config::Config;
use crate::core::report::{Page, ReportSummary};
use crate::error::AppError;
use crate::model::attendance::AttendanceRecord;
use crate::service::attendance::{self as attendance, AttendanceReport, DailySummary};
use crate::store::{AttendanceFilter, RecordStore};

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CheckInRequest {
    /// Admins may check someone else in; employees default to themselves
    #[schema(example = 1000)]
    pub employee_id: Option<u64>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct MarkAbsentRequest {
    #[schema(example = 1000)]
    pub employee_id: Option<u64>,
    #[schema(example = "2026-01-06", format = "date", value_type = Option<String>)]
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct DailyQuery {
    /// Defaults to today
    #[param(example = "2026-01-06", value_type = Option<String>)]
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ReportQuery {
    pub employee_id: Option<u64>,
    #[param(example = "2026-01-01", value_type = Option<String>)]
    pub from_date: Option<NaiveDate>,
    #[param(example = "2026-01-31", value_type = Option<String>)]
    pub to_date: Option<NaiveDate>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

#[derive(Serialize, ToSchema)]
pub struct AttendanceListResponse {
    pub data: Vec<AttendanceRecord>,
    #[schema(example = 1)]
    pub page: u64,
    #[schema(example = 10)]
    pub per_page: u64,
    #[schema(example = 1)]
    pub total: u64,
    #[schema(example = 1)]
    pub pages: u64,
}

impl From<Page<AttendanceRecord>> for AttendanceListResponse {
    fn from(p: Page<AttendanceRecord>) -> Self {
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
pub struct AttendanceReportResponse {
    pub summary: ReportSummary,
    pub data: Vec<AttendanceRecord>,
    pub page: u64,
    pub per_page: u64,
    pub total: u64,
    pub pages: u64,
}

impl From<AttendanceReport> for AttendanceReportResponse {
    fn from(r: AttendanceReport) -> Self {
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

/// Check-in endpoint
#[utoipa::path(
    post,
    path = "/api/attendance/check-in",
    request_body = CheckInRequest,
    responses(
        (status = 201, description = "Checked in successfully", body = Object, example = json!({
            "message": "Checked in successfully",
            "data": { "id": 1, "employee_id": 1000, "date": "2026-01-06", "status": "present" }
        })),
        (status = 400, description = "Already checked in today", body = Object, example = json!({
            "error": "ConflictError",
            "message": "Already checked in for 2026-01-06"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Employee not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn check_in(
    auth: AuthUser,
    store: Store,
    config: web::Data<Config>,
    payload: Option<web::Json<CheckInRequest>>,
) -> actix_web::Result<impl Responder> {
    let requested = payload.and_then(|p| p.into_inner().employee_id);
    let employee_id = auth.acting_for(requested)?;

    let now = Local::now().naive_local();
    let record = attendance::check_in(store.get_ref(), employee_id, now, &config.attendance).await?;

    Ok(HttpResponse::Created().json(json!({
        "message": "Checked in successfully",
        "data": record
    })))
}

/// Check-out endpoint
#[utoipa::path(
    put,
    path = "/api/attendance/check-out/{attendance_id}",
    params(
        ("attendance_id" = u64, Path, description = "Attendance record to close")
    ),
    responses(
        (status = 200, description = "Checked out successfully", body = Object, example = json!({
            "message": "Checked out successfully",
            "data": { "id": 1, "total_hours": 9.5, "status": "present" }
        })),
        (status = 400, description = "Already checked out", body = Object, example = json!({
            "error": "ConflictError",
            "message": "Already checked out"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Attendance record not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn check_out(
    auth: AuthUser,
    store: Store,
    config: web::Data<Config>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let attendance_id = path.into_inner();

    let record = store
        .get_ref()
        .find_attendance(attendance_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Attendance {attendance_id} not found")))?;
    auth.require_self_or_admin(record.employee_id)?;

    let now = Local::now().naive_local();
    let record = attendance::check_out(store.get_ref(), attendance_id, now, &config.attendance).await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Checked out successfully",
        "data": record
    })))
}

/// Mark an employee absent for a day (Admin)
#[utoipa::path(
    post,
    path = "/api/attendance/absent",
    request_body = MarkAbsentRequest,
    responses(
        (status = 201, description = "Absence recorded"),
        (status = 400, description = "Missing field or attendance already recorded"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Employee not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn mark_absent(
    auth: AuthUser,
    store: Store,
    payload: web::Json<MarkAbsentRequest>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let employee_id = payload
        .employee_id
        .ok_or_else(|| AppError::missing_field("employee_id"))?;
    let date = payload.date.ok_or_else(|| AppError::missing_field("date"))?;

    let record = attendance::mark_absent(store.get_ref(), employee_id, date).await?;

    Ok(HttpResponse::Created().json(json!({
        "message": "Absence recorded",
        "data": record
    })))
}

/// Daily attendance summary (Admin)
#[utoipa::path(
    get,
    path = "/api/attendance/daily",
    params(DailyQuery),
    responses(
        (status = 200, description = "Summary and records for the day", body = DailySummary),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn daily(
    auth: AuthUser,
    store: Store,
    config: web::Data<Config>,
    query: web::Query<DailyQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let date = query.date.unwrap_or_else(|| Local::now().date_naive());
    let summary = attendance::daily_summary(store.get_ref(), date, &config.attendance).await?;

    Ok(HttpResponse::Ok().json(summary))
}

/// Attendance report over a date range (Admin)
#[utoipa::path(
    get,
    path = "/api/attendance/report",
    params(ReportQuery),
    responses(
        (status = 200, description = "Totals plus one page of records", body = AttendanceReportResponse),
        (status = 400, description = "end date cannot be before start date"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn report(
    auth: AuthUser,
    store: Store,
    config: web::Data<Config>,
    query: web::Query<ReportQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let (offset, limit) = window(query.page, query.per_page, 100);
    let filter = AttendanceFilter {
        employee_id: query.employee_id,
        from_date: query.from_date,
        to_date: query.to_date,
        ..AttendanceFilter::default()
    };

    let report =
        attendance::report(store.get_ref(), &filter, offset, limit, &config.attendance).await?;
    Ok(HttpResponse::Ok().json(AttendanceReportResponse::from(report)))
}

/// Attendance history for one employee, newest first
#[utoipa::path(
    get,
    path = "/api/attendance/{employee_id}",
    params(
        ("employee_id" = u64, Path, description = "Employee id"),
        PageQuery
    ),
    responses(
        (status = 200, description = "Paginated attendance history", body = AttendanceListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn history(
    auth: AuthUser,
    store: Store,
    path: web::Path<u64>,
    query: web::Query<PageQuery>,
) -> actix_web::Result<impl Responder> {
    let employee_id = path.into_inner();
    auth.require_self_or_admin(employee_id)?;

    let (offset, limit) = query.window(10);
    let page = attendance::history(store.get_ref(), employee_id, offset, limit).await?;

    Ok(HttpResponse::Ok().json(AttendanceListResponse::from(page)))
}
