use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

use crate::api::attendance::{
    AttendanceListResponse, AttendanceReportResponse, CheckInRequest, MarkAbsentRequest,
};
use crate::api::employee::EmployeeListResponse;
use crate::api::leave_request::{LeaveDecision, LeaveListResponse, LeaveReportResponse};
use crate::core::leave::BalanceEntry;
use crate::core::report::{AttendanceSummary, LeaveSummary, ReportSummary};
use crate::model::attendance::{AttendanceRecord, AttendanceStatus};
use crate::model::employee::{Employee, EmployeePatch, EmployeeStatus};
use crate::model::leave_request::{LeaveRequest, LeaveStatus, LeaveType};
use crate::service::attendance::DailySummary;
use crate::service::employee::EmployeeSubmission;
use crate::service::leave::LeaveSubmission;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "HRM Portal API",
        version = "1.0.0",
        description = r#"
## HRM Portal

Employee records, daily attendance and leave requests for a single organization.

### Key Features
- **Employee Management**: register, update, list and deactivate employee profiles
- **Attendance**: check-in / check-out, admin absences, daily summaries and range reports
- **Leave Management**: request leave, approve or reject, balances per leave type, reports

### Security
Every endpoint except `/api/health` requires a **JWT Bearer** token issued by the
identity provider. Admin-only operations are marked in their descriptions.

### Response Format
- JSON bodies; list endpoints return `data`, `page`, `per_page`, `total` and `pages`
- Errors are `{"error": kind, "message": text}`
"#,
    ),
    paths(
        crate::api::health,

        crate::api::employee::create_employee,
        crate::api::employee::list_employees,
        crate::api::employee::me,
        crate::api::employee::get_employee,
        crate::api::employee::update_employee,
        crate::api::employee::delete_employee,

        crate::api::attendance::check_in,
        crate::api::attendance::check_out,
        crate::api::attendance::mark_absent,
        crate::api::attendance::daily,
        crate::api::attendance::report,
        crate::api::attendance::history,

        crate::api::leave_request::request_leave,
        crate::api::leave_request::my_leaves,
        crate::api::leave_request::pending,
        crate::api::leave_request::balance,
        crate::api::leave_request::update_status,
        crate::api::leave_request::report
    ),
    components(
        schemas(
            Employee,
            EmployeeStatus,
            EmployeePatch,
            EmployeeSubmission,
            EmployeeListResponse,
            AttendanceRecord,
            AttendanceStatus,
            AttendanceSummary,
            ReportSummary,
            DailySummary,
            CheckInRequest,
            MarkAbsentRequest,
            AttendanceListResponse,
            AttendanceReportResponse,
            LeaveRequest,
            LeaveType,
            LeaveStatus,
            LeaveSubmission,
            LeaveDecision,
            LeaveSummary,
            BalanceEntry,
            LeaveListResponse,
            LeaveReportResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Liveness probe"),
        (name = "Employee", description = "Employee management APIs"),
        (name = "Attendance", description = "Attendance management APIs"),
        (name = "Leave", description = "Leave management APIs"),
    )
)]
pub struct ApiDoc;
