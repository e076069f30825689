//! Typed record store over the `employees`, `attendance` and `leaves` tables.
//!
//! Every check-then-act invariant is a conditional write on the store side:
//! a duplicate `(employee_id, date)` insert, a second check-out and a second
//! leave decision all come back as `AppError::Conflict` (or `None`) instead of
//! silently overwriting.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};

use crate::error::AppResult;
use crate::model::attendance::{AttendanceRecord, AttendanceStatus, NewAttendance};
use crate::model::employee::{Employee, EmployeePatch, EmployeeStatus, NewEmployee};
use crate::model::leave_request::{LeaveRequest, LeaveStatus, LeaveType, NewLeave};

pub mod memory;
pub mod mysql;

pub use memory::MemoryStore;
pub use mysql::MySqlStore;

/// LIMIT/OFFSET window applied after ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    pub offset: u64,
    pub limit: u64,
}

#[derive(Debug, Clone, Default)]
pub struct EmployeeFilter {
    pub department: Option<String>,
    pub status: Option<EmployeeStatus>,
    /// Substring match on first name, last name or email.
    pub search: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct AttendanceFilter {
    pub employee_id: Option<u64>,
    pub date: Option<NaiveDate>,
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default)]
pub struct LeaveFilter {
    pub employee_id: Option<u64>,
    pub status: Option<LeaveStatus>,
    pub leave_type: Option<LeaveType>,
    /// `start_date >= from_date`
    pub from_date: Option<NaiveDate>,
    /// `end_date <= to_date`
    pub to_date: Option<NaiveDate>,
    pub department: Option<String>,
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Conflict when the email is already taken.
    async fn insert_employee(&self, new: NewEmployee) -> AppResult<Employee>;

    /// `None` when no employee has this id.
    async fn update_employee(&self, id: u64, patch: EmployeePatch) -> AppResult<Option<Employee>>;

    async fn find_employee(&self, id: u64) -> AppResult<Option<Employee>>;

    async fn find_employee_by_email(&self, email: &str) -> AppResult<Option<Employee>>;

    /// Newest first.
    async fn find_employees(
        &self,
        filter: &EmployeeFilter,
        range: Option<Range>,
    ) -> AppResult<Vec<Employee>>;

    async fn count_employees(&self, filter: &EmployeeFilter) -> AppResult<u64>;

    /// Conflict when a row for `(employee_id, date)` already exists.
    async fn insert_attendance(&self, new: NewAttendance) -> AppResult<AttendanceRecord>;

    async fn find_attendance(&self, id: u64) -> AppResult<Option<AttendanceRecord>>;

    async fn find_attendance_for_day(
        &self,
        employee_id: u64,
        date: NaiveDate,
    ) -> AppResult<Option<AttendanceRecord>>;

    /// Writes check-out, hours and status together, only while the row is
    /// still open. `None` when the row is missing or already closed.
    async fn complete_check_out(
        &self,
        id: u64,
        check_out: NaiveDateTime,
        total_hours: f64,
        status: AttendanceStatus,
    ) -> AppResult<Option<AttendanceRecord>>;

    /// Most recent date first.
    async fn find_attendance_many(
        &self,
        filter: &AttendanceFilter,
        range: Option<Range>,
    ) -> AppResult<Vec<AttendanceRecord>>;

    async fn count_attendance(&self, filter: &AttendanceFilter) -> AppResult<u64>;

    /// Stored as `PENDING`.
    async fn insert_leave(&self, new: NewLeave) -> AppResult<LeaveRequest>;

    async fn find_leave(&self, id: u64) -> AppResult<Option<LeaveRequest>>;

    /// Compare-and-set on the status. `None` when the row is missing or no
    /// longer in `from`.
    async fn transition_leave(
        &self,
        id: u64,
        from: LeaveStatus,
        to: LeaveStatus,
    ) -> AppResult<Option<LeaveRequest>>;

    /// Latest start date first.
    async fn find_leaves(
        &self,
        filter: &LeaveFilter,
        range: Option<Range>,
    ) -> AppResult<Vec<LeaveRequest>>;

    async fn count_leaves(&self, filter: &LeaveFilter) -> AppResult<u64>;
}
