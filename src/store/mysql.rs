use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use sqlx::{FromRow, MySqlPool};
use tracing::{debug, warn};

use crate::error::{AppError, AppResult};
use crate::model::attendance::{AttendanceRecord, AttendanceStatus, NewAttendance};
use crate::model::employee::{Employee, EmployeePatch, EmployeeStatus, NewEmployee};
use crate::model::leave_request::{LeaveRequest, LeaveStatus, LeaveType, NewLeave};

use super::{AttendanceFilter, EmployeeFilter, LeaveFilter, Range, RecordStore};

const EMPLOYEE_COLUMNS: &str =
    "id, user_id, first_name, last_name, email, position, department, salary, status";
const ATTENDANCE_COLUMNS: &str =
    "id, employee_id, date, check_in, check_out, total_hours, status";
const LEAVE_COLUMNS: &str =
    "id, employee_id, leave_type, start_date, end_date, reason, status, days_requested";

/// Record store over MySQL. Uniqueness of `(employee_id, date)` and of
/// `email` comes from the unique indexes in `migrations/`.
#[derive(Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

// Helper enum for typed SQLx binding
#[derive(Debug)]
enum FilterValue {
    U64(u64),
    Str(String),
    Date(NaiveDate),
}

macro_rules! bind_all {
    ($query:expr, $args:expr) => {{
        let mut q = $query;
        for arg in $args {
            q = match arg {
                FilterValue::U64(v) => q.bind(*v),
                FilterValue::Str(s) => q.bind(s.clone()),
                FilterValue::Date(d) => q.bind(*d),
            };
        }
        q
    }};
}

#[derive(Default)]
struct WhereClause {
    conditions: Vec<&'static str>,
    args: Vec<FilterValue>,
}

impl WhereClause {
    fn push(&mut self, condition: &'static str, value: FilterValue) {
        self.conditions.push(condition);
        self.args.push(value);
    }

    fn sql(&self) -> String {
        if self.conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.conditions.join(" AND "))
        }
    }
}

fn limit_sql(range: Option<Range>) -> String {
    match range {
        Some(r) => format!(" LIMIT {} OFFSET {}", r.limit, r.offset),
        None => String::new(),
    }
}

fn employee_where(filter: &EmployeeFilter) -> WhereClause {
    let mut w = WhereClause::default();
    if let Some(dept) = &filter.department {
        w.push("department = ?", FilterValue::Str(dept.clone()));
    }
    if let Some(status) = filter.status {
        w.push("status = ?", FilterValue::Str(status.to_string()));
    }
    if let Some(search) = &filter.search {
        let like = format!("%{}%", search);
        w.conditions
            .push("(first_name LIKE ? OR last_name LIKE ? OR email LIKE ?)");
        w.args.push(FilterValue::Str(like.clone()));
        w.args.push(FilterValue::Str(like.clone()));
        w.args.push(FilterValue::Str(like));
    }
    w
}

fn attendance_where(filter: &AttendanceFilter) -> WhereClause {
    let mut w = WhereClause::default();
    if let Some(id) = filter.employee_id {
        w.push("employee_id = ?", FilterValue::U64(id));
    }
    if let Some(d) = filter.date {
        w.push("date = ?", FilterValue::Date(d));
    }
    if let Some(d) = filter.from_date {
        w.push("date >= ?", FilterValue::Date(d));
    }
    if let Some(d) = filter.to_date {
        w.push("date <= ?", FilterValue::Date(d));
    }
    w
}

fn leave_where(filter: &LeaveFilter) -> WhereClause {
    let mut w = WhereClause::default();
    if let Some(id) = filter.employee_id {
        w.push("employee_id = ?", FilterValue::U64(id));
    }
    if let Some(status) = filter.status {
        w.push("status = ?", FilterValue::Str(status.to_string()));
    }
    if let Some(leave_type) = filter.leave_type {
        w.push("leave_type = ?", FilterValue::Str(leave_type.to_string()));
    }
    if let Some(d) = filter.from_date {
        w.push("start_date >= ?", FilterValue::Date(d));
    }
    if let Some(d) = filter.to_date {
        w.push("end_date <= ?", FilterValue::Date(d));
    }
    if let Some(dept) = &filter.department {
        w.push(
            "employee_id IN (SELECT id FROM employees WHERE department = ?)",
            FilterValue::Str(dept.clone()),
        );
    }
    w
}

/// Maps a duplicate-key failure to a conflict, everything else to a store error.
fn map_insert_error(e: sqlx::Error, conflict: &str) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.code().as_deref() == Some("23000") {
            return AppError::Conflict(conflict.to_string());
        }
    }
    AppError::from(e)
}

fn parse_column<T: std::str::FromStr>(value: &str, column: &str) -> AppResult<T> {
    value
        .parse()
        .map_err(|_| AppError::Store(format!("unexpected {column} value '{value}'")))
}

#[derive(FromRow)]
struct EmployeeRow {
    id: u64,
    user_id: Option<String>,
    first_name: String,
    last_name: String,
    email: String,
    position: Option<String>,
    department: Option<String>,
    salary: Option<f64>,
    status: String,
}

impl TryFrom<EmployeeRow> for Employee {
    type Error = AppError;

    fn try_from(row: EmployeeRow) -> AppResult<Self> {
        Ok(Employee {
            id: row.id,
            user_id: row.user_id,
            first_name: row.first_name,
            last_name: row.last_name,
            email: row.email,
            position: row.position,
            department: row.department,
            salary: row.salary,
            status: parse_column::<EmployeeStatus>(&row.status, "employee status")?,
        })
    }
}

#[derive(FromRow)]
struct AttendanceRow {
    id: u64,
    employee_id: u64,
    date: NaiveDate,
    check_in: Option<NaiveDateTime>,
    check_out: Option<NaiveDateTime>,
    total_hours: Option<f64>,
    status: String,
}

impl TryFrom<AttendanceRow> for AttendanceRecord {
    type Error = AppError;

    fn try_from(row: AttendanceRow) -> AppResult<Self> {
        Ok(AttendanceRecord {
            id: row.id,
            employee_id: row.employee_id,
            date: row.date,
            check_in: row.check_in,
            check_out: row.check_out,
            total_hours: row.total_hours,
            status: parse_column::<AttendanceStatus>(&row.status, "attendance status")?,
        })
    }
}

#[derive(FromRow)]
struct LeaveRow {
    id: u64,
    employee_id: u64,
    leave_type: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    reason: Option<String>,
    status: String,
    days_requested: i64,
}

impl TryFrom<LeaveRow> for LeaveRequest {
    type Error = AppError;

    fn try_from(row: LeaveRow) -> AppResult<Self> {
        Ok(LeaveRequest {
            id: row.id,
            employee_id: row.employee_id,
            leave_type: parse_column(&row.leave_type, "leave type")?,
            start_date: row.start_date,
            end_date: row.end_date,
            reason: row.reason.unwrap_or_default(),
            status: parse_column::<LeaveStatus>(&row.status, "leave status")?,
            days_requested: row.days_requested,
        })
    }
}

/// Rows with a leave type outside the known four are left out of listings
/// and aggregates; any other bad column is still an error.
fn convert_leaves(rows: Vec<LeaveRow>) -> AppResult<Vec<LeaveRequest>> {
    rows.into_iter()
        .filter(|row| {
            let known = row.leave_type.parse::<LeaveType>().is_ok();
            if !known {
                warn!(leave_id = row.id, leave_type = %row.leave_type, "Skipping leave with unknown type");
            }
            known
        })
        .map(LeaveRequest::try_from)
        .collect()
}

fn convert_all<R, T>(rows: Vec<R>) -> AppResult<Vec<T>>
where
    T: TryFrom<R, Error = AppError>,
{
    rows.into_iter().map(T::try_from).collect()
}

#[async_trait]
impl RecordStore for MySqlStore {
    async fn insert_employee(&self, new: NewEmployee) -> AppResult<Employee> {
        let result = sqlx::query(
            r#"
            INSERT INTO employees
                (user_id, first_name, last_name, email, position, department, salary, status)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&new.user_id)
        .bind(&new.first_name)
        .bind(&new.last_name)
        .bind(&new.email)
        .bind(&new.position)
        .bind(&new.department)
        .bind(new.salary)
        .bind(EmployeeStatus::Active.as_ref())
        .execute(&self.pool)
        .await
        .map_err(|e| map_insert_error(e, "Email already registered"))?;

        self.find_employee(result.last_insert_id())
            .await?
            .ok_or_else(|| AppError::Store("inserted employee not readable".to_string()))
    }

    async fn update_employee(&self, id: u64, patch: EmployeePatch) -> AppResult<Option<Employee>> {
        sqlx::query(
            r#"
            UPDATE employees SET
                first_name = COALESCE(?, first_name),
                last_name = COALESCE(?, last_name),
                email = COALESCE(?, email),
                position = COALESCE(?, position),
                department = COALESCE(?, department),
                salary = COALESCE(?, salary),
                status = COALESCE(?, status)
            WHERE id = ?
            "#,
        )
        .bind(&patch.first_name)
        .bind(&patch.last_name)
        .bind(&patch.email)
        .bind(&patch.position)
        .bind(&patch.department)
        .bind(patch.salary)
        .bind(patch.status.map(|s| s.to_string()))
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| map_insert_error(e, "Email already registered"))?;

        // MySQL reports 0 affected rows for a no-op update, so re-read instead
        self.find_employee(id).await
    }

    async fn find_employee(&self, id: u64) -> AppResult<Option<Employee>> {
        let sql = format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE id = ?");
        sqlx::query_as::<_, EmployeeRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(Employee::try_from)
            .transpose()
    }

    async fn find_employee_by_email(&self, email: &str) -> AppResult<Option<Employee>> {
        let sql = format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE email = ?");
        sqlx::query_as::<_, EmployeeRow>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?
            .map(Employee::try_from)
            .transpose()
    }

    async fn find_employees(
        &self,
        filter: &EmployeeFilter,
        range: Option<Range>,
    ) -> AppResult<Vec<Employee>> {
        let w = employee_where(filter);
        let sql = format!(
            "SELECT {EMPLOYEE_COLUMNS} FROM employees{} ORDER BY id DESC{}",
            w.sql(),
            limit_sql(range)
        );
        debug!(sql = %sql, bindings = ?w.args, "Fetching employees");

        let rows = bind_all!(sqlx::query_as::<_, EmployeeRow>(&sql), &w.args)
            .fetch_all(&self.pool)
            .await?;
        convert_all(rows)
    }

    async fn count_employees(&self, filter: &EmployeeFilter) -> AppResult<u64> {
        let w = employee_where(filter);
        let sql = format!("SELECT COUNT(*) FROM employees{}", w.sql());
        let total = bind_all!(sqlx::query_scalar::<_, i64>(&sql), &w.args)
            .fetch_one(&self.pool)
            .await?;
        Ok(total as u64)
    }

    async fn insert_attendance(&self, new: NewAttendance) -> AppResult<AttendanceRecord> {
        let result = sqlx::query(
            r#"
            INSERT INTO attendance (employee_id, date, check_in, status)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(new.employee_id)
        .bind(new.date)
        .bind(new.check_in)
        .bind(new.status.as_ref())
        .execute(&self.pool)
        .await
        .map_err(|e| map_insert_error(e, "Attendance already recorded for this day"))?;

        self.find_attendance(result.last_insert_id())
            .await?
            .ok_or_else(|| AppError::Store("inserted attendance not readable".to_string()))
    }

    async fn find_attendance(&self, id: u64) -> AppResult<Option<AttendanceRecord>> {
        let sql = format!("SELECT {ATTENDANCE_COLUMNS} FROM attendance WHERE id = ?");
        sqlx::query_as::<_, AttendanceRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(AttendanceRecord::try_from)
            .transpose()
    }

    async fn find_attendance_for_day(
        &self,
        employee_id: u64,
        date: NaiveDate,
    ) -> AppResult<Option<AttendanceRecord>> {
        let sql =
            format!("SELECT {ATTENDANCE_COLUMNS} FROM attendance WHERE employee_id = ? AND date = ?");
        sqlx::query_as::<_, AttendanceRow>(&sql)
            .bind(employee_id)
            .bind(date)
            .fetch_optional(&self.pool)
            .await?
            .map(AttendanceRecord::try_from)
            .transpose()
    }

    async fn complete_check_out(
        &self,
        id: u64,
        check_out: NaiveDateTime,
        total_hours: f64,
        status: AttendanceStatus,
    ) -> AppResult<Option<AttendanceRecord>> {
        let result = sqlx::query(
            r#"
            UPDATE attendance
            SET check_out = ?, total_hours = ?, status = ?
            WHERE id = ?
            AND check_in IS NOT NULL
            AND check_out IS NULL
            "#,
        )
        .bind(check_out)
        .bind(total_hours)
        .bind(status.as_ref())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.find_attendance(id).await
    }

    async fn find_attendance_many(
        &self,
        filter: &AttendanceFilter,
        range: Option<Range>,
    ) -> AppResult<Vec<AttendanceRecord>> {
        let w = attendance_where(filter);
        let sql = format!(
            "SELECT {ATTENDANCE_COLUMNS} FROM attendance{} ORDER BY date DESC, id DESC{}",
            w.sql(),
            limit_sql(range)
        );
        debug!(sql = %sql, bindings = ?w.args, "Fetching attendance");

        let rows = bind_all!(sqlx::query_as::<_, AttendanceRow>(&sql), &w.args)
            .fetch_all(&self.pool)
            .await?;
        convert_all(rows)
    }

    async fn count_attendance(&self, filter: &AttendanceFilter) -> AppResult<u64> {
        let w = attendance_where(filter);
        let sql = format!("SELECT COUNT(*) FROM attendance{}", w.sql());
        let total = bind_all!(sqlx::query_scalar::<_, i64>(&sql), &w.args)
            .fetch_one(&self.pool)
            .await?;
        Ok(total as u64)
    }

    async fn insert_leave(&self, new: NewLeave) -> AppResult<LeaveRequest> {
        let result = sqlx::query(
            r#"
            INSERT INTO leaves
                (employee_id, leave_type, start_date, end_date, reason, status, days_requested)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(new.employee_id)
        .bind(new.leave_type.as_ref())
        .bind(new.start_date)
        .bind(new.end_date)
        .bind(&new.reason)
        .bind(LeaveStatus::Pending.as_ref())
        .bind(new.days_requested)
        .execute(&self.pool)
        .await?;

        self.find_leave(result.last_insert_id())
            .await?
            .ok_or_else(|| AppError::Store("inserted leave not readable".to_string()))
    }

    async fn find_leave(&self, id: u64) -> AppResult<Option<LeaveRequest>> {
        let sql = format!("SELECT {LEAVE_COLUMNS} FROM leaves WHERE id = ?");
        sqlx::query_as::<_, LeaveRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(LeaveRequest::try_from)
            .transpose()
    }

    async fn transition_leave(
        &self,
        id: u64,
        from: LeaveStatus,
        to: LeaveStatus,
    ) -> AppResult<Option<LeaveRequest>> {
        let result = sqlx::query(
            r#"
            UPDATE leaves
            SET status = ?
            WHERE id = ?
            AND status = ?
            "#,
        )
        .bind(to.as_ref())
        .bind(id)
        .bind(from.as_ref())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.find_leave(id).await
    }

    async fn find_leaves(
        &self,
        filter: &LeaveFilter,
        range: Option<Range>,
    ) -> AppResult<Vec<LeaveRequest>> {
        let w = leave_where(filter);
        let sql = format!(
            "SELECT {LEAVE_COLUMNS} FROM leaves{} ORDER BY start_date DESC, id DESC{}",
            w.sql(),
            limit_sql(range)
        );
        debug!(sql = %sql, bindings = ?w.args, "Fetching leaves");

        let rows = bind_all!(sqlx::query_as::<_, LeaveRow>(&sql), &w.args)
            .fetch_all(&self.pool)
            .await?;
        convert_leaves(rows)
    }

    async fn count_leaves(&self, filter: &LeaveFilter) -> AppResult<u64> {
        let w = leave_where(filter);
        let sql = format!("SELECT COUNT(*) FROM leaves{}", w.sql());
        let total = bind_all!(sqlx::query_scalar::<_, i64>(&sql), &w.args)
            .fetch_one(&self.pool)
            .await?;
        Ok(total as u64)
    }
}
