use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};

use crate::error::{AppError, AppResult};
use crate::model::attendance::{AttendanceRecord, AttendanceStatus, NewAttendance};
use crate::model::employee::{Employee, EmployeePatch, EmployeeStatus, NewEmployee};
use crate::model::leave_request::{LeaveRequest, LeaveStatus, NewLeave};

use super::{AttendanceFilter, EmployeeFilter, LeaveFilter, Range, RecordStore};

#[derive(Default)]
struct Tables {
    employees: Vec<Employee>,
    attendance: Vec<AttendanceRecord>,
    leaves: Vec<LeaveRequest>,
    next_employee_id: u64,
    next_attendance_id: u64,
    next_leave_id: u64,
}

/// In-process store. Each conditional write runs its check and its write
/// under one write lock.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> AppResult<RwLockReadGuard<'_, Tables>> {
        self.tables
            .read()
            .map_err(|_| AppError::Store("memory store lock poisoned".to_string()))
    }

    fn write(&self) -> AppResult<RwLockWriteGuard<'_, Tables>> {
        self.tables
            .write()
            .map_err(|_| AppError::Store("memory store lock poisoned".to_string()))
    }
}

fn window<T>(rows: Vec<T>, range: Option<Range>) -> Vec<T> {
    match range {
        Some(r) => rows
            .into_iter()
            .skip(usize::try_from(r.offset).unwrap_or(usize::MAX))
            .take(usize::try_from(r.limit).unwrap_or(usize::MAX))
            .collect(),
        None => rows,
    }
}

fn employee_matches(e: &Employee, filter: &EmployeeFilter) -> bool {
    if let Some(dept) = &filter.department {
        if e.department.as_deref() != Some(dept.as_str()) {
            return false;
        }
    }
    if let Some(status) = filter.status {
        if e.status != status {
            return false;
        }
    }
    if let Some(search) = &filter.search {
        let needle = search.to_lowercase();
        let hit = [&e.first_name, &e.last_name, &e.email]
            .iter()
            .any(|field| field.to_lowercase().contains(&needle));
        if !hit {
            return false;
        }
    }
    true
}

fn attendance_matches(r: &AttendanceRecord, filter: &AttendanceFilter) -> bool {
    filter.employee_id.is_none_or(|id| r.employee_id == id)
        && filter.date.is_none_or(|d| r.date == d)
        && filter.from_date.is_none_or(|d| r.date >= d)
        && filter.to_date.is_none_or(|d| r.date <= d)
}

fn leave_matches(l: &LeaveRequest, filter: &LeaveFilter, employees: &[Employee]) -> bool {
    let dept_ok = match &filter.department {
        None => true,
        Some(dept) => employees
            .iter()
            .any(|e| e.id == l.employee_id && e.department.as_deref() == Some(dept.as_str())),
    };

    dept_ok
        && filter.employee_id.is_none_or(|id| l.employee_id == id)
        && filter.status.is_none_or(|s| l.status == s)
        && filter.leave_type.is_none_or(|t| l.leave_type == t)
        && filter.from_date.is_none_or(|d| l.start_date >= d)
        && filter.to_date.is_none_or(|d| l.end_date <= d)
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn insert_employee(&self, new: NewEmployee) -> AppResult<Employee> {
        let mut t = self.write()?;
        if t.employees.iter().any(|e| e.email == new.email) {
            return Err(AppError::Conflict("Email already registered".to_string()));
        }

        t.next_employee_id += 1;
        let employee = Employee {
            id: t.next_employee_id,
            user_id: new.user_id,
            first_name: new.first_name,
            last_name: new.last_name,
            email: new.email,
            position: new.position,
            department: new.department,
            salary: new.salary,
            status: EmployeeStatus::Active,
        };
        t.employees.push(employee.clone());
        Ok(employee)
    }

    async fn update_employee(&self, id: u64, patch: EmployeePatch) -> AppResult<Option<Employee>> {
        let mut t = self.write()?;
        if let Some(email) = &patch.email {
            if t.employees.iter().any(|e| e.id != id && &e.email == email) {
                return Err(AppError::Conflict("Email already registered".to_string()));
            }
        }

        Ok(t.employees.iter_mut().find(|e| e.id == id).map(|e| {
            patch.apply(e);
            e.clone()
        }))
    }

    async fn find_employee(&self, id: u64) -> AppResult<Option<Employee>> {
        Ok(self.read()?.employees.iter().find(|e| e.id == id).cloned())
    }

    async fn find_employee_by_email(&self, email: &str) -> AppResult<Option<Employee>> {
        Ok(self
            .read()?
            .employees
            .iter()
            .find(|e| e.email == email)
            .cloned())
    }

    async fn find_employees(
        &self,
        filter: &EmployeeFilter,
        range: Option<Range>,
    ) -> AppResult<Vec<Employee>> {
        let t = self.read()?;
        let mut rows: Vec<Employee> = t
            .employees
            .iter()
            .filter(|e| employee_matches(e, filter))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(window(rows, range))
    }

    async fn count_employees(&self, filter: &EmployeeFilter) -> AppResult<u64> {
        let t = self.read()?;
        Ok(t.employees
            .iter()
            .filter(|e| employee_matches(e, filter))
            .count() as u64)
    }

    async fn insert_attendance(&self, new: NewAttendance) -> AppResult<AttendanceRecord> {
        let mut t = self.write()?;
        if t
            .attendance
            .iter()
            .any(|r| r.employee_id == new.employee_id && r.date == new.date)
        {
            return Err(AppError::Conflict(
                "Attendance already recorded for this day".to_string(),
            ));
        }

        t.next_attendance_id += 1;
        let record = AttendanceRecord {
            id: t.next_attendance_id,
            employee_id: new.employee_id,
            date: new.date,
            check_in: new.check_in,
            check_out: None,
            total_hours: None,
            status: new.status,
        };
        t.attendance.push(record.clone());
        Ok(record)
    }

    async fn find_attendance(&self, id: u64) -> AppResult<Option<AttendanceRecord>> {
        Ok(self.read()?.attendance.iter().find(|r| r.id == id).cloned())
    }

    async fn find_attendance_for_day(
        &self,
        employee_id: u64,
        date: NaiveDate,
    ) -> AppResult<Option<AttendanceRecord>> {
        Ok(self
            .read()?
            .attendance
            .iter()
            .find(|r| r.employee_id == employee_id && r.date == date)
            .cloned())
    }

    async fn complete_check_out(
        &self,
        id: u64,
        check_out: NaiveDateTime,
        total_hours: f64,
        status: AttendanceStatus,
    ) -> AppResult<Option<AttendanceRecord>> {
        let mut t = self.write()?;
        Ok(t.attendance
            .iter_mut()
            .find(|r| r.id == id && r.check_in.is_some() && r.check_out.is_none())
            .map(|r| {
                r.check_out = Some(check_out);
                r.total_hours = Some(total_hours);
                r.status = status;
                r.clone()
            }))
    }

    async fn find_attendance_many(
        &self,
        filter: &AttendanceFilter,
        range: Option<Range>,
    ) -> AppResult<Vec<AttendanceRecord>> {
        let t = self.read()?;
        let mut rows: Vec<AttendanceRecord> = t
            .attendance
            .iter()
            .filter(|r| attendance_matches(r, filter))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
        Ok(window(rows, range))
    }

    async fn count_attendance(&self, filter: &AttendanceFilter) -> AppResult<u64> {
        let t = self.read()?;
        Ok(t.attendance
            .iter()
            .filter(|r| attendance_matches(r, filter))
            .count() as u64)
    }

    async fn insert_leave(&self, new: NewLeave) -> AppResult<LeaveRequest> {
        let mut t = self.write()?;
        t.next_leave_id += 1;
        let leave = LeaveRequest {
            id: t.next_leave_id,
            employee_id: new.employee_id,
            leave_type: new.leave_type,
            start_date: new.start_date,
            end_date: new.end_date,
            reason: new.reason,
            status: LeaveStatus::Pending,
            days_requested: new.days_requested,
        };
        t.leaves.push(leave.clone());
        Ok(leave)
    }

    async fn find_leave(&self, id: u64) -> AppResult<Option<LeaveRequest>> {
        Ok(self.read()?.leaves.iter().find(|l| l.id == id).cloned())
    }

    async fn transition_leave(
        &self,
        id: u64,
        from: LeaveStatus,
        to: LeaveStatus,
    ) -> AppResult<Option<LeaveRequest>> {
        let mut t = self.write()?;
        Ok(t.leaves
            .iter_mut()
            .find(|l| l.id == id && l.status == from)
            .map(|l| {
                l.status = to;
                l.clone()
            }))
    }

    async fn find_leaves(
        &self,
        filter: &LeaveFilter,
        range: Option<Range>,
    ) -> AppResult<Vec<LeaveRequest>> {
        let t = self.read()?;
        let mut rows: Vec<LeaveRequest> = t
            .leaves
            .iter()
            .filter(|l| leave_matches(l, filter, &t.employees))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.start_date.cmp(&a.start_date).then(b.id.cmp(&a.id)));
        Ok(window(rows, range))
    }

    async fn count_leaves(&self, filter: &LeaveFilter) -> AppResult<u64> {
        let t = self.read()?;
        Ok(t.leaves
            .iter()
            .filter(|l| leave_matches(l, filter, &t.employees))
            .count() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::leave_request::LeaveType;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, d).unwrap()
    }

    fn new_employee(email: &str, department: &str) -> NewEmployee {
        NewEmployee {
            user_id: None,
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: email.into(),
            position: None,
            department: Some(department.into()),
            salary: None,
        }
    }

    fn open_day(employee_id: u64, date: NaiveDate) -> NewAttendance {
        NewAttendance {
            employee_id,
            date,
            check_in: date.and_hms_opt(9, 0, 0),
            status: AttendanceStatus::Present,
        }
    }

    #[actix_web::test]
    async fn duplicate_email_conflicts() {
        let store = MemoryStore::new();
        store
            .insert_employee(new_employee("a@x.io", "R&D"))
            .await
            .unwrap();
        let err = store
            .insert_employee(new_employee("a@x.io", "Ops"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[actix_web::test]
    async fn one_attendance_row_per_employee_day() {
        let store = MemoryStore::new();
        store.insert_attendance(open_day(1, day(6))).await.unwrap();
        let err = store
            .insert_attendance(open_day(1, day(6)))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        store.insert_attendance(open_day(2, day(6))).await.unwrap();
        store.insert_attendance(open_day(1, day(7))).await.unwrap();
        assert_eq!(
            store
                .count_attendance(&AttendanceFilter::default())
                .await
                .unwrap(),
            3
        );
    }

    #[actix_web::test]
    async fn check_out_applies_once() {
        let store = MemoryStore::new();
        let rec = store.insert_attendance(open_day(1, day(6))).await.unwrap();
        let out = day(6).and_hms_opt(18, 0, 0).unwrap();

        let closed = store
            .complete_check_out(rec.id, out, 9.0, AttendanceStatus::Present)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(closed.total_hours, Some(9.0));

        let again = store
            .complete_check_out(rec.id, out, 1.0, AttendanceStatus::HalfDay)
            .await
            .unwrap();
        assert!(again.is_none());
        let stored = store.find_attendance(rec.id).await.unwrap().unwrap();
        assert_eq!(stored.total_hours, Some(9.0));
    }

    #[actix_web::test]
    async fn leave_transition_is_compare_and_set() {
        let store = MemoryStore::new();
        let leave = store
            .insert_leave(NewLeave {
                employee_id: 1,
                leave_type: LeaveType::Sick,
                start_date: day(6),
                end_date: day(7),
                reason: String::new(),
                days_requested: 2,
            })
            .await
            .unwrap();

        let approved = store
            .transition_leave(leave.id, LeaveStatus::Pending, LeaveStatus::Approved)
            .await
            .unwrap();
        assert_eq!(approved.unwrap().status, LeaveStatus::Approved);

        let rejected = store
            .transition_leave(leave.id, LeaveStatus::Pending, LeaveStatus::Rejected)
            .await
            .unwrap();
        assert!(rejected.is_none());
    }

    #[actix_web::test]
    async fn attendance_filters_and_windows() {
        let store = MemoryStore::new();
        for d in 1..=5 {
            store.insert_attendance(open_day(1, day(d))).await.unwrap();
        }
        store.insert_attendance(open_day(2, day(3))).await.unwrap();

        let filter = AttendanceFilter {
            employee_id: Some(1),
            from_date: Some(day(2)),
            to_date: Some(day(4)),
            ..AttendanceFilter::default()
        };
        let rows = store.find_attendance_many(&filter, None).await.unwrap();
        let dates: Vec<_> = rows.iter().map(|r| r.date).collect();
        assert_eq!(dates, vec![day(4), day(3), day(2)]);

        let page = store
            .find_attendance_many(
                &AttendanceFilter::default(),
                Some(Range {
                    offset: 1,
                    limit: 2,
                }),
            )
            .await
            .unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].date, day(4));
    }

    #[actix_web::test]
    async fn leave_department_filter_joins_employees() {
        let store = MemoryStore::new();
        let rd = store
            .insert_employee(new_employee("rd@x.io", "R&D"))
            .await
            .unwrap();
        let ops = store
            .insert_employee(new_employee("ops@x.io", "Ops"))
            .await
            .unwrap();
        for employee_id in [rd.id, ops.id] {
            store
                .insert_leave(NewLeave {
                    employee_id,
                    leave_type: LeaveType::Casual,
                    start_date: day(6),
                    end_date: day(6),
                    reason: String::new(),
                    days_requested: 1,
                })
                .await
                .unwrap();
        }

        let filter = LeaveFilter {
            department: Some("Ops".into()),
            ..LeaveFilter::default()
        };
        let rows = store.find_leaves(&filter, None).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].employee_id, ops.id);
        assert_eq!(store.count_leaves(&filter).await.unwrap(), 1);
    }
}
