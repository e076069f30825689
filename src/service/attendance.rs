use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;

use crate::core::attendance::{self, AttendancePolicy};
use crate::core::report::{
    AttendanceSummary, Page, ReportSummary, clamp_limit, paginate, summarize_attendance,
    summarize_report,
};
use crate::error::{AppError, AppResult};
use crate::model::attendance::{AttendanceRecord, AttendanceStatus, NewAttendance};
use crate::store::{AttendanceFilter, Range, RecordStore};

use super::require_active_employee;

#[derive(Debug, Serialize, ToSchema)]
pub struct DailySummary {
    #[schema(format = "date", value_type = String)]
    pub date: NaiveDate,
    pub summary: AttendanceSummary,
    pub records: Vec<AttendanceRecord>,
}

#[derive(Debug, Serialize)]
pub struct AttendanceReport {
    pub summary: ReportSummary,
    #[serde(flatten)]
    pub page: Page<AttendanceRecord>,
}

/// Opens today's record for the employee. The day comes from `now`.
#[instrument(skip(store))]
pub async fn check_in(
    store: &dyn RecordStore,
    employee_id: u64,
    now: NaiveDateTime,
    policy: &AttendancePolicy,
) -> AppResult<AttendanceRecord> {
    require_active_employee(store, employee_id).await?;

    let date = now.date();
    let existing = store.find_attendance_for_day(employee_id, date).await?;
    attendance::ensure_can_check_in(existing.as_ref())?;

    // the unique (employee_id, date) key still guards against a concurrent insert
    let record = store
        .insert_attendance(NewAttendance {
            employee_id,
            date,
            check_in: Some(now),
            status: attendance::classify(Some(now), None, None, policy.full_day_hours),
        })
        .await?;

    if attendance::is_late(now, policy.late_cutoff_hour) {
        info!(employee_id, attendance_id = record.id, "Late check-in");
    } else {
        info!(employee_id, attendance_id = record.id, "Checked in");
    }
    Ok(record)
}

/// Closes an open record, writing check-out, hours and status in one step.
#[instrument(skip(store))]
pub async fn check_out(
    store: &dyn RecordStore,
    attendance_id: u64,
    now: NaiveDateTime,
    policy: &AttendancePolicy,
) -> AppResult<AttendanceRecord> {
    let record = store
        .find_attendance(attendance_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Attendance {attendance_id} not found")))?;

    let closing = attendance::check_out(&record, now, policy)?;

    let updated = store
        .complete_check_out(
            attendance_id,
            closing.check_out,
            closing.total_hours,
            closing.status,
        )
        .await?;

    match updated {
        Some(r) => {
            info!(
                attendance_id,
                total_hours = ?r.total_hours,
                status = %r.status,
                "Checked out"
            );
            Ok(r)
        }
        None => {
            warn!(attendance_id, "Check-out lost a race with another check-out");
            Err(AppError::Conflict("Already checked out".to_string()))
        }
    }
}

/// Records an absence for a day with no attendance yet.
#[instrument(skip(store))]
pub async fn mark_absent(
    store: &dyn RecordStore,
    employee_id: u64,
    date: NaiveDate,
) -> AppResult<AttendanceRecord> {
    require_active_employee(store, employee_id).await?;

    let existing = store.find_attendance_for_day(employee_id, date).await?;
    if existing.is_some() {
        return Err(AppError::Conflict(format!(
            "Attendance already recorded for {date}"
        )));
    }

    store
        .insert_attendance(NewAttendance {
            employee_id,
            date,
            check_in: None,
            status: AttendanceStatus::Absent,
        })
        .await
}

pub async fn daily_summary(
    store: &dyn RecordStore,
    date: NaiveDate,
    policy: &AttendancePolicy,
) -> AppResult<DailySummary> {
    let filter = AttendanceFilter {
        date: Some(date),
        ..AttendanceFilter::default()
    };
    let records = store.find_attendance_many(&filter, None).await?;

    Ok(DailySummary {
        date,
        summary: summarize_attendance(&records, policy),
        records,
    })
}

/// Summary over every matching row, plus one page of those rows.
pub async fn report(
    store: &dyn RecordStore,
    filter: &AttendanceFilter,
    offset: u64,
    limit: u64,
    policy: &AttendancePolicy,
) -> AppResult<AttendanceReport> {
    if let (Some(from), Some(to)) = (filter.from_date, filter.to_date) {
        if to < from {
            return Err(AppError::invalid_range());
        }
    }

    let records = store.find_attendance_many(filter, None).await?;
    let summary = summarize_report(&records, policy);

    Ok(AttendanceReport {
        summary,
        page: paginate(records, offset, limit),
    })
}

pub async fn history(
    store: &dyn RecordStore,
    employee_id: u64,
    offset: u64,
    limit: u64,
) -> AppResult<Page<AttendanceRecord>> {
    let filter = AttendanceFilter {
        employee_id: Some(employee_id),
        ..AttendanceFilter::default()
    };
    let limit = clamp_limit(limit);
    let total = store.count_attendance(&filter).await?;
    let rows = store
        .find_attendance_many(&filter, Some(Range { offset, limit }))
        .await?;

    Ok(Page::from_parts(rows, total, offset, limit))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::employee::EmployeePatch;
    use crate::service::testing::hire;
    use crate::store::MemoryStore;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 6).unwrap()
    }

    fn at(h: u32, m: u32) -> NaiveDateTime {
        day().and_hms_opt(h, m, 0).unwrap()
    }

    #[actix_web::test]
    async fn full_day_scenario() {
        let store = MemoryStore::new();
        let policy = AttendancePolicy::default();
        let emp = hire(&store, "a@x.io").await;

        let open = check_in(&store, emp.id, at(9, 0), &policy).await.unwrap();
        assert_eq!(open.status, AttendanceStatus::Present);
        assert!(open.total_hours.is_none());

        let closed = check_out(&store, open.id, at(18, 30), &policy)
            .await
            .unwrap();
        assert_eq!(closed.total_hours, Some(9.5));
        assert_eq!(closed.status, AttendanceStatus::Present);
    }

    #[actix_web::test]
    async fn half_day_scenario() {
        let store = MemoryStore::new();
        let policy = AttendancePolicy::default();
        let emp = hire(&store, "a@x.io").await;

        let open = check_in(&store, emp.id, at(9, 30), &policy).await.unwrap();
        let closed = check_out(&store, open.id, at(13, 0), &policy)
            .await
            .unwrap();
        assert_eq!(closed.total_hours, Some(3.5));
        assert_eq!(closed.status, AttendanceStatus::HalfDay);
    }

    #[actix_web::test]
    async fn second_check_in_same_day_conflicts_without_new_row() {
        let store = MemoryStore::new();
        let policy = AttendancePolicy::default();
        let emp = hire(&store, "a@x.io").await;

        check_in(&store, emp.id, at(9, 0), &policy).await.unwrap();
        let err = check_in(&store, emp.id, at(9, 5), &policy)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let rows = store
            .count_attendance(&AttendanceFilter::default())
            .await
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[actix_web::test]
    async fn double_check_out_conflicts_and_keeps_first_values() {
        let store = MemoryStore::new();
        let policy = AttendancePolicy::default();
        let emp = hire(&store, "a@x.io").await;

        let open = check_in(&store, emp.id, at(9, 0), &policy).await.unwrap();
        check_out(&store, open.id, at(17, 0), &policy).await.unwrap();
        let err = check_out(&store, open.id, at(19, 0), &policy)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let stored = store.find_attendance(open.id).await.unwrap().unwrap();
        assert_eq!(stored.total_hours, Some(8.0));
    }

    #[actix_web::test]
    async fn check_out_of_unknown_record_is_not_found() {
        let store = MemoryStore::new();
        let err = check_out(&store, 42, at(17, 0), &AttendancePolicy::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[actix_web::test]
    async fn inactive_employee_cannot_check_in() {
        let store = MemoryStore::new();
        let emp = hire(&store, "a@x.io").await;
        store
            .update_employee(emp.id, EmployeePatch::deactivate())
            .await
            .unwrap();

        let err = check_in(&store, emp.id, at(9, 0), &AttendancePolicy::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[actix_web::test]
    async fn daily_summary_scenario() {
        let store = MemoryStore::new();
        let policy = AttendancePolicy::default();
        let a = hire(&store, "a@x.io").await;
        let b = hire(&store, "b@x.io").await;
        let c = hire(&store, "c@x.io").await;

        check_in(&store, a.id, at(9, 0), &policy).await.unwrap();
        check_in(&store, b.id, at(8, 30), &policy).await.unwrap();
        mark_absent(&store, c.id, day()).await.unwrap();

        let daily = daily_summary(&store, day(), &policy).await.unwrap();
        assert_eq!(daily.summary.present, 2);
        assert_eq!(daily.summary.absent, 1);
        assert_eq!(daily.summary.late, 0);
        assert_eq!(daily.summary.total, 3);
        assert_eq!(daily.records.len(), 3);
    }

    #[actix_web::test]
    async fn absent_day_blocks_check_in() {
        let store = MemoryStore::new();
        let emp = hire(&store, "a@x.io").await;
        mark_absent(&store, emp.id, day()).await.unwrap();

        let err = check_in(&store, emp.id, at(9, 0), &AttendancePolicy::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[actix_web::test]
    async fn report_sums_over_all_rows_but_returns_one_page() {
        let store = MemoryStore::new();
        let policy = AttendancePolicy::default();
        let emp = hire(&store, "a@x.io").await;

        for d in 5..=9 {
            let date = NaiveDate::from_ymd_opt(2026, 1, d).unwrap();
            let open = check_in(&store, emp.id, date.and_hms_opt(9, 0, 0).unwrap(), &policy)
                .await
                .unwrap();
            check_out(&store, open.id, date.and_hms_opt(17, 0, 0).unwrap(), &policy)
                .await
                .unwrap();
        }

        let filter = AttendanceFilter {
            employee_id: Some(emp.id),
            ..AttendanceFilter::default()
        };
        let rep = report(&store, &filter, 0, 2, &policy).await.unwrap();
        assert_eq!(rep.summary.total_present, 5);
        assert_eq!(rep.summary.total_hours, 40.0);
        assert_eq!(rep.page.data.len(), 2);
        assert_eq!(rep.page.total, 5);
        assert_eq!(rep.page.pages, 3);
    }

    #[actix_web::test]
    async fn history_is_windowed_by_the_store() {
        let store = MemoryStore::new();
        let policy = AttendancePolicy::default();
        let emp = hire(&store, "a@x.io").await;
        for d in 1..=3 {
            let date = NaiveDate::from_ymd_opt(2026, 1, d).unwrap();
            check_in(&store, emp.id, date.and_hms_opt(9, 0, 0).unwrap(), &policy)
                .await
                .unwrap();
        }

        let page = history(&store, emp.id, 2, 2).await.unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.data.len(), 1);
        assert_eq!(
            page.data[0].date,
            NaiveDate::from_ymd_opt(2026, 1, 1).unwrap()
        );
    }
}
