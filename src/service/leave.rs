use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use utoipa::ToSchema;

use crate::core::leave::{self, LeaveBalance, LeaveQuotas};
use crate::core::report::{LeaveSummary, Page, clamp_limit, paginate, summarize_leaves};
use crate::error::{AppError, AppResult};
use crate::model::leave_request::{LeaveRequest, LeaveStatus, LeaveType, NewLeave};
use crate::store::{LeaveFilter, Range, RecordStore};

use super::require_employee;

/// Leave request as submitted; every field is checked before anything is stored.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct LeaveSubmission {
    #[schema(example = 1000)]
    pub employee_id: Option<u64>,
    #[schema(example = "SICK")]
    pub leave_type: Option<LeaveType>,
    #[schema(example = "2026-01-06", format = "date", value_type = Option<String>)]
    pub start_date: Option<NaiveDate>,
    #[schema(example = "2026-01-07", format = "date", value_type = Option<String>)]
    pub end_date: Option<NaiveDate>,
    #[schema(example = "flu")]
    pub reason: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LeaveReport {
    pub summary: LeaveSummary,
    #[serde(flatten)]
    pub page: Page<LeaveRequest>,
}

/// Stores a `PENDING` request. Remaining balance is not checked.
#[instrument(skip(store))]
pub async fn request_leave(
    store: &dyn RecordStore,
    submission: LeaveSubmission,
) -> AppResult<LeaveRequest> {
    let valid = leave::validate_request(
        submission.employee_id,
        submission.leave_type,
        submission.start_date,
        submission.end_date,
    )?;

    require_employee(store, valid.employee_id).await?;

    let stored = store
        .insert_leave(NewLeave {
            employee_id: valid.employee_id,
            leave_type: valid.leave_type,
            start_date: valid.start_date,
            end_date: valid.end_date,
            reason: submission.reason.unwrap_or_default(),
            days_requested: valid.days_requested,
        })
        .await?;

    info!(
        leave_id = stored.id,
        employee_id = valid.employee_id,
        days_requested = valid.days_requested,
        "Leave requested"
    );
    Ok(stored)
}

/// Moves a `PENDING` request to `decision`. Terminal requests are left alone.
#[instrument(skip(store))]
pub async fn decide_leave(
    store: &dyn RecordStore,
    leave_id: u64,
    decision: LeaveStatus,
) -> AppResult<LeaveRequest> {
    let current = store
        .find_leave(leave_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Leave request {leave_id} not found")))?;

    let next = leave::transition(current.status, decision)?;

    match store.transition_leave(leave_id, current.status, next).await? {
        Some(updated) => {
            info!(leave_id, status = %updated.status, "Leave decided");
            Ok(updated)
        }
        None => {
            warn!(leave_id, "Leave decision lost a race with another decision");
            Err(AppError::Conflict(
                "Leave request already processed".to_string(),
            ))
        }
    }
}

pub async fn balance(
    store: &dyn RecordStore,
    employee_id: u64,
    quotas: &LeaveQuotas,
) -> AppResult<LeaveBalance> {
    require_employee(store, employee_id).await?;

    let filter = LeaveFilter {
        employee_id: Some(employee_id),
        status: Some(LeaveStatus::Approved),
        ..LeaveFilter::default()
    };
    let approved = store.find_leaves(&filter, None).await?;

    Ok(leave::compute_balance(&approved, quotas))
}

pub async fn employee_leaves(
    store: &dyn RecordStore,
    employee_id: u64,
    status: Option<LeaveStatus>,
    leave_type: Option<LeaveType>,
) -> AppResult<Vec<LeaveRequest>> {
    let filter = LeaveFilter {
        employee_id: Some(employee_id),
        status,
        leave_type,
        ..LeaveFilter::default()
    };
    store.find_leaves(&filter, None).await
}

pub async fn pending(
    store: &dyn RecordStore,
    offset: u64,
    limit: u64,
) -> AppResult<Page<LeaveRequest>> {
    let filter = LeaveFilter {
        status: Some(LeaveStatus::Pending),
        ..LeaveFilter::default()
    };
    let limit = clamp_limit(limit);
    let total = store.count_leaves(&filter).await?;
    let rows = store
        .find_leaves(&filter, Some(Range { offset, limit }))
        .await?;

    Ok(Page::from_parts(rows, total, offset, limit))
}

/// Status counts over every matching request, plus one page of them.
pub async fn report(
    store: &dyn RecordStore,
    filter: &LeaveFilter,
    offset: u64,
    limit: u64,
) -> AppResult<LeaveReport> {
    if let (Some(from), Some(to)) = (filter.from_date, filter.to_date) {
        if to < from {
            return Err(AppError::invalid_range());
        }
    }

    let rows = store.find_leaves(filter, None).await?;
    let summary = summarize_leaves(&rows);

    Ok(LeaveReport {
        summary,
        page: paginate(rows, offset, limit),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::leave::BalanceEntry;
    use crate::service::testing::hire;
    use crate::store::MemoryStore;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, day).unwrap()
    }

    fn submission(employee_id: u64, leave_type: LeaveType, start: u32, end: u32) -> LeaveSubmission {
        LeaveSubmission {
            employee_id: Some(employee_id),
            leave_type: Some(leave_type),
            start_date: Some(d(start)),
            end_date: Some(d(end)),
            reason: None,
        }
    }

    #[actix_web::test]
    async fn sick_leave_scenario() {
        let store = MemoryStore::new();
        let emp = hire(&store, "a@x.io").await;

        let req = request_leave(&store, submission(emp.id, LeaveType::Sick, 6, 7))
            .await
            .unwrap();
        assert_eq!(req.days_requested, 2);
        assert_eq!(req.status, LeaveStatus::Pending);

        // pending requests do not consume the quota
        let before = balance(&store, emp.id, &LeaveQuotas::default()).await.unwrap();
        assert_eq!(before[&LeaveType::Sick].used, 0);

        decide_leave(&store, req.id, LeaveStatus::Approved)
            .await
            .unwrap();
        let after = balance(&store, emp.id, &LeaveQuotas::default()).await.unwrap();
        assert_eq!(
            after[&LeaveType::Sick],
            BalanceEntry {
                total: 5,
                used: 2,
                remaining: 3
            }
        );
    }

    #[actix_web::test]
    async fn over_quota_requests_are_accepted() {
        let store = MemoryStore::new();
        let emp = hire(&store, "a@x.io").await;

        let req = request_leave(&store, submission(emp.id, LeaveType::Others, 1, 10))
            .await
            .unwrap();
        decide_leave(&store, req.id, LeaveStatus::Approved)
            .await
            .unwrap();

        let bal = balance(&store, emp.id, &LeaveQuotas::default()).await.unwrap();
        assert_eq!(bal[&LeaveType::Others].remaining, -5);
    }

    #[actix_web::test]
    async fn inverted_dates_are_rejected_before_storing() {
        let store = MemoryStore::new();
        let emp = hire(&store, "a@x.io").await;

        let err = request_leave(&store, submission(emp.id, LeaveType::Casual, 9, 8))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(store.count_leaves(&LeaveFilter::default()).await.unwrap(), 0);
    }

    #[actix_web::test]
    async fn missing_employee_is_a_validation_error() {
        let store = MemoryStore::new();
        let mut sub = submission(1, LeaveType::Casual, 1, 1);
        sub.employee_id = None;
        let err = request_leave(&store, sub).await.unwrap_err();
        assert_eq!(err.to_string(), "employee_id is required");
    }

    #[actix_web::test]
    async fn unknown_employee_is_not_found() {
        let store = MemoryStore::new();
        let err = request_leave(&store, submission(99, LeaveType::Casual, 1, 1))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[actix_web::test]
    async fn rejected_request_cannot_be_approved() {
        let store = MemoryStore::new();
        let emp = hire(&store, "a@x.io").await;
        let req = request_leave(&store, submission(emp.id, LeaveType::Vacation, 1, 3))
            .await
            .unwrap();

        decide_leave(&store, req.id, LeaveStatus::Rejected)
            .await
            .unwrap();
        let err = decide_leave(&store, req.id, LeaveStatus::Approved)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let stored = store.find_leave(req.id).await.unwrap().unwrap();
        assert_eq!(stored.status, LeaveStatus::Rejected);
    }

    #[actix_web::test]
    async fn deciding_unknown_leave_is_not_found() {
        let store = MemoryStore::new();
        let err = decide_leave(&store, 5, LeaveStatus::Approved)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[actix_web::test]
    async fn report_counts_statuses_and_pages_rows() {
        let store = MemoryStore::new();
        let emp = hire(&store, "a@x.io").await;
        let mut ids = Vec::new();
        for day in 1..=4 {
            let req = request_leave(&store, submission(emp.id, LeaveType::Casual, day, day))
                .await
                .unwrap();
            ids.push(req.id);
        }
        decide_leave(&store, ids[0], LeaveStatus::Approved)
            .await
            .unwrap();
        decide_leave(&store, ids[1], LeaveStatus::Rejected)
            .await
            .unwrap();

        let rep = report(&store, &LeaveFilter::default(), 0, 3).await.unwrap();
        assert_eq!(
            rep.summary,
            LeaveSummary {
                pending: 2,
                approved: 1,
                rejected: 1
            }
        );
        assert_eq!(rep.page.data.len(), 3);
        assert_eq!(rep.page.pages, 2);

        let queue = pending(&store, 0, 10).await.unwrap();
        assert_eq!(queue.total, 2);
        assert!(queue.data.iter().all(|l| l.status == LeaveStatus::Pending));
    }

    #[actix_web::test]
    async fn report_rejects_an_inverted_range() {
        let store = MemoryStore::new();
        let emp = hire(&store, "a@x.io").await;
        request_leave(&store, submission(emp.id, LeaveType::Sick, 2, 2))
            .await
            .unwrap();

        let filter = LeaveFilter {
            from_date: Some(d(20)),
            to_date: Some(d(10)),
            ..LeaveFilter::default()
        };
        let err = report(&store, &filter, 0, 10).await.unwrap_err();
        assert_eq!(err.to_string(), "end date cannot be before start date");
    }
}
