//! Folds attendance and leave rows into summary counts, and windows lists.

use serde::Serialize;
use utoipa::ToSchema;

use crate::core::attendance::{AttendancePolicy, classify_day, is_late, round2};
use crate::model::attendance::{AttendanceRecord, AttendanceStatus};
use crate::model::leave_request::{LeaveRequest, LeaveStatus};

pub const MAX_PAGE_SIZE: u64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceSummary {
    /// Attended days, half-days included.
    pub present: u64,
    pub absent: u64,
    pub half_day: u64,
    pub late: u64,
    pub total: u64,
    pub total_hours: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub total_present: u64,
    pub total_absent: u64,
    pub total_hours: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, ToSchema)]
pub struct LeaveSummary {
    pub pending: u64,
    pub approved: u64,
    pub rejected: u64,
}

pub fn summarize_attendance(
    records: &[AttendanceRecord],
    policy: &AttendancePolicy,
) -> AttendanceSummary {
    let mut summary = records
        .iter()
        .fold(AttendanceSummary::default(), |mut acc, record| {
            acc.total += 1;
            acc.total_hours += record.total_hours.unwrap_or(0.0);

            match classify_day(record, policy) {
                AttendanceStatus::Absent => acc.absent += 1,
                status => {
                    acc.present += 1;
                    if status == AttendanceStatus::HalfDay {
                        acc.half_day += 1;
                    }
                    if record
                        .check_in
                        .is_some_and(|ci| is_late(ci, policy.late_cutoff_hour))
                    {
                        acc.late += 1;
                    }
                }
            }
            acc
        });

    summary.total_hours = round2(summary.total_hours);
    summary
}

pub fn summarize_report(records: &[AttendanceRecord], policy: &AttendancePolicy) -> ReportSummary {
    let summary = summarize_attendance(records, policy);
    ReportSummary {
        total_present: summary.present,
        total_absent: summary.absent,
        total_hours: summary.total_hours,
    }
}

pub fn summarize_leaves(records: &[LeaveRequest]) -> LeaveSummary {
    records
        .iter()
        .fold(LeaveSummary::default(), |mut acc, leave| {
            match leave.status {
                LeaveStatus::Pending => acc.pending += 1,
                LeaveStatus::Approved => acc.approved += 1,
                LeaveStatus::Rejected => acc.rejected += 1,
            }
            acc
        })
}

/// One window of a larger result set. `page` is 1-based.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub page: u64,
    pub per_page: u64,
    pub total: u64,
    pub pages: u64,
}

impl<T> Page<T> {
    /// Wraps rows already windowed by the store.
    pub fn from_parts(data: Vec<T>, total: u64, offset: u64, limit: u64) -> Self {
        let per_page = clamp_limit(limit);
        Self {
            data,
            page: (offset / per_page).saturating_add(1),
            per_page,
            total,
            pages: total.div_ceil(per_page),
        }
    }
}

/// Windows `all`; an offset past the end gives an empty page.
pub fn paginate<T>(all: Vec<T>, offset: u64, limit: u64) -> Page<T> {
    let limit = clamp_limit(limit);
    let total = all.len() as u64;
    let data = all
        .into_iter()
        .skip(usize::try_from(offset).unwrap_or(usize::MAX))
        .take(limit as usize)
        .collect();

    Page::from_parts(data, total, offset, limit)
}

pub fn clamp_limit(limit: u64) -> u64 {
    limit.clamp(1, MAX_PAGE_SIZE)
}
