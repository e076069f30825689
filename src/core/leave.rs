//! Leave day counting, per-type quotas and balance aggregation.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use utoipa::ToSchema;

use crate::error::{AppError, AppResult};
use crate::model::leave_request::{LeaveRequest, LeaveStatus, LeaveType};

/// Days allotted per leave type for a calendar year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveQuotas {
    pub sick: i64,
    pub casual: i64,
    pub vacation: i64,
    pub others: i64,
}

impl Default for LeaveQuotas {
    fn default() -> Self {
        Self {
            sick: 5,
            casual: 10,
            vacation: 15,
            others: 5,
        }
    }
}

impl LeaveQuotas {
    pub fn total(&self, leave_type: LeaveType) -> i64 {
        match leave_type {
            LeaveType::Sick => self.sick,
            LeaveType::Casual => self.casual,
            LeaveType::Vacation => self.vacation,
            LeaveType::Others => self.others,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
pub struct BalanceEntry {
    pub total: i64,
    pub used: i64,
    /// Negative once usage exceeds the quota.
    pub remaining: i64,
}

/// Keyed by leave type; serializes as `{"SICK": {...}, "CASUAL": {...}, ...}`.
pub type LeaveBalance = BTreeMap<LeaveType, BalanceEntry>;

/// Inclusive number of calendar days from `start` to `end`.
pub fn span_days(start: NaiveDate, end: NaiveDate) -> AppResult<i64> {
    if end < start {
        return Err(AppError::invalid_range());
    }
    Ok((end - start).num_days() + 1)
}

/// Sums approved usage per type against the quotas. Leaves in any other
/// status do not count. Over-allocation is reported, not capped.
pub fn compute_balance<'a, I>(leaves: I, quotas: &LeaveQuotas) -> LeaveBalance
where
    I: IntoIterator<Item = &'a LeaveRequest>,
{
    let mut used: BTreeMap<LeaveType, i64> = BTreeMap::new();
    for leave in leaves {
        if leave.status == LeaveStatus::Approved {
            *used.entry(leave.leave_type).or_insert(0) += leave.days_requested;
        }
    }

    LeaveType::iter()
        .map(|leave_type| {
            let total = quotas.total(leave_type);
            let used = used.get(&leave_type).copied().unwrap_or(0);
            (
                leave_type,
                BalanceEntry {
                    total,
                    used,
                    remaining: total - used,
                },
            )
        })
        .collect()
}

/// A submission with every required field present and an ordered range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidLeave {
    pub employee_id: u64,
    pub leave_type: LeaveType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub days_requested: i64,
}

/// Checks a submission and works out the number of days it covers.
/// Remaining balance is not checked here.
pub fn validate_request(
    employee_id: Option<u64>,
    leave_type: Option<LeaveType>,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
) -> AppResult<ValidLeave> {
    let employee_id = employee_id.ok_or_else(|| AppError::missing_field("employee_id"))?;
    let leave_type = leave_type.ok_or_else(|| AppError::missing_field("leave_type"))?;
    let start_date = start_date.ok_or_else(|| AppError::missing_field("start_date"))?;
    let end_date = end_date.ok_or_else(|| AppError::missing_field("end_date"))?;

    Ok(ValidLeave {
        employee_id,
        leave_type,
        start_date,
        end_date,
        days_requested: span_days(start_date, end_date)?,
    })
}

/// `PENDING -> APPROVED | REJECTED`; nothing leaves a terminal state.
pub fn transition(from: LeaveStatus, to: LeaveStatus) -> AppResult<LeaveStatus> {
    if from.is_terminal() {
        return Err(AppError::Conflict(format!(
            "Leave request already {from}, cannot change to {to}"
        )));
    }
    if to == LeaveStatus::Pending {
        return Err(AppError::Conflict(
            "A leave request cannot move back to PENDING".to_string(),
        ));
    }
    Ok(to)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn leave(leave_type: LeaveType, status: LeaveStatus, days: i64) -> LeaveRequest {
        LeaveRequest {
            id: 0,
            employee_id: 1,
            leave_type,
            start_date: d(2026, 1, 6),
            end_date: d(2026, 1, 6),
            reason: String::new(),
            status,
            days_requested: days,
        }
    }

    #[test]
    fn single_day_spans_one() {
        assert_eq!(span_days(d(2026, 1, 6), d(2026, 1, 6)).unwrap(), 1);
        assert_eq!(span_days(d(2026, 1, 6), d(2026, 1, 12)).unwrap(), 7);
    }

    #[test]
    fn span_crosses_month_and_leap_day() {
        assert_eq!(span_days(d(2028, 2, 28), d(2028, 3, 1)).unwrap(), 3);
        assert_eq!(span_days(d(2025, 12, 31), d(2026, 1, 1)).unwrap(), 2);
    }

    #[test]
    fn inverted_range_is_rejected() {
        let err = span_days(d(2026, 1, 7), d(2026, 1, 6)).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn sick_leave_scenario() {
        let days = validate_request(
            Some(1),
            Some(LeaveType::Sick),
            Some(d(2026, 1, 6)),
            Some(d(2026, 1, 7)),
        )
        .unwrap()
        .days_requested;
        assert_eq!(days, 2);

        let approved = [leave(LeaveType::Sick, LeaveStatus::Approved, days)];
        let balance = compute_balance(&approved, &LeaveQuotas::default());
        assert_eq!(
            balance[&LeaveType::Sick],
            BalanceEntry {
                total: 5,
                used: 2,
                remaining: 3
            }
        );
        assert_eq!(balance[&LeaveType::Casual].used, 0);
    }

    #[test]
    fn remaining_is_total_minus_used_even_when_negative() {
        let leaves = [
            leave(LeaveType::Vacation, LeaveStatus::Approved, 10),
            leave(LeaveType::Vacation, LeaveStatus::Approved, 9),
            leave(LeaveType::Casual, LeaveStatus::Approved, 3),
            leave(LeaveType::Others, LeaveStatus::Pending, 4),
            leave(LeaveType::Sick, LeaveStatus::Rejected, 2),
        ];
        let balance = compute_balance(&leaves, &LeaveQuotas::default());

        assert_eq!(balance.len(), 4);
        for entry in balance.values() {
            assert_eq!(entry.remaining, entry.total - entry.used);
        }
        assert_eq!(balance[&LeaveType::Vacation].remaining, -4);
        assert_eq!(balance[&LeaveType::Others].used, 0);
        assert_eq!(balance[&LeaveType::Sick].used, 0);
    }

    #[test]
    fn injected_quotas_are_used() {
        let quotas = LeaveQuotas {
            sick: 12,
            ..LeaveQuotas::default()
        };
        let balance = compute_balance(&Vec::<LeaveRequest>::new(), &quotas);
        assert_eq!(balance[&LeaveType::Sick].total, 12);
        assert_eq!(balance[&LeaveType::Sick].remaining, 12);
    }

    #[test]
    fn balance_serializes_keyed_by_type() {
        let balance = compute_balance(&Vec::<LeaveRequest>::new(), &LeaveQuotas::default());
        let json = serde_json::to_value(&balance).unwrap();
        assert_eq!(json["SICK"]["total"], 5);
        assert_eq!(json["VACATION"]["remaining"], 15);
    }

    #[test]
    fn valid_request_carries_its_fields() {
        let valid = validate_request(
            Some(7),
            Some(LeaveType::Vacation),
            Some(d(2026, 3, 30)),
            Some(d(2026, 4, 2)),
        )
        .unwrap();
        assert_eq!(
            valid,
            ValidLeave {
                employee_id: 7,
                leave_type: LeaveType::Vacation,
                start_date: d(2026, 3, 30),
                end_date: d(2026, 4, 2),
                days_requested: 4,
            }
        );
    }

    #[test]
    fn missing_fields_are_reported_first() {
        let err = validate_request(None, Some(LeaveType::Sick), None, None).unwrap_err();
        assert_eq!(err.to_string(), "employee_id is required");
        let err = validate_request(Some(1), None, Some(d(2026, 1, 1)), None).unwrap_err();
        assert_eq!(err.to_string(), "leave_type is required");
        let err = validate_request(Some(1), Some(LeaveType::Casual), Some(d(2026, 1, 1)), None)
            .unwrap_err();
        assert_eq!(err.to_string(), "end_date is required");
    }

    #[test]
    fn terminal_states_do_not_move() {
        assert_eq!(
            transition(LeaveStatus::Pending, LeaveStatus::Approved).unwrap(),
            LeaveStatus::Approved
        );
        assert_eq!(
            transition(LeaveStatus::Pending, LeaveStatus::Rejected).unwrap(),
            LeaveStatus::Rejected
        );
        assert!(matches!(
            transition(LeaveStatus::Rejected, LeaveStatus::Approved),
            Err(AppError::Conflict(_))
        ));
        assert!(matches!(
            transition(LeaveStatus::Approved, LeaveStatus::Approved),
            Err(AppError::Conflict(_))
        ));
        assert!(matches!(
            transition(LeaveStatus::Pending, LeaveStatus::Pending),
            Err(AppError::Conflict(_))
        ));
    }
}
