//! Attendance status derivation from raw check-in/check-out timestamps.

use chrono::{NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::model::attendance::{AttendanceRecord, AttendanceStatus};

pub const DEFAULT_LATE_CUTOFF_HOUR: u32 = 10;
pub const DEFAULT_FULL_DAY_HOURS: f64 = 8.0;

/// Thresholds used when classifying a day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttendancePolicy {
    /// A check-in whose hour is past this one counts as late.
    pub late_cutoff_hour: u32,
    /// Closed days below this many hours are half-days.
    pub full_day_hours: f64,
}

impl Default for AttendancePolicy {
    fn default() -> Self {
        Self {
            late_cutoff_hour: DEFAULT_LATE_CUTOFF_HOUR,
            full_day_hours: DEFAULT_FULL_DAY_HOURS,
        }
    }
}

/// Where a single employee-day sits in `NONE -> CHECKED_IN -> CHECKED_OUT`.
/// `Absent` is a row written by an admin without any check-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttendancePhase {
    None,
    Absent,
    CheckedIn,
    CheckedOut,
}

impl AttendancePhase {
    pub fn of(record: Option<&AttendanceRecord>) -> Self {
        match record {
            None => AttendancePhase::None,
            Some(r) => match (r.check_in, r.check_out) {
                (None, _) => AttendancePhase::Absent,
                (Some(_), None) => AttendancePhase::CheckedIn,
                (Some(_), Some(_)) => AttendancePhase::CheckedOut,
            },
        }
    }
}

/// Values written by a successful check-out.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CheckOut {
    pub check_out: NaiveDateTime,
    pub total_hours: f64,
    pub status: AttendanceStatus,
}

/// Hours between two timestamps, rounded to 2 decimals.
pub fn compute_total_hours(check_in: NaiveDateTime, check_out: NaiveDateTime) -> AppResult<f64> {
    if check_out < check_in {
        return Err(AppError::Validation(
            "check-out time cannot be before check-in time".to_string(),
        ));
    }

    let millis = (check_out - check_in).num_milliseconds() as f64;
    Ok(round2(millis / 3_600_000.0))
}

pub fn is_late(check_in: NaiveDateTime, cutoff_hour: u32) -> bool {
    check_in.hour() > cutoff_hour
}

/// Decision table over the raw fields of a day.
pub fn classify(
    check_in: Option<NaiveDateTime>,
    check_out: Option<NaiveDateTime>,
    total_hours: Option<f64>,
    full_day_hours: f64,
) -> AttendanceStatus {
    match (check_in, check_out) {
        (None, _) => AttendanceStatus::Absent,
        (Some(_), None) => AttendanceStatus::Present,
        (Some(ci), Some(co)) => {
            // missing total: recompute from the timestamps
            let hours = total_hours
                .or_else(|| compute_total_hours(ci, co).ok())
                .unwrap_or(0.0);
            if hours < full_day_hours {
                AttendanceStatus::HalfDay
            } else {
                AttendanceStatus::Present
            }
        }
    }
}

pub fn classify_day(record: &AttendanceRecord, policy: &AttendancePolicy) -> AttendanceStatus {
    classify(
        record.check_in,
        record.check_out,
        record.total_hours,
        policy.full_day_hours,
    )
}

/// Rejects a second check-in (or a check-in on a day marked absent).
pub fn ensure_can_check_in(existing: Option<&AttendanceRecord>) -> AppResult<()> {
    match AttendancePhase::of(existing) {
        AttendancePhase::None => Ok(()),
        AttendancePhase::Absent => Err(AppError::Conflict(
            "Attendance for today is already marked absent".to_string(),
        )),
        AttendancePhase::CheckedIn | AttendancePhase::CheckedOut => {
            Err(AppError::Conflict("Already checked in today".to_string()))
        }
    }
}

/// Closes an open day at `at`, computing hours and the final status eagerly.
pub fn check_out(
    record: &AttendanceRecord,
    at: NaiveDateTime,
    policy: &AttendancePolicy,
) -> AppResult<CheckOut> {
    let check_in = match AttendancePhase::of(Some(record)) {
        AttendancePhase::CheckedIn => record.check_in,
        AttendancePhase::CheckedOut => {
            return Err(AppError::Conflict("Already checked out".to_string()));
        }
        AttendancePhase::Absent | AttendancePhase::None => {
            return Err(AppError::Conflict(
                "No active check-in found for this record".to_string(),
            ));
        }
    };

    let check_in = check_in.ok_or_else(|| AppError::Conflict("Record has no check-in".into()))?;
    let total_hours = compute_total_hours(check_in, at)?;
    let status = classify(Some(check_in), Some(at), Some(total_hours), policy.full_day_hours);

    Ok(CheckOut {
        check_out: at,
        total_hours,
        status,
    })
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::NaiveDate;

    pub(crate) fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 1, 6)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    pub(crate) fn record(
        check_in: Option<NaiveDateTime>,
        check_out: Option<NaiveDateTime>,
        total_hours: Option<f64>,
    ) -> AttendanceRecord {
        AttendanceRecord {
            id: 1,
            employee_id: 1,
            date: NaiveDate::from_ymd_opt(2026, 1, 6).unwrap(),
            check_in,
            check_out,
            total_hours,
            status: classify(check_in, check_out, total_hours, DEFAULT_FULL_DAY_HOURS),
        }
    }

    #[test]
    fn full_day_is_present() {
        let hours = compute_total_hours(at(9, 0), at(18, 30)).unwrap();
        assert_eq!(hours, 9.5);
        let r = record(Some(at(9, 0)), Some(at(18, 30)), Some(hours));
        assert_eq!(
            classify_day(&r, &AttendancePolicy::default()),
            AttendanceStatus::Present
        );
    }

    #[test]
    fn short_day_is_half_day() {
        let hours = compute_total_hours(at(9, 30), at(13, 0)).unwrap();
        assert_eq!(hours, 3.5);
        let r = record(Some(at(9, 30)), Some(at(13, 0)), Some(hours));
        assert_eq!(
            classify_day(&r, &AttendancePolicy::default()),
            AttendanceStatus::HalfDay
        );
    }

    #[test]
    fn hours_round_to_two_decimals() {
        // 7h 20m = 7.333...
        assert_eq!(compute_total_hours(at(9, 0), at(16, 20)).unwrap(), 7.33);
        assert_eq!(compute_total_hours(at(9, 0), at(9, 0)).unwrap(), 0.0);
    }

    #[test]
    fn check_out_before_check_in_is_rejected() {
        let err = compute_total_hours(at(10, 0), at(9, 59)).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn classification_is_total() {
        let full = DEFAULT_FULL_DAY_HOURS;
        let cases = [
            (None, None, None, AttendanceStatus::Absent),
            (None, Some(at(17, 0)), Some(9.0), AttendanceStatus::Absent),
            (None, Some(at(17, 0)), Some(2.0), AttendanceStatus::Absent),
            (Some(at(9, 0)), None, None, AttendanceStatus::Present),
            (Some(at(9, 0)), None, Some(2.0), AttendanceStatus::Present),
            (Some(at(9, 0)), Some(at(17, 0)), Some(8.0), AttendanceStatus::Present),
            (Some(at(9, 0)), Some(at(12, 0)), Some(3.0), AttendanceStatus::HalfDay),
        ];
        for (ci, co, hours, expected) in cases {
            assert_eq!(classify(ci, co, hours, full), expected, "{ci:?} {co:?} {hours:?}");
        }
    }

    #[test]
    fn missing_total_is_recomputed() {
        assert_eq!(
            classify(Some(at(9, 0)), Some(at(11, 0)), None, DEFAULT_FULL_DAY_HOURS),
            AttendanceStatus::HalfDay
        );
        assert_eq!(
            classify(Some(at(9, 0)), Some(at(18, 0)), None, DEFAULT_FULL_DAY_HOURS),
            AttendanceStatus::Present
        );
    }

    #[test]
    fn late_means_past_the_cutoff_hour() {
        assert!(!is_late(at(9, 59), 10));
        assert!(!is_late(at(10, 45), 10));
        assert!(is_late(at(11, 0), 10));
        assert!(is_late(at(9, 5), 8));
    }

    #[test]
    fn second_check_in_conflicts() {
        assert!(ensure_can_check_in(None).is_ok());
        let open = record(Some(at(9, 0)), None, None);
        assert!(matches!(
            ensure_can_check_in(Some(&open)),
            Err(AppError::Conflict(_))
        ));
        let absent = record(None, None, None);
        assert!(matches!(
            ensure_can_check_in(Some(&absent)),
            Err(AppError::Conflict(_))
        ));
    }

    #[test]
    fn check_out_closes_an_open_day_once() {
        let policy = AttendancePolicy::default();
        let open = record(Some(at(9, 30)), None, None);
        let done = check_out(&open, at(13, 0), &policy).unwrap();
        assert_eq!(done.total_hours, 3.5);
        assert_eq!(done.status, AttendanceStatus::HalfDay);

        let closed = record(Some(at(9, 30)), Some(at(13, 0)), Some(3.5));
        assert!(matches!(
            check_out(&closed, at(14, 0), &policy),
            Err(AppError::Conflict(_))
        ));
    }

    #[test]
    fn check_out_on_absent_day_conflicts() {
        let absent = record(None, None, None);
        assert!(matches!(
            check_out(&absent, at(17, 0), &AttendancePolicy::default()),
            Err(AppError::Conflict(_))
        ));
    }

    #[test]
    fn custom_full_day_threshold() {
        let policy = AttendancePolicy {
            late_cutoff_hour: 9,
            full_day_hours: 4.0,
        };
        let r = record(Some(at(9, 0)), Some(at(13, 30)), Some(4.5));
        assert_eq!(classify_day(&r, &policy), AttendanceStatus::Present);
    }
}
