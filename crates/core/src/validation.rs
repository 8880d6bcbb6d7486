//! Input validation utilities.
//!
//! These checks run before a record reaches the capacity resolver so that implausible
//! clinical input is reported instead of scheduled.

use crate::constants::{MAX_VALID_GA_WEEKS, MIN_VALID_GA_WEEKS};
use crate::error::{ScheduleError, ScheduleResult};
use crate::gestational::{GaReference, GestationalAge};
use crate::protocol::Protocol;
use chrono::NaiveDate;
use gesta_types::FacilityName;

/// Validates that the GA implied by `reference` on `run_date` is clinically plausible.
///
/// GA must lie within 5 to 42 completed weeks (inclusive). Anything else usually means a
/// mistyped date or a pregnancy that is already over.
///
/// # Errors
///
/// Returns `ScheduleError::GaOutOfRange` with the completed weeks (which may be negative)
/// when the GA is outside the plausible range.
pub fn validate_ga_at(reference: &GaReference, run_date: NaiveDate) -> ScheduleResult<GestationalAge> {
    let days = reference.days_at(run_date);
    let weeks = days.div_euclid(7);
    if !(MIN_VALID_GA_WEEKS..=MAX_VALID_GA_WEEKS).contains(&weeks) {
        return Err(ScheduleError::GaOutOfRange { weeks });
    }
    GestationalAge::from_days(days)
}

/// Validates and normalizes a facility cell.
///
/// # Errors
///
/// Returns `ScheduleError::InvalidInput` if the name is empty or whitespace-only.
pub fn validate_facility(name: &str) -> ScheduleResult<FacilityName> {
    FacilityName::new(name).map_err(|e| ScheduleError::InvalidInput(format!("facility: {e}")))
}

/// Compares the GA the physician asked for with the protocol window.
///
/// Returns a human-readable warning when they disagree; the protocol target still wins.
pub fn intended_ga_mismatch(intended_weeks: Option<u32>, protocol: &Protocol) -> Option<String> {
    let weeks = intended_weeks?;
    if protocol.window_contains(weeks) {
        return None;
    }
    Some(format!(
        "requested GA {weeks}s is outside the {} window ({}); scheduling at {}s",
        protocol.display_name,
        protocol.window_label(),
        protocol.target_weeks()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::ProtocolKey;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn accepts_ga_inside_range() {
        let reference = GaReference::dum(ymd(2025, 1, 1));
        let ga = validate_ga_at(&reference, ymd(2025, 3, 1)).expect("plausible");
        assert_eq!(ga.to_string(), "8s 3d");
    }

    #[test]
    fn range_bounds_are_inclusive() {
        let reference = GaReference::dum(ymd(2025, 1, 1));
        validate_ga_at(&reference, ymd(2025, 2, 5)).expect("exactly 5 weeks");
        let at_42 = reference.date_for(42 * 7 + 6).expect("date");
        validate_ga_at(&reference, at_42).expect("42 weeks 6 days");
    }

    #[test]
    fn rejects_too_early() {
        let reference = GaReference::dum(ymd(2025, 1, 1));
        let err = validate_ga_at(&reference, ymd(2025, 1, 20)).expect_err("should reject");
        assert!(matches!(err, ScheduleError::GaOutOfRange { weeks: 2 }));
    }

    #[test]
    fn rejects_too_late_and_negative() {
        let reference = GaReference::dum(ymd(2024, 1, 1));
        let err = validate_ga_at(&reference, ymd(2025, 1, 1)).expect_err("should reject");
        assert!(matches!(err, ScheduleError::GaOutOfRange { weeks: 52 }));

        let err = validate_ga_at(&reference, ymd(2023, 12, 30)).expect_err("should reject");
        assert!(matches!(err, ScheduleError::GaOutOfRange { weeks: -1 }));
    }

    #[test]
    fn rejects_blank_facility() {
        assert!(matches!(
            validate_facility("   "),
            Err(ScheduleError::InvalidInput(_))
        ));
        assert_eq!(validate_facility(" Salvalus ").expect("valid").key(), "salvalus");
    }

    #[test]
    fn intended_ga_inside_window_is_silent() {
        let protocol = ProtocolKey::BaixoRisco.protocol();
        assert_eq!(intended_ga_mismatch(Some(40), protocol), None);
        assert_eq!(intended_ga_mismatch(None, protocol), None);
    }

    #[test]
    fn intended_ga_outside_window_warns() {
        let protocol = ProtocolKey::Hipertensao.protocol();
        let warning = intended_ga_mismatch(Some(39), protocol).expect("warning");
        assert!(warning.contains("39s"));
        assert!(warning.contains("37s"));
    }
}
