//! Gestational age (GA) arithmetic.
//!
//! GA is carried as a whole number of days and shown as completed weeks plus days, written
//! `"{weeks}s {days}d"` (for example `"38s 2d"`).
//!
//! A [`GaReference`] anchors GA at a known calendar date: for a DUM reference the GA on the
//! DUM date is zero; for an ultrasound reference it is the GA reported by the exam.

use crate::constants::FULL_TERM_DAYS;
use crate::error::{ScheduleError, ScheduleResult};
use chrono::{Duration, NaiveDate};
use serde::Serialize;

/// Source of a GA reference.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GaMethod {
    /// Last menstrual period.
    Dum,
    /// First ultrasound exam.
    Ultrasound,
}

/// A GA known at a specific calendar date.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct GaReference {
    method: GaMethod,
    reference_date: NaiveDate,
    reference_weeks: u32,
    reference_days: u32,
}

impl GaReference {
    /// A DUM reference: GA is zero on the DUM date.
    pub fn dum(date: NaiveDate) -> Self {
        Self {
            method: GaMethod::Dum,
            reference_date: date,
            reference_weeks: 0,
            reference_days: 0,
        }
    }

    /// An ultrasound reference: the exam reported `weeks` + `days` on `exam_date`.
    pub fn ultrasound(exam_date: NaiveDate, weeks: u32, days: u32) -> ScheduleResult<Self> {
        if days > 6 {
            return Err(ScheduleError::InvalidInput(format!(
                "ultrasound days must be between 0 and 6, got {days}"
            )));
        }
        Ok(Self {
            method: GaMethod::Ultrasound,
            reference_date: exam_date,
            reference_weeks: weeks,
            reference_days: days,
        })
    }

    pub fn method(&self) -> GaMethod {
        self.method
    }

    pub fn reference_date(&self) -> NaiveDate {
        self.reference_date
    }

    pub fn reference_weeks(&self) -> u32 {
        self.reference_weeks
    }

    pub fn reference_days(&self) -> u32 {
        self.reference_days
    }

    /// GA in days on the reference date itself.
    pub fn reference_total_days(&self) -> i64 {
        i64::from(self.reference_weeks) * 7 + i64::from(self.reference_days)
    }

    /// GA in days on `target`. Negative when `target` precedes the start of pregnancy.
    pub fn days_at(&self, target: NaiveDate) -> i64 {
        self.reference_total_days() + (target - self.reference_date).num_days()
    }

    /// Calendar date on which GA reaches `total_days`.
    pub fn date_for(&self, total_days: i64) -> Option<NaiveDate> {
        self.reference_date
            .checked_add_signed(Duration::days(total_days - self.reference_total_days()))
    }

    /// Estimated due date (GA of 40 weeks).
    pub fn due_date(&self) -> Option<NaiveDate> {
        self.date_for(FULL_TERM_DAYS)
    }
}

/// A non-negative gestational age.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(into = "String")]
pub struct GestationalAge {
    total_days: i64,
}

impl GestationalAge {
    pub fn from_days(total_days: i64) -> ScheduleResult<Self> {
        if total_days < 0 {
            return Err(ScheduleError::NegativeGa(total_days));
        }
        Ok(Self { total_days })
    }

    pub fn from_weeks_days(weeks: u32, days: u32) -> ScheduleResult<Self> {
        if days > 6 {
            return Err(ScheduleError::GaParse(format!("{weeks}s {days}d")));
        }
        Self::from_days(i64::from(weeks) * 7 + i64::from(days))
    }

    /// GA on `target` according to `reference`.
    pub fn at(reference: &GaReference, target: NaiveDate) -> ScheduleResult<Self> {
        Self::from_days(reference.days_at(target))
    }

    pub fn total_days(&self) -> i64 {
        self.total_days
    }

    pub fn weeks(&self) -> i64 {
        self.total_days / 7
    }

    pub fn days(&self) -> i64 {
        self.total_days % 7
    }
}

impl std::fmt::Display for GestationalAge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}s {}d", self.weeks(), self.days())
    }
}

impl From<GestationalAge> for String {
    fn from(ga: GestationalAge) -> Self {
        ga.to_string()
    }
}

/// Formats a day count as `"{weeks}s {days}d"`. Negative counts are rejected.
pub fn format_ga(total_days: i64) -> ScheduleResult<String> {
    GestationalAge::from_days(total_days).map(|ga| ga.to_string())
}

/// Parses `"Ns Md"`, `"Ns"` or a bare number of weeks into `(weeks, days)`.
///
/// Whitespace and case are ignored, so `"6S1D"`, `"6s 1d"` and `" 6 s "` are accepted.
pub fn parse_formatted(text: &str) -> ScheduleResult<(u32, u32)> {
    let compact: String = text
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect();
    let fail = || ScheduleError::GaParse(text.to_string());

    let number = |s: &str| -> ScheduleResult<u32> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(fail());
        }
        s.parse::<u32>().map_err(|_| fail())
    };

    let (weeks, days) = match compact.split_once('s') {
        Some((w, "")) => (number(w)?, 0),
        Some((w, rest)) => {
            let d = rest.strip_suffix('d').ok_or_else(fail)?;
            (number(w)?, number(d)?)
        }
        None => (number(&compact)?, 0),
    };

    if days > 6 {
        return Err(fail());
    }
    Ok((weeks, days))
}

/// Digits of a loosely formatted numeric cell (`"12 sem"` → 12). `None` when no digits.
pub fn parse_loose_number(text: &str) -> Option<u32> {
    let digits: String = text.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}
