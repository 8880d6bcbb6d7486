//! Parsing of heterogeneous spreadsheet dates.
//!
//! Exports mix Brazilian (`dd/mm/yyyy`), American (`mm/dd/yyyy`) and ISO (`yyyy-mm-dd`)
//! dates, sometimes without a year, and use `10/6/1900` as a placeholder for "no value".
//!
//! Interpretation order for three numeric components separated by `/` or `-`:
//! 1. day-first with a four-digit year,
//! 2. month-first with a four-digit year,
//! 3. ISO year-month-day.
//!
//! The first interpretation that yields a real calendar date wins. Two-component input
//! (`mm/dd`, slash only) is completed with a year from [`YearPolicy`]; a first component
//! above 12 is taken to be the day and the pair is swapped.
//!
//! Parsing never fails loudly: the outcome is a [`ParsedDate`] and the caller decides how
//! to treat absence or failure.

use crate::config::YearPolicy;
use crate::constants::SENTINEL_DATE;
use crate::error::ScheduleError;
use chrono::NaiveDate;

/// Outcome of parsing one date cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedDate {
    /// A valid calendar date.
    Date(NaiveDate),
    /// The cell was empty or held the placeholder date.
    Absent,
    /// The cell held something that is not a usable date.
    Failure(String),
}

impl ParsedDate {
    /// The parsed date, if any.
    pub fn date(&self) -> Option<NaiveDate> {
        match self {
            ParsedDate::Date(d) => Some(*d),
            _ => None,
        }
    }

    /// Converts the outcome into a `Result`, keeping absence as `Ok(None)`.
    pub fn into_result(self, input: &str) -> Result<Option<NaiveDate>, ScheduleError> {
        match self {
            ParsedDate::Date(d) => Ok(Some(d)),
            ParsedDate::Absent => Ok(None),
            ParsedDate::Failure(reason) => Err(ScheduleError::DateParse {
                input: input.to_string(),
                reason,
            }),
        }
    }
}

/// Stateless date parser bound to a year policy.
#[derive(Debug, Clone, Copy)]
pub struct DateParser {
    policy: YearPolicy,
}

impl DateParser {
    pub fn new(policy: YearPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> YearPolicy {
        self.policy
    }

    /// Parses a raw date cell.
    pub fn parse(&self, text: &str) -> ParsedDate {
        let trimmed = text.trim();
        if trimmed.is_empty() || matches!(trimmed, "-" | "null" | "undefined") {
            return ParsedDate::Absent;
        }

        // Drop a trailing time component ("2025-01-01T00:00:00", "01/02/2025 08:00").
        let date_part = trimmed
            .split(|c: char| c == 'T' || c.is_whitespace())
            .next()
            .unwrap_or(trimmed);

        let parts: Vec<&str> = date_part.split(['/', '-']).collect();
        if !parts.iter().all(|p| is_numeric_component(p)) {
            return ParsedDate::Failure("date contains non-numeric components".into());
        }

        match parts.as_slice() {
            [a, b, c] => self.parse_three(a, b, c),
            [a, b] if date_part.contains('/') => self.parse_day_month(a, b),
            _ => ParsedDate::Failure("unrecognised date layout".into()),
        }
    }

    fn parse_three(&self, a: &str, b: &str, c: &str) -> ParsedDate {
        let (Ok(p0), Ok(p1), Ok(p2)) = (a.parse::<u32>(), b.parse::<u32>(), c.parse::<i32>())
        else {
            return ParsedDate::Failure("date component out of range".into());
        };

        if c.len() == 4 {
            if (p0, p1, p2) == SENTINEL_DATE {
                return ParsedDate::Absent;
            }
            if let Some(d) = NaiveDate::from_ymd_opt(p2, p1, p0) {
                return ParsedDate::Date(d);
            }
            if let Some(d) = NaiveDate::from_ymd_opt(p2, p0, p1) {
                tracing::debug!("date {a}/{b}/{c} read month-first");
                return ParsedDate::Date(d);
            }
            return ParsedDate::Failure(format!(
                "{a}/{b}/{c} is not a valid day-first or month-first date"
            ));
        }

        if a.len() == 4 {
            let (Ok(year), Ok(month), Ok(day)) = (a.parse::<i32>(), b.parse::<u32>(), c.parse::<u32>())
            else {
                return ParsedDate::Failure("date component out of range".into());
            };
            let (sd, sm, sy) = SENTINEL_DATE;
            if (day, month, year) == (sd, sm, sy) {
                return ParsedDate::Absent;
            }
            return match NaiveDate::from_ymd_opt(year, month, day) {
                Some(d) => ParsedDate::Date(d),
                None => ParsedDate::Failure(format!("{a}-{b}-{c} is not a valid ISO date")),
            };
        }

        ParsedDate::Failure("a four-digit year is required".into())
    }

    fn parse_day_month(&self, a: &str, b: &str) -> ParsedDate {
        let (Ok(mut month), Ok(mut day)) = (a.parse::<u32>(), b.parse::<u32>()) else {
            return ParsedDate::Failure("date component out of range".into());
        };
        if month > 12 {
            std::mem::swap(&mut month, &mut day);
            tracing::debug!("year-less date {a}/{b} swapped to month {month}, day {day}");
        }
        let year = self.policy.year_for_month(month);
        match NaiveDate::from_ymd_opt(year, month, day) {
            Some(d) => ParsedDate::Date(d),
            None => ParsedDate::Failure(format!("{a}/{b} is not a valid month/day pair")),
        }
    }
}

fn is_numeric_component(part: &str) -> bool {
    !part.is_empty() && part.len() <= 4 && part.bytes().all(|b| b.is_ascii_digit())
}
