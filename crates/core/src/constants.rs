//! Constants used throughout the scheduling core crate.
//!
//! Clinical limits, calendar policy, and default configuration locations live here so that
//! every component applies the same values.

/// Year-less `mm/dd` input with a month before this one is assigned to the year after the
/// reference year; later months stay in the reference year.
pub const REFERENCE_YEAR_CUTOFF_MONTH: u32 = 5;

/// Placeholder date exported by the source spreadsheets for "no value" (10 June 1900).
pub const SENTINEL_DATE: (u32, u32, i32) = (10, 6, 1900);

/// Lowest gestational age, in completed weeks, accepted as clinically valid.
pub const MIN_VALID_GA_WEEKS: i64 = 5;

/// Highest gestational age, in completed weeks, accepted as clinically valid.
pub const MAX_VALID_GA_WEEKS: i64 = 42;

/// Length of a term pregnancy in days (40 weeks).
pub const FULL_TERM_DAYS: i64 = 280;

/// Number of days after a full requested date searched for a free slot.
pub const RESCHEDULE_WINDOW_DAYS: i64 = 7;

/// Earliest date that may be requested, in days after the run date.
pub const MIN_LEAD_TIME_DAYS: i64 = 10;

/// Largest gap, in days, between the GA on the booked date and the protocol target before a
/// warning is raised.
pub const GA_TOLERANCE_DAYS: i64 = 7;

/// Separator placed between an existing observation and an appended scheduling note.
pub const NOTE_SEPARATOR: &str = " | ";

/// Default capacity table location when `GESTA_CAPACITY_FILE` is not set.
pub const DEFAULT_CAPACITY_FILE: &str = "config/capacity.yaml";

/// Environment variable naming the run date (ISO `YYYY-MM-DD`).
pub const ENV_RUN_DATE: &str = "GESTA_RUN_DATE";

/// Environment variable naming the capacity table file.
pub const ENV_CAPACITY_FILE: &str = "GESTA_CAPACITY_FILE";

/// Environment variable naming the batch of patient records.
pub const ENV_BATCH_FILE: &str = "GESTA_BATCH_FILE";

/// Environment variable naming an optional file of existing bookings.
pub const ENV_BOOKINGS_FILE: &str = "GESTA_BOOKINGS_FILE";

/// Environment variable naming the output file for the run report.
pub const ENV_OUTPUT_FILE: &str = "GESTA_OUTPUT_FILE";
