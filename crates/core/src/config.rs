//! Run configuration and the per-run scheduling context.
//!
//! Configuration is resolved once at process startup and then passed into the engine. The
//! engine never reads environment variables while processing records, and the capacity
//! table is loaded exactly once per run into a [`SchedulingContext`] instead of living in
//! process-wide state.

use crate::capacity::CapacityTable;
use crate::constants::{DEFAULT_CAPACITY_FILE, REFERENCE_YEAR_CUTOFF_MONTH};
use crate::error::{ScheduleError, ScheduleResult};
use crate::store::CapacityStore;
use chrono::{Datelike, NaiveDate};
use std::path::{Path, PathBuf};

/// Year inference for dates written without a year.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearPolicy {
    reference_year: i32,
    cutoff_month: u32,
}

impl YearPolicy {
    /// Policy anchored on `reference_year` with [`REFERENCE_YEAR_CUTOFF_MONTH`].
    pub fn new(reference_year: i32) -> Self {
        Self {
            reference_year,
            cutoff_month: REFERENCE_YEAR_CUTOFF_MONTH,
        }
    }

    pub fn for_run_date(run_date: NaiveDate) -> Self {
        Self::new(run_date.year())
    }

    pub fn reference_year(&self) -> i32 {
        self.reference_year
    }

    /// Months before the cutoff fall in the next year, the rest in the reference year.
    pub fn year_for_month(&self, month: u32) -> i32 {
        if month < self.cutoff_month {
            self.reference_year + 1
        } else {
            self.reference_year
        }
    }
}

/// Configuration for one batch run.
#[derive(Clone, Debug)]
pub struct RunConfig {
    run_date: NaiveDate,
    capacity_file: PathBuf,
    batch_file: PathBuf,
    bookings_file: Option<PathBuf>,
    output_file: Option<PathBuf>,
}

impl RunConfig {
    /// Builds a configuration from raw (typically environment) values.
    ///
    /// Empty or whitespace-only values are treated as unset. `run_date` must be ISO
    /// `YYYY-MM-DD`; when unset, `today` is used.
    pub fn from_env_values(
        run_date: Option<String>,
        capacity_file: Option<String>,
        batch_file: Option<String>,
        bookings_file: Option<String>,
        output_file: Option<String>,
        today: NaiveDate,
    ) -> ScheduleResult<Self> {
        fn non_empty(value: Option<String>) -> Option<String> {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        }

        let run_date = match non_empty(run_date) {
            Some(raw) => NaiveDate::parse_from_str(&raw, "%Y-%m-%d").map_err(|e| {
                ScheduleError::InvalidInput(format!("run date {raw:?} is not YYYY-MM-DD: {e}"))
            })?,
            None => today,
        };

        let batch_file = non_empty(batch_file)
            .map(PathBuf::from)
            .ok_or_else(|| ScheduleError::InvalidInput("a batch file is required".into()))?;

        Ok(Self {
            run_date,
            capacity_file: non_empty(capacity_file)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CAPACITY_FILE)),
            batch_file,
            bookings_file: non_empty(bookings_file).map(PathBuf::from),
            output_file: non_empty(output_file).map(PathBuf::from),
        })
    }

    pub fn run_date(&self) -> NaiveDate {
        self.run_date
    }

    pub fn year_policy(&self) -> YearPolicy {
        YearPolicy::for_run_date(self.run_date)
    }

    pub fn capacity_file(&self) -> &Path {
        &self.capacity_file
    }

    pub fn batch_file(&self) -> &Path {
        &self.batch_file
    }

    pub fn bookings_file(&self) -> Option<&Path> {
        self.bookings_file.as_deref()
    }

    pub fn output_file(&self) -> Option<&Path> {
        self.output_file.as_deref()
    }
}

/// Everything a run needs that is fixed for its whole lifetime.
///
/// The capacity table is a snapshot taken when the context is built; starting a new run
/// (building a new context) is the only way to pick up capacity changes.
#[derive(Debug, Clone)]
pub struct SchedulingContext {
    run_date: NaiveDate,
    year_policy: YearPolicy,
    capacities: CapacityTable,
}

impl SchedulingContext {
    pub fn new(run_date: NaiveDate, year_policy: YearPolicy, capacities: CapacityTable) -> Self {
        Self {
            run_date,
            year_policy,
            capacities,
        }
    }

    /// Loads the capacity snapshot from `store` and builds the context.
    pub fn load<S: CapacityStore + ?Sized>(
        store: &S,
        run_date: NaiveDate,
        year_policy: YearPolicy,
    ) -> ScheduleResult<Self> {
        let capacities = CapacityTable::from_entries(store.list_capacities()?)?;
        tracing::info!(
            facilities = capacities.len(),
            %run_date,
            "capacity table loaded"
        );
        Ok(Self::new(run_date, year_policy, capacities))
    }

    pub fn run_date(&self) -> NaiveDate {
        self.run_date
    }

    pub fn year_policy(&self) -> YearPolicy {
        self.year_policy
    }

    pub fn capacities(&self) -> &CapacityTable {
        &self.capacities
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 11, 25).expect("valid date")
    }

    #[test]
    fn year_policy_uses_single_cutoff() {
        let policy = YearPolicy::new(2025);
        assert_eq!(policy.year_for_month(1), 2026);
        assert_eq!(policy.year_for_month(4), 2026);
        assert_eq!(policy.year_for_month(5), 2025);
        assert_eq!(policy.year_for_month(12), 2025);
    }

    #[test]
    fn run_config_defaults() {
        let cfg = RunConfig::from_env_values(
            None,
            Some("  ".into()),
            Some("batch.yaml".into()),
            None,
            None,
            today(),
        )
        .expect("valid config");
        assert_eq!(cfg.run_date(), today());
        assert_eq!(cfg.capacity_file(), Path::new(DEFAULT_CAPACITY_FILE));
        assert_eq!(cfg.batch_file(), Path::new("batch.yaml"));
        assert!(cfg.bookings_file().is_none());
        assert_eq!(cfg.year_policy().reference_year(), 2025);
    }

    #[test]
    fn run_config_parses_run_date() {
        let cfg = RunConfig::from_env_values(
            Some("2026-01-15".into()),
            None,
            Some("batch.yaml".into()),
            None,
            Some("out.json".into()),
            today(),
        )
        .expect("valid config");
        assert_eq!(cfg.run_date(), NaiveDate::from_ymd_opt(2026, 1, 15).unwrap());
        assert_eq!(cfg.output_file(), Some(Path::new("out.json")));
    }

    #[test]
    fn run_config_rejects_bad_run_date() {
        let err = RunConfig::from_env_values(
            Some("15/01/2026".into()),
            None,
            Some("batch.yaml".into()),
            None,
            None,
            today(),
        )
        .expect_err("should reject");
        assert!(matches!(err, ScheduleError::InvalidInput(msg) if msg.contains("YYYY-MM-DD")));
    }

    #[test]
    fn run_config_requires_batch_file() {
        let err = RunConfig::from_env_values(None, None, None, None, None, today())
            .expect_err("should reject");
        assert!(matches!(err, ScheduleError::InvalidInput(msg) if msg.contains("batch file")));
    }
}
