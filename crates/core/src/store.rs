//! External collaborators of the engine and their file/in-memory implementations.
//!
//! The engine talks to storage through three traits:
//! - [`CapacityStore`]: the facility capacity table, read once per run,
//! - [`BookingStore`]: live count of non-rejected bookings per facility and date,
//! - [`ScheduleRecorder`]: persists a decision against a patient record.
//!
//! [`YamlCapacityStore`] reads the capacity table from a strict YAML file.
//! [`InMemoryBookingStore`] keeps bookings in a vector and implements both the booking
//! count and the recorder, so later records in a batch see earlier decisions.

use crate::capacity::{DecisionStatus, FacilityCapacity, SchedulingDecision};
use crate::constants::NOTE_SEPARATOR;
use crate::error::{ScheduleError, ScheduleResult};
use crate::record::PatientRecord;
use chrono::NaiveDate;
use gesta_types::FacilityName;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub trait CapacityStore {
    fn list_capacities(&self) -> ScheduleResult<Vec<FacilityCapacity>>;
}

pub trait BookingStore {
    /// Bookings at `facility` on `date`, excluding rejected ones.
    fn count_active(&self, facility: &FacilityName, date: NaiveDate) -> ScheduleResult<u32>;
}

pub trait ScheduleRecorder {
    /// Inserts or updates the booking for `record`. The decision note is appended to any
    /// existing observation text.
    fn record(
        &mut self,
        record: &PatientRecord,
        decision: &SchedulingDecision,
    ) -> ScheduleResult<()>;
}

/// Wire form of one capacity table row.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CapacityEntry {
    facility: FacilityName,
    weekday: u32,
    saturday: u32,
    #[serde(default)]
    sunday: u32,
}

impl From<CapacityEntry> for FacilityCapacity {
    fn from(entry: CapacityEntry) -> Self {
        FacilityCapacity {
            facility: entry.facility,
            weekday_slots: entry.weekday,
            saturday_slots: entry.saturday,
            sunday_slots: entry.sunday,
        }
    }
}

/// Parses a YAML capacity table. Unknown keys are rejected and errors name the offending
/// path (for example `[1].weekday`).
pub fn parse_capacity_yaml(input: &str) -> ScheduleResult<Vec<FacilityCapacity>> {
    let de = serde_yaml::Deserializer::from_str(input);
    let entries: Vec<CapacityEntry> = serde_path_to_error::deserialize(de)
        .map_err(|e| ScheduleError::Translation(format!("{} at {}", e.inner(), e.path())))?;
    Ok(entries.into_iter().map(FacilityCapacity::from).collect())
}

/// Capacity table stored in a YAML file.
#[derive(Debug, Clone)]
pub struct YamlCapacityStore {
    path: PathBuf,
}

impl YamlCapacityStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CapacityStore for YamlCapacityStore {
    fn list_capacities(&self) -> ScheduleResult<Vec<FacilityCapacity>> {
        let contents = std::fs::read_to_string(&self.path).map_err(|e| {
            ScheduleError::Store(format!("reading {}: {e}", self.path.display()))
        })?;
        parse_capacity_yaml(&contents)
    }
}

/// Lifecycle status of a stored booking.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Scheduled,
    PendingReview,
    Rejected,
}

/// A stored scheduling record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub patient_id: String,
    pub facility: FacilityName,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    pub status: BookingStatus,
    #[serde(default)]
    pub observations: String,
}

impl Booking {
    pub fn scheduled(
        patient_id: impl Into<String>,
        facility: FacilityName,
        date: NaiveDate,
    ) -> Self {
        Self {
            patient_id: patient_id.into(),
            facility,
            date: Some(date),
            status: BookingStatus::Scheduled,
            observations: String::new(),
        }
    }

    fn is_active_on(&self, facility: &FacilityName, date: NaiveDate) -> bool {
        self.status != BookingStatus::Rejected
            && self.date == Some(date)
            && &self.facility == facility
    }
}

/// Appends `note` to `existing`, keeping whatever was there.
pub fn append_note(existing: &str, note: &str) -> String {
    let existing = existing.trim();
    if existing.is_empty() {
        note.to_string()
    } else {
        format!("{existing}{NOTE_SEPARATOR}{note}")
    }
}

/// Bookings held in memory for the duration of a run.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBookingStore {
    bookings: Vec<Booking>,
}

impl InMemoryBookingStore {
    pub fn new(bookings: Vec<Booking>) -> Self {
        Self { bookings }
    }

    /// Loads existing bookings from a YAML (or JSON) list.
    pub fn from_yaml(input: &str) -> ScheduleResult<Self> {
        let de = serde_yaml::Deserializer::from_str(input);
        let bookings: Vec<Booking> = serde_path_to_error::deserialize(de)
            .map_err(|e| ScheduleError::Translation(format!("{} at {}", e.inner(), e.path())))?;
        Ok(Self::new(bookings))
    }

    pub fn push(&mut self, booking: Booking) {
        self.bookings.push(booking);
    }

    pub fn bookings(&self) -> &[Booking] {
        &self.bookings
    }

    pub fn find(&self, patient_id: &str) -> Option<&Booking> {
        self.bookings.iter().find(|b| b.patient_id == patient_id)
    }
}

impl BookingStore for InMemoryBookingStore {
    fn count_active(&self, facility: &FacilityName, date: NaiveDate) -> ScheduleResult<u32> {
        let count = self
            .bookings
            .iter()
            .filter(|b| b.is_active_on(facility, date))
            .count();
        u32::try_from(count).map_err(|_| ScheduleError::Store("booking count overflow".into()))
    }
}

impl ScheduleRecorder for InMemoryBookingStore {
    fn record(
        &mut self,
        record: &PatientRecord,
        decision: &SchedulingDecision,
    ) -> ScheduleResult<()> {
        let facility = FacilityName::new(&record.facility)
            .map_err(|e| ScheduleError::InvalidInput(format!("facility: {e}")))?;
        let status = match decision.status() {
            DecisionStatus::Accepted | DecisionStatus::Rescheduled => BookingStatus::Scheduled,
            DecisionStatus::PendingManualReview => BookingStatus::PendingReview,
        };

        if let Some(existing) = self
            .bookings
            .iter_mut()
            .find(|b| b.patient_id == record.id)
        {
            existing.facility = facility;
            existing.date = decision.resolved_date();
            existing.status = status;
            existing.observations = append_note(&existing.observations, decision.note());
        } else {
            let prior = record.observations.as_deref().unwrap_or_default();
            self.bookings.push(Booking {
                patient_id: record.id.clone(),
                facility,
                date: decision.resolved_date(),
                status,
                observations: append_note(prior, decision.note()),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    const SAMPLE: &str = r#"- facility: Salvalus
  weekday: 9
  saturday: 7
  sunday: 0
- facility: Cruzeiro
  weekday: 3
  saturday: 1
"#;

    #[test]
    fn parses_capacity_yaml() {
        let caps = parse_capacity_yaml(SAMPLE).expect("parse");
        assert_eq!(caps.len(), 2);
        assert_eq!(caps[1].facility.key(), "cruzeiro");
        assert_eq!(caps[1].sunday_slots, 0);
        assert_eq!(caps[0].weekday_slots, 9);
    }

    #[test]
    fn capacity_yaml_rejects_unknown_keys() {
        let input = "- facility: Salvalus\n  weekday: 9\n  saturday: 7\n  holidays: 1\n";
        let err = parse_capacity_yaml(input).expect_err("should reject");
        assert!(matches!(err, ScheduleError::Translation(msg) if msg.contains("holidays")));
    }

    #[test]
    fn capacity_yaml_reports_path_of_bad_value() {
        let input = "- facility: Salvalus\n  weekday: nine\n  saturday: 7\n";
        let err = parse_capacity_yaml(input).expect_err("should reject");
        assert!(matches!(err, ScheduleError::Translation(msg) if msg.contains("weekday")));
    }

    #[test]
    fn yaml_store_reads_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(SAMPLE.as_bytes()).expect("write");
        let store = YamlCapacityStore::new(file.path());
        assert_eq!(store.list_capacities().expect("read").len(), 2);
    }

    #[test]
    fn missing_capacity_file_is_a_store_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = YamlCapacityStore::new(dir.path().join("absent.yaml"));
        let err = store.list_capacities().expect_err("should fail");
        assert!(err.is_retryable());
    }

    #[test]
    fn counts_ignore_case_and_rejections() {
        let date = ymd(2025, 3, 4);
        let mut store = InMemoryBookingStore::default();
        store.push(Booking::scheduled("1", FacilityName::new("Salvalus").unwrap(), date));
        store.push(Booking::scheduled("2", FacilityName::new("SALVALUS ").unwrap(), date));
        let mut rejected = Booking::scheduled("3", FacilityName::new("salvalus").unwrap(), date);
        rejected.status = BookingStatus::Rejected;
        store.push(rejected);
        store.push(Booking::scheduled("4", FacilityName::new("Cruzeiro").unwrap(), date));

        let salvalus = FacilityName::new("salvalus").unwrap();
        assert_eq!(store.count_active(&salvalus, date).expect("count"), 2);
        assert_eq!(store.count_active(&salvalus, ymd(2025, 3, 5)).expect("count"), 0);
    }

    #[test]
    fn loads_bookings_from_yaml() {
        let input = r#"- patient_id: "10"
  facility: Cruzeiro
  date: 2025-03-04
  status: scheduled
- patient_id: "11"
  facility: Cruzeiro
  status: pending_review
"#;
        let store = InMemoryBookingStore::from_yaml(input).expect("parse");
        assert_eq!(store.bookings().len(), 2);
        assert_eq!(store.bookings()[0].date, Some(ymd(2025, 3, 4)));
        assert_eq!(store.bookings()[1].date, None);
    }

    #[test]
    fn append_note_keeps_prior_text() {
        assert_eq!(append_note("", "accepted"), "accepted");
        assert_eq!(append_note("  alergia a látex ", "accepted"), "alergia a látex | accepted");
    }
}
