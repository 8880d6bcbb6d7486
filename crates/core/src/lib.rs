//! # Gesta Core
//!
//! Gestational-age computation and capacity-constrained scheduling for obstetric
//! procedures.
//!
//! This crate contains the scheduling engine and its collaborators:
//! - Parsing of the mixed date formats found in clinical spreadsheets
//! - GA arithmetic from a DUM or first-ultrasound reference
//! - Protocol classification and ideal-date projection
//! - Capacity resolution against live booking counts
//! - Batch orchestration with per-record issue reporting
//!
//! **No process concerns**: environment loading, logging setup and output destinations belong
//! in the `gesta-run` and `gesta` binaries.

pub mod capacity;
pub mod config;
pub mod constants;
pub mod date_parser;
pub mod error;
pub mod gestational;
pub mod orchestrator;
pub mod projector;
pub mod protocol;
pub mod record;
pub mod store;
pub mod validation;

pub use capacity::{CapacityTable, DecisionStatus, FacilityCapacity, SchedulingDecision};
pub use config::{RunConfig, SchedulingContext, YearPolicy};
pub use date_parser::{DateParser, ParsedDate};
pub use error::{ScheduleError, ScheduleResult};
pub use gestational::{GaMethod, GaReference, GestationalAge};
pub use orchestrator::{
    run_batch, schedule_patient, BatchReport, IssueKind, PatientOutcome, RecordIssue, RunSummary,
};
pub use protocol::{classify, Protocol, ProtocolKey};
pub use record::PatientRecord;
pub use store::{
    BookingStore, CapacityStore, InMemoryBookingStore, ScheduleRecorder, YamlCapacityStore,
};

pub use gesta_types::FacilityName;
