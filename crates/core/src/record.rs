//! Patient scheduling records and GA reference selection.
//!
//! A [`PatientRecord`] carries the raw spreadsheet values for one patient. Column mapping
//! happens upstream; here the cells are still free text. [`select_reference`] turns the raw
//! DUM and ultrasound cells into one [`GaReference`], preferring a DUM that is marked
//! reliable, present, and plausible at the run date.

use crate::constants::MAX_VALID_GA_WEEKS;
use crate::date_parser::{DateParser, ParsedDate};
use crate::error::{ScheduleError, ScheduleResult};
use crate::gestational::{parse_formatted, parse_loose_number, GaReference};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Raw scheduling request for one patient.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PatientRecord {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub facility: String,
    /// Free-text DUM reliability answer ("Sim - Confiável", "Incerta", ...).
    #[serde(default)]
    pub dum_status: Option<String>,
    #[serde(default)]
    pub dum_date: Option<String>,
    #[serde(default)]
    pub usg_date: Option<String>,
    /// Combined ultrasound GA (`"12s 3d"`); takes precedence over the split fields.
    #[serde(default)]
    pub usg_ga: Option<String>,
    #[serde(default)]
    pub usg_weeks: Option<String>,
    #[serde(default)]
    pub usg_days: Option<String>,
    #[serde(default)]
    pub diagnosis: String,
    #[serde(default)]
    pub medication: String,
    #[serde(default)]
    pub procedure: String,
    /// GA in weeks the requesting physician asked for.
    #[serde(default)]
    pub intended_ga_weeks: Option<u32>,
    #[serde(default)]
    pub observations: Option<String>,
}

/// Reads a batch of records from a YAML or JSON file.
pub fn read_batch_file(path: &Path) -> ScheduleResult<Vec<PatientRecord>> {
    let contents = std::fs::read_to_string(path).map_err(ScheduleError::FileRead)?;
    parse_batch(&contents)
}

/// Parses a batch of records from YAML (JSON is accepted as a subset).
pub fn parse_batch(input: &str) -> ScheduleResult<Vec<PatientRecord>> {
    let de = serde_yaml::Deserializer::from_str(input);
    serde_path_to_error::deserialize(de)
        .map_err(|e| ScheduleError::Translation(format!("{} at {}", e.inner(), e.path())))
}

/// Interpretation of the DUM reliability answer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DumReliability {
    Reliable,
    Unreliable,
}

impl DumReliability {
    /// Negative markers win over positive ones ("não confiável" is unreliable).
    pub fn from_text(text: Option<&str>) -> Self {
        let Some(text) = text else {
            return DumReliability::Unreliable;
        };
        let lower = text.to_lowercase();
        if ["incerta", "não", "nao"].iter().any(|k| lower.contains(k)) {
            return DumReliability::Unreliable;
        }
        if ["confiável", "confiavel", "certa", "sim"]
            .iter()
            .any(|k| lower.contains(k))
        {
            return DumReliability::Reliable;
        }
        DumReliability::Unreliable
    }
}

/// Non-fatal findings made while selecting a reference.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReferenceNotice {
    /// A date cell could not be parsed.
    UnparsableDate { field: &'static str, input: String, reason: String },
    /// A GA cell could not be parsed.
    UnparsableGa { input: String },
    /// An ultrasound date was given without the GA it reported.
    MissingUltrasoundGa,
    /// The ultrasound GA parsed but is not a valid weeks + days pair.
    InvalidUltrasound { reason: String },
    /// A reliable DUM was ignored because it implies an impossible GA at the run date.
    ImplausibleDum { dum: NaiveDate, days_at_run: i64 },
}

impl std::fmt::Display for ReferenceNotice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReferenceNotice::UnparsableDate { field, input, reason } => {
                write!(f, "{field}: could not parse {input:?} ({reason})")
            }
            ReferenceNotice::UnparsableGa { input } => {
                write!(f, "ultrasound GA: could not parse {input:?}")
            }
            ReferenceNotice::MissingUltrasoundGa => {
                f.write_str("ultrasound date given without the GA it reported")
            }
            ReferenceNotice::InvalidUltrasound { reason } => {
                write!(f, "ultrasound ignored: {reason}")
            }
            ReferenceNotice::ImplausibleDum { dum, days_at_run } => write!(
                f,
                "reliable DUM {dum} ignored: implies {days_at_run} days of gestation at run date"
            ),
        }
    }
}

/// Result of reference selection: the reference (if any) and what was noticed on the way.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReferenceSelection {
    pub reference: Option<GaReference>,
    pub notices: Vec<ReferenceNotice>,
}

impl ReferenceSelection {
    pub fn into_reference(self) -> ScheduleResult<GaReference> {
        self.reference.ok_or(ScheduleError::NoUsableReference)
    }
}

fn parse_cell(
    parser: &DateParser,
    field: &'static str,
    cell: Option<&str>,
    notices: &mut Vec<ReferenceNotice>,
) -> Option<NaiveDate> {
    let input = cell?;
    match parser.parse(input) {
        ParsedDate::Date(d) => Some(d),
        ParsedDate::Absent => None,
        ParsedDate::Failure(reason) => {
            tracing::debug!(field, input, %reason, "unparsable date cell");
            notices.push(ReferenceNotice::UnparsableDate {
                field,
                input: input.to_string(),
                reason,
            });
            None
        }
    }
}

fn non_empty(cell: &Option<String>) -> Option<&str> {
    cell.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Weeks and days reported by the ultrasound. Missing days default to 0; missing weeks
/// leave the ultrasound unusable.
fn ultrasound_ga(record: &PatientRecord, notices: &mut Vec<ReferenceNotice>) -> Option<(u32, u32)> {
    let combined = non_empty(&record.usg_ga);
    if let Some(text) = combined {
        match parse_formatted(text) {
            Ok(ga) => return Some(ga),
            Err(_) => notices.push(ReferenceNotice::UnparsableGa {
                input: text.to_string(),
            }),
        }
    }

    let Some(weeks_cell) = non_empty(&record.usg_weeks) else {
        if combined.is_none() {
            notices.push(ReferenceNotice::MissingUltrasoundGa);
        }
        return None;
    };
    let Some(weeks) = parse_loose_number(weeks_cell) else {
        notices.push(ReferenceNotice::UnparsableGa {
            input: weeks_cell.to_string(),
        });
        return None;
    };
    let days = match non_empty(&record.usg_days) {
        None => 0,
        Some(cell) => match parse_loose_number(cell) {
            Some(days) => days,
            None => {
                notices.push(ReferenceNotice::UnparsableGa {
                    input: cell.to_string(),
                });
                return None;
            }
        },
    };
    Some((weeks, days))
}

/// Chooses the GA reference for `record`.
///
/// A DUM is used when it is marked reliable, parses to a date, and places the run date
/// between 0 and 42 completed weeks of gestation. Otherwise the first ultrasound is used
/// when its date parses and it carries a GA with days 0-6. With neither, the selection is
/// empty and the notices say why.
pub fn select_reference(
    record: &PatientRecord,
    parser: &DateParser,
    run_date: NaiveDate,
) -> ReferenceSelection {
    let mut notices = Vec::new();

    if DumReliability::from_text(record.dum_status.as_deref()) == DumReliability::Reliable {
        if let Some(dum) = parse_cell(parser, "dum_date", record.dum_date.as_deref(), &mut notices)
        {
            let reference = GaReference::dum(dum);
            let days_at_run = reference.days_at(run_date);
            if (0..=MAX_VALID_GA_WEEKS).contains(&days_at_run.div_euclid(7)) {
                return ReferenceSelection {
                    reference: Some(reference),
                    notices,
                };
            }
            notices.push(ReferenceNotice::ImplausibleDum { dum, days_at_run });
        }
    }

    let reference = parse_cell(parser, "usg_date", record.usg_date.as_deref(), &mut notices)
        .and_then(|exam_date| {
            let (weeks, days) = ultrasound_ga(record, &mut notices)?;
            match GaReference::ultrasound(exam_date, weeks, days) {
                Ok(reference) => Some(reference),
                Err(e) => {
                    notices.push(ReferenceNotice::InvalidUltrasound {
                        reason: e.to_string(),
                    });
                    None
                }
            }
        });

    ReferenceSelection { reference, notices }
}
