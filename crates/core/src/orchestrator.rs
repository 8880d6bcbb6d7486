//! Per-record scheduling and batch runs.
//!
//! [`schedule_patient`] takes one raw record through reference selection, GA validation,
//! classification, ideal-date projection and capacity resolution. Nothing in that path
//! mutates shared state, so the same record against the same booking counts always yields
//! the same outcome. [`run_batch`] sequences records and hands every decision to a
//! [`ScheduleRecorder`], which is what makes later records see earlier bookings.
//!
//! A record never aborts the batch. Parse failures, validation failures and store failures
//! are collected on the record's [`PatientOutcome`] and the run moves on.

use crate::capacity::{resolve, DecisionStatus, SchedulingDecision};
use crate::config::SchedulingContext;
use crate::constants::{GA_TOLERANCE_DAYS, MIN_LEAD_TIME_DAYS};
use crate::date_parser::DateParser;
use crate::error::{ScheduleError, ScheduleResult};
use crate::gestational::{GaReference, GestationalAge};
use crate::projector::ideal_date;
use crate::protocol::{classify, Protocol, ProtocolKey};
use crate::record::{select_reference, PatientRecord, ReferenceNotice};
use crate::store::{BookingStore, ScheduleRecorder};
use crate::validation::{intended_ga_mismatch, validate_facility, validate_ga_at};
use chrono::{Duration, NaiveDate};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use uuid::Uuid;

/// Category of a per-record finding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// Malformed date or GA text.
    Parse,
    /// Input that parsed but cannot be scheduled.
    Validation,
    /// An external store failed; the record should be retried.
    Store,
    /// Scheduling went ahead but something deserves a look.
    Warning,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RecordIssue {
    pub kind: IssueKind,
    pub message: String,
}

impl RecordIssue {
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            kind: IssueKind::Warning,
            message: message.into(),
        }
    }
}

impl From<&ScheduleError> for RecordIssue {
    fn from(err: &ScheduleError) -> Self {
        let kind = match err {
            ScheduleError::DateParse { .. } | ScheduleError::GaParse(_) => IssueKind::Parse,
            e if e.is_retryable() => IssueKind::Store,
            _ => IssueKind::Validation,
        };
        Self {
            kind,
            message: err.to_string(),
        }
    }
}

impl From<ReferenceNotice> for RecordIssue {
    fn from(notice: ReferenceNotice) -> Self {
        let kind = match notice {
            ReferenceNotice::ImplausibleDum { .. } => IssueKind::Warning,
            ReferenceNotice::UnparsableDate { .. } | ReferenceNotice::UnparsableGa { .. } => {
                IssueKind::Parse
            }
            ReferenceNotice::MissingUltrasoundGa | ReferenceNotice::InvalidUltrasound { .. } => {
                IssueKind::Validation
            }
        };
        Self {
            kind,
            message: notice.to_string(),
        }
    }
}

/// Everything computed for one patient record.
#[derive(Clone, Debug, Serialize)]
pub struct PatientOutcome {
    pub patient_id: String,
    pub facility: String,
    pub protocol: ProtocolKey,
    pub reference: Option<GaReference>,
    pub ga_today: Option<GestationalAge>,
    pub due_date: Option<NaiveDate>,
    pub ideal_date: Option<NaiveDate>,
    pub decision: Option<SchedulingDecision>,
    pub issues: Vec<RecordIssue>,
}

impl PatientOutcome {
    fn new(record: &PatientRecord, protocol: &Protocol) -> Self {
        Self {
            patient_id: record.id.clone(),
            facility: record.facility.trim().to_string(),
            protocol: protocol.key,
            reference: None,
            ga_today: None,
            due_date: None,
            ideal_date: None,
            decision: None,
            issues: Vec::new(),
        }
    }

    fn fail(mut self, err: ScheduleError) -> Self {
        tracing::warn!(patient = %self.patient_id, error = %err, "record not scheduled");
        self.issues.push(RecordIssue::from(&err));
        self
    }

    pub fn has_issue(&self, kind: IssueKind) -> bool {
        self.issues.iter().any(|i| i.kind == kind)
    }
}

/// Schedules one record against the run context and the live booking counts.
pub fn schedule_patient<B: BookingStore + ?Sized>(
    ctx: &SchedulingContext,
    record: &PatientRecord,
    bookings: &B,
) -> PatientOutcome {
    let protocol = classify(&record.diagnosis, &record.medication, &record.procedure);
    let mut outcome = PatientOutcome::new(record, protocol);
    tracing::debug!(patient = %record.id, protocol = %protocol.key, "classified");

    let facility = match validate_facility(&record.facility) {
        Ok(f) => f,
        Err(e) => return outcome.fail(e),
    };

    if let Some(warning) = intended_ga_mismatch(record.intended_ga_weeks, protocol) {
        outcome.issues.push(RecordIssue::warning(warning));
    }

    let run_date = ctx.run_date();
    let selection = select_reference(record, &DateParser::new(ctx.year_policy()), run_date);
    outcome
        .issues
        .extend(selection.notices.into_iter().map(RecordIssue::from));
    let Some(reference) = selection.reference else {
        return outcome.fail(ScheduleError::NoUsableReference);
    };
    outcome.reference = Some(reference);
    outcome.due_date = reference.due_date();

    let ga_today = match validate_ga_at(&reference, run_date) {
        Ok(ga) => ga,
        Err(e) => return outcome.fail(e),
    };
    outcome.ga_today = Some(ga_today);

    let Some(ideal) = ideal_date(&reference, protocol) else {
        return outcome.fail(ScheduleError::NoIdealDate);
    };
    outcome.ideal_date = Some(ideal);

    let earliest = run_date
        .checked_add_signed(Duration::days(MIN_LEAD_TIME_DAYS))
        .unwrap_or(run_date);
    let requested = if ideal < earliest {
        outcome.issues.push(RecordIssue::warning(format!(
            "ideal date {ideal} ({} at {}s) is less than {MIN_LEAD_TIME_DAYS} days away; \
             requesting {earliest}",
            protocol.display_name,
            protocol.target_weeks()
        )));
        earliest
    } else {
        ideal
    };

    let decision = match resolve(ctx.capacities(), &facility, requested, bookings) {
        Ok(d) => d,
        Err(e) => return outcome.fail(e),
    };

    let on = decision.resolved_date().unwrap_or(requested);
    let target_days = i64::from(protocol.target_weeks()) * 7;
    let drift = reference.days_at(on) - target_days;
    if decision.resolved_date().is_some() && drift.abs() > GA_TOLERANCE_DAYS {
        outcome.issues.push(RecordIssue::warning(format!(
            "GA on {on} is {drift:+} days from the {}s target (tolerance {GA_TOLERANCE_DAYS} days)",
            protocol.target_weeks()
        )));
    }
    let ga_on = GestationalAge::at(&reference, on)
        .map(|ga| ga.to_string())
        .unwrap_or_else(|_| "unknown".to_string());
    let decision = decision.annotated(&format!(
        "{} ({}): GA {ga_on} on {on}",
        protocol.display_name,
        protocol.window_label()
    ));

    tracing::info!(
        patient = %record.id,
        %facility,
        status = ?decision.status(),
        resolved = ?decision.resolved_date(),
        "scheduling decision"
    );
    outcome.decision = Some(decision);
    outcome
}

/// Counts over one run's outcomes.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub total: usize,
    pub accepted: usize,
    pub rescheduled: usize,
    pub pending_manual_review: usize,
    /// Records that produced no decision at all.
    pub unscheduled: usize,
    pub with_issues: usize,
    pub by_protocol: BTreeMap<&'static str, usize>,
}

impl RunSummary {
    pub fn from_outcomes(outcomes: &[PatientOutcome]) -> Self {
        let mut summary = Self {
            total: outcomes.len(),
            ..Self::default()
        };
        for outcome in outcomes {
            match outcome.decision.as_ref().map(SchedulingDecision::status) {
                Some(DecisionStatus::Accepted) => summary.accepted += 1,
                Some(DecisionStatus::Rescheduled) => summary.rescheduled += 1,
                Some(DecisionStatus::PendingManualReview) => summary.pending_manual_review += 1,
                None => summary.unscheduled += 1,
            }
            if !outcome.issues.is_empty() {
                summary.with_issues += 1;
            }
            *summary
                .by_protocol
                .entry(outcome.protocol.as_str())
                .or_default() += 1;
        }
        summary
    }
}

/// Result of one batch run.
#[derive(Clone, Debug, Serialize)]
pub struct BatchReport {
    pub run_id: Uuid,
    pub run_date: NaiveDate,
    pub outcomes: Vec<PatientOutcome>,
    pub summary: RunSummary,
}

impl BatchReport {
    pub fn to_json(&self) -> ScheduleResult<String> {
        serde_json::to_string_pretty(self).map_err(ScheduleError::Serialization)
    }

    /// Writes the report as pretty JSON to `path`, replacing any existing file.
    pub fn write_json(&self, path: &Path) -> ScheduleResult<()> {
        let json = self.to_json()?;
        std::fs::write(path, json).map_err(ScheduleError::FileWrite)
    }
}

/// Schedules `records` in order, recording each decision before moving to the next record.
pub fn run_batch<S: BookingStore + ScheduleRecorder>(
    ctx: &SchedulingContext,
    records: &[PatientRecord],
    store: &mut S,
) -> BatchReport {
    let run_id = Uuid::new_v4();
    tracing::info!(%run_id, run_date = %ctx.run_date(), records = records.len(), "batch started");

    let mut outcomes = Vec::with_capacity(records.len());
    for record in records {
        let mut outcome = schedule_patient(ctx, record, &*store);
        if let Some(decision) = &outcome.decision {
            if let Err(e) = store.record(record, decision) {
                tracing::warn!(patient = %record.id, error = %e, "decision not recorded");
                outcome.decision = None;
                outcome.issues.push(RecordIssue::from(&e));
            }
        }
        for issue in &outcome.issues {
            tracing::warn!(patient = %outcome.patient_id, kind = ?issue.kind, "{}", issue.message);
        }
        outcomes.push(outcome);
    }

    let summary = RunSummary::from_outcomes(&outcomes);
    tracing::info!(
        %run_id,
        total = summary.total,
        accepted = summary.accepted,
        rescheduled = summary.rescheduled,
        pending = summary.pending_manual_review,
        unscheduled = summary.unscheduled,
        with_issues = summary.with_issues,
        "batch finished"
    );

    BatchReport {
        run_id,
        run_date: ctx.run_date(),
        outcomes,
        summary,
    }
}
