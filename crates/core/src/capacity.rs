//! Facility capacity and date resolution.
//!
//! A scheduling attempt starts at a requested date and ends in exactly one terminal state:
//! - `Accepted`: the requested date has a free slot (or the facility has no configured
//!   capacity and is treated as unconstrained),
//! - `Rescheduled`: the requested date is full and a later day within
//!   [`RESCHEDULE_WINDOW_DAYS`] has a free slot,
//! - `PendingManualReview`: nothing in the window is free.
//!
//! The reschedule search never proposes a Sunday, whatever the Sunday capacity says.
//! Booking counts come from a [`BookingStore`]; a failed count is propagated and never read
//! as "nothing booked".

use crate::constants::RESCHEDULE_WINDOW_DAYS;
use crate::error::{ScheduleError, ScheduleResult};
use crate::store::BookingStore;
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use gesta_types::FacilityName;
use serde::Serialize;
use std::collections::HashMap;

/// Daily slot limits for one facility.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FacilityCapacity {
    pub facility: FacilityName,
    pub weekday_slots: u32,
    pub saturday_slots: u32,
    pub sunday_slots: u32,
}

impl FacilityCapacity {
    /// Slots available on `date`, by day of week.
    pub fn slots_on(&self, date: NaiveDate) -> u32 {
        match date.weekday() {
            Weekday::Sat => self.saturday_slots,
            Weekday::Sun => self.sunday_slots,
            _ => self.weekday_slots,
        }
    }
}

/// Capacities keyed by normalized facility name.
#[derive(Clone, Debug, Default)]
pub struct CapacityTable {
    by_facility: HashMap<FacilityName, FacilityCapacity>,
}

impl CapacityTable {
    /// Builds the table, rejecting two entries for the same facility.
    pub fn from_entries(entries: Vec<FacilityCapacity>) -> ScheduleResult<Self> {
        let mut by_facility = HashMap::with_capacity(entries.len());
        for entry in entries {
            if by_facility.contains_key(&entry.facility) {
                return Err(ScheduleError::DuplicateFacility(entry.facility.to_string()));
            }
            by_facility.insert(entry.facility.clone(), entry);
        }
        Ok(Self { by_facility })
    }

    pub fn get(&self, facility: &FacilityName) -> Option<&FacilityCapacity> {
        self.by_facility.get(facility)
    }

    pub fn len(&self) -> usize {
        self.by_facility.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_facility.is_empty()
    }
}

/// Terminal state of a scheduling attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DecisionStatus {
    Accepted,
    Rescheduled,
    PendingManualReview,
}

/// Outcome of one scheduling attempt. A retry produces a new decision.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SchedulingDecision {
    requested_date: NaiveDate,
    resolved_date: Option<NaiveDate>,
    status: DecisionStatus,
    note: String,
}

impl SchedulingDecision {
    fn accepted(date: NaiveDate, note: String) -> Self {
        Self {
            requested_date: date,
            resolved_date: Some(date),
            status: DecisionStatus::Accepted,
            note,
        }
    }

    pub fn requested_date(&self) -> NaiveDate {
        self.requested_date
    }

    pub fn resolved_date(&self) -> Option<NaiveDate> {
        self.resolved_date
    }

    pub fn status(&self) -> DecisionStatus {
        self.status
    }

    pub fn note(&self) -> &str {
        &self.note
    }

    /// A copy of this decision whose note is `prefix` followed by the original note.
    pub fn annotated(self, prefix: &str) -> Self {
        Self {
            note: format!("{prefix}; {}", self.note),
            ..self
        }
    }
}

/// Resolves `requested` against the capacity of `facility`.
pub fn resolve<B: BookingStore + ?Sized>(
    capacities: &CapacityTable,
    facility: &FacilityName,
    requested: NaiveDate,
    bookings: &B,
) -> ScheduleResult<SchedulingDecision> {
    let Some(capacity) = capacities.get(facility) else {
        tracing::debug!(%facility, "no capacity configured, accepting requested date");
        return Ok(SchedulingDecision::accepted(
            requested,
            format!("capacity not configured for {facility}; accepted {requested}"),
        ));
    };

    let slots = capacity.slots_on(requested);
    let used = bookings.count_active(facility, requested)?;
    if used < slots {
        return Ok(SchedulingDecision::accepted(
            requested,
            format!("accepted {requested} ({used}/{slots} slots used)"),
        ));
    }

    for offset in 1..=RESCHEDULE_WINDOW_DAYS {
        let Some(day) = requested.checked_add_signed(Duration::days(offset)) else {
            break;
        };
        if day.weekday() == Weekday::Sun {
            continue;
        }
        let day_slots = capacity.slots_on(day);
        let day_used = bookings.count_active(facility, day)?;
        if day_used < day_slots {
            return Ok(SchedulingDecision {
                requested_date: requested,
                resolved_date: Some(day),
                status: DecisionStatus::Rescheduled,
                note: format!(
                    "rescheduled +{offset} day(s) to {day}: {requested} full ({used}/{slots}), \
                     {day_used}/{day_slots} slots used on new date"
                ),
            });
        }
    }

    Ok(SchedulingDecision {
        requested_date: requested,
        resolved_date: None,
        status: DecisionStatus::PendingManualReview,
        note: format!(
            "no free slot at {facility} from {requested} through +{RESCHEDULE_WINDOW_DAYS} days \
             (Sundays excluded); manual review required"
        ),
    })
}
