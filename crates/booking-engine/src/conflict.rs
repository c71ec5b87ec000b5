//! Decide whether a candidate stay may be admitted on a spot.
//!
//! Every path that creates or reschedules a booking goes through this module,
//! so there is exactly one overlap rule in the system: two stays `[s1, e1)`
//! and `[s2, e2)` collide iff `s1 < e2 && s2 < e1`. Back-to-back stays
//! (checkout and check-in on the same day) are NOT conflicts.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::interval::{DateRange, Interval, ReservationId, ResourceId};

/// Outcome of a conflict check.
///
/// `Reject` is a normal answer, not an error. It carries the conflicting
/// booking so callers can explain the refusal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", content = "conflict", rename_all = "lowercase")]
pub enum Decision {
    Admit,
    Reject(Interval),
}

impl Decision {
    pub fn is_admit(&self) -> bool {
        matches!(self, Decision::Admit)
    }

    /// The booking that caused a rejection, if any.
    pub fn conflict(&self) -> Option<&Interval> {
        match self {
            Decision::Admit => None,
            Decision::Reject(interval) => Some(interval),
        }
    }
}

/// Validate raw bounds into a [`DateRange`].
///
/// # Errors
/// Returns `BookingError::InvalidInterval` when `start >= end`.
pub fn validate_range(start: NaiveDate, end: NaiveDate) -> Result<DateRange> {
    DateRange::new(start, end)
}

/// Check `candidate` against the bookings already admitted on its spot.
///
/// The caller supplies only the bookings of the candidate's spot. When
/// several bookings overlap, the earliest-starting one is reported (then
/// earliest end, then lowest id), so the result does not depend on the
/// order of `existing`.
pub fn check_conflict(candidate: &DateRange, existing: &[Interval]) -> Decision {
    earliest_overlap(candidate, existing.iter())
}

/// Like [`check_conflict`], for moving an admitted booking to new dates.
///
/// Bookings with id `own_id` are skipped so a booking never collides with its
/// own previous dates. Bookings on other spots are skipped too.
pub fn check_update_conflict(
    resource_id: ResourceId,
    own_id: ReservationId,
    candidate: &DateRange,
    existing: &[Interval],
) -> Decision {
    earliest_overlap(
        candidate,
        existing
            .iter()
            .filter(|i| i.id != own_id && i.resource_id == resource_id),
    )
}

/// Validate raw bounds, then check them against `existing`.
///
/// # Errors
/// Returns `BookingError::InvalidInterval` when `start >= end`; the conflict
/// check never runs in that case.
pub fn check_dates(start: NaiveDate, end: NaiveDate, existing: &[Interval]) -> Result<Decision> {
    let candidate = validate_range(start, end)?;
    Ok(check_conflict(&candidate, existing))
}

/// Every booking in `existing` that overlaps `candidate`, sorted by start.
pub fn find_conflicts(candidate: &DateRange, existing: &[Interval]) -> Vec<Interval> {
    let mut conflicts: Vec<Interval> = existing
        .iter()
        .filter(|i| i.range.overlaps(candidate))
        .cloned()
        .collect();
    conflicts.sort_by_key(|i| (i.start(), i.end(), i.id));
    conflicts
}

fn earliest_overlap<'a>(
    candidate: &DateRange,
    existing: impl Iterator<Item = &'a Interval>,
) -> Decision {
    existing
        .filter(|i| i.range.overlaps(candidate))
        .min_by_key(|i| (i.start(), i.end(), i.id))
        .map_or(Decision::Admit, |i| Decision::Reject(i.clone()))
}
