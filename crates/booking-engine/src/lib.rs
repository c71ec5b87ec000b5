//! # booking-engine
//!
//! Date-range conflict checking and reservation admission for bookable spots.
//!
//! A stay occupies the half-open range `[start, end)` of calendar dates: the
//! guest checks in on `start` and checks out on the morning of `end`, so a
//! stay ending on the 16th and one starting on the 16th do not collide.
//!
//! ## Modules
//!
//! - [`interval`] — `DateRange`, `Interval` and the identifier newtypes
//! - [`conflict`] — Admit/reject a candidate range against existing stays
//! - [`freebusy`] — Compute open date ranges for a spot inside a window
//! - [`ledger`] — In-memory reservation store that serializes admission per spot
//! - [`error`] — Error types

pub mod conflict;
pub mod error;
pub mod freebusy;
pub mod interval;
pub mod ledger;

pub use conflict::{
    check_conflict, check_dates, check_update_conflict, find_conflicts, validate_range, Decision,
};
pub use error::{BookingError, Result};
pub use freebusy::{first_free_range, free_ranges, merge_booked};
pub use interval::{parse_api_date, DateRange, Interval, OwnerId, ReservationId, ResourceId};
pub use ledger::Ledger;
