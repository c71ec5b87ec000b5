//! Error types for booking-engine operations.

use chrono::NaiveDate;
use thiserror::Error;

use crate::interval::{Interval, OwnerId, ReservationId, ResourceId};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BookingError {
    #[error("Invalid interval: start {start} must be before end {end}")]
    InvalidInterval { start: NaiveDate, end: NaiveDate },

    #[error("Spot {0} couldn't be found")]
    ResourceNotFound(ResourceId),

    #[error("Spot {0} is already registered")]
    AlreadyExists(ResourceId),

    #[error("Booking {0} couldn't be found")]
    ReservationNotFound(ReservationId),

    #[error("User {caller} is not allowed to modify booking {reservation}")]
    Forbidden {
        reservation: ReservationId,
        caller: OwnerId,
    },

    #[error("User {0} can't book their own spot")]
    OwnResource(OwnerId),

    #[error("Start date {0} is in the past")]
    StartInPast(NaiveDate),

    #[error("Booking {0} has already started")]
    AlreadyStarted(ReservationId),

    #[error(
        "Spot is already booked for the specified dates: conflicts with booking {} {}",
        .conflict.id,
        .conflict.range
    )]
    Unavailable { conflict: Interval },
}

pub type Result<T> = std::result::Result<T, BookingError>;
