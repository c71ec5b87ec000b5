//! Date ranges, booked intervals, and the identifiers that scope them.
//!
//! All ranges are half-open: `[start, end)`. A stay from the 15th to the 16th
//! occupies the night of the 15th only, and the spot is free again for a
//! check-in on the 16th.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{BookingError, Result};

macro_rules! id_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(raw: u64) -> Self {
                Self(raw)
            }
        }
    };
}

id_newtype!(
    /// Identity of an admitted reservation.
    ReservationId
);
id_newtype!(
    /// The bookable spot a reservation is scoped to.
    ResourceId
);
id_newtype!(
    /// The user holding a reservation (or hosting a spot).
    OwnerId
);

/// A non-empty half-open range of calendar dates.
///
/// Construction goes through [`DateRange::new`], so every value satisfies
/// `start < end`. Deserialization applies the same check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawDateRange")]
pub struct DateRange {
    #[serde(rename = "startDate")]
    start: NaiveDate,
    #[serde(rename = "endDate")]
    end: NaiveDate,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDateRange {
    #[serde(deserialize_with = "deserialize_api_date")]
    start_date: NaiveDate,
    #[serde(deserialize_with = "deserialize_api_date")]
    end_date: NaiveDate,
}

/// Parse a booking API date: `YYYY-MM-DD`, or a full ISO datetime such as
/// `2024-09-15T00:00:00.000Z` of which only the date part is kept.
pub fn parse_api_date(s: &str) -> std::result::Result<NaiveDate, chrono::ParseError> {
    let date_part = s.split('T').next().unwrap_or(s);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
}

fn deserialize_api_date<'de, D>(deserializer: D) -> std::result::Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_api_date(&raw)
        .map_err(|e| serde::de::Error::custom(format!("invalid date '{raw}': {e}")))
}

impl TryFrom<RawDateRange> for DateRange {
    type Error = BookingError;

    fn try_from(raw: RawDateRange) -> Result<Self> {
        DateRange::new(raw.start_date, raw.end_date)
    }
}

impl DateRange {
    /// Build a range, rejecting zero-length and inverted bounds.
    ///
    /// # Errors
    /// Returns `BookingError::InvalidInterval` when `start >= end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start >= end {
            return Err(BookingError::InvalidInterval { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Number of nights covered. Always at least 1.
    pub fn nights(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    /// Half-open overlap: `a.start < b.end && b.start < a.end`.
    ///
    /// Ranges that only touch (one ends on the day the other starts) do not
    /// overlap.
    pub fn overlaps(&self, other: &DateRange) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Whether the night of `date` falls inside this range.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date < self.end
    }

    /// Same start, end pushed out to `end` if that is later.
    pub(crate) fn extended_to(&self, end: NaiveDate) -> DateRange {
        DateRange {
            start: self.start,
            end: self.end.max(end),
        }
    }

    /// Intersection with `window`, or `None` when they do not overlap.
    pub fn clip(&self, window: &DateRange) -> Option<DateRange> {
        if !self.overlaps(window) {
            return None;
        }
        Some(DateRange {
            start: self.start.max(window.start),
            end: self.end.min(window.end),
        })
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

/// An admitted (or proposed) booking of one spot by one user.
///
/// Serialized with the same field names the booking API has always used:
/// `id`, `spotId`, `userId`, `startDate`, `endDate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interval {
    pub id: ReservationId,
    #[serde(rename = "spotId")]
    pub resource_id: ResourceId,
    #[serde(rename = "userId")]
    pub owner_id: OwnerId,
    #[serde(flatten)]
    pub range: DateRange,
}

impl Interval {
    pub fn new(
        id: ReservationId,
        resource_id: ResourceId,
        owner_id: OwnerId,
        range: DateRange,
    ) -> Self {
        Self {
            id,
            resource_id,
            owner_id,
            range,
        }
    }

    pub fn start(&self) -> NaiveDate {
        self.range.start()
    }

    pub fn end(&self) -> NaiveDate {
        self.range.end()
    }
}
