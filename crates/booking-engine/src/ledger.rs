//! In-memory reservation ledger.
//!
//! Holds every admitted booking, grouped by spot. Each spot sits behind its
//! own mutex and the conflict check runs while that mutex is held, so two
//! concurrent callers can never both admit overlapping stays on the same
//! spot. Different spots never contend.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::NaiveDate;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::conflict::{check_conflict, check_update_conflict, Decision};
use crate::error::{BookingError, Result};
use crate::freebusy;
use crate::interval::{DateRange, Interval, OwnerId, ReservationId, ResourceId};

type SharedSpot = Arc<Mutex<SpotBook>>;

/// Bookings for one spot. Unsorted; readers sort on the way out.
struct SpotBook {
    host: OwnerId,
    bookings: Vec<Interval>,
}

impl SpotBook {
    fn position(&self, id: ReservationId) -> Option<usize> {
        self.bookings.iter().position(|b| b.id == id)
    }
}

pub struct Ledger {
    spots: DashMap<ResourceId, SharedSpot>,
    /// Reverse lookup: reservation id → spot id
    reservation_to_spot: DashMap<ReservationId, ResourceId>,
    next_id: AtomicU64,
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

impl Ledger {
    pub fn new() -> Self {
        Self {
            spots: DashMap::new(),
            reservation_to_spot: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    // ── Spots ────────────────────────────────────────────────

    /// Register a bookable spot hosted by `host_id`.
    pub fn register_resource(&self, resource_id: ResourceId, host_id: OwnerId) -> Result<()> {
        match self.spots.entry(resource_id) {
            Entry::Occupied(_) => Err(BookingError::AlreadyExists(resource_id)),
            Entry::Vacant(slot) => {
                slot.insert(Arc::new(Mutex::new(SpotBook {
                    host: host_id,
                    bookings: Vec::new(),
                })));
                info!("registered spot {resource_id} (host {host_id})");
                Ok(())
            }
        }
    }

    pub fn resource_count(&self) -> usize {
        self.spots.len()
    }

    pub fn host_of(&self, resource_id: ResourceId) -> Result<OwnerId> {
        Ok(self.spot(resource_id)?.lock().host)
    }

    // ── Mutations ────────────────────────────────────────────

    /// Admit a new stay for `guest_id` on `resource_id`.
    ///
    /// # Errors
    /// - `ResourceNotFound` if the spot is not registered.
    /// - `OwnResource` if the guest hosts the spot.
    /// - `StartInPast` if the stay starts before `today`.
    /// - `Unavailable` if the dates overlap an admitted booking.
    pub fn book(
        &self,
        resource_id: ResourceId,
        guest_id: OwnerId,
        range: DateRange,
        today: NaiveDate,
    ) -> Result<Interval> {
        let spot = self.spot(resource_id)?;
        let mut book = spot.lock();

        if book.host == guest_id {
            warn!("user {guest_id} tried to book own spot {resource_id}");
            return Err(BookingError::OwnResource(guest_id));
        }
        if range.start() < today {
            return Err(BookingError::StartInPast(range.start()));
        }

        if let Decision::Reject(conflict) = check_conflict(&range, &book.bookings) {
            debug!(
                "rejected {range} on spot {resource_id}: overlaps booking {}",
                conflict.id
            );
            return Err(BookingError::Unavailable { conflict });
        }

        let id = ReservationId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let interval = Interval::new(id, resource_id, guest_id, range);
        book.bookings.push(interval.clone());
        self.reservation_to_spot.insert(id, resource_id);
        debug!("admitted booking {id} {range} on spot {resource_id}");
        Ok(interval)
    }

    /// Move an admitted booking to new dates.
    ///
    /// The booking is checked against every other booking on its spot, never
    /// against its own previous dates.
    ///
    /// # Errors
    /// - `ReservationNotFound` if there is no such booking.
    /// - `Forbidden` if `caller_id` is not the guest.
    /// - `AlreadyStarted` if the current stay starts on or before `today`.
    /// - `StartInPast` if the new dates start before `today`.
    /// - `Unavailable` if the new dates overlap another booking.
    pub fn reschedule(
        &self,
        reservation_id: ReservationId,
        caller_id: OwnerId,
        range: DateRange,
        today: NaiveDate,
    ) -> Result<Interval> {
        let resource_id = self.spot_of(reservation_id)?;
        let spot = self.spot(resource_id)?;
        let mut book = spot.lock();

        // Re-resolve under the lock: a concurrent cancel may have won.
        let pos = book
            .position(reservation_id)
            .ok_or(BookingError::ReservationNotFound(reservation_id))?;
        let current = &book.bookings[pos];

        if current.owner_id != caller_id {
            warn!("user {caller_id} tried to reschedule booking {reservation_id}");
            return Err(BookingError::Forbidden {
                reservation: reservation_id,
                caller: caller_id,
            });
        }
        if current.start() <= today {
            return Err(BookingError::AlreadyStarted(reservation_id));
        }
        if range.start() < today {
            return Err(BookingError::StartInPast(range.start()));
        }

        if let Decision::Reject(conflict) =
            check_update_conflict(resource_id, reservation_id, &range, &book.bookings)
        {
            debug!(
                "rejected move of booking {reservation_id} to {range}: overlaps booking {}",
                conflict.id
            );
            return Err(BookingError::Unavailable { conflict });
        }

        book.bookings[pos].range = range;
        debug!("moved booking {reservation_id} to {range} on spot {resource_id}");
        Ok(book.bookings[pos].clone())
    }

    /// Remove a booking. Allowed for the guest and for the spot's host.
    ///
    /// # Errors
    /// - `ReservationNotFound` if there is no such booking.
    /// - `Forbidden` if `caller_id` is neither guest nor host.
    /// - `AlreadyStarted` if the stay starts on or before `today`.
    pub fn cancel(
        &self,
        reservation_id: ReservationId,
        caller_id: OwnerId,
        today: NaiveDate,
    ) -> Result<Interval> {
        let resource_id = self.spot_of(reservation_id)?;
        let spot = self.spot(resource_id)?;
        let mut book = spot.lock();

        let pos = book
            .position(reservation_id)
            .ok_or(BookingError::ReservationNotFound(reservation_id))?;
        let current = &book.bookings[pos];

        if current.owner_id != caller_id && book.host != caller_id {
            warn!("user {caller_id} tried to cancel booking {reservation_id}");
            return Err(BookingError::Forbidden {
                reservation: reservation_id,
                caller: caller_id,
            });
        }
        if current.start() <= today {
            return Err(BookingError::AlreadyStarted(reservation_id));
        }

        let removed = book.bookings.swap_remove(pos);
        self.reservation_to_spot.remove(&reservation_id);
        debug!("cancelled booking {reservation_id} on spot {resource_id}");
        Ok(removed)
    }

    // ── Queries ──────────────────────────────────────────────

    pub fn get(&self, reservation_id: ReservationId) -> Result<Interval> {
        let resource_id = self.spot_of(reservation_id)?;
        let spot = self.spot(resource_id)?;
        let book = spot.lock();
        book.position(reservation_id)
            .map(|pos| book.bookings[pos].clone())
            .ok_or(BookingError::ReservationNotFound(reservation_id))
    }

    /// Bookings on one spot, sorted by start date.
    pub fn bookings_for_resource(&self, resource_id: ResourceId) -> Result<Vec<Interval>> {
        let spot = self.spot(resource_id)?;
        let mut bookings = spot.lock().bookings.clone();
        bookings.sort_by_key(|b| (b.start(), b.id));
        Ok(bookings)
    }

    /// A guest's bookings across all spots, sorted by start date then id.
    pub fn bookings_for_owner(&self, owner_id: OwnerId) -> Vec<Interval> {
        // Snapshot the handles first so no map shard is held while locking.
        let spots: Vec<SharedSpot> = self.spots.iter().map(|e| e.value().clone()).collect();

        let mut bookings: Vec<Interval> = spots
            .iter()
            .flat_map(|spot| {
                spot.lock()
                    .bookings
                    .iter()
                    .filter(|b| b.owner_id == owner_id)
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .collect();
        bookings.sort_by_key(|b| (b.start(), b.id));
        bookings
    }

    /// Open date ranges for a spot inside `window`.
    pub fn free_ranges(
        &self,
        resource_id: ResourceId,
        window: &DateRange,
    ) -> Result<Vec<DateRange>> {
        let spot = self.spot(resource_id)?;
        let book = spot.lock();
        Ok(freebusy::free_ranges(&book.bookings, window))
    }

    // ── Internals ────────────────────────────────────────────

    fn spot(&self, resource_id: ResourceId) -> Result<SharedSpot> {
        self.spots
            .get(&resource_id)
            .map(|e| e.value().clone())
            .ok_or(BookingError::ResourceNotFound(resource_id))
    }

    fn spot_of(&self, reservation_id: ReservationId) -> Result<ResourceId> {
        self.reservation_to_spot
            .get(&reservation_id)
            .map(|e| *e.value())
            .ok_or(BookingError::ReservationNotFound(reservation_id))
    }
}
