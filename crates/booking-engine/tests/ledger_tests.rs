//! Tests for the in-memory reservation ledger: booking policy, reschedule,
//! cancel, queries, and admission under concurrent callers.

use std::sync::Arc;
use std::thread;

use booking_engine::{BookingError, DateRange, Ledger, OwnerId, ReservationId, ResourceId};
use chrono::NaiveDate;

const SPOT: ResourceId = ResourceId(1);
const HOST: OwnerId = OwnerId(10);
const GUEST: OwnerId = OwnerId(20);
const OTHER_GUEST: OwnerId = OwnerId(30);

fn date(s: &str) -> NaiveDate {
    s.parse().unwrap()
}

fn range(start: &str, end: &str) -> DateRange {
    DateRange::new(date(start), date(end)).unwrap()
}

fn today() -> NaiveDate {
    date("2024-09-01")
}

fn ledger() -> Ledger {
    let ledger = Ledger::new();
    ledger.register_resource(SPOT, HOST).unwrap();
    ledger
}

// ── Registration ────────────────────────────────────────────────────────────

#[test]
fn registering_twice_fails() {
    let ledger = ledger();
    assert_eq!(
        ledger.register_resource(SPOT, OwnerId(99)),
        Err(BookingError::AlreadyExists(SPOT))
    );
    assert_eq!(ledger.host_of(SPOT), Ok(HOST));
    assert_eq!(ledger.resource_count(), 1);
}

#[test]
fn booking_unknown_spot_fails() {
    let ledger = ledger();
    let err = ledger
        .book(ResourceId(404), GUEST, range("2024-09-15", "2024-09-16"), today())
        .unwrap_err();
    assert_eq!(err, BookingError::ResourceNotFound(ResourceId(404)));
}

// ── Booking ─────────────────────────────────────────────────────────────────

#[test]
fn book_assigns_ids_and_stores() {
    let ledger = ledger();
    let first = ledger
        .book(SPOT, GUEST, range("2024-09-15", "2024-09-16"), today())
        .unwrap();
    let second = ledger
        .book(SPOT, OTHER_GUEST, range("2024-09-16", "2024-09-18"), today())
        .unwrap();

    assert_ne!(first.id, second.id);
    assert_eq!(first.resource_id, SPOT);
    assert_eq!(first.owner_id, GUEST);
    assert_eq!(ledger.get(second.id), Ok(second.clone()));
    assert_eq!(ledger.bookings_for_resource(SPOT).unwrap(), vec![first, second]);
}

#[test]
fn overlapping_booking_unavailable() {
    let ledger = ledger();
    let existing = ledger
        .book(SPOT, GUEST, range("2024-09-15", "2024-09-18"), today())
        .unwrap();

    let err = ledger
        .book(SPOT, OTHER_GUEST, range("2024-09-17", "2024-09-20"), today())
        .unwrap_err();
    assert_eq!(err, BookingError::Unavailable { conflict: existing });
    assert_eq!(ledger.bookings_for_resource(SPOT).unwrap().len(), 1);
}

#[test]
fn same_dates_on_different_spots_both_admitted() {
    let ledger = ledger();
    ledger.register_resource(ResourceId(2), HOST).unwrap();
    ledger
        .book(SPOT, GUEST, range("2024-09-15", "2024-09-18"), today())
        .unwrap();
    ledger
        .book(ResourceId(2), GUEST, range("2024-09-15", "2024-09-18"), today())
        .unwrap();
    assert_eq!(ledger.bookings_for_owner(GUEST).len(), 2);
}

#[test]
fn host_cannot_book_own_spot() {
    let ledger = ledger();
    let err = ledger
        .book(SPOT, HOST, range("2024-09-15", "2024-09-16"), today())
        .unwrap_err();
    assert_eq!(err, BookingError::OwnResource(HOST));
}

#[test]
fn start_in_past_refused() {
    let ledger = ledger();
    let err = ledger
        .book(SPOT, GUEST, range("2024-08-30", "2024-09-02"), today())
        .unwrap_err();
    assert_eq!(err, BookingError::StartInPast(date("2024-08-30")));
}

#[test]
fn starting_today_allowed() {
    let ledger = ledger();
    assert!(ledger
        .book(SPOT, GUEST, range("2024-09-01", "2024-09-02"), today())
        .is_ok());
}

// ── Reschedule ──────────────────────────────────────────────────────────────

#[test]
fn reschedule_over_own_dates_succeeds() {
    let ledger = ledger();
    let booked = ledger
        .book(SPOT, GUEST, range("2024-09-15", "2024-09-18"), today())
        .unwrap();

    let moved = ledger
        .reschedule(booked.id, GUEST, range("2024-09-16", "2024-09-19"), today())
        .unwrap();

    assert_eq!(moved.id, booked.id);
    assert_eq!(moved.range, range("2024-09-16", "2024-09-19"));
    assert_eq!(ledger.get(booked.id).unwrap().range, moved.range);
}

#[test]
fn reschedule_into_other_booking_unavailable() {
    let ledger = ledger();
    let mine = ledger
        .book(SPOT, GUEST, range("2024-09-15", "2024-09-18"), today())
        .unwrap();
    let theirs = ledger
        .book(SPOT, OTHER_GUEST, range("2024-09-20", "2024-09-22"), today())
        .unwrap();

    let err = ledger
        .reschedule(mine.id, GUEST, range("2024-09-17", "2024-09-21"), today())
        .unwrap_err();
    assert_eq!(err, BookingError::Unavailable { conflict: theirs });
    // Original dates kept.
    assert_eq!(ledger.get(mine.id).unwrap().range, mine.range);
}

#[test]
fn reschedule_back_to_back_with_neighbour_allowed() {
    let ledger = ledger();
    let mine = ledger
        .book(SPOT, GUEST, range("2024-09-15", "2024-09-18"), today())
        .unwrap();
    ledger
        .book(SPOT, OTHER_GUEST, range("2024-09-20", "2024-09-22"), today())
        .unwrap();

    assert!(ledger
        .reschedule(mine.id, GUEST, range("2024-09-17", "2024-09-20"), today())
        .is_ok());
}

#[test]
fn reschedule_by_someone_else_forbidden() {
    let ledger = ledger();
    let booked = ledger
        .book(SPOT, GUEST, range("2024-09-15", "2024-09-18"), today())
        .unwrap();

    let err = ledger
        .reschedule(booked.id, HOST, range("2024-09-16", "2024-09-19"), today())
        .unwrap_err();
    assert_eq!(
        err,
        BookingError::Forbidden {
            reservation: booked.id,
            caller: HOST,
        }
    );
}

#[test]
fn reschedule_started_booking_refused() {
    let ledger = ledger();
    let booked = ledger
        .book(SPOT, GUEST, range("2024-09-15", "2024-09-18"), today())
        .unwrap();

    let err = ledger
        .reschedule(
            booked.id,
            GUEST,
            range("2024-09-20", "2024-09-22"),
            date("2024-09-15"),
        )
        .unwrap_err();
    assert_eq!(err, BookingError::AlreadyStarted(booked.id));
}

#[test]
fn reschedule_into_past_refused() {
    let ledger = ledger();
    let booked = ledger
        .book(SPOT, GUEST, range("2024-09-15", "2024-09-18"), today())
        .unwrap();

    // Not started yet on Sep 10, but the new dates begin before that.
    let err = ledger
        .reschedule(
            booked.id,
            GUEST,
            range("2024-09-05", "2024-09-08"),
            date("2024-09-10"),
        )
        .unwrap_err();
    assert_eq!(err, BookingError::StartInPast(date("2024-09-05")));
    assert_eq!(
        ledger.get(booked.id).unwrap().range,
        range("2024-09-15", "2024-09-18")
    );
}

#[test]
fn reschedule_unknown_booking_not_found() {
    let ledger = ledger();
    let err = ledger
        .reschedule(
            ReservationId(999),
            GUEST,
            range("2024-09-15", "2024-09-16"),
            today(),
        )
        .unwrap_err();
    assert_eq!(err, BookingError::ReservationNotFound(ReservationId(999)));
}

// ── Cancel ──────────────────────────────────────────────────────────────────

#[test]
fn guest_cancels_and_dates_free_up() {
    let ledger = ledger();
    let booked = ledger
        .book(SPOT, GUEST, range("2024-09-15", "2024-09-18"), today())
        .unwrap();

    assert_eq!(ledger.cancel(booked.id, GUEST, today()), Ok(booked.clone()));
    assert_eq!(
        ledger.get(booked.id),
        Err(BookingError::ReservationNotFound(booked.id))
    );
    assert!(ledger
        .book(SPOT, OTHER_GUEST, range("2024-09-15", "2024-09-18"), today())
        .is_ok());
}

#[test]
fn host_may_cancel_guest_booking() {
    let ledger = ledger();
    let booked = ledger
        .book(SPOT, GUEST, range("2024-09-15", "2024-09-18"), today())
        .unwrap();
    assert!(ledger.cancel(booked.id, HOST, today()).is_ok());
}

#[test]
fn stranger_cannot_cancel() {
    let ledger = ledger();
    let booked = ledger
        .book(SPOT, GUEST, range("2024-09-15", "2024-09-18"), today())
        .unwrap();
    let err = ledger.cancel(booked.id, OTHER_GUEST, today()).unwrap_err();
    assert!(matches!(err, BookingError::Forbidden { .. }));
}

#[test]
fn started_booking_cannot_be_cancelled() {
    let ledger = ledger();
    let booked = ledger
        .book(SPOT, GUEST, range("2024-09-15", "2024-09-18"), today())
        .unwrap();
    let err = ledger
        .cancel(booked.id, GUEST, date("2024-09-16"))
        .unwrap_err();
    assert_eq!(err, BookingError::AlreadyStarted(booked.id));
}

// ── Queries ─────────────────────────────────────────────────────────────────

#[test]
fn bookings_sorted_by_start() {
    let ledger = ledger();
    ledger
        .book(SPOT, GUEST, range("2024-10-31", "2024-11-01"), today())
        .unwrap();
    ledger
        .book(SPOT, OTHER_GUEST, range("2024-09-24", "2024-09-25"), today())
        .unwrap();
    ledger
        .book(SPOT, GUEST, range("2024-09-15", "2024-09-16"), today())
        .unwrap();

    let starts: Vec<NaiveDate> = ledger
        .bookings_for_resource(SPOT)
        .unwrap()
        .iter()
        .map(|b| b.start())
        .collect();
    assert_eq!(
        starts,
        vec![date("2024-09-15"), date("2024-09-24"), date("2024-10-31")]
    );

    let mine = ledger.bookings_for_owner(GUEST);
    assert_eq!(mine.len(), 2);
    assert!(mine[0].start() < mine[1].start());
}

#[test]
fn free_ranges_reflect_stored_bookings() {
    let ledger = ledger();
    ledger
        .book(SPOT, GUEST, range("2024-09-15", "2024-09-18"), today())
        .unwrap();

    let free = ledger
        .free_ranges(SPOT, &range("2024-09-10", "2024-09-20"))
        .unwrap();
    assert_eq!(
        free,
        vec![
            range("2024-09-10", "2024-09-15"),
            range("2024-09-18", "2024-09-20"),
        ]
    );
}

// ── Concurrency ─────────────────────────────────────────────────────────────

#[test]
fn concurrent_overlapping_bookings_admit_exactly_one() {
    let ledger = Arc::new(ledger());
    let handles: Vec<_> = (0..16u64)
        .map(|i| {
            let ledger = Arc::clone(&ledger);
            thread::spawn(move || {
                // Every candidate covers the night of Sep 17.
                let start = date("2024-09-15") + chrono::Duration::days((i % 3) as i64);
                let end = start + chrono::Duration::days(3);
                ledger.book(
                    SPOT,
                    OwnerId(1000 + i),
                    DateRange::new(start, end).unwrap(),
                    today(),
                )
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let admitted = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(admitted, 1, "exactly one overlapping booking may win");
    for r in results.iter().filter(|r| r.is_err()) {
        assert!(matches!(r, Err(BookingError::Unavailable { .. })));
    }
    assert_eq!(ledger.bookings_for_resource(SPOT).unwrap().len(), 1);
}

#[test]
fn concurrent_disjoint_bookings_all_admitted() {
    let ledger = Arc::new(ledger());
    let handles: Vec<_> = (0..10i64)
        .map(|i| {
            let ledger = Arc::clone(&ledger);
            thread::spawn(move || {
                let start = date("2024-09-10") + chrono::Duration::days(i * 2);
                let end = start + chrono::Duration::days(2);
                ledger.book(SPOT, GUEST, DateRange::new(start, end).unwrap(), today())
            })
        })
        .collect();

    for h in handles {
        assert!(h.join().unwrap().is_ok());
    }
    assert_eq!(ledger.bookings_for_resource(SPOT).unwrap().len(), 10);
}
