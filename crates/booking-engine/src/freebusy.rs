//! Compute open date ranges for a spot.
//!
//! Sorts bookings by start date, merges overlapping and back-to-back stays
//! into booked blocks, then returns the gaps between blocks inside a window.

use crate::interval::{DateRange, Interval};

/// Merge bookings into sorted, non-overlapping booked blocks, clipped to `window`.
///
/// Back-to-back stays are merged into one block: there is no free night
/// between them.
pub fn merge_booked(existing: &[Interval], window: &DateRange) -> Vec<DateRange> {
    // Clip to the window, discarding bookings entirely outside.
    let mut ranges: Vec<DateRange> = existing
        .iter()
        .filter_map(|i| i.range.clip(window))
        .collect();

    if ranges.is_empty() {
        return Vec::new();
    }

    ranges.sort_by_key(|r| (r.start(), r.end()));

    let mut merged: Vec<DateRange> = Vec::with_capacity(ranges.len());
    for range in ranges {
        if let Some(last) = merged.last_mut() {
            if range.start() <= last.end() {
                // Overlapping or back-to-back: extend the current block.
                *last = last.extended_to(range.end());
                continue;
            }
        }
        merged.push(range);
    }

    merged
}

/// Open date ranges inside `window`, sorted by start.
///
/// Every returned range is admitted by [`crate::check_conflict`] against the
/// same `existing` bookings.
pub fn free_ranges(existing: &[Interval], window: &DateRange) -> Vec<DateRange> {
    let merged = merge_booked(existing, window);

    let mut free = Vec::new();
    let mut cursor = window.start();

    for booked in &merged {
        if let Ok(gap) = DateRange::new(cursor, booked.start()) {
            free.push(gap);
        }
        cursor = cursor.max(booked.end());
    }

    // Trailing gap after the last booked block.
    if let Ok(gap) = DateRange::new(cursor, window.end()) {
        free.push(gap);
    }

    free
}

/// First open range of at least `min_nights` inside `window`.
pub fn first_free_range(
    existing: &[Interval],
    window: &DateRange,
    min_nights: i64,
) -> Option<DateRange> {
    free_ranges(existing, window)
        .into_iter()
        .find(|r| r.nights() >= min_nights)
}
