//! WASM bindings for booking-engine.
//!
//! Lets the booking page run the same availability check the server runs,
//! before the request is ever sent. All complex types cross the boundary as
//! JSON strings using the booking API's field names (`spotId`, `userId`,
//! `startDate`, `endDate`).
//!
//! ## Build process
//!
//! ```sh
//! cargo build -p booking-engine-wasm --target wasm32-unknown-unknown --release
//! wasm-bindgen --target web --out-dir frontend/src/wasm/ \
//!   target/wasm32-unknown-unknown/release/booking_engine_wasm.wasm
//! ```

use booking_engine::{Decision, Interval};
use chrono::NaiveDate;
use serde::Deserialize;
use wasm_bindgen::prelude::*;

/// Candidate dates as sent by the booking form.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CandidateInput {
    start_date: String,
    end_date: String,
    /// Set when editing an existing booking so it is not checked against itself.
    #[serde(default)]
    id: Option<u64>,
    #[serde(default)]
    spot_id: Option<u64>,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Parse a date in either shape the booking API sends (`YYYY-MM-DD` or a
/// full ISO datetime). Stored bookings go through the same parser when
/// deserialized.
fn parse_date(s: &str) -> Result<NaiveDate, String> {
    booking_engine::parse_api_date(s).map_err(|e| format!("Invalid date '{}': {}", s, e))
}

fn parse_bookings_json(json: &str) -> Result<Vec<Interval>, String> {
    serde_json::from_str(json).map_err(|e| format!("Invalid bookings JSON: {}", e))
}

fn check_conflict_json(candidate_json: &str, existing_json: &str) -> Result<String, String> {
    let candidate: CandidateInput = serde_json::from_str(candidate_json)
        .map_err(|e| format!("Invalid candidate JSON: {}", e))?;
    let existing = parse_bookings_json(existing_json)?;

    let start = parse_date(&candidate.start_date)?;
    let end = parse_date(&candidate.end_date)?;
    let range = booking_engine::validate_range(start, end).map_err(|e| e.to_string())?;

    let decision: Decision = match (candidate.id, candidate.spot_id) {
        (Some(id), Some(spot_id)) => {
            booking_engine::check_update_conflict(spot_id.into(), id.into(), &range, &existing)
        }
        (Some(id), None) => {
            let others: Vec<Interval> = existing.into_iter().filter(|b| b.id.0 != id).collect();
            booking_engine::check_conflict(&range, &others)
        }
        (None, Some(spot_id)) => {
            let same_spot: Vec<Interval> = existing
                .into_iter()
                .filter(|b| b.resource_id.0 == spot_id)
                .collect();
            booking_engine::check_conflict(&range, &same_spot)
        }
        (None, None) => booking_engine::check_conflict(&range, &existing),
    };

    serde_json::to_string(&decision).map_err(|e| format!("Serialization error: {}", e))
}

fn free_ranges_json(
    existing_json: &str,
    from: &str,
    to: &str,
    spot_id: Option<u64>,
) -> Result<String, String> {
    let mut existing = parse_bookings_json(existing_json)?;
    if let Some(spot_id) = spot_id {
        existing.retain(|b| b.resource_id.0 == spot_id);
    }
    let window = booking_engine::validate_range(parse_date(from)?, parse_date(to)?)
        .map_err(|e| e.to_string())?;

    let free = booking_engine::free_ranges(&existing, &window);

    serde_json::to_string(&free).map_err(|e| format!("Serialization error: {}", e))
}

// ---------------------------------------------------------------------------
// WASM exports
// ---------------------------------------------------------------------------

/// Check candidate dates against a spot's existing bookings.
///
/// `candidate_json` is `{startDate, endDate, id?, spotId?}`; `existing_json`
/// is an array of `{id, spotId, userId, startDate, endDate}`. Returns
/// `{"decision":"admit"}` or `{"decision":"reject","conflict":{...}}`.
/// Throws when the dates are unparseable or `startDate >= endDate`.
#[wasm_bindgen(js_name = "checkConflict")]
pub fn check_conflict(candidate_json: &str, existing_json: &str) -> Result<String, JsValue> {
    check_conflict_json(candidate_json, existing_json).map_err(|e| JsValue::from_str(&e))
}

/// Open date ranges between `from` and `to` given a spot's bookings.
///
/// When `spot_id` is given, only that spot's bookings are considered;
/// otherwise every booking in `existing_json` counts, so pass a single
/// spot's bookings. Returns a JSON array of `{startDate, endDate}` objects.
#[wasm_bindgen(js_name = "freeRanges")]
pub fn free_ranges(
    existing_json: &str,
    from: &str,
    to: &str,
    spot_id: Option<u32>,
) -> Result<String, JsValue> {
    free_ranges_json(existing_json, from, to, spot_id.map(u64::from))
        .map_err(|e| JsValue::from_str(&e))
}
