//! `booking` CLI — check candidate dates and list open dates for a spot.
//!
//! Bookings are read as a JSON array in the booking API's shape:
//! `[{"id":1,"spotId":1,"userId":2,"startDate":"2024-09-15","endDate":"2024-09-16"}]`.
//! Full ISO datetimes (`2024-09-15T00:00:00.000Z`) are accepted and reduced
//! to their date.
//!
//! ## Usage
//!
//! ```sh
//! # Can spot 1 take a stay from Sep 16 to Sep 18? (bookings on stdin)
//! cat bookings.json | booking check --spot 1 --start 2024-09-16 --end 2024-09-18
//!
//! # Move booking 4 to new dates without clashing with itself
//! booking check -i bookings.json --spot 1 --exclude 4 --start 2024-09-20 --end 2024-09-22
//!
//! # Open ranges of at least 3 nights in October
//! booking free -i bookings.json --spot 1 --from 2024-10-01 --to 2024-11-01 --min-nights 3
//! ```
//!
//! `check` exits 0 when the dates are admitted, 2 when they clash with an
//! existing booking, and 1 on invalid input.

use anyhow::{Context, Result};
use booking_engine::{DateRange, Decision, Interval, ReservationId, ResourceId};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::io::{self, Read};
use std::process;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Exit status for a rejected candidate.
const EXIT_REJECTED: i32 = 2;

#[derive(Parser)]
#[command(
    name = "booking",
    version,
    about = "Check spot bookings for date conflicts"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log debug output to stderr (overrides RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Decide whether candidate dates can be booked
    Check {
        /// Bookings JSON file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Check-in date (YYYY-MM-DD)
        #[arg(long)]
        start: NaiveDate,
        /// Check-out date (YYYY-MM-DD)
        #[arg(long)]
        end: NaiveDate,
        /// Only consider bookings on this spot
        #[arg(long)]
        spot: Option<u64>,
        /// Booking id being edited; it is never checked against itself
        #[arg(long)]
        exclude: Option<u64>,
    },
    /// List open date ranges inside a window
    Free {
        /// Bookings JSON file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Window start (YYYY-MM-DD)
        #[arg(long)]
        from: NaiveDate,
        /// Window end, exclusive (YYYY-MM-DD)
        #[arg(long)]
        to: NaiveDate,
        /// Only consider bookings on this spot
        #[arg(long)]
        spot: Option<u64>,
        /// Drop ranges shorter than this many nights
        #[arg(long, default_value_t = 1)]
        min_nights: i64,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Check {
            input,
            start,
            end,
            spot,
            exclude,
        } => {
            let candidate = booking_engine::validate_range(start, end)
                .context("Invalid candidate dates")?;
            let bookings = read_bookings(input.as_deref())?;
            let decision = check(&candidate, &bookings, spot, exclude);

            println!("{}", serde_json::to_string(&decision)?);
            if let Decision::Reject(conflict) = &decision {
                debug!("candidate {candidate} clashes with booking {}", conflict.id);
                process::exit(EXIT_REJECTED);
            }
        }
        Commands::Free {
            input,
            from,
            to,
            spot,
            min_nights,
        } => {
            let window =
                booking_engine::validate_range(from, to).context("Invalid window dates")?;
            let bookings = scope_to_spot(read_bookings(input.as_deref())?, spot);

            let free: Vec<DateRange> = booking_engine::free_ranges(&bookings, &window)
                .into_iter()
                .filter(|r| r.nights() >= min_nights)
                .collect();
            debug!("{} open ranges in {window}", free.len());

            println!("{}", serde_json::to_string_pretty(&free)?);
        }
    }

    Ok(())
}

/// Run the conflict check, switching to update mode when `exclude` is set.
fn check(
    candidate: &DateRange,
    bookings: &[Interval],
    spot: Option<u64>,
    exclude: Option<u64>,
) -> Decision {
    match (spot, exclude) {
        (Some(spot), Some(own)) => booking_engine::check_update_conflict(
            ResourceId(spot),
            ReservationId(own),
            candidate,
            bookings,
        ),
        (spot, own) => {
            let scoped: Vec<Interval> = scope_to_spot(bookings.to_vec(), spot)
                .into_iter()
                .filter(|b| own != Some(b.id.0))
                .collect();
            booking_engine::check_conflict(candidate, &scoped)
        }
    }
}

fn scope_to_spot(bookings: Vec<Interval>, spot: Option<u64>) -> Vec<Interval> {
    match spot {
        Some(spot) => bookings
            .into_iter()
            .filter(|b| b.resource_id == ResourceId(spot))
            .collect(),
        None => bookings,
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn read_bookings(path: Option<&str>) -> Result<Vec<Interval>> {
    let json = read_input(path)?;
    let bookings: Vec<Interval> =
        serde_json::from_str(&json).context("Failed to parse bookings JSON")?;
    debug!("loaded {} bookings", bookings.len());
    Ok(bookings)
}

fn read_input(path: Option<&str>) -> Result<String> {
    match path {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path))
        }
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read from stdin")?;
            Ok(buf)
        }
    }
}
