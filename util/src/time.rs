//! General time utility functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use conquer_once::OnceCell;
use std::time::Instant;

// ---------------------------------------------------------------------------
// STATICS
// ---------------------------------------------------------------------------

static PROCESS_EPOCH: OnceCell<Instant> = OnceCell::uninit();

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Number of nanoseconds in a second
pub const NANOS_PER_SECOND: i64 = 1_000_000_000;

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Convert a duration into a number of seconds, or `None` if overflow
pub fn duration_to_seconds(duration: chrono::Duration) -> Option<f64> {
    duration
        .num_nanoseconds()
        .map(|ns| ns as f64 / NANOS_PER_SECOND as f64)
}

/// Get the number of seconds elapsed on the monotonic clock since this
/// function was first called.
///
/// All link and controller timestamps are measured against this clock, so
/// they are immune to wall-clock adjustments.
pub fn monotonic_s() -> f64 {
    let _ = PROCESS_EPOCH.try_init_once(Instant::now);

    match PROCESS_EPOCH.get() {
        Some(epoch) => epoch.elapsed().as_secs_f64(),
        None => 0.0
    }
}
