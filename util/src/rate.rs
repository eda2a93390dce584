//! Simple non-blocking rate limiter

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use thiserror::Error;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A non-blocking rate limiter.
///
/// Used by cyclic executives to run work at a fixed frequency without
/// sleeping inside the work itself:
///
/// ```
/// # use util::rate::Rate;
/// let mut rate = Rate::new(10.0).unwrap();
/// let now_s = util::time::monotonic_s();
/// if rate.ready(now_s) {
///     // do work
/// }
/// ```
pub struct Rate {
    /// Period between triggers.
    ///
    /// Units: seconds
    period_s: f64,

    /// Time of the last trigger.
    ///
    /// Units: seconds
    last_t_s: f64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors associated with building a rate limiter.
#[derive(Debug, Error)]
pub enum RateError {
    #[error("Rate frequency must be greater than zero, got {0} Hz")]
    NonPositiveFrequency(f64)
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Rate {
    /// Create a new rate limiter triggering at the given frequency.
    pub fn new(hz: f64) -> Result<Self, RateError> {
        if hz <= 0.0 {
            return Err(RateError::NonPositiveFrequency(hz));
        }

        Ok(Rate {
            period_s: 1.0 / hz,
            last_t_s: 0.0,
        })
    }

    /// Returns true if enough time has elapsed since the last trigger.
    ///
    /// Does not block or sleep.
    pub fn ready(&mut self, now_s: f64) -> bool {
        if (now_s - self.last_t_s) >= self.period_s {
            self.last_t_s = now_s;
            return true;
        }

        false
    }

    /// Reset the timer so that the next call to `ready` triggers immediately.
    pub fn reset(&mut self) {
        self.last_t_s = 0.0;
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_ready_triggers_at_period() {
        let mut rate = Rate::new(10.0).unwrap();

        assert!(rate.ready(1.0));
        assert!(!rate.ready(1.05));
        assert!(rate.ready(1.1));
        assert!(!rate.ready(1.15));
    }

    #[test]
    fn test_reset_retriggers() {
        let mut rate = Rate::new(1.0).unwrap();

        assert!(rate.ready(5.0));
        assert!(!rate.ready(5.5));
        rate.reset();
        assert!(rate.ready(5.5));
    }

    #[test]
    fn test_non_positive_hz_rejected() {
        assert!(Rate::new(0.0).is_err());
        assert!(Rate::new(-1.0).is_err());
    }
}
