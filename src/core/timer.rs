//! Wall-clock deadlines for anytime solvers.
//!
//! Deadlines are polled cooperatively at well-defined points (outer passes,
//! node expansions, simulations); a solver may overshoot by the cost of one
//! unit of work between polls. A negative time limit means unbounded.

use std::time::Instant;

/// A countdown started at construction time.
#[derive(Clone, Copy, Debug)]
pub struct Deadline {
    start: Instant,
    /// Limit in seconds; `None` when unbounded.
    limit: Option<f64>,
}

impl Deadline {
    /// Start a countdown of `limit_secs` seconds. Negative means unbounded.
    #[must_use]
    pub fn start(limit_secs: f64) -> Self {
        Self {
            start: Instant::now(),
            limit: (limit_secs >= 0.0).then_some(limit_secs),
        }
    }

    /// An unbounded deadline that is never reached.
    #[must_use]
    pub fn unbounded() -> Self {
        Self::start(-1.0)
    }

    /// Whether a finite limit was set.
    #[must_use]
    pub fn is_bounded(&self) -> bool {
        self.limit.is_some()
    }

    /// Seconds since the countdown started.
    #[must_use]
    pub fn elapsed_secs(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }

    /// The configured limit in seconds, if bounded.
    #[must_use]
    pub fn limit_secs(&self) -> Option<f64> {
        self.limit
    }

    /// Whether the countdown has run out. Always `false` when unbounded.
    #[must_use]
    pub fn reached(&self) -> bool {
        match self.limit {
            Some(limit) => self.elapsed_secs() >= limit,
            None => false,
        }
    }
}
