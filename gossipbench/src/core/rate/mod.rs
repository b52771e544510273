//! Rate calculation for pacing
//!
//! This module provides the [`Rate`] type which represents emission intervals
//! for request pacing. It converts human-friendly rate specifications
//! (e.g., "150 requests per minute") into precise emission intervals.

use std::time::Duration;

#[cfg(test)]
mod tests;

/// Rate defines the emission interval between paced requests
///
/// The `Rate` type encapsulates the concept of "N requests per time period"
/// as a duration between each emission.
///
/// # Examples
///
/// ```
/// use gossipbench::Rate;
/// use std::time::Duration;
///
/// // 10 requests per second
/// let rate = Rate::per_second(10);
/// assert_eq!(rate.period(), Duration::from_millis(100));
///
/// // 60 requests per minute (1 per second)
/// let rate = Rate::per_minute(60);
/// assert_eq!(rate.period(), Duration::from_secs(1));
///
/// // 150 requests spread over a minute
/// let rate = Rate::from_budget(150, Duration::from_secs(60));
/// assert_eq!(rate.period(), Duration::from_millis(400));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rate {
    period: Duration,
}

impl Rate {
    /// Creates a new rate with a custom period between emissions
    pub fn new(period: Duration) -> Self {
        Rate { period }
    }

    /// Creates a rate of n requests per second
    ///
    /// A zero `n` yields the slowest representable rate.
    pub fn per_second(n: u64) -> Self {
        Self::from_budget(n, Duration::from_secs(1))
    }

    /// Creates a rate of n requests per minute
    pub fn per_minute(n: u64) -> Self {
        Self::from_budget(n, Duration::from_secs(60))
    }

    /// Creates a rate that spreads `budget` requests evenly over `window`
    ///
    /// The resulting period is `window / budget`, truncated to whole
    /// nanoseconds. If `budget` is zero the rate is effectively blocking
    /// (a period of `Duration::MAX`).
    ///
    /// # Example
    ///
    /// ```
    /// use gossipbench::Rate;
    /// use std::time::Duration;
    ///
    /// // 150,000 requests per minute = one every 400 microseconds
    /// let rate = Rate::from_budget(150_000, Duration::from_secs(60));
    /// assert_eq!(rate.period(), Duration::from_micros(400));
    /// ```
    pub fn from_budget(budget: u64, window: Duration) -> Self {
        if budget == 0 {
            return Rate {
                period: Duration::MAX,
            };
        }

        let period_ns = window.as_nanos() / budget as u128;
        Rate {
            period: Duration::from_nanos(period_ns.min(u64::MAX as u128) as u64),
        }
    }

    /// Returns the emission interval (period) of this rate
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Requests per second implied by this rate
    pub fn per_second_f64(&self) -> f64 {
        let secs = self.period.as_secs_f64();
        if secs == 0.0 { f64::INFINITY } else { 1.0 / secs }
    }
}
