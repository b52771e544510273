//! Shared GCRA pacer for dispatch workers
//!
//! The pacer hands out send slots spaced one emission interval apart. It is
//! the Generic Cell Rate Algorithm in its virtual scheduling form: a single
//! theoretical arrival time (TAT) is advanced by one interval per
//! reservation, and a caller whose slot lies in the future waits for it.
//!
//! Unlike a per-worker sleep after each request, the schedule does not drift
//! with request latency, and any number of workers can share one pacer: the
//! aggregate rate is the pacer's rate, not `workers * rate`.
//!
//! # Burst tolerance
//!
//! With the default `max_burst` of 1 a pacer that fell behind (for example
//! because every worker was stuck on a slow node) does not try to catch up;
//! the schedule restarts from "now". A larger `max_burst` lets up to
//! `max_burst - 1` missed slots be issued back-to-back once workers are free
//! again.

use super::Rate;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};


/// Lock-free GCRA pacer
///
/// # Example
///
/// ```
/// use gossipbench::{Pacer, Rate};
/// use std::time::{Duration, Instant};
///
/// let origin = Instant::now();
/// let pacer = Pacer::starting_at(Rate::per_second(10), origin);
///
/// // Slots are handed out 100ms apart
/// assert_eq!(pacer.reserve_at(origin), Duration::ZERO);
/// assert_eq!(pacer.reserve_at(origin), Duration::from_millis(100));
/// assert_eq!(pacer.reserve_at(origin), Duration::from_millis(200));
/// ```
#[derive(Debug)]
pub struct Pacer {
    origin: Instant,
    emission_interval_ns: u64,
    tolerance_ns: u64,
    /// Theoretical arrival time of the next slot, in nanoseconds since `origin`
    tat_ns: AtomicU64,
}

impl Pacer {
    /// Create a pacer whose schedule starts now
    pub fn new(rate: Rate) -> Self {
        Self::starting_at(rate, Instant::now())
    }

    /// Create a pacer whose schedule starts at `origin`
    pub fn starting_at(rate: Rate, origin: Instant) -> Self {
        let emission_interval_ns = rate.period().as_nanos().min(u64::MAX as u128) as u64;
        Self {
            origin,
            emission_interval_ns,
            tolerance_ns: 0,
            tat_ns: AtomicU64::new(0),
        }
    }

    /// Allow up to `max_burst` slots to be issued without waiting
    ///
    /// Values below 1 are treated as 1.
    pub fn with_max_burst(mut self, max_burst: u32) -> Self {
        let extra = max_burst.max(1) as u64 - 1;
        self.tolerance_ns = self.emission_interval_ns.saturating_mul(extra);
        self
    }

    /// The spacing between consecutive slots
    pub fn emission_interval(&self) -> Duration {
        Duration::from_nanos(self.emission_interval_ns)
    }

    /// Reserve the next slot and return how long to wait for it
    pub fn reserve(&self) -> Duration {
        self.reserve_at(Instant::now())
    }

    /// Reserve the next slot as seen at `now`
    ///
    /// Returns the delay between `now` and the reserved slot. Every call
    /// reserves a distinct slot, including concurrent calls from many threads.
    pub fn reserve_at(&self, now: Instant) -> Duration {
        // Non-zero only when `now` precedes the schedule's origin
        let before_origin = self.origin.saturating_duration_since(now);
        let now_ns = now
            .saturating_duration_since(self.origin)
            .as_nanos()
            .min(u64::MAX as u128) as u64;
        let floor = now_ns.saturating_sub(self.tolerance_ns);

        let mut current = self.tat_ns.load(Ordering::Acquire);
        loop {
            let slot = current.max(floor);
            let next = slot.saturating_add(self.emission_interval_ns);

            match self.tat_ns.compare_exchange_weak(
                current,
                next,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => {
                    return before_origin.saturating_add(Duration::from_nanos(
                        slot.saturating_sub(now_ns),
                    ));
                }
                Err(actual) => current = actual,
            }
        }
    }

    /// Instant of the next unreserved slot
    pub fn next_slot(&self) -> Instant {
        self.origin + Duration::from_nanos(self.tat_ns.load(Ordering::Acquire))
    }
}
