//! Dispatch counters
//!
//! Lock-free atomic counters shared by every worker of a run. Nothing in the
//! hot path allocates; a [`RunResult`] is materialized from the counters when
//! the run ends (or for a progress log).

use gossipbench::{Address, Pool};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Counters for a single pool address
#[derive(Debug, Default)]
pub struct TargetCounters {
    pub attempted: AtomicU64,
    pub succeeded: AtomicU64,
    pub failed: AtomicU64,
}

/// Counters collected while a run is in progress
pub struct DispatchMetrics {
    /// Run start time
    start_time: Instant,

    /// Requests sent, whatever their outcome
    pub attempted: AtomicU64,
    pub succeeded: AtomicU64,
    pub failed: AtomicU64,

    /// Indexed like the pool
    targets: Vec<TargetCounters>,

    /// Request latency buckets (in microseconds)
    pub latency_under_1ms: AtomicU64,
    pub latency_under_10ms: AtomicU64,
    pub latency_under_100ms: AtomicU64,
    pub latency_under_1s: AtomicU64,
    pub latency_over_1s: AtomicU64,

    pub latency_sum_micros: AtomicU64,
}

impl DispatchMetrics {
    /// Create counters for a pool of `targets` addresses
    pub fn new(targets: usize) -> Self {
        Self {
            start_time: Instant::now(),
            attempted: AtomicU64::new(0),
            succeeded: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            targets: (0..targets).map(|_| TargetCounters::default()).collect(),
            latency_under_1ms: AtomicU64::new(0),
            latency_under_10ms: AtomicU64::new(0),
            latency_under_100ms: AtomicU64::new(0),
            latency_under_1s: AtomicU64::new(0),
            latency_over_1s: AtomicU64::new(0),
            latency_sum_micros: AtomicU64::new(0),
        }
    }

    /// Record a completed request to pool index `target`
    pub fn record(&self, target: usize, latency: Duration, success: bool) {
        self.attempted.fetch_add(1, Ordering::Relaxed);
        if success {
            self.succeeded.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failed.fetch_add(1, Ordering::Relaxed);
        }

        if let Some(counters) = self.targets.get(target) {
            counters.attempted.fetch_add(1, Ordering::Relaxed);
            if success {
                counters.succeeded.fetch_add(1, Ordering::Relaxed);
            } else {
                counters.failed.fetch_add(1, Ordering::Relaxed);
            }
        }

        let latency_us = latency.as_micros().min(u64::MAX as u128) as u64;
        match latency_us {
            0..=999 => self.latency_under_1ms.fetch_add(1, Ordering::Relaxed),
            1000..=9999 => self.latency_under_10ms.fetch_add(1, Ordering::Relaxed),
            10000..=99999 => self.latency_under_100ms.fetch_add(1, Ordering::Relaxed),
            100000..=999999 => self.latency_under_1s.fetch_add(1, Ordering::Relaxed),
            _ => self.latency_over_1s.fetch_add(1, Ordering::Relaxed),
        };
        self.latency_sum_micros
            .fetch_add(latency_us, Ordering::Relaxed);
    }

    /// Time since the run started
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Current counter values
    pub fn snapshot(&self, pool: &Pool) -> RunResult {
        let attempted = self.attempted.load(Ordering::Relaxed);
        let latency_sum = self.latency_sum_micros.load(Ordering::Relaxed);

        RunResult {
            attempted,
            succeeded: self.succeeded.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            elapsed: self.elapsed(),
            latency_avg: if attempted == 0 {
                Duration::ZERO
            } else {
                Duration::from_micros(latency_sum / attempted)
            },
            latency_buckets: LatencyBuckets {
                under_1ms: self.latency_under_1ms.load(Ordering::Relaxed),
                under_10ms: self.latency_under_10ms.load(Ordering::Relaxed),
                under_100ms: self.latency_under_100ms.load(Ordering::Relaxed),
                under_1s: self.latency_under_1s.load(Ordering::Relaxed),
                over_1s: self.latency_over_1s.load(Ordering::Relaxed),
            },
            targets: pool
                .iter()
                .zip(&self.targets)
                .map(|(address, counters)| TargetResult {
                    address: address.clone(),
                    attempted: counters.attempted.load(Ordering::Relaxed),
                    succeeded: counters.succeeded.load(Ordering::Relaxed),
                    failed: counters.failed.load(Ordering::Relaxed),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LatencyBuckets {
    pub under_1ms: u64,
    pub under_10ms: u64,
    pub under_100ms: u64,
    pub under_1s: u64,
    pub over_1s: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetResult {
    pub address: Address,
    pub attempted: u64,
    pub succeeded: u64,
    pub failed: u64,
}

/// Outcome of a dispatch run
#[derive(Debug, Clone, PartialEq)]
pub struct RunResult {
    pub attempted: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub elapsed: Duration,
    pub latency_avg: Duration,
    pub latency_buckets: LatencyBuckets,
    /// One entry per pool address, in pool order
    pub targets: Vec<TargetResult>,
}

impl RunResult {
    /// Achieved requests per second
    pub fn rate(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs == 0.0 {
            0.0
        } else {
            self.attempted as f64 / secs
        }
    }

    pub fn success_ratio(&self) -> f64 {
        if self.attempted == 0 {
            0.0
        } else {
            self.succeeded as f64 / self.attempted as f64
        }
    }

    pub fn print_summary(&self) {
        println!("\n=== Dispatch Summary ===");
        println!("Duration: {:?}", self.elapsed);
        println!("Total requests: {}", self.attempted);
        println!("Requests/sec: {:.2}", self.rate());
        println!(
            "Successful: {} ({:.2}%)",
            self.succeeded,
            self.success_ratio() * 100.0
        );
        println!("Failed: {}", self.failed);
        println!("Average latency: {:?}", self.latency_avg);

        println!("\nLatency distribution:");
        println!("  <1ms:    {}", self.latency_buckets.under_1ms);
        println!("  <10ms:   {}", self.latency_buckets.under_10ms);
        println!("  <100ms:  {}", self.latency_buckets.under_100ms);
        println!("  <1s:     {}", self.latency_buckets.under_1s);
        println!("  >=1s:    {}", self.latency_buckets.over_1s);

        println!("\nPer node:");
        for target in &self.targets {
            println!(
                "  {:<24} sent {:>8}  ok {:>8}  failed {:>8}",
                target.address.to_string(),
                target.attempted,
                target.succeeded,
                target.failed
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool() -> Pool {
        Pool::new(vec![
            Address::new("10.0.0.1", 8000),
            Address::new("10.0.0.2", 8000),
        ])
        .unwrap()
    }

    #[test]
    fn test_record_splits_outcomes() {
        let metrics = DispatchMetrics::new(2);
        metrics.record(0, Duration::from_micros(500), true);
        metrics.record(0, Duration::from_millis(5), false);
        metrics.record(1, Duration::from_millis(50), true);
        metrics.record(1, Duration::from_secs(2), true);

        let result = metrics.snapshot(&pool());
        assert_eq!(result.attempted, 4);
        assert_eq!(result.succeeded, 3);
        assert_eq!(result.failed, 1);
        assert_eq!(result.attempted, result.succeeded + result.failed);

        assert_eq!(result.targets[0].attempted, 2);
        assert_eq!(result.targets[0].failed, 1);
        assert_eq!(result.targets[1].succeeded, 2);
        assert_eq!(result.targets[1].address, Address::new("10.0.0.2", 8000));

        assert_eq!(
            result.latency_buckets,
            LatencyBuckets {
                under_1ms: 1,
                under_10ms: 1,
                under_100ms: 1,
                under_1s: 0,
                over_1s: 1,
            }
        );
    }

    #[test]
    fn test_empty_run() {
        let result = DispatchMetrics::new(2).snapshot(&pool());
        assert_eq!(result.attempted, 0);
        assert_eq!(result.latency_avg, Duration::ZERO);
        assert_eq!(result.success_ratio(), 0.0);
        assert_eq!(result.targets.len(), 2);
    }

    #[test]
    fn test_average_latency() {
        let metrics = DispatchMetrics::new(1);
        metrics.record(0, Duration::from_millis(10), true);
        metrics.record(0, Duration::from_millis(30), true);

        let pool = Pool::new(vec![Address::new("n1", 8000)]).unwrap();
        assert_eq!(metrics.snapshot(&pool).latency_avg, Duration::from_millis(20));
    }
}
