//! The request cycle shared by both worker modes

use super::Publisher;
use crate::metrics::DispatchMetrics;
use gossipbench::{Pacer, PayloadGenerator, Pool};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// State every worker of a run reads; only the counters and the pacer are
/// written, and both are lock-free
pub(crate) struct RunState {
    pub pool: Pool,
    pub payload: PayloadGenerator,
    /// Shared GCRA pacer, when pacing is shared
    pub pacer: Option<Pacer>,
    /// Per-worker sleep after each request, when pacing is open-loop
    pub gap: Option<Duration>,
    /// Total requests the run may issue
    pub limit: Option<u64>,
    claimed: AtomicU64,
    pub deadline: Option<Instant>,
    pub metrics: DispatchMetrics,
    pub cancel: CancellationToken,
}

impl RunState {
    pub fn new(
        pool: Pool,
        payload: PayloadGenerator,
        pacer: Option<Pacer>,
        gap: Option<Duration>,
        limit: Option<u64>,
        deadline: Option<Instant>,
        cancel: CancellationToken,
    ) -> Self {
        let metrics = DispatchMetrics::new(pool.len());
        Self {
            pool,
            payload,
            pacer,
            gap,
            limit,
            claimed: AtomicU64::new(0),
            deadline,
            metrics,
            cancel,
        }
    }

    /// Claim one request slot from the run budget
    fn claim(&self) -> bool {
        match self.limit {
            Some(limit) => self.claimed.fetch_add(1, Ordering::Relaxed) < limit,
            None => true,
        }
    }

    fn past_deadline(&self, at: Instant) -> bool {
        self.deadline.is_some_and(|deadline| at >= deadline)
    }
}

/// Run request cycles until the budget, the deadline or the cancel token
/// stops this worker. Returns the number of requests it sent.
pub(crate) async fn run_worker<P: Publisher>(
    id: usize,
    state: std::sync::Arc<RunState>,
    publisher: P,
) -> u64 {
    let mut sent = 0u64;

    loop {
        if state.cancel.is_cancelled() || state.past_deadline(Instant::now()) {
            break;
        }
        if !state.claim() {
            break;
        }

        if let Some(pacer) = &state.pacer {
            let wait = pacer.reserve();
            // A slot beyond the deadline would never be used
            let slot = Instant::now().checked_add(wait);
            if slot.map_or(state.deadline.is_some(), |at| state.past_deadline(at)) {
                break;
            }
            if !wait.is_zero() && !sleep_or_cancel(&state.cancel, wait).await {
                break;
            }
        }

        let (index, target) = state.pool.sample();
        let payload = state.payload.generate();

        let start = Instant::now();
        let outcome = publisher.publish(target, payload).await;
        let latency = start.elapsed();

        match outcome {
            Ok(()) => state.metrics.record(index, latency, true),
            Err(e) => {
                tracing::debug!("Publish to {} failed: {}", target, e);
                state.metrics.record(index, latency, false);
            }
        }
        sent += 1;

        if let Some(gap) = state.gap {
            if !sleep_or_cancel(&state.cancel, gap).await {
                break;
            }
        }
    }

    tracing::debug!("Worker {} finished after {} requests", id, sent);
    sent
}

/// Returns false if cancelled before `wait` elapsed
async fn sleep_or_cancel(cancel: &CancellationToken, wait: Duration) -> bool {
    tokio::select! {
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(wait) => true,
    }
}
