//! Rate-controlled dispatch of publish requests
//!
//! A run starts `workers` independent workers. Each one repeatedly samples a
//! node from the pool, generates a payload and publishes it, until the
//! [`RateSpec`] says the run is over or the cancel token fires.
//!
//! # Pacing
//!
//! - [`Pacing::Shared`]: all workers reserve send slots from one lock-free
//!   GCRA [`Pacer`]; the aggregate rate is `budget / window` no matter how
//!   many workers there are or how slow the nodes answer.
//! - [`Pacing::OpenLoop`]: every worker sleeps `window / budget` after each
//!   request. The schedule drifts by the request latency and the aggregate
//!   rate scales with the worker count.
//!
//! Count specs are never paced.
//!
//! # Budget
//!
//! Bounded specs hand out request slots from a shared atomic counter before
//! anything is sent, so the total across workers is exact.

mod publisher;
mod worker;

#[cfg(test)]
mod tests;

pub use publisher::Publisher;

use crate::error::{HarnessError, Result};
use crate::metrics::RunResult;
use gossipbench::{Address, ConfigError, Pacer, PayloadGenerator, Pool, RateSpec};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use worker::{RunState, run_worker};

/// How workers space their requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pacing {
    /// One GCRA schedule shared by every worker
    Shared,
    /// Each worker sleeps one gap after every request
    OpenLoop,
}

impl std::str::FromStr for Pacing {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.to_lowercase().as_str() {
            "shared" => Ok(Pacing::Shared),
            "open-loop" | "openloop" => Ok(Pacing::OpenLoop),
            _ => Err(anyhow::anyhow!(
                "Invalid pacing: {}. Valid options are: shared, open-loop",
                s
            )),
        }
    }
}

/// How workers are executed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerMode {
    /// Tokio tasks on the caller's runtime
    Tasks,
    /// One OS thread per worker, each with its own current-thread runtime
    Threads,
}

impl std::str::FromStr for WorkerMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.to_lowercase().as_str() {
            "tasks" => Ok(WorkerMode::Tasks),
            "threads" => Ok(WorkerMode::Threads),
            _ => Err(anyhow::anyhow!(
                "Invalid worker mode: {}. Valid options are: tasks, threads",
                s
            )),
        }
    }
}

/// Runs dispatch workers against a pool
///
/// # Example
///
/// ```no_run
/// use gossipbench::{Address, PayloadGenerator, RateSpec};
/// use gossipbench_client::GossipClient;
/// use gossipbench_harness::dispatch::{Dispatcher, WorkerMode};
/// use tokio_util::sync::CancellationToken;
///
/// # async fn run() -> gossipbench_harness::error::Result<()> {
/// let dispatcher = Dispatcher::new(GossipClient::new()?).worker_mode(WorkerMode::Threads);
/// let result = dispatcher
///     .run(
///         vec![Address::new("10.0.0.1", 8000), Address::new("10.0.0.2", 8000)],
///         PayloadGenerator::default(),
///         RateSpec::Count { count: 10_000 },
///         4,
///         CancellationToken::new(),
///     )
///     .await?;
/// result.print_summary();
/// # Ok(())
/// # }
/// ```
pub struct Dispatcher<P> {
    publisher: P,
    pacing: Pacing,
    worker_mode: WorkerMode,
    max_burst: u32,
    report_interval: Option<Duration>,
}

impl<P: Publisher> Dispatcher<P> {
    /// `publisher` is only used as a template; every worker gets its own
    pub fn new(publisher: P) -> Self {
        Self {
            publisher,
            pacing: Pacing::Shared,
            worker_mode: WorkerMode::Tasks,
            max_burst: 1,
            report_interval: None,
        }
    }

    pub fn pacing(mut self, pacing: Pacing) -> Self {
        self.pacing = pacing;
        self
    }

    pub fn worker_mode(mut self, mode: WorkerMode) -> Self {
        self.worker_mode = mode;
        self
    }

    pub fn max_burst(mut self, max_burst: u32) -> Self {
        self.max_burst = max_burst;
        self
    }

    /// Log progress every `interval` while the run is in progress
    pub fn report_interval(mut self, interval: Option<Duration>) -> Self {
        self.report_interval = interval.filter(|i| !i.is_zero());
        self
    }

    /// Dispatch publish requests until `spec` is exhausted or `cancel` fires
    ///
    /// Configuration errors are detected before any worker starts, so a run
    /// that fails with [`HarnessError::Config`] has sent nothing. Failed
    /// requests are counted in the result, never returned as errors.
    pub async fn run(
        &self,
        addresses: Vec<Address>,
        payload: PayloadGenerator,
        spec: RateSpec,
        workers: usize,
        cancel: CancellationToken,
    ) -> Result<RunResult> {
        let pool = Pool::new(addresses)?;
        if workers == 0 {
            return Err(ConfigError::NoWorkers.into());
        }
        spec.validate()?;

        let publishers = (0..workers)
            .map(|_| self.publisher.for_worker())
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let (pacer, gap) = match (self.pacing, spec.rate()) {
            (Pacing::Shared, Some(rate)) => {
                (Some(Pacer::new(rate).with_max_burst(self.max_burst)), None)
            }
            (Pacing::OpenLoop, Some(rate)) => (None, Some(rate.period())),
            (_, None) => (None, None),
        };

        tracing::info!(
            "Starting {} run: {} worker(s) as {:?}, {:?} pacing, {} node(s)",
            spec.kind(),
            workers,
            self.worker_mode,
            self.pacing,
            pool.len()
        );
        if let Some(rate) = spec.rate() {
            tracing::info!("Target rate: {:.2} req/s", rate.per_second_f64());
        }

        let state = Arc::new(RunState::new(
            pool,
            payload,
            pacer,
            gap,
            spec.limit(),
            // A window too long to represent as an instant never ends on its own
            spec.deadline().and_then(|d| Instant::now().checked_add(d)),
            cancel.child_token(),
        ));

        let reporter_stop = CancellationToken::new();
        let reporter = self
            .report_interval
            .map(|interval| spawn_reporter(state.clone(), interval, reporter_stop.clone()));

        let outcome = match self.worker_mode {
            WorkerMode::Tasks => run_tasks(&state, publishers).await,
            WorkerMode::Threads => run_threads(&state, publishers).await,
        };

        reporter_stop.cancel();
        if let Some(reporter) = reporter {
            let _ = reporter.await;
        }

        outcome?;

        let result = state.metrics.snapshot(&state.pool);
        tracing::info!(
            "Run finished: {} sent, {} succeeded, {} failed in {:?} ({:.2} req/s)",
            result.attempted,
            result.succeeded,
            result.failed,
            result.elapsed,
            result.rate()
        );
        Ok(result)
    }
}

async fn run_tasks<P: Publisher>(state: &Arc<RunState>, publishers: Vec<P>) -> Result<()> {
    let mut tasks = JoinSet::new();
    for (id, publisher) in publishers.into_iter().enumerate() {
        tasks.spawn(run_worker(id, state.clone(), publisher));
    }

    while let Some(result) = tasks.join_next().await {
        if let Err(e) = result {
            tracing::error!("Worker task panicked: {}", e);
            state.cancel.cancel();
            tasks.shutdown().await;
            return Err(HarnessError::Worker(format!("worker task panicked: {e}")));
        }
    }

    Ok(())
}

async fn run_threads<P: Publisher>(state: &Arc<RunState>, publishers: Vec<P>) -> Result<()> {
    let mut handles = Vec::with_capacity(publishers.len());
    let mut spawn_error = None;

    for (id, publisher) in publishers.into_iter().enumerate() {
        let worker_state = state.clone();
        let spawned = std::thread::Builder::new()
            .name(format!("gossipbench-worker-{id}"))
            .spawn(move || -> std::io::Result<u64> {
                let runtime = tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()?;
                Ok(runtime.block_on(run_worker(id, worker_state, publisher)))
            });

        match spawned {
            Ok(handle) => handles.push(handle),
            Err(e) => {
                // Stop the workers already running, then report
                state.cancel.cancel();
                spawn_error = Some(HarnessError::Worker(format!(
                    "failed to spawn worker thread {id}: {e}"
                )));
                break;
            }
        }
    }

    let joined = tokio::task::spawn_blocking(move || {
        handles
            .into_iter()
            .map(|handle| handle.join())
            .collect::<Vec<_>>()
    })
    .await
    .map_err(|e| HarnessError::Worker(format!("failed to join worker threads: {e}")))?;

    if let Some(e) = spawn_error {
        return Err(e);
    }

    for (id, result) in joined.into_iter().enumerate() {
        match result {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => {
                return Err(HarnessError::Worker(format!(
                    "worker thread {id} could not start its runtime: {e}"
                )));
            }
            Err(_) => {
                return Err(HarnessError::Worker(format!("worker thread {id} panicked")));
            }
        }
    }

    Ok(())
}

fn spawn_reporter(
    state: Arc<RunState>,
    interval: Duration,
    stop: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // The first tick completes immediately
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = stop.cancelled() => break,
                _ = ticker.tick() => {
                    let progress = state.metrics.snapshot(&state.pool);
                    tracing::info!(
                        "Progress: {} sent, {} succeeded, {} failed, {:.2} req/s",
                        progress.attempted,
                        progress.succeeded,
                        progress.failed,
                        progress.rate()
                    );
                }
            }
        }
    })
}
