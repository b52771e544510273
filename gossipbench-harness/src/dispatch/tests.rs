use super::*;
use async_trait::async_trait;
use gossipbench_client::ClientError;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Default)]
struct MockState {
    calls: Mutex<HashMap<Address, u64>>,
    failing: HashSet<Address>,
    latency: Duration,
    workers: AtomicUsize,
}

/// Records every publish instead of sending it
#[derive(Clone, Default)]
struct MockPublisher {
    state: Arc<MockState>,
}

impl MockPublisher {
    fn failing(addresses: &[Address]) -> Self {
        Self {
            state: Arc::new(MockState {
                failing: addresses.iter().cloned().collect(),
                ..Default::default()
            }),
        }
    }

    fn with_latency(latency: Duration) -> Self {
        Self {
            state: Arc::new(MockState {
                latency,
                ..Default::default()
            }),
        }
    }

    fn total_calls(&self) -> u64 {
        self.state.calls.lock().values().sum()
    }

    fn calls_to(&self, address: &Address) -> u64 {
        self.state.calls.lock().get(address).copied().unwrap_or(0)
    }
}

#[async_trait]
impl Publisher for MockPublisher {
    fn for_worker(&self) -> std::result::Result<Self, ClientError> {
        self.state.workers.fetch_add(1, Ordering::Relaxed);
        Ok(self.clone())
    }

    async fn publish(&self, target: &Address, payload: String) -> std::result::Result<(), ClientError> {
        assert_eq!(payload.len(), 16);
        *self.state.calls.lock().entry(target.clone()).or_default() += 1;

        if !self.state.latency.is_zero() {
            tokio::time::sleep(self.state.latency).await;
        }

        if self.state.failing.contains(target) {
            Err(ClientError::Timeout)
        } else {
            Ok(())
        }
    }
}

fn nodes(n: u16) -> Vec<Address> {
    (1..=n).map(|i| Address::new(format!("10.0.0.{i}"), 8000)).collect()
}

fn payload() -> PayloadGenerator {
    PayloadGenerator::new(16)
}

#[test]
fn test_pacing_from_str() {
    assert_eq!(Pacing::from_str("shared").unwrap(), Pacing::Shared);
    assert_eq!(Pacing::from_str("open-loop").unwrap(), Pacing::OpenLoop);
    assert_eq!(Pacing::from_str("OpenLoop").unwrap(), Pacing::OpenLoop);
    assert!(Pacing::from_str("sleepy").is_err());
}

#[test]
fn test_worker_mode_from_str() {
    assert_eq!(WorkerMode::from_str("tasks").unwrap(), WorkerMode::Tasks);
    assert_eq!(WorkerMode::from_str("THREADS").unwrap(), WorkerMode::Threads);
    assert!(WorkerMode::from_str("fibers").is_err());
}

#[tokio::test]
async fn test_count_is_exact_across_workers() {
    for workers in [1, 4, 16] {
        let publisher = MockPublisher::default();
        let dispatcher = Dispatcher::new(publisher.clone());

        let result = dispatcher
            .run(
                nodes(3),
                payload(),
                RateSpec::Count { count: 1_000 },
                workers,
                CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(publisher.total_calls(), 1_000, "workers = {workers}");
        assert_eq!(result.attempted, 1_000);
        assert_eq!(result.succeeded, 1_000);
        assert_eq!(
            result.targets.iter().map(|t| t.attempted).sum::<u64>(),
            1_000
        );
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_count_is_exact_in_threads_mode() {
    let publisher = MockPublisher::default();
    let dispatcher = Dispatcher::new(publisher.clone()).worker_mode(WorkerMode::Threads);

    let result = dispatcher
        .run(
            nodes(2),
            payload(),
            RateSpec::Count { count: 500 },
            4,
            CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(publisher.total_calls(), 500);
    assert_eq!(result.attempted, 500);
}

#[tokio::test]
async fn test_one_publisher_per_worker() {
    let publisher = MockPublisher::default();
    Dispatcher::new(publisher.clone())
        .run(
            nodes(1),
            payload(),
            RateSpec::Count { count: 10 },
            3,
            CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(publisher.state.workers.load(Ordering::Relaxed), 3);
}

#[tokio::test]
async fn test_empty_pool_is_rejected_before_sending() {
    let publisher = MockPublisher::default();
    let err = Dispatcher::new(publisher.clone())
        .run(
            Vec::new(),
            payload(),
            RateSpec::Count { count: 10 },
            1,
            CancellationToken::new(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, HarnessError::Config(ConfigError::EmptyPool)));
    assert_eq!(publisher.total_calls(), 0);
    assert_eq!(publisher.state.workers.load(Ordering::Relaxed), 0);
}

#[tokio::test]
async fn test_invalid_run_parameters_are_rejected() {
    let publisher = MockPublisher::default();
    let dispatcher = Dispatcher::new(publisher.clone());

    let err = dispatcher
        .run(
            nodes(2),
            payload(),
            RateSpec::Count { count: 10 },
            0,
            CancellationToken::new(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, HarnessError::Config(ConfigError::NoWorkers)));

    let err = dispatcher
        .run(
            nodes(2),
            payload(),
            RateSpec::Window {
                duration: Duration::from_secs(1),
                budget: 0,
            },
            1,
            CancellationToken::new(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, HarnessError::Config(ConfigError::ZeroBudget)));
    assert_eq!(err.stage(), "configuration");

    assert_eq!(publisher.total_calls(), 0);
}

#[tokio::test]
async fn test_failing_node_is_counted_and_swallowed() {
    let pool = nodes(2);
    let publisher = MockPublisher::failing(&pool[1..]);

    let result = Dispatcher::new(publisher.clone())
        .run(
            pool.clone(),
            payload(),
            RateSpec::Count { count: 100 },
            2,
            CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(result.attempted, 100);
    assert_eq!(result.succeeded + result.failed, 100);

    let healthy = &result.targets[0];
    let broken = &result.targets[1];
    assert_eq!(healthy.address, pool[0]);
    assert_eq!(healthy.failed, 0);
    assert_eq!(broken.succeeded, 0);
    assert_eq!(broken.failed, broken.attempted);
    assert_eq!(healthy.attempted + broken.attempted, 100);
    assert!(healthy.attempted > 0 && broken.attempted > 0);

    assert_eq!(publisher.calls_to(&pool[0]), healthy.attempted);
    assert_eq!(publisher.calls_to(&pool[1]), broken.attempted);
}

#[tokio::test]
async fn test_window_stops_at_deadline() {
    let publisher = MockPublisher::with_latency(Duration::from_millis(5));
    let window = Duration::from_millis(300);

    let start = Instant::now();
    let result = Dispatcher::new(publisher.clone())
        .run(
            nodes(2),
            payload(),
            RateSpec::Window {
                duration: window,
                budget: 1_000_000,
            },
            2,
            CancellationToken::new(),
        )
        .await
        .unwrap();
    let elapsed = start.elapsed();

    // duration + one request latency + one gap, plus scheduler slack
    assert!(elapsed < window + Duration::from_millis(200), "{elapsed:?}");
    assert!(result.attempted > 0);
    assert!(result.attempted < 1_000_000);
}

#[tokio::test]
async fn test_window_stops_at_budget() {
    let publisher = MockPublisher::default();

    let result = Dispatcher::new(publisher.clone())
        .run(
            nodes(2),
            payload(),
            RateSpec::Window {
                duration: Duration::from_millis(400),
                budget: 10,
            },
            2,
            CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(result.attempted, 10);
    assert_eq!(publisher.total_calls(), 10);
}

#[tokio::test]
async fn test_window_longer_than_the_clock_runs_to_budget() {
    let publisher = MockPublisher::default();

    let result = Dispatcher::new(publisher.clone())
        .run(
            nodes(1),
            payload(),
            RateSpec::Window {
                duration: Duration::from_secs(u64::MAX),
                budget: 1,
            },
            1,
            CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(result.attempted, 1);
    assert_eq!(publisher.total_calls(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_count_run_spreads_uniformly_over_pool() {
    // Chi-squared goodness of fit of the per-node counts of a whole run.
    // With 4 degrees of freedom the 0.999 quantile is 18.47.
    const N: u64 = 50_000;
    let pool = nodes(5);
    let publisher = MockPublisher::default();

    let result = Dispatcher::new(publisher.clone())
        .run(
            pool.clone(),
            payload(),
            RateSpec::Count { count: N },
            4,
            CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(result.attempted, N);

    let expected = N as f64 / 5.0;
    let observed: Vec<u64> = pool.iter().map(|a| publisher.calls_to(a)).collect();
    let chi_squared: f64 = observed
        .iter()
        .map(|&o| {
            let diff = o as f64 - expected;
            diff * diff / expected
        })
        .sum();

    assert!(
        chi_squared < 18.47,
        "chi-squared {chi_squared:.2} too large, observed {observed:?}"
    );
    assert_eq!(
        observed,
        result.targets.iter().map(|t| t.attempted).collect::<Vec<_>>()
    );
}

#[tokio::test]
async fn test_open_loop_window() {
    let publisher = MockPublisher::default();

    let start = Instant::now();
    let result = Dispatcher::new(publisher.clone())
        .pacing(Pacing::OpenLoop)
        .run(
            nodes(1),
            payload(),
            RateSpec::Window {
                duration: Duration::from_millis(200),
                budget: 4,
            },
            1,
            CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(result.attempted, 4);
    // Three 50ms gaps at least separate four requests
    assert!(start.elapsed() >= Duration::from_millis(150));
}

#[tokio::test]
async fn test_shared_pacing_bounds_aggregate_rate() {
    let publisher = MockPublisher::default();
    let cancel = CancellationToken::new();

    // 50 per second, i.e. one slot every 20ms, shared by 8 workers
    let dispatcher = Dispatcher::new(publisher.clone());
    let run = dispatcher.run(
        nodes(3),
        payload(),
        RateSpec::Unbounded {
            window: Duration::from_secs(1),
            budget: 50,
        },
        8,
        cancel.clone(),
    );

    let stopper = async {
        tokio::time::sleep(Duration::from_millis(300)).await;
        cancel.cancel();
    };

    let (result, ()) = tokio::join!(run, stopper);
    let result = result.unwrap();

    // About 16 slots fit in 300ms; open-loop pacing would issue ~8x that
    assert!(result.attempted >= 8, "{}", result.attempted);
    assert!(result.attempted <= 20, "{}", result.attempted);
}

#[tokio::test]
async fn test_cancel_stops_unbounded_run() {
    let publisher = MockPublisher::default();
    let cancel = CancellationToken::new();
    let dispatcher = Dispatcher::new(publisher.clone()).report_interval(Some(Duration::from_millis(20)));

    let run = dispatcher.run(
        nodes(2),
        payload(),
        RateSpec::Unbounded {
            window: Duration::from_secs(1),
            budget: 100,
        },
        2,
        cancel.clone(),
    );

    let stopper = async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        cancel.cancel();
    };

    let start = Instant::now();
    let (result, ()) = tokio::join!(run, stopper);
    let result = result.unwrap();

    assert!(start.elapsed() < Duration::from_secs(1));
    assert!(result.attempted > 0);
    assert_eq!(result.attempted, publisher.total_calls());
}

#[tokio::test]
async fn test_cancel_before_start_sends_nothing() {
    let publisher = MockPublisher::default();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let result = Dispatcher::new(publisher.clone())
        .run(
            nodes(2),
            payload(),
            RateSpec::Count { count: 100 },
            4,
            cancel,
        )
        .await
        .unwrap();

    assert_eq!(result.attempted, 0);
    assert_eq!(publisher.total_calls(), 0);
}
