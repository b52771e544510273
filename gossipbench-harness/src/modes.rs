//! The invocation pipelines behind each CLI mode
//!
//! Every mode resolves the pool first; a discovery failure aborts before any
//! request is sent.

use crate::config::{Config, DiscoveryConfig, DiscoveryKind, Mode};
use crate::directory::{Directory, KubeDirectory, StaticDirectory, resolve_pool};
use crate::dispatch::Dispatcher;
use crate::error::{HarnessError, Result};
use crate::snapshot::{self, CanonicalStrategy};
use gossipbench::{PayloadGenerator, Pool, RateSpec};
use gossipbench_client::GossipClient;
use tokio_util::sync::CancellationToken;

/// Run `mode` to completion
pub async fn run(config: &Config, mode: Mode, cancel: CancellationToken) -> Result<()> {
    let client = GossipClient::builder()
        .request_timeout(config.dispatch.timeout)
        .build()?;

    let directory = build_directory(&config.discovery).await?;
    let pool = resolve_pool(directory.as_ref(), &config.discovery.selector).await?;

    match (mode, config.dispatch.rate_spec(mode)) {
        (Mode::Test, _) => print_snapshots(&client, &pool).await,
        (Mode::Configure, _) => configure(&client, &pool, config.canonical).await,
        (Mode::GetList, _) => print_membership_sizes(&client, &pool).await,
        (Mode::Bench, Some(spec)) => bench(config, client, pool.first_only(), spec, cancel).await,
        (_, Some(spec)) => bench(config, client, pool, spec, cancel).await,
        (_, None) => Ok(()),
    }
}

pub async fn build_directory(discovery: &DiscoveryConfig) -> Result<Box<dyn Directory>> {
    match discovery.kind {
        DiscoveryKind::Static => Ok(Box::new(StaticDirectory::new(discovery.nodes.clone()))),
        DiscoveryKind::Kube => Ok(Box::new(KubeDirectory::connect().await?)),
    }
}

async fn print_snapshots(client: &GossipClient, pool: &Pool) -> Result<()> {
    let collection = snapshot::collect_all(client, pool).await;

    for snapshot in &collection.snapshots {
        println!(
            "Snapshot from {} ({} members):\n{}",
            snapshot.source, snapshot.member_count, snapshot.content
        );
    }
    for failure in &collection.failures {
        println!("Failed to collect from {}: {}", failure.source, failure.error);
    }

    println!(
        "\nCollected {} of {} snapshot(s)",
        collection.snapshots.len(),
        pool.len()
    );
    Ok(())
}

/// Collect, select the canonical snapshot and propagate it
pub async fn configure(
    client: &GossipClient,
    pool: &Pool,
    strategy: CanonicalStrategy,
) -> Result<()> {
    let collection = snapshot::collect_all(client, pool).await;

    if strategy == CanonicalStrategy::First {
        if let Some(failure) = collection.failed(pool.first()) {
            return Err(HarnessError::Snapshot(format!(
                "canonical node {} failed: {}",
                failure.source, failure.error
            )));
        }
    }

    let outcomes = snapshot::propagate(client, &collection.snapshots, strategy).await?;
    for outcome in &outcomes {
        match &outcome.result {
            Ok(response) => println!("Response from {}: {}", outcome.target, response),
            Err(e) => println!("Failed to configure {}: {}", outcome.target, e),
        }
    }

    Ok(())
}

async fn print_membership_sizes(client: &GossipClient, pool: &Pool) -> Result<()> {
    for size in snapshot::membership_sizes(client, pool).await {
        match size.result {
            Ok(count) => println!("{} has {} members", size.target, count),
            Err(e) => println!("{} failed: {}", size.target, e),
        }
    }
    Ok(())
}

async fn bench(
    config: &Config,
    client: GossipClient,
    pool: Pool,
    spec: RateSpec,
    cancel: CancellationToken,
) -> Result<()> {
    let settings = &config.dispatch;
    let dispatcher = Dispatcher::new(client)
        .pacing(settings.pacing)
        .worker_mode(settings.worker_mode)
        .max_burst(settings.max_burst)
        .report_interval(settings.report_interval);

    let result = dispatcher
        .run(
            pool.addresses().to_vec(),
            PayloadGenerator::new(settings.payload_length),
            spec,
            settings.workers,
            cancel,
        )
        .await?;

    result.print_summary();
    Ok(())
}
