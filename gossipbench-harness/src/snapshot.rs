//! Membership snapshots and propagation
//!
//! A snapshot is the first entry of a node's `/list` response: the node's
//! own membership record, pretty-printed. `configure` mode collects one
//! snapshot per node, picks a canonical one and posts it to every node's
//! `/set` endpoint so the whole cluster agrees on it.
//!
//! Node failures are recorded per node and never abort a collection or a
//! propagation; the caller decides what is fatal.

use crate::error::{HarnessError, Result};
use gossipbench::{Address, Pool};
use gossipbench_client::{ClientError, GossipClient};

/// One node's membership record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MembershipSnapshot {
    pub source: Address,
    /// Number of entries the node's `/list` returned
    pub member_count: usize,
    /// Pretty-printed JSON of the first `/list` entry
    pub content: String,
}

#[derive(Debug)]
pub struct CollectFailure {
    pub source: Address,
    pub error: ClientError,
}

/// Result of [`collect_all`]; both sequences are in pool order
#[derive(Debug, Default)]
pub struct Collection {
    pub snapshots: Vec<MembershipSnapshot>,
    pub failures: Vec<CollectFailure>,
}

impl Collection {
    /// Whether `address` failed to produce a snapshot
    pub fn failed(&self, address: &Address) -> Option<&CollectFailure> {
        self.failures.iter().find(|f| &f.source == address)
    }
}

/// Which snapshot is propagated to the cluster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CanonicalStrategy {
    /// The first collected snapshot
    #[default]
    First,
    /// The snapshot from the node that reported the most members;
    /// ties go to the earliest
    Largest,
}

impl CanonicalStrategy {
    pub fn select<'a>(&self, snapshots: &'a [MembershipSnapshot]) -> Option<&'a MembershipSnapshot> {
        match self {
            CanonicalStrategy::First => snapshots.first(),
            CanonicalStrategy::Largest => snapshots.iter().reduce(|best, candidate| {
                if candidate.member_count > best.member_count {
                    candidate
                } else {
                    best
                }
            }),
        }
    }
}

impl std::str::FromStr for CanonicalStrategy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.to_lowercase().as_str() {
            "first" => Ok(CanonicalStrategy::First),
            "largest" => Ok(CanonicalStrategy::Largest),
            _ => Err(anyhow::anyhow!(
                "Invalid canonical strategy: {}. Valid options are: first, largest",
                s
            )),
        }
    }
}

/// Fetch a snapshot from every node in pool order
pub async fn collect_all(client: &GossipClient, pool: &Pool) -> Collection {
    let mut collection = Collection::default();

    for address in pool {
        match snapshot(client, address).await {
            Ok(snapshot) => {
                tracing::debug!(
                    "Collected snapshot from {} ({} members)",
                    address,
                    snapshot.member_count
                );
                collection.snapshots.push(snapshot);
            }
            Err(error) => {
                tracing::warn!("Failed to collect snapshot from {}: {}", address, error);
                collection.failures.push(CollectFailure {
                    source: address.clone(),
                    error,
                });
            }
        }
    }

    collection
}

async fn snapshot(
    client: &GossipClient,
    address: &Address,
) -> std::result::Result<MembershipSnapshot, ClientError> {
    let (entry, member_count) = client.first_entry(address).await?;
    let content = serde_json::to_string_pretty(&entry).map_err(|source| ClientError::Parse {
        url: address.url("/list"),
        source,
    })?;

    Ok(MembershipSnapshot {
        source: address.clone(),
        member_count,
        content,
    })
}

/// Outcome of one `/set` call
#[derive(Debug)]
pub struct PropagateOutcome {
    pub target: Address,
    /// Response text of the node
    pub result: std::result::Result<String, ClientError>,
}

/// Post the canonical snapshot to `/set` of every node that produced one
///
/// Makes exactly `snapshots.len()` calls. Fails only when there is nothing
/// to propagate.
pub async fn propagate(
    client: &GossipClient,
    snapshots: &[MembershipSnapshot],
    strategy: CanonicalStrategy,
) -> Result<Vec<PropagateOutcome>> {
    let canonical = strategy
        .select(snapshots)
        .ok_or_else(|| HarnessError::Snapshot("no snapshots were collected".to_string()))?;

    tracing::info!(
        "Propagating snapshot from {} to {} node(s)",
        canonical.source,
        snapshots.len()
    );

    let mut outcomes = Vec::with_capacity(snapshots.len());
    for snapshot in snapshots {
        let result = client.set(&snapshot.source, canonical.content.clone()).await;
        if let Err(e) = &result {
            tracing::warn!("Failed to set membership on {}: {}", snapshot.source, e);
        }
        outcomes.push(PropagateOutcome {
            target: snapshot.source.clone(),
            result,
        });
    }

    Ok(outcomes)
}

/// Membership size reported by one node
#[derive(Debug)]
pub struct MembershipSize {
    pub target: Address,
    pub result: std::result::Result<usize, ClientError>,
}

/// Number of `/list` entries per node, in pool order
pub async fn membership_sizes(client: &GossipClient, pool: &Pool) -> Vec<MembershipSize> {
    let mut sizes = Vec::with_capacity(pool.len());

    for address in pool {
        let result = client.list(address).await.map(|entries| {
            let without_addr = entries.iter().filter(|e| e.get("Addr").is_none()).count();
            if without_addr > 0 {
                tracing::debug!("{} returned {} entries without Addr", address, without_addr);
            }
            entries.len()
        });

        if tracing::enabled!(tracing::Level::DEBUG) {
            match client.metadata(address).await {
                Ok(metadata) => tracing::debug!("Metadata of {}: {}", address, metadata),
                Err(e) => tracing::debug!("Failed to read metadata of {}: {}", address, e),
            }
        }

        sizes.push(MembershipSize {
            target: address.clone(),
            result,
        });
    }

    sizes
}
