//! Endpoint discovery
//!
//! A [`Directory`] turns a [`Selector`] into the list of gossip nodes that are
//! reachable right now. Two implementations exist:
//!
//! - [`fixed::StaticDirectory`]: a configured list of addresses
//! - [`kube::KubeDirectory`]: pod IPs from the Kubernetes API
//!
//! A resolution is a point-in-time snapshot. Nodes may disappear while a run
//! is in progress; the dispatcher tolerates that by counting the failures.

pub mod fixed;
pub mod kube;

use async_trait::async_trait;
use gossipbench::{Address, ConfigError, Pool};
use thiserror::Error;

pub use self::fixed::StaticDirectory;
pub use self::kube::KubeDirectory;

/// Default namespace the gossip service is deployed in
pub const DEFAULT_NAMESPACE: &str = "gossip";
/// Default label selector matching gossip service pods
pub const DEFAULT_LABEL_SELECTOR: &str = "app=gossip-service";
/// HTTP control port of a gossip node
pub const DEFAULT_NODE_PORT: u16 = 8000;

/// Which service group to resolve
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    pub namespace: String,
    pub label_selector: String,
    /// Port the control plane listens on; used for every resolved address
    /// that does not carry its own
    pub port: u16,
}

impl Default for Selector {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            label_selector: DEFAULT_LABEL_SELECTOR.to_string(),
            port: DEFAULT_NODE_PORT,
        }
    }
}

impl std::fmt::Display for Selector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.namespace, self.label_selector)
    }
}

#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("kubernetes client unavailable: {0}")]
    Client(#[source] ::kube::Error),

    #[error("failed to list pods in namespace {namespace}: {source}")]
    List {
        namespace: String,
        #[source]
        source: ::kube::Error,
    },

    #[error("invalid static address: {0}")]
    InvalidAddress(#[from] ConfigError),

    #[error("no endpoints found for {0}")]
    Empty(String),
}

/// Source of node addresses
#[async_trait]
pub trait Directory: Send + Sync {
    /// Resolve the current addresses for `selector`, in a stable order
    ///
    /// An empty result is not an error at this level; see [`resolve_pool`].
    async fn resolve(&self, selector: &Selector) -> Result<Vec<Address>, DiscoveryError>;

    /// Short name used in logs
    fn name(&self) -> &'static str;
}

/// Resolve `selector` and build a non-empty pool from the result
pub async fn resolve_pool(
    directory: &dyn Directory,
    selector: &Selector,
) -> Result<Pool, DiscoveryError> {
    let addresses = directory.resolve(selector).await?;
    tracing::info!(
        "{} directory resolved {} endpoint(s) for {}",
        directory.name(),
        addresses.len(),
        selector
    );

    Pool::new(addresses).map_err(|_| DiscoveryError::Empty(selector.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_resolve_pool_rejects_empty() {
        let directory = StaticDirectory::new(Vec::<String>::new());
        let err = resolve_pool(&directory, &Selector::default())
            .await
            .unwrap_err();

        assert!(matches!(err, DiscoveryError::Empty(_)));
        assert!(err.to_string().contains("gossip/app=gossip-service"));
    }

    #[tokio::test]
    async fn test_resolve_pool_keeps_order() {
        let directory = StaticDirectory::new(["10.0.0.3", "10.0.0.1", "10.0.0.2"]);
        let pool = resolve_pool(&directory, &Selector::default()).await.unwrap();

        let hosts: Vec<_> = pool.iter().map(|a| a.host().to_string()).collect();
        assert_eq!(hosts, ["10.0.0.3", "10.0.0.1", "10.0.0.2"]);
    }
}
