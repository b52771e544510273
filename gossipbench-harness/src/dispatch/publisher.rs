use async_trait::async_trait;
use gossipbench::Address;
use gossipbench_client::{ClientError, GossipClient};

/// Sends one update to one node
///
/// Every worker gets its own publisher from [`Publisher::for_worker`], so a
/// publisher never has to be shared across runtimes in threads mode.
#[async_trait]
pub trait Publisher: Send + Sync + 'static {
    /// A publisher with its own connection pool, for one worker
    fn for_worker(&self) -> Result<Self, ClientError>
    where
        Self: Sized;

    async fn publish(&self, target: &Address, payload: String) -> Result<(), ClientError>;
}

#[async_trait]
impl Publisher for GossipClient {
    fn for_worker(&self) -> Result<Self, ClientError> {
        self.fresh()
    }

    async fn publish(&self, target: &Address, payload: String) -> Result<(), ClientError> {
        GossipClient::publish(self, target, payload).await
    }
}
