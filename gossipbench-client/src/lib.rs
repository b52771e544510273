//! Async client for the HTTP control plane of a gossip membership node
//!
//! Every node exposes a small set of endpoints used by the load harness:
//!
//! - `POST /publish` with `{"test-meta": "<payload>"}` pushes a metadata update
//! - `GET /list` returns the node's current membership as a JSON array
//! - `POST /set` replaces the node's membership entry with the posted JSON
//! - `GET /metadata` returns the node's current metadata as text
//!
//! ```no_run
//! use gossipbench::Address;
//! use gossipbench_client::GossipClient;
//! use std::time::Duration;
//!
//! # async fn run() -> gossipbench_client::Result<()> {
//! let client = GossipClient::builder()
//!     .request_timeout(Duration::from_secs(2))
//!     .build()?;
//!
//! let node = Address::new("10.0.0.1", 8000);
//! client.publish(&node, "abc123".to_string()).await?;
//! let members = client.members(&node).await?;
//! println!("{} sees {} members", node, members.len());
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
pub mod protocol;

pub use client::{ClientBuilder, ClientConfig, GossipClient};
pub use error::{ClientError, Result};
pub use protocol::{Member, PublishRequest};
