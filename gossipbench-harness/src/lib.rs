//! # GossipBench Harness
//!
//! Load generation and membership synchronisation for gossip clusters that
//! expose the HTTP control plane described in [`gossipbench_client`].
//!
//! ## Modes
//!
//! | Flag | Mode | What it does |
//! |---|---|---|
//! | `-t` | test | Collect and print every node's membership snapshot |
//! | `-c` | configure | Collect snapshots and push the canonical one to every node |
//! | `-b` | bench | Unbounded publish load against the first node until Ctrl-C |
//! | `-f` | bench-fixed | Exactly `--count` publishes spread over the pool |
//! | `-w` | bench-window | `--budget` publishes paced across `--window-secs` |
//! | `-g` | get-list | Print the membership size reported by each node |
//!
//! ## Quick Start
//!
//! ```bash
//! # Show all available options
//! gossipbench --help
//!
//! # Nodes from the cluster (namespace "gossip", label "app=gossip-service")
//! gossipbench --get-list
//!
//! # 10000 publishes from 8 workers against a static pool
//! gossipbench --nodes 10.0.0.1,10.0.0.2,10.0.0.3 --bench-fixed --count 10000 --workers 8
//!
//! # List all available environment variables
//! gossipbench --list-env-vars
//! ```
//!
//! ## Library use
//!
//! The [`dispatch::Dispatcher`] can drive any [`dispatch::Publisher`], which
//! is how the dispatch tests run without a network.

pub mod config;
pub mod directory;
pub mod dispatch;
pub mod error;
pub mod metrics;
pub mod modes;
pub mod snapshot;

pub use dispatch::{Dispatcher, Pacing, Publisher, WorkerMode};
pub use error::HarnessError;
pub use metrics::RunResult;
