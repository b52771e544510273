//! # gossipbench
//!
//! Building blocks for driving synthetic update traffic against a gossip
//! membership cluster.
//!
//! ## Overview
//!
//! This crate contains the parts of the load generator that have no I/O:
//! - **Pacing**: a lock-free GCRA pacer shared by all workers of a run, so the
//!   aggregate request rate stays on target regardless of worker count
//! - **Rate specs**: bounded windows, fixed request counts and unbounded runs
//! - **Target sampling**: uniform random selection from a read-only [`Pool`]
//! - **Payloads**: fixed-length random strings over `[a-z0-9]`
//!
//! ## Quick Start
//!
//! ```
//! use gossipbench::{Address, Pacer, Pool, RateSpec, payload};
//! use std::time::Duration;
//!
//! let pool = Pool::new(vec![
//!     Address::new("10.0.0.1", 8000),
//!     Address::new("10.0.0.2", 8000),
//! ])?;
//!
//! // 150 requests spread over one minute
//! let spec = RateSpec::Window {
//!     duration: Duration::from_secs(60),
//!     budget: 150,
//! };
//! spec.validate()?;
//!
//! let pacer = Pacer::new(spec.rate().unwrap());
//! let wait = pacer.reserve();
//! assert!(wait <= pacer.emission_interval());
//!
//! let (_, target) = pool.sample();
//! let body = payload::generate(payload::DEFAULT_PAYLOAD_LENGTH);
//! assert_eq!(body.len(), 200);
//! println!("POST {} ({} bytes)", target.url("/publish"), body.len());
//! # Ok::<(), gossipbench::ConfigError>(())
//! ```
//!
//! ## Thread Safety
//!
//! [`Pool`], [`Pacer`] and the payload functions are all safe to share across
//! threads without a mutex. The pacer keeps its state in a single atomic.

pub mod core;
pub mod payload;
pub mod pool;

pub use crate::core::{ConfigError, Pacer, Rate, RateSpec};
pub use payload::{DEFAULT_PAYLOAD_LENGTH, PayloadGenerator};
pub use pool::{Address, Pool};
