//! Core components of the load generator
//!
//! This module contains the fundamental building blocks:
//! - [`rate`]: Rate calculation and emission intervals
//! - [`pacer`]: The shared GCRA pacer used by dispatch workers
//! - [`spec`]: How fast and for how long a run issues requests

pub mod pacer;
pub mod rate;
pub mod spec;

pub use pacer::Pacer;
pub use rate::Rate;
pub use spec::RateSpec;

use std::error::Error;
use std::fmt;

/// Errors raised when a run is configured with values it cannot execute
///
/// These are always detected before any worker starts, so a run that fails
/// with a `ConfigError` has issued zero requests.
///
/// # Example
///
/// ```
/// use gossipbench::{ConfigError, Pool};
///
/// match Pool::new(Vec::new()) {
///     Err(ConfigError::EmptyPool) => println!("nothing to dispatch against"),
///     _ => unreachable!(),
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The target pool has no addresses
    EmptyPool,
    /// The worker count was zero
    NoWorkers,
    /// A window or unbounded run was given a zero request budget
    ZeroBudget,
    /// A window or unbounded run was given a zero duration
    ZeroDuration,
    /// A count run was asked to issue zero requests
    ZeroCount,
    /// An address could not be parsed
    InvalidAddress(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::EmptyPool => write!(f, "target pool is empty"),
            ConfigError::NoWorkers => write!(f, "worker count must be at least 1"),
            ConfigError::ZeroBudget => write!(f, "request budget must be at least 1"),
            ConfigError::ZeroDuration => write!(f, "window duration must be non-zero"),
            ConfigError::ZeroCount => write!(f, "request count must be at least 1"),
            ConfigError::InvalidAddress(addr) => write!(f, "invalid address: {addr}"),
        }
    }
}

impl Error for ConfigError {}
