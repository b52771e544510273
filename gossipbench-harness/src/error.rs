//! Stage-level errors of a harness invocation
//!
//! Every fatal error names the stage that failed so the CLI can report
//! "discovery failed" separately from "snapshot failed". Per-request
//! transport errors never reach this type; the dispatcher counts them and
//! moves on.

use crate::directory::DiscoveryError;
use gossipbench::ConfigError;
use gossipbench_client::ClientError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HarnessError {
    #[error("discovery failed: {0}")]
    Discovery(#[from] DiscoveryError),

    #[error("invalid run configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("could not build HTTP client: {0}")]
    Client(#[from] ClientError),

    #[error("dispatch worker failed: {0}")]
    Worker(String),

    #[error("snapshot failed: {0}")]
    Snapshot(String),
}

impl HarnessError {
    /// Name of the stage that failed
    pub fn stage(&self) -> &'static str {
        match self {
            HarnessError::Discovery(_) => "discovery",
            HarnessError::Config(_) => "configuration",
            HarnessError::Client(_) => "client",
            HarnessError::Worker(_) => "dispatch",
            HarnessError::Snapshot(_) => "snapshot",
        }
    }
}

pub type Result<T> = std::result::Result<T, HarnessError>;
