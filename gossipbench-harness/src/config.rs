//! Harness configuration and CLI argument parsing
//!
//! Settings come from four places, highest priority first:
//! 1. CLI arguments
//! 2. Environment variables (with GOSSIPBENCH_ prefix)
//! 3. An optional configuration file (`--config`, TOML/YAML/JSON by extension)
//! 4. Default values
//!
//! The file only carries cluster layout (the static node list and selector
//! defaults); run parameters stay on the command line.
//!
//! # Example Usage
//!
//! ```bash
//! # Benchmark a fixed count against pods discovered in the cluster
//! gossipbench --bench-fixed --count 50000 --workers 8
//!
//! # Same against a static node list
//! export GOSSIPBENCH_NODES=10.0.0.1,10.0.0.2:8001
//! gossipbench -f --count 50000
//!
//! # Static nodes from a file, CLI overrides the file's port
//! gossipbench --config cluster.toml --port 9000 --get-list
//! ```

use crate::directory::{DEFAULT_LABEL_SELECTOR, DEFAULT_NAMESPACE, DEFAULT_NODE_PORT, Selector};
use crate::dispatch::{Pacing, WorkerMode};
use crate::snapshot::CanonicalStrategy;
use anyhow::{Context, Result, anyhow};
use clap::{ArgGroup, CommandFactory, Parser};
use gossipbench::{DEFAULT_PAYLOAD_LENGTH, RateSpec};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Requests per window of `--bench`; with the default 60s window this is a
/// 40ns emission interval, so the pacer never holds a worker back
pub const DEFAULT_BENCH_BUDGET: u64 = 1_500_000_000;

/// What a single invocation does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Collect and print membership snapshots
    Test,
    /// Collect snapshots and propagate the canonical one
    Configure,
    /// Unbounded dispatch against the first discovered node
    Bench,
    /// Count-bounded dispatch against the whole pool
    BenchFixed,
    /// One bounded window against the whole pool
    BenchWindow,
    /// Print membership sizes per node
    GetList,
}

impl Mode {
    pub fn name(&self) -> &'static str {
        match self {
            Mode::Test => "test",
            Mode::Configure => "configure",
            Mode::Bench => "bench",
            Mode::BenchFixed => "bench-fixed",
            Mode::BenchWindow => "bench-window",
            Mode::GetList => "get-list",
        }
    }
}

/// Where node addresses come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscoveryKind {
    /// A configured list of addresses
    Static,
    /// Pods listed through the Kubernetes API
    Kube,
}

impl std::str::FromStr for DiscoveryKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "static" => Ok(DiscoveryKind::Static),
            "kube" | "kubernetes" | "k8s" => Ok(DiscoveryKind::Kube),
            _ => Err(anyhow!(
                "Invalid discovery: {}. Valid options are: static, kube",
                s
            )),
        }
    }
}

/// Fully resolved harness configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Selected mode; `None` means print help
    pub mode: Option<Mode>,
    pub discovery: DiscoveryConfig,
    pub dispatch: DispatchConfig,
    pub canonical: CanonicalStrategy,
    /// Logging level (error, warn, info, debug, trace)
    pub log_level: String,
}

#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    pub kind: DiscoveryKind,
    /// Static entries; only used with [`DiscoveryKind::Static`]
    pub nodes: Vec<String>,
    pub selector: Selector,
}

/// Parameters of the dispatch modes
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    pub workers: usize,
    pub worker_mode: WorkerMode,
    pub pacing: Pacing,
    /// GCRA burst allowance for shared pacing
    pub max_burst: u32,
    /// Request count for bench-fixed
    pub count: u64,
    /// Window length for bench and bench-window
    pub window: Duration,
    /// Requests per window for bench-window
    pub budget: u64,
    /// Requests per window for bench
    pub bench_budget: u64,
    pub payload_length: usize,
    pub timeout: Duration,
    /// Progress log interval; `None` disables progress logs
    pub report_interval: Option<Duration>,
}

impl DispatchConfig {
    /// Rate spec used by `mode`, or `None` for non-dispatch modes
    pub fn rate_spec(&self, mode: Mode) -> Option<RateSpec> {
        match mode {
            Mode::Bench => Some(RateSpec::Unbounded {
                window: self.window,
                budget: self.bench_budget,
            }),
            Mode::BenchFixed => Some(RateSpec::Count { count: self.count }),
            Mode::BenchWindow => Some(RateSpec::Window {
                duration: self.window,
                budget: self.budget,
            }),
            Mode::Test | Mode::Configure | Mode::GetList => None,
        }
    }
}

/// Cluster layout read from `--config`
///
/// ```toml
/// nodes = ["10.0.0.1", "10.0.0.2:8001"]
/// namespace = "gossip"
/// selector = "app=gossip-service"
/// port = 8000
/// ```
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct FileConfig {
    pub discovery: Option<DiscoveryKind>,
    pub nodes: Vec<String>,
    pub namespace: Option<String>,
    pub selector: Option<String>,
    pub port: Option<u16>,
}

impl FileConfig {
    /// Load a file, format picked from its extension
    pub fn load(path: &Path) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path))
            .build()
            .with_context(|| format!("failed to read config file {}", path.display()))?;

        settings
            .try_deserialize()
            .with_context(|| format!("invalid config file {}", path.display()))
    }
}

/// Command-line arguments for the harness
///
/// All arguments can also be set via environment variables with the
/// GOSSIPBENCH_ prefix. CLI arguments take precedence over environment variables.
///
/// # Examples
///
/// Print membership sizes of every pod in the default namespace:
/// ```bash
/// gossipbench -g
/// ```
///
/// One minute window of 150000 publishes across 16 worker threads:
/// ```bash
/// gossipbench -w --budget 150000 --window-secs 60 --workers 16 --worker-mode threads
/// ```
#[derive(Parser, Debug)]
#[command(
    name = "gossipbench",
    version,
    about = "Load generator and membership sync tool for gossip clusters",
    long_about = "Drives gossip membership nodes over their HTTP control plane.\n\nExactly one mode flag selects what the invocation does; with no mode the help is printed.\n\nEnvironment variables with GOSSIPBENCH_ prefix are supported. CLI arguments take precedence over environment variables.",
    group(ArgGroup::new("mode").multiple(false))
)]
pub struct Args {
    // Modes
    #[arg(short = 't', long, group = "mode", help = "Collect and print membership snapshots")]
    pub test: bool,
    #[arg(
        short = 'c',
        long,
        group = "mode",
        help = "Collect snapshots and propagate the canonical one to every node"
    )]
    pub configure: bool,
    #[arg(
        short = 'b',
        long,
        group = "mode",
        help = "Unbounded publish load against the first node until Ctrl-C"
    )]
    pub bench: bool,
    #[arg(
        short = 'f',
        long,
        group = "mode",
        help = "Publish exactly --count requests across the pool"
    )]
    pub bench_fixed: bool,
    #[arg(
        short = 'w',
        long,
        group = "mode",
        help = "Publish --budget requests spread over --window-secs across the pool"
    )]
    pub bench_window: bool,
    #[arg(short = 'g', long, group = "mode", help = "Print membership sizes per node")]
    pub get_list: bool,

    // Discovery
    #[arg(
        long,
        value_name = "KIND",
        help = "Discovery: static, kube [default: static if nodes are given, else kube]",
        env = "GOSSIPBENCH_DISCOVERY"
    )]
    pub discovery: Option<DiscoveryKind>,
    #[arg(
        long,
        value_name = "ADDR,...",
        value_delimiter = ',',
        help = "Static node addresses (host or host:port)",
        env = "GOSSIPBENCH_NODES"
    )]
    pub nodes: Vec<String>,
    #[arg(
        long,
        value_name = "NAMESPACE",
        help = "Kubernetes namespace [default: gossip]",
        env = "GOSSIPBENCH_NAMESPACE"
    )]
    pub namespace: Option<String>,
    #[arg(
        long,
        value_name = "LABELS",
        help = "Kubernetes label selector [default: app=gossip-service]",
        env = "GOSSIPBENCH_SELECTOR"
    )]
    pub selector: Option<String>,
    #[arg(
        long,
        value_name = "PORT",
        help = "Node control port [default: 8000]",
        env = "GOSSIPBENCH_PORT"
    )]
    pub port: Option<u16>,

    // Dispatch
    #[arg(
        long,
        value_name = "N",
        help = "Number of dispatch workers",
        default_value_t = 1,
        env = "GOSSIPBENCH_WORKERS"
    )]
    pub workers: usize,
    #[arg(
        long,
        value_name = "MODE",
        help = "Worker mode: tasks, threads",
        default_value = "tasks",
        env = "GOSSIPBENCH_WORKER_MODE"
    )]
    pub worker_mode: WorkerMode,
    #[arg(
        long,
        value_name = "PACING",
        help = "Pacing: shared, open-loop",
        default_value = "shared",
        env = "GOSSIPBENCH_PACING"
    )]
    pub pacing: Pacing,
    #[arg(
        long,
        value_name = "N",
        help = "Burst allowance of the shared pacer",
        default_value_t = 1,
        env = "GOSSIPBENCH_MAX_BURST"
    )]
    pub max_burst: u32,
    #[arg(
        long,
        value_name = "N",
        help = "Request count for --bench-fixed",
        default_value_t = 10_000,
        env = "GOSSIPBENCH_COUNT"
    )]
    pub count: u64,
    #[arg(
        long,
        value_name = "SECS",
        help = "Window length for --bench and --bench-window (seconds)",
        default_value_t = 60,
        env = "GOSSIPBENCH_WINDOW_SECS"
    )]
    pub window_secs: u64,
    #[arg(
        long,
        value_name = "N",
        help = "Requests per window for --bench-window",
        default_value_t = 150_000,
        env = "GOSSIPBENCH_BUDGET"
    )]
    pub budget: u64,
    #[arg(
        long,
        value_name = "N",
        help = "Requests per window for --bench",
        default_value_t = DEFAULT_BENCH_BUDGET,
        env = "GOSSIPBENCH_BENCH_BUDGET"
    )]
    pub bench_budget: u64,
    #[arg(
        long,
        value_name = "LEN",
        help = "Length of the generated payload",
        default_value_t = DEFAULT_PAYLOAD_LENGTH,
        env = "GOSSIPBENCH_PAYLOAD_LENGTH"
    )]
    pub payload_length: usize,
    #[arg(
        long,
        value_name = "MS",
        help = "Per-request timeout (milliseconds)",
        default_value_t = 2000,
        env = "GOSSIPBENCH_TIMEOUT_MS"
    )]
    pub timeout_ms: u64,
    #[arg(
        long,
        value_name = "SECS",
        help = "Progress log interval in seconds, 0 disables",
        default_value_t = 0,
        env = "GOSSIPBENCH_REPORT_INTERVAL"
    )]
    pub report_interval: u64,

    // Snapshot
    #[arg(
        long,
        value_name = "STRATEGY",
        help = "Canonical snapshot for --configure: first, largest",
        default_value = "first",
        env = "GOSSIPBENCH_CANONICAL"
    )]
    pub canonical: CanonicalStrategy,

    // General options
    #[arg(
        long,
        value_name = "FILE",
        help = "Configuration file with the cluster layout",
        env = "GOSSIPBENCH_CONFIG"
    )]
    pub config: Option<PathBuf>,
    #[arg(
        long,
        value_name = "LEVEL",
        help = "Log level: error, warn, info, debug, trace",
        default_value = "info",
        env = "GOSSIPBENCH_LOG_LEVEL"
    )]
    pub log_level: String,

    // Utility options
    #[arg(
        long,
        help = "List all environment variables and exit",
        action = clap::ArgAction::SetTrue
    )]
    pub list_env_vars: bool,
}

impl Args {
    /// Selected mode, if any
    pub fn mode(&self) -> Option<Mode> {
        [
            (self.test, Mode::Test),
            (self.configure, Mode::Configure),
            (self.bench, Mode::Bench),
            (self.bench_fixed, Mode::BenchFixed),
            (self.bench_window, Mode::BenchWindow),
            (self.get_list, Mode::GetList),
        ]
        .into_iter()
        .find_map(|(set, mode)| set.then_some(mode))
    }
}

impl Config {
    /// Build configuration from environment variables and CLI arguments
    ///
    /// Handles `--list-env-vars` and the no-mode case by printing and
    /// exiting with status 0.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or a value is
    /// out of range.
    pub fn from_env_and_args() -> Result<Self> {
        let args = Args::parse();

        if args.list_env_vars {
            Self::print_env_vars();
            std::process::exit(0);
        }

        if args.mode().is_none() {
            Args::command().print_help()?;
            println!();
            std::process::exit(0);
        }

        let file = match &args.config {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };

        Self::from_parts(args, file)
    }

    /// Merge parsed arguments over file settings and validate
    pub fn from_parts(args: Args, file: FileConfig) -> Result<Self> {
        let mode = args.mode();

        let nodes = if args.nodes.is_empty() {
            file.nodes
        } else {
            args.nodes
        };
        let nodes: Vec<String> = nodes
            .into_iter()
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .collect();

        let kind = args.discovery.or(file.discovery).unwrap_or(if nodes.is_empty() {
            DiscoveryKind::Kube
        } else {
            DiscoveryKind::Static
        });

        let selector = Selector {
            namespace: args
                .namespace
                .or(file.namespace)
                .unwrap_or_else(|| DEFAULT_NAMESPACE.to_string()),
            label_selector: args
                .selector
                .or(file.selector)
                .unwrap_or_else(|| DEFAULT_LABEL_SELECTOR.to_string()),
            port: args.port.or(file.port).unwrap_or(DEFAULT_NODE_PORT),
        };

        let config = Config {
            mode,
            discovery: DiscoveryConfig {
                kind,
                nodes,
                selector,
            },
            dispatch: DispatchConfig {
                workers: args.workers,
                worker_mode: args.worker_mode,
                pacing: args.pacing,
                max_burst: args.max_burst,
                count: args.count,
                window: Duration::from_secs(args.window_secs),
                budget: args.budget,
                bench_budget: args.bench_budget,
                payload_length: args.payload_length,
                timeout: Duration::from_millis(args.timeout_ms),
                report_interval: (args.report_interval > 0)
                    .then(|| Duration::from_secs(args.report_interval)),
            },
            canonical: args.canonical,
            log_level: args.log_level,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    ///
    /// Zero workers and zero budgets are rejected again by the dispatcher;
    /// catching them here gives a CLI-flavoured message before any
    /// discovery happens.
    fn validate(&self) -> Result<()> {
        if self.discovery.kind == DiscoveryKind::Static && self.discovery.nodes.is_empty() {
            return Err(anyhow!(
                "Static discovery needs at least one node.\n\n\
                Example:\n  \
                gossipbench --nodes 10.0.0.1,10.0.0.2:8001 --get-list\n\n\
                For more information, try '--help'"
            ));
        }

        if self.dispatch.timeout.is_zero() {
            return Err(anyhow!("--timeout-ms must be greater than 0"));
        }

        if let Some(mode) = self.mode {
            if let Some(spec) = self.dispatch.rate_spec(mode) {
                if self.dispatch.workers == 0 {
                    return Err(anyhow!("--workers must be at least 1"));
                }
                spec.validate()
                    .with_context(|| format!("invalid parameters for --{}", mode.name()))?;
            }
        }

        Ok(())
    }

    /// Print all available environment variables and their descriptions
    fn print_env_vars() {
        println!("GossipBench Environment Variables");
        println!("=================================");
        println!();
        println!("All environment variables use the GOSSIPBENCH_ prefix.");
        println!("CLI arguments take precedence over environment variables.");
        println!();

        println!("Discovery Configuration:");
        println!(
            "  GOSSIPBENCH_DISCOVERY=<kind>          Discovery: static, kube [default: static if nodes are given, else kube]"
        );
        println!("  GOSSIPBENCH_NODES=<addr,...>          Static node addresses");
        println!("  GOSSIPBENCH_NAMESPACE=<ns>            Kubernetes namespace [default: gossip]");
        println!(
            "  GOSSIPBENCH_SELECTOR=<labels>         Kubernetes label selector [default: app=gossip-service]"
        );
        println!("  GOSSIPBENCH_PORT=<port>               Node control port [default: 8000]");
        println!();

        println!("Dispatch Configuration:");
        println!("  GOSSIPBENCH_WORKERS=<n>               Number of dispatch workers [default: 1]");
        println!(
            "  GOSSIPBENCH_WORKER_MODE=<mode>        Worker mode: tasks, threads [default: tasks]"
        );
        println!(
            "  GOSSIPBENCH_PACING=<pacing>           Pacing: shared, open-loop [default: shared]"
        );
        println!("  GOSSIPBENCH_MAX_BURST=<n>             Shared pacer burst allowance [default: 1]");
        println!("  GOSSIPBENCH_COUNT=<n>                 Request count for bench-fixed [default: 10000]");
        println!("  GOSSIPBENCH_WINDOW_SECS=<secs>        Window length [default: 60]");
        println!("  GOSSIPBENCH_BUDGET=<n>                Requests per window for bench-window [default: 150000]");
        println!(
            "  GOSSIPBENCH_BENCH_BUDGET=<n>          Requests per window for bench [default: 1500000000]"
        );
        println!("  GOSSIPBENCH_PAYLOAD_LENGTH=<len>      Payload length [default: 200]");
        println!("  GOSSIPBENCH_TIMEOUT_MS=<ms>           Per-request timeout [default: 2000]");
        println!(
            "  GOSSIPBENCH_REPORT_INTERVAL=<secs>    Progress log interval, 0 disables [default: 0]"
        );
        println!();

        println!("Snapshot Configuration:");
        println!(
            "  GOSSIPBENCH_CANONICAL=<strategy>      Canonical snapshot: first, largest [default: first]"
        );
        println!();

        println!("General Configuration:");
        println!("  GOSSIPBENCH_CONFIG=<file>             Cluster layout file (toml, yaml, json)");
        println!(
            "  GOSSIPBENCH_LOG_LEVEL=<level>         Log level: error, warn, info, debug, trace [default: info]"
        );
        println!();

        println!("Examples:");
        println!("  # Benchmark three static nodes with four workers");
        println!("  export GOSSIPBENCH_NODES=10.0.0.1,10.0.0.2,10.0.0.3");
        println!("  export GOSSIPBENCH_WORKERS=4");
        println!("  gossipbench --bench-fixed");
        println!();
        println!("  # Run against the cluster (CLI args override env vars)");
        println!("  gossipbench --discovery kube --namespace staging --get-list");
    }
}
