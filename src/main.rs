//! # Main — CLI Entry Point
//!
//! Parses the node's search configuration, initializes logging, and hands
//! off to [`cli::run_search`].
//!
//! ## Options
//!
//! - `-n` / `--unknown`: unknown characters (keyspace is `32^n`).
//! - `--format`: key template with one `%s` marker.
//! - `--random` / `--lcg`: shuffled or LCG traversal instead of sequential.
//! - `--node-index` / `--number-of-nodes` / `--fair-distribution`: keyspace
//!   partitioning across independently started nodes.
//! - `--workers` / `--bufsize`: pool size and producer buffer capacity.
//! - `--verify-url` or `--verify-command`: the external verifier.
//! - `LOG_FORMAT=json` switches log output to JSON lines; `RUST_LOG` filters.

mod cli;

use anyhow::Result;
use clap::{ArgGroup, Parser};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use keysweep::config::{
    SearchConfig, DEFAULT_BUFSIZE, DEFAULT_KEY_LENGTH, DEFAULT_SECRET_LENGTH,
};

#[derive(Parser)]
#[command(
    name = "keysweep",
    version,
    about = "Search a radix-32 keyspace for the key an external verifier accepts"
)]
#[command(group(
    ArgGroup::new("verifier")
        .required(true)
        .args(["verify_url", "verify_command"])
))]
struct Cli {
    /// Number of unknown characters in the key
    #[arg(short = 'n', long = "unknown", env = "KEYSWEEP_UNKNOWN", default_value_t = 4)]
    unknown: u32,

    /// Key format containing the known part of the key and one %s marker (e.g. AKIA%sXXXXXXXXXXXX)
    #[arg(long, env = "KEYSWEEP_FORMAT")]
    format: String,

    /// Secret passed to the verifier with every candidate
    #[arg(long, env = "KEYSWEEP_SECRET", hide_env_values = true)]
    secret: String,

    /// Traverse the keyspace in random order instead of incrementally
    #[arg(long)]
    random: bool,

    /// With --random, stream a full-period LCG instead of shuffling in memory
    #[arg(long)]
    lcg: bool,

    /// Index of this node (0-based)
    #[arg(long, env = "KEYSWEEP_NODE_INDEX", default_value_t = 0)]
    node_index: u64,

    /// Total number of cooperating nodes
    #[arg(long, env = "KEYSWEEP_NUMBER_OF_NODES", default_value_t = 1)]
    number_of_nodes: u64,

    /// Give every node the same share; the keyspace remainder is never searched
    #[arg(long)]
    fair_distribution: bool,

    /// Number of verifier workers (defaults to all logical cores)
    #[arg(long, env = "KEYSWEEP_WORKERS")]
    workers: Option<usize>,

    /// Capacity of the offset buffer between producer and workers
    #[arg(long, default_value_t = DEFAULT_BUFSIZE)]
    bufsize: usize,

    /// Required total key length (known characters plus unknown)
    #[arg(long, default_value_t = DEFAULT_KEY_LENGTH)]
    key_length: usize,

    /// Required secret length
    #[arg(long, default_value_t = DEFAULT_SECRET_LENGTH)]
    secret_length: usize,

    /// HTTP endpoint that accepts POST {"key", "secret"}; any 2xx means valid
    #[arg(long, env = "KEYSWEEP_VERIFY_URL")]
    verify_url: Option<String>,

    /// Shell command run per candidate with KEYSWEEP_KEY/KEYSWEEP_SECRET set; exit 0 means valid
    #[arg(long, env = "KEYSWEEP_VERIFY_COMMAND")]
    verify_command: Option<String>,

    /// Per-call verifier timeout in seconds
    #[arg(long, default_value_t = 10)]
    verify_timeout_secs: u64,

    /// Webhook that receives the completion summary as POST {"message"}
    #[arg(long, env = "KEYSWEEP_NOTIFY_URL")]
    notify_url: Option<String>,

    /// Give up after this many seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Seconds between progress log lines (0 disables)
    #[arg(long, default_value_t = 30)]
    progress_secs: u64,

    /// Print the result as JSON instead of the summary line
    #[arg(long)]
    json: bool,

    /// Log every attempted candidate
    #[arg(long)]
    verbose: bool,
}

impl Cli {
    fn search_config(&self) -> SearchConfig {
        SearchConfig {
            unknown: self.unknown,
            format: self.format.clone(),
            secret: self.secret.clone(),
            random: self.random,
            lcg: self.lcg,
            node_index: self.node_index,
            number_of_nodes: self.number_of_nodes,
            fair_distribution: self.fair_distribution,
            workers: self.workers.unwrap_or_else(rayon::current_num_threads),
            bufsize: self.bufsize,
            key_length: self.key_length,
            secret_length: self.secret_length,
            verify_timeout: Duration::from_secs(self.verify_timeout_secs),
            verbose: self.verbose,
        }
    }
}

fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let default_filter = if cli.verbose { "info,keysweep=debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    // LOG_FORMAT=json for log shippers, human-readable otherwise. Both go to
    // stderr so stdout carries only the result.
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_default();
    if log_format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .init();
    }

    cli::run_search(&cli)
}
