/// IDX dataset command-line tool for loading, inspecting and caching
/// MNIST-style datasets.
///
/// # Command overview
///
/// ```text
/// idx <COMMAND> [OPTIONS]
///
/// Commands:
///   load       Load the train split through the dataset cache
///   inspect    Validate and describe a single IDX file
///   cache      List or clear cached datasets
///   help       Print help information
///
/// Global options:
///   -v, --verbose    Log decoder and cache activity (RUST_LOG overrides)
///   -h, --help       Print help
///   -V, --version    Print version
/// ```
///
/// # Exit codes
///
/// | Code | Meaning                                 |
/// |------|-----------------------------------------|
/// | 0    | Success                                 |
/// | 1    | Error (I/O failure, invalid file, etc.) |
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod cmd_cache;
mod cmd_inspect;
mod cmd_load;

/// Store file used when `--cache` is not given.
const DEFAULT_CACHE: &str = "MNIST.sqlite3";

// ── CLI root ──────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "idx", version, about = "IDX dataset loader and cache")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log decoder and cache activity.
    #[arg(short, long, global = true)]
    verbose: bool,
}

// ── Sub-commands ──────────────────────────────────────────────────────────────

#[derive(Subcommand)]
enum Commands {
    /// Load the train split, from the cache when possible.
    Load(LoadArgs),
    /// Validate and describe a single IDX file.
    Inspect(InspectArgs),
    /// List or clear cached datasets.
    #[command(subcommand)]
    Cache(CacheCommand),
}

// ── Argument structs ──────────────────────────────────────────────────────────

/// Arguments for `idx load`.
///
/// ```text
/// ┌────────────────┬─────────────────────────────────────────────────────┐
/// │ Flag           │ Effect                                              │
/// ├────────────────┼─────────────────────────────────────────────────────┤
/// │ --data-dir     │ read resource files from this directory (default .) │
/// │ --base-url     │ fetch resource files over HTTP instead              │
/// │ --cache        │ SQLite store path, or :memory:                      │
/// │ --timeout-secs │ per-dataset fetch limit, 0 disables                 │
/// │ --lenient      │ accept any non-zero header words                    │
/// │ --json         │ print the summary as JSON                           │
/// └────────────────┴─────────────────────────────────────────────────────┘
/// ```
#[derive(clap::Args)]
pub struct LoadArgs {
    /// Directory holding `train-images.idx3-ubyte` and `train-labels.idx1-ubyte`.
    #[arg(long, default_value = ".", conflicts_with = "base_url")]
    pub data_dir: PathBuf,

    /// Base URL the resource files are fetched from.
    #[arg(long)]
    pub base_url: Option<String>,

    #[command(flatten)]
    pub store: StoreArgs,

    /// Fetch-and-decode time limit per dataset, in seconds (0 = none).
    #[arg(long, default_value_t = 120)]
    pub timeout_secs: u64,

    /// Only require header words to be non-zero instead of exact.
    #[arg(long)]
    pub lenient: bool,

    /// Read size for local files, in bytes.
    #[arg(long, default_value_t = 64 * 1024)]
    pub chunk_size: usize,

    /// Print the summary as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Arguments for `idx inspect`.
#[derive(clap::Args)]
pub struct InspectArgs {
    /// Path to an IDX image or label file.
    pub file: PathBuf,

    /// Stop after the header instead of decoding every record.
    #[arg(long)]
    pub header_only: bool,
}

#[derive(clap::Args)]
pub struct StoreArgs {
    /// Dataset store path (`:memory:` for a throwaway store).
    #[arg(long, default_value = DEFAULT_CACHE)]
    pub cache: PathBuf,
}

#[derive(Subcommand)]
pub enum CacheCommand {
    /// List cached dataset keys.
    Ls(StoreArgs),
    /// Remove every cached dataset.
    Clear(StoreArgs),
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let result = match cli.command {
        Commands::Load(args) => cmd_load::run(&args).await,
        Commands::Inspect(args) => cmd_inspect::run(&args),
        Commands::Cache(cmd) => cmd_cache::run(&cmd),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}
