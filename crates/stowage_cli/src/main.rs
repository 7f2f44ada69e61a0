//! Stowage CLI: inspect and query an on-disk artifact cache.
//!
//! Provides `stowage key` to print the digest a file maps to, `stowage status`
//! to check whether a reusable artifact exists, `stowage inspect` to dump a
//! stored header sidecar and `stowage list` to enumerate cached digests.

#![warn(missing_docs)]

mod context;
mod inspect;
mod key;
mod list;
mod status;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use stowage_common::HashAlgorithm;
use stowage_config::CacheMode;
use tracing_subscriber::EnvFilter;

/// Stowage, a persistent content-addressed artifact cache.
#[derive(Parser, Debug)]
#[command(name = "stowage", version, about = "Stowage artifact cache")]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose (debug-level) output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to a custom `stowage.toml` configuration file.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Cache folder, overriding the configured one.
    #[arg(long, global = true)]
    pub cache_dir: Option<PathBuf>,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the digest one or more files map to.
    Key(KeyArgs),
    /// Report whether a reusable artifact exists for one or more files.
    Status(KeyArgs),
    /// Print the header sidecar stored for a digest.
    Inspect {
        /// Digest of the cached artifact.
        digest: String,

        /// Output format.
        #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
        format: ReportFormat,
    },
    /// List cached digests.
    List,
}

/// Arguments shared by `stowage key` and `stowage status`.
#[derive(Parser, Debug)]
pub struct KeyArgs {
    /// Source files. Several files form one multi-path source when the
    /// mode supports it.
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Naming and invalidation preset, overriding the configured one.
    #[arg(short, long, value_enum)]
    pub mode: Option<ModeArg>,

    /// Reader id the artifact was produced with.
    #[arg(short, long, default_value = "")]
    pub reader: String,

    /// Digest algorithm, overriding the configured one.
    #[arg(long)]
    pub hash: Option<HashAlgorithm>,
}

/// Naming and invalidation preset selectable on the command line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    /// Name by content, valid while the artifact exists.
    Hash,
    /// Name by path, valid while the artifact is newer than the source.
    Mtime,
}

impl From<ModeArg> for CacheMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Hash => CacheMode::Hash,
            ModeArg::Mtime => CacheMode::Mtime,
        }
    }
}

/// Output format for sidecar dumps.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// One `field = value` line per field.
    Text,
    /// A JSON object.
    Json,
}

/// Global settings derived from CLI flags.
#[derive(Debug, Clone)]
pub struct GlobalArgs {
    /// Whether to suppress non-error output.
    pub quiet: bool,
    /// Directory used to find `stowage.toml` and resolve a relative folder.
    pub project_dir: PathBuf,
    /// Optional path to a custom config file.
    pub config: Option<PathBuf>,
    /// Optional cache folder override.
    pub cache_dir: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.quiet, cli.verbose);

    let project_dir = match std::env::current_dir() {
        Ok(dir) => dir,
        Err(e) => {
            eprintln!("error: cannot determine current directory: {e}");
            process::exit(1);
        }
    };
    let global = GlobalArgs {
        quiet: cli.quiet,
        project_dir,
        config: cli.config,
        cache_dir: cli.cache_dir,
    };

    let result = match cli.command {
        Command::Key(ref args) => key::run(args, &global),
        Command::Status(ref args) => status::run(args, &global),
        Command::Inspect { ref digest, format } => inspect::run(digest, format, &global),
        Command::List => list::run(&global),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}

/// Installs a stderr `fmt` subscriber. `RUST_LOG` wins over the flags.
fn init_logging(quiet: bool, verbose: bool) {
    let default_level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();
}
