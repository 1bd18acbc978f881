//! # codescribe CLI (`scribe`)
//!
//! The `scribe` binary registers repositories, generates per-file
//! documentation with a language model, keeps it current through
//! incremental updates, and serves it over HTTP.
//!
//! ## Usage
//!
//! ```bash
//! scribe --config ./config/scribe.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `scribe init` | Create the SQLite database and run schema migrations |
//! | `scribe import <name> <dir>` | Register a repository and record its source files |
//! | `scribe generate <repo>` | Document every file of a repository |
//! | `scribe apply <repo> <changes.json>` | Apply a batch of file changes atomically |
//! | `scribe sync <repo> <dir>` | Diff a directory against the stored files and apply the changes |
//! | `scribe get <repo> <path>` | Print one file's documentation |
//! | `scribe repos` | List repositories |
//! | `scribe serve` | Start the HTTP API server |
//!
//! Logs go to stderr and honour `RUST_LOG`.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use codescribe::progress::ProgressMode;
use codescribe::{config, generate, get, import, migrate, repos, server};

/// codescribe: incremental, fingerprinted documentation for code repositories.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/scribe.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "scribe",
    about = "codescribe: incremental, fingerprinted documentation for code repositories",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/scribe.toml")]
    config: PathBuf,

    /// Progress output on stderr. Defaults to `human` on a terminal, else `off`.
    #[arg(long, global = true, value_enum)]
    progress: Option<ProgressMode>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Idempotent: running it multiple times is safe.
    Init,

    /// Register a repository (or refresh an existing one) from a directory.
    ///
    /// Replaces the repository's recorded file set with the source files
    /// found under `dir`. Does not generate documentation.
    Import {
        /// Repository name.
        name: String,
        /// Directory to scan.
        dir: PathBuf,
    },

    /// Generate documentation for every recorded file of a repository.
    Generate {
        /// Repository id or name.
        repo: String,
    },

    /// Apply a JSON change file in one transaction.
    ///
    /// The file holds `[{"path", "action", "content"}]` or
    /// `{"changes": [...]}`; `action` is `added`, `modified` or `removed`.
    Apply {
        /// Repository id or name.
        repo: String,
        /// Path to the change file.
        changes: PathBuf,
    },

    /// Apply the difference between a directory and the recorded files.
    Sync {
        /// Repository id or name.
        repo: String,
        /// Directory to compare against.
        dir: PathBuf,
    },

    /// Print the documentation of one file.
    Get {
        /// Repository id or name.
        repo: String,
        /// Repository-relative file path.
        path: String,
    },

    /// List registered repositories.
    Repos,

    /// Start the HTTP API server on `[server].bind`.
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::new(std::env::var("RUST_LOG").unwrap_or_else(|_| {
            "codescribe=info,codescribe_core=info,tower_http=info".into()
        })))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;
    let events = cli
        .progress
        .unwrap_or_else(ProgressMode::default_for_tty)
        .sink();

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Import { name, dir } => {
            import::run_import(&cfg, &name, &dir).await?;
        }
        Commands::Generate { repo } => {
            generate::run_generate(&cfg, &repo, events).await?;
        }
        Commands::Apply { repo, changes } => {
            generate::run_apply(&cfg, &repo, &changes, events).await?;
        }
        Commands::Sync { repo, dir } => {
            generate::run_sync(&cfg, &repo, &dir, events).await?;
        }
        Commands::Get { repo, path } => {
            get::run_get(&cfg, &repo, &path).await?;
        }
        Commands::Repos => {
            repos::run_repos(&cfg).await?;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
