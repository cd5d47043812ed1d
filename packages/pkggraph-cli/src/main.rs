//! pkggraph - audit an installed `node_modules` tree.
//!
//! Diagnostics go to stderr via `tracing`; the JSON document is the only
//! thing written to stdout (or to `--output`). Any fatal scan error exits
//! non-zero without emitting a document.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use pkggraph_core::{EdgePolicy, ScanConfig, Scanner, DEFAULT_ROOT};

#[derive(Parser)]
#[command(name = "pkggraph")]
#[command(version)]
#[command(
    about = "Audit an installed package tree: dependency graph, content hashes, license provenance"
)]
struct Cli {
    /// Install root to scan.
    #[arg(value_name = "ROOT", default_value = DEFAULT_ROOT)]
    root: PathBuf,

    /// Worker threads for package scanning (defaults to the CPU count).
    #[arg(long, value_name = "N")]
    workers: Option<usize>,

    /// Abort the scan after this many seconds.
    #[arg(long, value_name = "S")]
    timeout_secs: Option<u64>,

    /// Resolve edges by semver range matching instead of first-registered.
    #[arg(long)]
    strict_versions: bool,

    /// Write the document to a file instead of stdout.
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let mut config = ScanConfig::new(absolute_root(&cli.root)?);
    if let Some(workers) = cli.workers {
        config = config.with_workers(workers);
    }
    if let Some(secs) = cli.timeout_secs {
        config = config.with_timeout(Duration::from_secs(secs));
    }
    if cli.strict_versions {
        config = config.with_edge_policy(EdgePolicy::StrictSemver);
    }

    let outcome = Scanner::new(config).run()?;
    let json = outcome.document.to_json_pretty()?;

    match cli.output {
        Some(path) => {
            fs::write(&path, json + "\n")
                .with_context(|| format!("writing document to {}", path.display()))?;
            info!("document written to {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Anchor a relative root to the working directory; the document records
/// the root exactly as resolved here.
fn absolute_root(root: &Path) -> anyhow::Result<PathBuf> {
    if root.is_absolute() {
        return Ok(root.to_path_buf());
    }
    let cwd = std::env::current_dir().context("resolving working directory")?;
    Ok(cwd.join(root))
}
