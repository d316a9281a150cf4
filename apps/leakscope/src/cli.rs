//! Command line interface

use crate::logging::LogFormat;
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use leak_analysis_disposer::{DisposerAnalyzer, DisposerConfig};
use leak_analysis_graph::{HeapGraph, SnapshotFile};
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "leakscope")]
#[command(about = "Find disposed objects that are still strongly reachable in a heap snapshot")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Log level (trace, debug, info, warn, error). RUST_LOG takes precedence.
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyze a heap snapshot and print the disposer report
    Analyze(AnalyzeArgs),
    /// Print the default analysis configuration as TOML
    DefaultConfig,
}

#[derive(Args)]
pub struct AnalyzeArgs {
    /// Heap snapshot in JSON format
    #[arg(long)]
    pub snapshot: PathBuf,

    /// Analysis configuration in TOML format
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Write the report to this file instead of stdout
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Skip the per-class GC-root paths
    #[arg(long)]
    pub no_details: bool,

    /// Skip the count and dominator summaries
    #[arg(long)]
    pub no_summary: bool,

    /// Maximum disposer tree depth to descend into
    #[arg(long)]
    pub max_depth: Option<usize>,
}

pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Analyze(args) => analyze(&args),
        Commands::DefaultConfig => {
            let config = toml::to_string_pretty(&DisposerConfig::default())
                .context("Failed to serialize default configuration")?;
            print!("{config}");
            Ok(())
        }
    }
}

fn load_config(args: &AnalyzeArgs) -> Result<DisposerConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            toml::from_str(&content)
                .with_context(|| format!("Invalid config file {}", path.display()))?
        }
        None => DisposerConfig::default(),
    };

    if args.no_details {
        config.include_disposed_objects_details = false;
    }
    if args.no_summary {
        config.include_disposed_objects_summary = false;
    }
    if let Some(depth) = args.max_depth {
        config.max_tree_depth = depth;
    }
    Ok(config)
}

fn analyze(args: &AnalyzeArgs) -> Result<()> {
    let config = load_config(args)?;

    let snapshot = SnapshotFile::load(&args.snapshot).with_context(|| {
        format!("Failed to read heap snapshot {}", args.snapshot.display())
    })?;
    let graph = HeapGraph::from_snapshot(snapshot)
        .with_context(|| format!("Invalid heap snapshot {}", args.snapshot.display()))?;
    let parents = graph.parent_list();

    let report = DisposerAnalyzer::new(config)
        .analyze(&mut graph.navigator(), &parents, &graph)
        .context("Disposer analysis failed")?;

    match &args.output {
        Some(path) => {
            fs::write(path, &report)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            info!(path = %path.display(), bytes = report.len(), "Wrote report");
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout
                .write_all(report.as_bytes())
                .context("Failed to write report")?;
            stdout.flush().context("Failed to write report")?;
        }
    }
    Ok(())
}
