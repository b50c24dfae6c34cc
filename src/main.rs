//! Tally-Harvest main entry point
//!
//! This is the command-line interface for the Tally-Harvest scraper.

use anyhow::Context;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tally_harvest::config::{load_config_with_hash, validate, Config};
use tally_harvest::crawler::Harvester;
use tally_harvest::output::{print_statistics, write_harvest, RunStatistics};
use tracing_subscriber::EnvFilter;

/// Tally-Harvest: a concurrent election tally scraper
///
/// Resolves the area manifest, fetches every district's results page with a
/// fixed pool of workers and writes all rows as CSV.
#[derive(Parser, Debug)]
#[command(name = "tally-harvest")]
#[command(version)]
#[command(about = "A concurrent election tally scraper", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (defaults apply when omitted)
    #[arg(value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Number of concurrent workers
    #[arg(short, long)]
    workers: Option<usize>,

    /// Write CSV to this file instead of stdout
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Override the manifest URL
    #[arg(long, value_name = "URL")]
    manifest_url: Option<String>,

    /// Sort rows by manifest order before writing
    #[arg(long)]
    ordered: bool,

    /// Resolve the manifest and list the areas without fetching any page
    #[arg(long)]
    dry_run: bool,

    /// Print run statistics to stderr after the harvest
    #[arg(long)]
    stats: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = load(&cli)?;

    if cli.dry_run {
        handle_dry_run(config).await
    } else {
        handle_harvest(config, cli.stats).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// Logs go to stderr; stdout is reserved for CSV.
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("tally_harvest=info,warn"),
            1 => EnvFilter::new("tally_harvest=debug,info"),
            2 => EnvFilter::new("tally_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Loads the configuration file (if any) and applies command-line overrides
fn load(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("failed to load {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => {
            tracing::info!("No configuration file given, using defaults");
            Config::default()
        }
    };

    if let Some(workers) = cli.workers {
        config.pool.workers = workers;
    }
    if let Some(output) = &cli.output {
        config.output.path = Some(output.display().to_string());
    }
    if let Some(url) = &cli.manifest_url {
        config.source.manifest_url = url.clone();
    }
    if cli.ordered {
        config.output.ordered = true;
    }

    validate(&config).context("invalid configuration")?;
    Ok(config)
}

/// Handles the --dry-run mode: resolves the manifest and lists the jobs
async fn handle_dry_run(config: Config) -> anyhow::Result<()> {
    let harvester = Harvester::from_config(config)?;
    let index = harvester.resolve().await.context("manifest resolution failed")?;

    println!("=== Tally-Harvest Dry Run ===\n");
    println!("Manifest: {}", harvester.config().source.manifest_url);
    println!("Page template: {}", harvester.config().source.page_url_template);
    println!("Workers: {}\n", harvester.config().pool.workers);

    for header in index.headers() {
        println!("{} ({})", header.name, header.id);
    }
    for area in index.leaves() {
        println!("  - {} / {} ({})", area.division, area.name, area.id);
    }

    println!(
        "\n✓ Would fetch {} pages across {} groups",
        index.leaf_count(),
        index.group_count()
    );

    Ok(())
}

/// Handles the main harvest: resolve, fetch, aggregate, render
async fn handle_harvest(config: Config, show_stats: bool) -> anyhow::Result<()> {
    let start_time = Instant::now();
    let output_path = config.output.path.clone();

    let harvester = Harvester::from_config(config)?;
    let harvest = match harvester.run().await {
        Ok(harvest) => harvest,
        Err(e) => {
            tracing::error!("Harvest failed: {}", e);
            return Err(e.into());
        }
    };

    write_harvest(&harvest, output_path.as_deref().map(Path::new))
        .context("failed to write CSV output")?;

    if let Some(path) = &output_path {
        tracing::info!("Wrote {} rows to {}", harvest.rows().len(), path);
    }

    if show_stats {
        print_statistics(&RunStatistics::from_harvest(&harvest, start_time.elapsed()));
    }

    Ok(())
}
