//! Command line entry point for the spike-rating tool
//!
//! Loads configuration and reference tables, reads match files, rates every
//! player in every match and writes the batch report as JSON.

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use serde::de::DeserializeOwned;
use spike_rating::config::{AppConfig, NormalizationParams};
use spike_rating::data::{discover_inputs, load_matches};
use spike_rating::metrics::MetricsCollector;
use spike_rating::{BatchRunner, ComponentRegistry, RatingCalculator, ReferenceData};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// Spike Rating - per-match player ratings from round-level event data
#[derive(Parser)]
#[command(
    name = "spike-rating",
    version,
    about = "Compute per-match player ratings for round-based tactical shooters",
    long_about = "Spike Rating turns per-round kill, damage and economy data into a composite \
                 player rating. Kills and deaths are priced by the change in round win \
                 probability they cause, scaled by the economic matchup and round timing, then \
                 combined with assists and armor-adjusted damage per round."
)]
struct Args {
    /// Configuration file path
    #[arg(
        short,
        long,
        global = true,
        value_name = "FILE",
        help = "Path to configuration file (TOML format)"
    )]
    config: Option<PathBuf>,

    /// Log level override
    #[arg(
        short,
        long,
        global = true,
        value_name = "LEVEL",
        help = "Override log level (trace, debug, info, warn, error)"
    )]
    log_level: Option<String>,

    /// Enable debug mode
    #[arg(
        short,
        long,
        global = true,
        help = "Enable debug mode with verbose logging"
    )]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Rate every player in the given match file or directory
    Calculate(CalculateArgs),
    /// Print the registered rating components and their weights
    ListComponents,
    /// Load configuration and reference tables, then exit
    ValidateConfig,
}

#[derive(clap::Args)]
struct CalculateArgs {
    /// Match JSON file, or a directory searched recursively for *.json
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "Write the report to FILE instead of stdout"
    )]
    output: Option<PathBuf>,

    #[arg(
        long,
        value_name = "JSON|FILE",
        help = "Component weights as a JSON object, inline or in a file"
    )]
    weights: Option<String>,

    #[arg(
        long,
        value_name = "JSON|FILE",
        help = "Per-component {\"mean\", \"std\"} normalization as a JSON object, inline or in a file"
    )]
    normalization: Option<String>,

    #[arg(
        long,
        value_name = "NAMES",
        value_delimiter = ',',
        help = "Comma-separated components to compute, in aggregation order"
    )]
    components: Option<Vec<String>>,

    #[arg(long, help = "Pretty-print the JSON report")]
    pretty: bool,

    #[arg(
        long,
        value_name = "FILE",
        help = "Write Prometheus text metrics to FILE after the run"
    )]
    metrics_out: Option<PathBuf>,

    #[arg(
        long,
        value_name = "N",
        help = "Rate at most N matches (in input path order)"
    )]
    max_matches: Option<usize>,

    #[arg(
        long,
        value_name = "N",
        help = "Override the number of rating worker threads"
    )]
    workers: Option<usize>,
}

/// Initialize structured logging with the configured level
fn init_logging(log_level: &str) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

/// Load and merge configuration from file or environment and CLI arguments
fn load_config(args: &Args) -> Result<AppConfig> {
    let mut config = if let Some(config_path) = &args.config {
        AppConfig::from_file(config_path)?
    } else {
        AppConfig::from_env()?
    };

    // Apply CLI overrides
    if let Some(log_level) = &args.log_level {
        config.service.log_level = log_level.clone();
    }

    if args.debug {
        config.service.log_level = "debug".to_string();
    }

    Ok(config)
}

/// Parse a JSON object given inline or as a path to a file holding one
fn read_json_map<T: DeserializeOwned>(flag: &str, value: &str) -> Result<BTreeMap<String, T>> {
    let trimmed = value.trim_start();
    let raw = if trimmed.starts_with('{') {
        value.to_string()
    } else {
        std::fs::read_to_string(Path::new(value))
            .with_context(|| format!("Failed to read {} file {}", flag, value))?
    };
    serde_json::from_str(&raw).with_context(|| format!("Invalid {} JSON", flag))
}

/// Fold the calculate-specific overrides into the loaded configuration
fn apply_calculate_overrides(config: &mut AppConfig, args: &CalculateArgs) -> Result<()> {
    if let Some(weights) = &args.weights {
        let weights: BTreeMap<String, f64> = read_json_map("--weights", weights)?;
        config.rating.weights.extend(weights);
    }

    if let Some(normalization) = &args.normalization {
        let params: BTreeMap<String, NormalizationParams> =
            read_json_map("--normalization", normalization)?;
        config.rating.normalization = Some(params);
    }

    if let Some(components) = &args.components {
        config.rating.components = components
            .iter()
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .collect();
    }

    if let Some(workers) = args.workers {
        config.service.worker_threads = workers;
    }

    config
        .rating
        .validate()
        .context("Invalid rating configuration after CLI overrides")?;
    Ok(())
}

async fn run_calculate(mut config: AppConfig, args: CalculateArgs) -> Result<()> {
    apply_calculate_overrides(&mut config, &args)?;

    let reference = Arc::new(ReferenceData::from_files(&config.data)?);
    let calculator = Arc::new(
        RatingCalculator::with_builtins(config.rating.clone())
            .context("Failed to build rating calculator")?,
    );
    let metrics = Arc::new(MetricsCollector::new()?);

    let paths = discover_inputs(&args.input)?;
    if paths.is_empty() {
        warn!("No match files found under {}", args.input.display());
    }

    let loaded = load_matches(paths, config.service.load_concurrency).await;
    for _ in &loaded.failures {
        metrics.record_load_failure();
    }

    let mut matches = loaded.matches;
    if let Some(max) = args.max_matches {
        if matches.len() > max {
            info!("Limiting run to the first {} of {} matches", max, matches.len());
            matches.truncate(max);
        }
    }

    let runner = BatchRunner::new(calculator, reference, config.service.worker_threads)?
        .with_metrics(metrics.clone());
    let mut report = tokio::task::spawn_blocking(move || runner.run(&matches))
        .await
        .context("Rating workers stopped unexpectedly")?;
    report.load_failures = loaded.failures;

    match &args.output {
        Some(path) => {
            report.write_to(path, args.pretty)?;
            info!(
                "Wrote {} ratings to {}",
                report.ratings.len(),
                path.display()
            );
        }
        None => println!("{}", report.to_json(args.pretty)?),
    }

    if let Some(path) = &args.metrics_out {
        metrics.write_to(path)?;
        info!("Wrote metrics to {}", path.display());
    }

    info!(
        "Run {} finished: {} ratings, {} rating failures, {} load failures",
        report.run_id,
        report.ratings.len(),
        report.failures.len(),
        report.load_failures.len()
    );
    Ok(())
}

fn list_components(config: &AppConfig) {
    let registry = ComponentRegistry::with_builtins();
    for name in registry.names() {
        let selected = config.rating.components.iter().any(|c| c == name);
        match config.rating.weight(name) {
            Some(weight) => println!(
                "{:<14} weight={:<10} {}",
                name,
                weight,
                if selected { "selected" } else { "" }
            ),
            None => println!("{:<14} (no weight)", name),
        }
    }
}

fn validate_config(config: &AppConfig) -> Result<()> {
    ReferenceData::from_files(&config.data)?;
    RatingCalculator::with_builtins(config.rating.clone())
        .context("Failed to build rating calculator")?;
    info!("Configuration validation successful");
    println!("Configuration is valid");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = load_config(&args).unwrap_or_else(|e| {
        eprintln!("Configuration error: {:#}", e);
        std::process::exit(1);
    });

    if let Err(e) = init_logging(&config.service.log_level) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    match args.command {
        Command::Calculate(calculate) => run_calculate(config, calculate).await,
        Command::ListComponents => {
            list_components(&config);
            Ok(())
        }
        Command::ValidateConfig => validate_config(&config),
    }
}
