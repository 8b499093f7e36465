//! Kuba TSVB response processor CLI
//!
//! Runs the response pipeline over a saved aggregation response and prints
//! the resulting rows as JSON.
//!
//! # CLI Commands
//!
//! - `process` - Process a response
//! - `check-config` - Validate a pipeline configuration file
//!
//! Running without a command prints the help text.
//!
//! # Input files
//!
//! - `--response`: JSON aggregation sub-tree holding the series aggregation,
//!   or a full search response with an `aggregations` object
//! - `--series`: JSON series configuration
//! - `--meta`: optional JSON request metadata

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::{debug, info};

use kuba_tsvb::{
    fields::NoFields,
    response::{AggregationResponse, AGGREGATIONS},
    telemetry::init_tracing,
    Error, PipelineConfig, ProcessorContext, ResponsePipeline, ResultRows, SeriesConfig, SeriesMeta,
};

#[derive(Parser)]
#[command(name = "tsvb-process")]
#[command(version)]
#[command(about = "Post-process time-series aggregation responses into result rows", long_about = None)]
#[command(arg_required_else_help = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to pipeline configuration file (overrides TSVB_CONFIG env var)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Process a response
    Process(ProcessArgs),

    /// Validate configuration file and print the stage order
    CheckConfig,
}

#[derive(clap::Args)]
struct ProcessArgs {
    /// Aggregation response JSON file
    #[arg(short, long)]
    response: PathBuf,

    /// Series configuration JSON file
    #[arg(short, long)]
    series: PathBuf,

    /// Request metadata JSON file
    #[arg(short, long)]
    meta: Option<PathBuf>,

    /// Pretty-print the output
    #[arg(long)]
    pretty: bool,
}

fn load_config(cli: &Cli) -> Result<PipelineConfig, Error> {
    let path = cli
        .config
        .clone()
        .or_else(|| std::env::var("TSVB_CONFIG").ok().map(PathBuf::from));

    let config = match path {
        Some(path) => PipelineConfig::from_file_with_env(path)?,
        None => PipelineConfig::from_env()?,
    };
    config.validate()?;
    Ok(config)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, Error> {
    let contents = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}

/// Accept either a bare aggregation sub-tree or a full search response
fn aggregation_bucket(value: Value) -> Result<Map<String, Value>, Error> {
    let is_full_response = value
        .as_object()
        .map_or(false, |root| root.get(AGGREGATIONS).map_or(false, Value::is_object));

    if is_full_response {
        let response = AggregationResponse::from_value(value)?;
        return Ok(response.aggregations().clone());
    }

    match value {
        Value::Object(bucket) => Ok(bucket),
        _ => Err(Error::Configuration(
            "response file must contain a JSON object".to_string(),
        )),
    }
}

async fn cmd_process(config: &PipelineConfig, args: &ProcessArgs) -> Result<(), Error> {
    let bucket = aggregation_bucket(read_json(&args.response)?)?;
    let series: SeriesConfig = read_json(&args.series)?;
    let meta: SeriesMeta = match &args.meta {
        Some(path) => read_json(path)?,
        None => SeriesMeta::default(),
    };

    let pipeline = ResponsePipeline::from_config(config);
    debug!(stages = ?pipeline.stage_names(), series = %series.id, "Running pipeline");

    let ctx = ProcessorContext::new(&bucket, &series, &meta, &NoFields);
    let rows = pipeline.run(&ctx, ResultRows::new()).await?;
    info!(rows = rows.len(), "Processed response");

    let output = if args.pretty {
        serde_json::to_string_pretty(&rows)?
    } else {
        serde_json::to_string(&rows)?
    };
    println!("{}", output);
    Ok(())
}

fn cmd_check_config(config: &PipelineConfig) {
    println!("Configuration is valid");
    println!("  sibling suffix: {}", config.sibling.suffix);
    for combination in &config.sibling.excluded {
        println!(
            "  excluded: {} (mode: {})",
            combination.metric_type,
            combination.mode.as_deref().unwrap_or("any")
        );
    }
    let stages: Vec<String> = config.pipeline.stages.iter().map(|s| s.to_string()).collect();
    println!("  stages: {}", stages.join(" -> "));
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(2);
        }
    };
    init_tracing(&config.logging);

    let result = match &cli.command {
        Commands::CheckConfig => {
            cmd_check_config(&config);
            Ok(())
        }
        Commands::Process(args) => cmd_process(&config, args).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
