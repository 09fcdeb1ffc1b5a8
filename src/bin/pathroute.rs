//! pathroute CLI - route JSON records by JSONPath extraction results
//!
//! Reads a directory of JSON documents, runs them through the router in
//! batches, and writes one NDJSON file per outcome.

use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use pathroute::{BatchRouter, NdjsonSink, RecordQueue, RouterConfig};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pathroute")]
#[command(version, about = "Route JSON records by JSONPath extraction results", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Route every file in a directory and write matched/unmatched/failed NDJSON
    Route {
        /// Path to router configuration (YAML)
        #[arg(short, long, default_value = "pathroute.yaml")]
        config: PathBuf,

        /// Directory of input documents, one record per file
        #[arg(short, long)]
        input: PathBuf,

        /// Output directory for matched.ndjson, unmatched.ndjson, failed.ndjson
        #[arg(short, long, default_value = "routed")]
        output: PathBuf,

        /// Override batch size from the config file (at least 1)
        #[arg(short, long, value_parser = parse_batch_size)]
        batch_size: Option<usize>,
    },

    /// Validate a router configuration without routing anything
    Validate {
        /// Path to router configuration (YAML)
        #[arg(short, long, default_value = "pathroute.yaml")]
        config: PathBuf,
    },
}

fn main() {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Route {
            config,
            input,
            output,
            batch_size,
        } => route(config, input, output, batch_size),
        Commands::Validate { config } => validate(config),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Route every record found in `input` and write one NDJSON file per outcome
fn route(
    config: PathBuf,
    input: PathBuf,
    output: PathBuf,
    batch_size: Option<usize>,
) -> Result<(), String> {
    let config = RouterConfig::load_from_file(&config).map_err(|e| e.to_string())?;
    let registry = config.build_registry().map_err(|e| e.to_string())?;

    let router = BatchRouter::new(Arc::new(registry))
        .with_batch_size(batch_size.unwrap_or(config.batch_size));

    let mut queue = RecordQueue::from_dir(&input).map_err(|e| e.to_string())?;
    println!("  ✓ Loaded {} records from {}", queue.len(), input.display());

    std::fs::create_dir_all(&output)
        .map_err(|e| format!("Failed to create output directory: {}", e))?;

    let open = |name: &str| -> Result<BufWriter<File>, String> {
        let path = output.join(name);
        File::create(&path)
            .map(BufWriter::new)
            .map_err(|e| format!("Failed to create {}: {}", path.display(), e))
    };
    let mut sink = NdjsonSink::new(
        open("matched.ndjson")?,
        open("unmatched.ndjson")?,
        open("failed.ndjson")?,
    );

    let drained = router.drain(&mut queue, &mut sink);

    // Records routed before a source failure are already in the sink
    sink.finish()
        .map_err(|e| format!("Failed to write routed records: {}", e))?;

    let summary = drained.map_err(|e| {
        format!(
            "{} ({} matched, {} unmatched, {} failed written to {})",
            e,
            e.completed.matched,
            e.completed.unmatched,
            e.completed.failed,
            output.display()
        )
    })?;

    println!(
        "  ✓ Routed {} records: {} matched, {} unmatched, {} failed",
        summary.pulled, summary.matched, summary.unmatched, summary.failed
    );
    println!("  Output directory: {}", output.display());

    Ok(())
}

/// Parse `--batch-size`, rejecting zero the same way the config file does
fn parse_batch_size(value: &str) -> Result<usize, String> {
    match value.parse::<usize>() {
        Ok(0) => Err("batch size must be at least 1".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(format!("invalid batch size '{}': {}", value, e)),
    }
}

/// Validate configuration and list the queries in evaluation order
fn validate(config: PathBuf) -> Result<(), String> {
    println!("🔍 Validating {}...", config.display());

    let config = RouterConfig::load_from_file(&config).map_err(|e| e.to_string())?;
    let registry = config.build_registry().map_err(|e| e.to_string())?;

    println!("  ✓ Destination: {}", registry.destination());
    println!("  ✓ Batch size: {}", config.batch_size);

    let mut invalid = 0;
    for binding in registry.bindings() {
        match binding.compiled() {
            Ok(_) => println!("  ✓ {} = {}", binding.name(), binding.expression()),
            Err(e) => {
                invalid += 1;
                println!("  ✗ {} = {} ({})", binding.name(), binding.expression(), e);
            }
        }
    }

    if invalid > 0 {
        return Err(format!("{} invalid JSONPath expression(s)", invalid));
    }

    println!("✨ Configuration is valid ({} queries)", registry.len());
    Ok(())
}
