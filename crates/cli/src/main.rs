use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use assist::{Collaborators, EnrichedResult, KeywordIndex};
use clap::{Parser, Subcommand};
use diagnostics::{RackConfig, RackTables};
use serde::Serialize;
use sim::{PartialReadings, SensorSnapshot};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const NO_FAULT: &str = "none";
const DEFAULT_LOG_FILTER: &str = "rack_fault_sim=info,diagnostics=info,assist=info";

#[derive(Parser, Debug)]
#[command(
    name = "rack-fault-sim",
    version,
    about = "Refrigeration rack fault simulator for technician training"
)]
struct Args {
    /// JSON file replacing the built-in ranges, faults, thresholds and rules
    #[arg(long, env = "RACK_SIM_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// JSON list of manual sections used to look up references
    #[arg(long, env = "RACK_SIM_MANUALS", global = true)]
    manuals: Option<PathBuf>,

    /// Upper bound for each collaborator call, in milliseconds
    #[arg(long, default_value_t = 2000, global = true)]
    collaborator_timeout_ms: u64,

    /// Maximum manual sections retrieved per diagnosis
    #[arg(long, default_value_t = 5, global = true)]
    search_limit: usize,

    /// Pretty-print each JSON object instead of one per line
    #[arg(long, global = true)]
    pretty: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate normal snapshots, inject a fault and diagnose each one
    Simulate {
        /// Fault archetype to inject, or "none"
        #[arg(long, default_value = NO_FAULT)]
        fault: String,

        /// Number of independent snapshots
        #[arg(long, default_value_t = 1)]
        steps: u64,

        /// RNG seed for deterministic runs; omitted seeds from entropy
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Diagnose sensor readings from a JSON file ("-" reads stdin)
    Diagnose {
        #[arg(long, default_value = "-")]
        input: PathBuf,

        /// Evaluate incomplete readings instead of rejecting them
        #[arg(long)]
        tolerate_missing: bool,
    },

    /// List the fault archetypes
    Faults,
}

#[derive(Serialize)]
struct TraceRow<'a> {
    step: u64,
    fault: &'a str,
    snapshot: &'a SensorSnapshot,
    #[serde(flatten)]
    outcome: EnrichedResult,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    let tables = load_tables(args.config.as_deref())?;
    let collaborators = load_collaborators(args.manuals.as_deref(), args.collaborator_timeout_ms, args.search_limit)?;

    match &args.command {
        Command::Simulate { fault, steps, seed } => {
            simulate(&tables, &collaborators, fault, *steps, *seed, args.pretty).await
        }
        Command::Diagnose { input, tolerate_missing } => {
            diagnose(&tables, &collaborators, input, *tolerate_missing, args.pretty).await
        }
        Command::Faults => {
            for archetype in tables.catalog().iter() {
                emit(archetype, args.pretty)?;
            }
            Ok(())
        }
    }
}

fn load_tables(path: Option<&Path>) -> Result<RackTables> {
    let Some(path) = path else {
        tracing::info!("using built-in rack tables");
        return Ok(RackTables::default());
    };
    let tables = RackConfig::load(path)
        .and_then(RackConfig::into_tables)
        .with_context(|| format!("invalid rack configuration {}", path.display()))?;
    Ok(tables)
}

fn load_collaborators(manuals: Option<&Path>, timeout_ms: u64, search_limit: usize) -> Result<Collaborators> {
    let mut collaborators = Collaborators::default()
        .with_timeout(Duration::from_millis(timeout_ms))
        .with_search_limit(search_limit);
    if let Some(path) = manuals {
        let index = KeywordIndex::load(path).context("failed to load manual sections")?;
        tracing::info!(sections = index.len(), "manual index loaded");
        collaborators = collaborators.with_search(Arc::new(index));
    }
    Ok(collaborators)
}

async fn simulate(
    tables: &RackTables,
    collaborators: &Collaborators,
    fault: &str,
    steps: u64,
    seed: Option<u64>,
    pretty: bool,
) -> Result<()> {
    let injector = tables.injector();
    if fault != NO_FAULT {
        injector.catalog().get(fault)?;
    }

    let mut generator = match seed {
        Some(seed) => tables.generator(seed),
        None => tables.generator_from_entropy(),
    };
    let engine = tables.engine();

    for step in 0..steps {
        let baseline = generator.generate_normal();
        let snapshot = if fault == NO_FAULT {
            baseline
        } else {
            injector.inject(&baseline, fault)?
        };

        let result = engine.diagnose(&snapshot);
        let outcome = collaborators.enrich(&PartialReadings::from(&snapshot), result).await;

        emit(
            &TraceRow {
                step,
                fault,
                snapshot: &snapshot,
                outcome,
            },
            pretty,
        )?;
    }

    Ok(())
}

async fn diagnose(
    tables: &RackTables,
    collaborators: &Collaborators,
    input: &Path,
    tolerate_missing: bool,
    pretty: bool,
) -> Result<()> {
    let raw = read_input(input)?;
    let readings: PartialReadings = serde_json::from_str(&raw).context("failed to parse sensor readings")?;
    let engine = tables.engine();

    let result = if tolerate_missing {
        let missing = missing_keys(&readings);
        if !missing.is_empty() {
            tracing::warn!(?missing, "evaluating incomplete readings");
        }
        engine.diagnose(&readings)
    } else {
        let snapshot = SensorSnapshot::try_from(readings.clone())?;
        engine.diagnose(&snapshot)
    };

    let outcome = collaborators.enrich(&readings, result).await;
    emit(&outcome, pretty)
}

/// Input field names of the readings that are absent or not finite.
fn missing_keys(readings: &PartialReadings) -> Vec<&'static str> {
    readings.missing().into_iter().map(|s| s.key()).collect()
}

fn read_input(input: &Path) -> Result<String> {
    if input == Path::new("-") {
        let mut raw = String::new();
        std::io::stdin().read_to_string(&mut raw).context("failed to read stdin")?;
        return Ok(raw);
    }
    std::fs::read_to_string(input).with_context(|| format!("failed to read {}", input.display()))
}

fn emit<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let line = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{line}");
    Ok(())
}
