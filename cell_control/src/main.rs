//! # Cell Control
//!
//! Runs one rotary drilling cell: loads the configuration, creates the
//! fieldbus driver, homes the cell and enters the supervisor loop until a
//! cycle limit, an operator stop (Ctrl+C) or a fault.
//!
//! A fault halts the process with exit code 1. The cell is never restarted
//! automatically.

use cell_common::config::{CellConfig, ConfigLoader};
use cell_common::consts::DEFAULT_CONFIG_PATH;
use cell_common::fieldbus::{Fieldbus, FieldbusDiagnostics};
use cell_control::{Cell, CellOutcome, HaltReason, Origin};
use cell_hal::DriverRegistry;
use clap::Parser;
use serde_json::{Map, Value, json};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Rotary drilling cell coordinator
#[derive(Parser, Debug)]
#[command(name = "cell_control")]
#[command(version)]
#[command(about = "Supervisor and station workers of a rotary drilling cell")]
struct Args {
    /// Path to the cell configuration TOML. Falls back to
    /// `/etc/cell/cell.toml` if present, then to built-in defaults.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Fieldbus driver name (overrides `fieldbus.driver`).
    #[arg(long)]
    driver: Option<String>,

    /// Fieldbus node id (overrides `fieldbus.node_id`).
    #[arg(long)]
    node: Option<String>,

    /// Stop after N supervisor cycles.
    #[arg(long, value_name = "N")]
    max_cycles: Option<u64>,

    /// Stop after N consecutive idle cycles.
    #[arg(long, value_name = "N")]
    idle_limit: Option<u64>,

    /// Bound on turntable/drill sensor waits [ms].
    #[arg(long, value_name = "MS")]
    mechanical_timeout_ms: Option<u64>,

    /// Simulation feed pattern, `g` = good part, `b` = defective part.
    #[arg(long, value_name = "PATTERN")]
    parts: Option<String>,

    /// Enable verbose logging (DEBUG level).
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format.
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("configuration error: {e}");
            process::exit(2);
        }
    };
    setup_tracing(&args, &config);

    info!("Cell Control v{} starting...", env!("CARGO_PKG_VERSION"));

    match run(config).await {
        Ok((outcome, diagnostics)) => {
            report(&outcome, diagnostics.as_ref());
            if outcome.is_halted() {
                process::exit(1);
            }
            info!("Cell Control shutdown complete");
        }
        Err(reason) => {
            error!("FATAL: {reason}; restart required");
            process::exit(1);
        }
    }
}

fn load_config(args: &Args) -> Result<CellConfig, Box<dyn std::error::Error>> {
    let path = CellConfig::resolve_path(args.config.as_deref(), Path::new(DEFAULT_CONFIG_PATH));
    let mut config = match path {
        Some(path) => CellConfig::load(path)?,
        None => CellConfig::default(),
    };

    if let Some(driver) = &args.driver {
        config.fieldbus.driver = driver.clone();
    }
    if let Some(node) = &args.node {
        config.fieldbus.node_id = node.clone();
    }
    if args.max_cycles.is_some() {
        config.supervisor.max_cycles = args.max_cycles;
    }
    if args.idle_limit.is_some() {
        config.supervisor.idle_limit = args.idle_limit;
    }
    if args.mechanical_timeout_ms.is_some() {
        config.timing.mechanical_timeout_ms = args.mechanical_timeout_ms;
    }
    if let Some(parts) = &args.parts {
        config.simulation.parts = parts.clone();
    }

    config.validate()?;
    Ok(config)
}

async fn run(
    config: CellConfig,
) -> Result<(CellOutcome, Option<FieldbusDiagnostics>), HaltReason> {
    let registry = DriverRegistry::with_builtin();
    info!("Available drivers: {:?}", registry.list_drivers());
    let bus: Arc<dyn Fieldbus> = registry
        .create_driver(&config)
        .map_err(|e| HaltReason::new(Origin::Startup, e.into()))?;
    let cell = Cell::start(Arc::clone(&bus), &config)
        .map_err(|e| HaltReason::new(Origin::Startup, e))?;

    let stop = cell.shutdown_handle();
    tokio::spawn(async move {
        match signal::ctrl_c().await {
            Ok(()) => {
                info!("Received shutdown signal (Ctrl+C)");
                stop.request_stop();
            }
            Err(err) => warn!("Unable to listen for shutdown signal: {err}"),
        }
    });

    let outcome = cell.run().await;
    Ok((outcome, bus.diagnostics()))
}

fn report(outcome: &CellOutcome, diagnostics: Option<&FieldbusDiagnostics>) {
    let summary = outcome.summary();
    let mut doc = json!({
        "outcome": outcome.label(),
        "summary": summary,
    });
    if let Some(reason) = outcome.halt_reason() {
        doc["halt_reason"] = json!(reason.to_string());
    }
    if let Some(diag) = diagnostics {
        let custom: Map<String, Value> = diag
            .custom
            .iter()
            .map(|(name, value)| ((*name).to_string(), json!(value)))
            .collect();
        doc["fieldbus"] = json!({
            "reads": diag.reads,
            "writes": diag.writes,
            "driver": custom,
        });
    }

    match serde_json::to_string_pretty(&doc) {
        Ok(text) => println!("{text}"),
        Err(e) => warn!("cannot render run summary: {e}"),
    }
}

fn setup_tracing(args: &Args, config: &CellConfig) {
    let directive = if args.verbose {
        "debug"
    } else {
        config.shared.log_level.as_directive()
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .compact()
            .init();
    }
}
