//! Integration test: configuration-driven startup.
//!
//! Validates: TOML loading → validation → driver creation → a complete run
//! honoring the configured supervisor limits and timing.

use cell_common::config::{CellConfig, ConfigLoader};
use cell_common::fieldbus::Fieldbus;
use cell_control::{Cell, CellOutcome};
use cell_hal::DriverRegistry;
use cell_hal::drivers::simulation::SimulationFieldbus;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

const CELL_TOML: &str = r#"
[shared]
service_name = "cell-test"

[fieldbus]
driver = "simulation"
node_id = "NODE-T"

[timing]
mechanical_timeout_ms = 5000

[supervisor]
idle_limit = 12

[simulation]
parts = "gb"
"#;

#[tokio::test(start_paused = true)]
async fn configured_cell_runs_to_completion() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("cell.toml");
    fs::write(&path, CELL_TOML).unwrap();

    let config = CellConfig::load(&path).unwrap();
    config.validate().unwrap();
    assert_eq!(config.timing.poll_interval_ms, 50);

    let bus = SimulationFieldbus::new(&config.simulation);
    let sim = bus.handle();
    let outcome = Cell::start(Arc::new(bus), &config).unwrap().run().await;

    let CellOutcome::Completed(summary) = outcome else {
        panic!("expected completion, got {outcome:?}");
    };
    assert_eq!(summary.supervisor.rejects, 1);
    assert_eq!(summary.supervisor.drills, 1);
    assert!(summary.supervisor.idle_cycles >= 12);

    let plant = sim.stats();
    assert_eq!(plant.drilled, 1);
    assert_eq!(plant.drilled_defective, 0);
    assert_eq!(plant.ejected, 2);
}

#[test]
fn shipped_config_is_valid() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../config/cell.toml");
    let config = CellConfig::load(&path).unwrap();
    config.validate().unwrap();
    assert_eq!(config.fieldbus.driver, "simulation");
}

#[tokio::test(start_paused = true)]
async fn registry_built_driver_runs_the_configured_feed() {
    let config = CellConfig::from_toml(CELL_TOML).unwrap();
    let registry = DriverRegistry::with_builtin();

    let bus = registry.create_driver(&config).unwrap();
    assert_eq!(bus.name(), "simulation");
    let outcome = Cell::start(Arc::clone(&bus), &config).unwrap().run().await;
    assert_eq!(outcome.label(), "completed");

    let diag = bus.diagnostics().unwrap();
    assert_eq!(diag.counter("ejected"), Some(2));
    assert_eq!(diag.counter("ejected_defective"), Some(1));
    assert_eq!(diag.counter("drilled"), Some(1));
    assert!(diag.writes > 0);

    let mut other = config.clone();
    other.fieldbus.driver = "profinet".to_string();
    assert!(registry.create_driver(&other).is_err());
}
