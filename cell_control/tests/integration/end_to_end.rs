//! Integration test: a complete cell against the simulated plant.
//!
//! Validates: every fed part is inspected and ejected, good parts are
//! drilled, the defective part is carried through undrilled, and the cell
//! ends with all outputs cleared and the fieldbus disconnected.

use super::support::ms;
use cell_common::config::{CellConfig, SimulationConfig};
use cell_common::io::ActuatorWord;
use cell_control::{Cell, CellOutcome, Origin};
use cell_hal::drivers::simulation::{Part, SimulationFieldbus, SimulationHandle, Slot};
use std::sync::Arc;

fn simulated_cell(config: &CellConfig) -> (Cell, SimulationHandle) {
    let bus = SimulationFieldbus::new(&config.simulation);
    let handle = bus.handle();
    let cell = Cell::start(Arc::new(bus), config).unwrap();
    (cell, handle)
}

#[tokio::test(start_paused = true)]
async fn defective_part_is_never_drilled() {
    let mut config = CellConfig::default();
    config.simulation.parts = "gggbgg".to_string();
    config.supervisor.idle_limit = Some(10);
    config.supervisor.max_cycles = Some(100);

    let (cell, sim) = simulated_cell(&config);
    let outcome = cell.run().await;

    let CellOutcome::Completed(summary) = outcome else {
        panic!("expected completion, got {outcome:?}");
    };
    let plant = sim.stats();
    assert_eq!(plant.drilled, 5);
    assert_eq!(plant.drilled_defective, 0);
    assert_eq!(plant.ejected, 6);
    assert_eq!(plant.ejected_defective, 1);
    assert_eq!(plant.dropped, 0);
    assert_eq!(plant.empty_ejections, 0);

    let stats = summary.supervisor;
    assert_eq!(stats.inspections, 6);
    assert_eq!(stats.rejects, 1);
    assert_eq!(stats.skipped_drills, 1);
    assert_eq!(stats.drills, 5);
    assert_eq!(stats.ejections, 6);
    assert_eq!(summary.drained_replies, 0);

    assert!(sim.is_drained());
    assert_eq!(sim.outputs(), ActuatorWord::empty());
    assert!(!sim.is_connected());
}

#[tokio::test(start_paused = true)]
async fn homing_clears_parts_left_on_the_table() {
    let mut config = CellConfig::default();
    config.simulation = SimulationConfig {
        parts: String::new(),
        ..Default::default()
    };
    config.supervisor.max_cycles = Some(0);

    let (cell, sim) = simulated_cell(&config);
    sim.place(Slot::Load, Some(Part::good()));
    sim.place(Slot::Inspector, Some(Part::defective()));
    sim.place(Slot::Drill, Some(Part::good()));

    let outcome = cell.run().await;

    let summary = outcome.summary();
    assert_eq!(outcome.label(), "completed");
    let homing = summary.homing.unwrap();
    assert_eq!(homing.indexes, 3);
    assert_eq!(homing.ejections, 3);
    assert_eq!(summary.supervisor.cycles, 0);

    let plant = sim.stats();
    assert_eq!(plant.ejected, 3);
    assert_eq!(plant.dropped, 0);
    assert_eq!(plant.drilled, 0);
    assert!(sim.is_drained());
}

#[tokio::test(start_paused = true)]
async fn transport_fault_mid_run_halts_with_restart_required() {
    let mut config = CellConfig::default();
    config.simulation.parts = "gggggg".to_string();

    let (cell, sim) = simulated_cell(&config);
    let breaker = sim.clone();
    tokio::spawn(async move {
        tokio::time::sleep(ms(2_000)).await;
        breaker.inject_fault();
    });

    let outcome = cell.run().await;

    let reason = outcome.halt_reason().expect("halted").clone();
    assert_eq!(reason.error.as_label(), "io");
    assert_ne!(reason.origin, Origin::Startup);
    assert!(outcome.summary().supervisor.indexes >= 1);
    assert!(!sim.is_connected());
}
