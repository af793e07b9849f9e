//! Integration test: fault propagation and teardown of a whole cell.
//!
//! Validates: the first fault is recorded with its origin, every worker is
//! joined, queues are drained, outputs are cleared best-effort and the
//! fieldbus is disconnected.

use super::support::{ScriptedFieldbus, ms};
use cell_common::config::CellConfig;
use cell_common::fieldbus::FieldbusError;
use cell_common::io::{ActuatorWord, SensorWord};
use cell_control::message::Station;
use cell_control::{Cell, CellError, CellOutcome, Origin};
use cell_hal::drivers::simulation::SimulationFieldbus;
use std::sync::Arc;

fn config() -> CellConfig {
    let mut config = CellConfig::default();
    config.timing.write_settle_ms = 0;
    config
}

#[tokio::test(start_paused = true)]
async fn worker_io_error_halts_the_cell() {
    let bus = ScriptedFieldbus::steady(
        SensorWord::DRILL_UP | SensorWord::WORKPIECE_AT_TURNTABLE | SensorWord::TURNTABLE_IN_POSITION,
    );
    bus.fail_writes(true);

    let cell = Cell::start(bus.as_bus(), &config()).unwrap();
    let outcome = cell.run().await;

    let CellOutcome::Halted { reason, summary } = outcome else {
        panic!("expected halt, got {outcome:?}");
    };
    assert_eq!(reason.origin, Origin::Station(Station::Turntable));
    assert!(matches!(
        reason.error,
        CellError::Io(FieldbusError::Communication(_))
    ));
    assert_eq!(summary.homing, None);
    assert_eq!(summary.worker_sequences, 0);
    assert!(!bus.is_connected());
}

#[tokio::test(start_paused = true)]
async fn stuck_turntable_is_a_mechanical_fault() {
    let bus = ScriptedFieldbus::steady(
        SensorWord::DRILL_UP | SensorWord::WORKPIECE_AT_TURNTABLE | SensorWord::TURNTABLE_IN_POSITION,
    );
    let mut config = config();
    config.timing.mechanical_timeout_ms = Some(300);

    let outcome = Cell::start(bus.as_bus(), &config).unwrap().run().await;

    let reason = outcome.halt_reason().expect("halted");
    assert_eq!(reason.origin, Origin::Station(Station::Turntable));
    assert_eq!(reason.error.as_label(), "mechanical_fault");
    // Motor was started, then cleared by the all-stop.
    assert_eq!(
        bus.writes(),
        vec![ActuatorWord::TURNTABLE_MOTOR, ActuatorWord::empty()]
    );
    assert_eq!(bus.outputs(), ActuatorWord::empty());
}

#[tokio::test(start_paused = true)]
async fn supervisor_read_failure_halts_the_cell() {
    let bus = ScriptedFieldbus::steady(SensorWord::DRILL_UP);

    let cell = Cell::start(bus.as_bus(), &config()).unwrap();
    let breaker = Arc::clone(&bus);
    tokio::spawn(async move {
        tokio::time::sleep(ms(275)).await;
        breaker.fail_reads(true);
    });
    let outcome = cell.run().await;

    let CellOutcome::Halted { reason, summary } = outcome else {
        panic!("expected halt, got {outcome:?}");
    };
    assert_eq!(reason.origin, Origin::Supervisor);
    assert_eq!(reason.error.as_label(), "io");
    assert_eq!(summary.homing.map(|h| h.indexes), Some(0));
    assert!(summary.supervisor.cycles >= 1);
    assert!(!bus.is_connected());
}

#[tokio::test(start_paused = true)]
async fn stop_request_is_not_a_halt() {
    let bus = ScriptedFieldbus::steady(SensorWord::DRILL_UP);

    let cell = Cell::start(bus.as_bus(), &config()).unwrap();
    let stop = cell.shutdown_handle();
    tokio::spawn(async move {
        tokio::time::sleep(ms(300)).await;
        stop.request_stop();
    });

    let outcome = cell.run().await;
    assert_eq!(outcome.label(), "stopped");
    assert!(outcome.summary().supervisor.idle_cycles > 0);
    assert!(!bus.is_connected());
}

#[tokio::test]
async fn unreachable_node_fails_startup() {
    let bus = SimulationFieldbus::default();
    bus.handle().inject_fault();

    let err = Cell::start(Arc::new(bus), &CellConfig::default())
        .err()
        .expect("startup must fail");
    assert!(matches!(err, CellError::Io(FieldbusError::ConnectFailed(_))));
}
