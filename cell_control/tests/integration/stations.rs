//! Integration test: station sequences and the worker loop against a
//! scripted fieldbus.

use super::support::{ScriptedFieldbus, ms};
use cell_common::io::{ActuatorWord, Sensor, SensorWord};
use cell_control::dispatch;
use cell_control::lifecycle::Shutdown;
use cell_control::message::{Completion, Station};
use cell_control::station::{
    Drill, Ejector, Inspector, StationSequence, StationWorker, Turntable, Wait,
};
use cell_control::{CellError, IoGateway, Origin};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

fn gateway(bus: &Arc<ScriptedFieldbus>) -> IoGateway {
    IoGateway::new(bus.connected().as_bus(), Duration::ZERO)
}

fn inspector() -> Inspector {
    Inspector {
        poll_interval: ms(50),
        polls: 4,
        settle: ms(100),
    }
}

#[tokio::test(start_paused = true)]
async fn inspector_rejects_when_bit_rises_on_second_poll() {
    let bus = ScriptedFieldbus::new([
        SensorWord::empty(),
        SensorWord::INSPECTOR_REJECT_DETECTED,
    ]);
    let io = gateway(&bus);

    let reply = inspector().run(&io).await.unwrap();

    assert_eq!(reply, Completion::InspectorReject);
    assert_eq!(bus.input_reads(), 2);
    assert_eq!(
        bus.writes(),
        vec![ActuatorWord::INSPECTOR_EXTEND, ActuatorWord::empty()]
    );
}

#[tokio::test(start_paused = true)]
async fn inspector_window_expiry_is_a_pass() {
    let bus = ScriptedFieldbus::steady(SensorWord::WORKPIECE_AT_INSPECTOR);
    let io = gateway(&bus);

    let started = Instant::now();
    let reply = inspector().run(&io).await.unwrap();

    assert_eq!(reply, Completion::InspectorDone);
    assert_eq!(bus.input_reads(), 4);
    // Four polls plus the retract delay.
    let elapsed = started.elapsed();
    assert!(elapsed >= ms(300) && elapsed < ms(350), "{elapsed:?}");
    assert_eq!(bus.outputs(), ActuatorWord::empty());
}

#[tokio::test(start_paused = true)]
async fn turntable_waits_for_leave_and_return() {
    let bus = ScriptedFieldbus::new([
        SensorWord::TURNTABLE_IN_POSITION,
        SensorWord::empty(),
        SensorWord::empty(),
        SensorWord::TURNTABLE_IN_POSITION,
    ]);
    let io = gateway(&bus);
    let table = Turntable {
        poll_interval: ms(50),
        settle: ms(100),
        timeout: None,
    };

    assert_eq!(table.run(&io).await.unwrap(), Completion::TurntableDone);
    assert_eq!(bus.input_reads(), 4);
    assert_eq!(
        bus.writes(),
        vec![ActuatorWord::TURNTABLE_MOTOR, ActuatorWord::empty()]
    );
}

#[tokio::test(start_paused = true)]
async fn drill_runs_one_full_stroke() {
    let bus = ScriptedFieldbus::new([
        SensorWord::DRILL_UP,
        SensorWord::empty(),
        SensorWord::DRILL_DOWN,
        SensorWord::DRILL_UP,
    ]);
    let io = gateway(&bus);
    let drill = Drill {
        poll_interval: ms(50),
        dwell: ms(300),
        timeout: None,
    };

    assert_eq!(drill.run(&io).await.unwrap(), Completion::DrillDone);

    let cutting =
        ActuatorWord::DRILL_LOWER | ActuatorWord::CLAMP_WORKPIECE | ActuatorWord::DRILL_MOTOR;
    assert_eq!(
        bus.writes(),
        vec![
            ActuatorWord::DRILL_RAISE,
            ActuatorWord::empty(),
            cutting,
            ActuatorWord::CLAMP_WORKPIECE | ActuatorWord::DRILL_MOTOR,
            ActuatorWord::CLAMP_WORKPIECE | ActuatorWord::DRILL_MOTOR | ActuatorWord::DRILL_RAISE,
            ActuatorWord::empty(),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn drill_stops_lowering_before_the_dwell() {
    let bus = ScriptedFieldbus::new([
        SensorWord::DRILL_UP,
        SensorWord::empty(),
        SensorWord::DRILL_DOWN,
        SensorWord::DRILL_UP,
    ]);
    let io = gateway(&bus);
    let drill = Drill {
        poll_interval: ms(50),
        dwell: ms(300),
        timeout: None,
    };

    // Bottom is seen at 150 ms, the dwell lasts until 450 ms.
    let (reply, mid_dwell) = tokio::join!(drill.run(&io), async {
        tokio::time::sleep(ms(300)).await;
        bus.outputs()
    });

    assert_eq!(reply.unwrap(), Completion::DrillDone);
    assert_eq!(
        mid_dwell,
        ActuatorWord::CLAMP_WORKPIECE | ActuatorWord::DRILL_MOTOR
    );
    assert_eq!(bus.outputs(), ActuatorWord::empty());
}

#[tokio::test(start_paused = true)]
async fn stuck_drill_reports_mechanical_fault() {
    let bus = ScriptedFieldbus::steady(SensorWord::empty());
    let io = gateway(&bus);
    let drill = Drill {
        poll_interval: ms(50),
        dwell: ms(300),
        timeout: Some(ms(300)),
    };

    let err = drill.run(&io).await.unwrap_err();
    assert_eq!(
        err,
        CellError::MechanicalFault {
            station: Station::Drill,
            waiting_for: Wait::set(Sensor::DrillUp),
            timeout: ms(300),
        }
    );
    assert_eq!(bus.input_reads(), 6);
}

#[tokio::test(start_paused = true)]
async fn ejector_holds_for_fixed_time() {
    let bus = ScriptedFieldbus::steady(SensorWord::empty());
    let io = gateway(&bus);

    let started = Instant::now();
    let reply = Ejector { hold: ms(400) }.run(&io).await.unwrap();

    assert_eq!(reply, Completion::EjectorDone);
    assert!(started.elapsed() >= ms(400));
    assert_eq!(bus.input_reads(), 0);
    assert_eq!(
        bus.writes(),
        vec![ActuatorWord::EJECTOR_EXTEND, ActuatorWord::empty()]
    );
}

#[tokio::test(start_paused = true)]
async fn worker_replies_once_per_command() {
    let bus = ScriptedFieldbus::steady(SensorWord::empty());
    let io = Arc::new(gateway(&bus));
    let shutdown = Shutdown::new();
    let (mut dispatcher, ends) = dispatch::channels(shutdown.clone());

    let worker = tokio::spawn(
        StationWorker::new(inspector(), io, ends.inspector, ends.replies, shutdown).run(),
    );

    dispatcher.command(Station::Inspector).await.unwrap();
    dispatcher.expect(Completion::InspectorDone).await.unwrap();
    dispatcher.command(Station::Inspector).await.unwrap();
    dispatcher.expect(Completion::InspectorDone).await.unwrap();

    assert_eq!(dispatcher.close(), 0);
    assert_eq!(worker.await.unwrap(), 2);
}

#[tokio::test(start_paused = true)]
async fn worker_io_error_triggers_shutdown_without_reply() {
    let bus = ScriptedFieldbus::steady(SensorWord::empty());
    bus.fail_writes(true);
    let io = Arc::new(gateway(&bus));
    let shutdown = Shutdown::new();
    let (mut dispatcher, ends) = dispatch::channels(shutdown.clone());

    let worker = tokio::spawn(
        StationWorker::new(
            Ejector { hold: ms(400) },
            io,
            ends.ejector,
            ends.replies,
            shutdown.clone(),
        )
        .run(),
    );

    dispatcher.command(Station::Ejector).await.unwrap();
    assert_eq!(dispatcher.recv().await.unwrap_err(), CellError::Halted);
    assert_eq!(worker.await.unwrap(), 0);

    let reason = shutdown.reason().unwrap();
    assert_eq!(reason.origin, Origin::Station(Station::Ejector));
    assert_eq!(reason.error.as_label(), "io");
    assert_eq!(dispatcher.close(), 0);
}

#[tokio::test(start_paused = true)]
async fn cancelled_worker_abandons_its_sequence() {
    let bus = ScriptedFieldbus::steady(SensorWord::empty());
    let io = Arc::new(gateway(&bus));
    let shutdown = Shutdown::new();
    let (dispatcher, ends) = dispatch::channels(shutdown.clone());

    let worker = tokio::spawn(
        StationWorker::new(
            Turntable {
                poll_interval: ms(50),
                settle: ms(100),
                timeout: None,
            },
            io,
            ends.turntable,
            ends.replies,
            shutdown.clone(),
        )
        .run(),
    );

    // The table never returns to position; only cancellation ends the wait.
    dispatcher.command(Station::Turntable).await.unwrap();
    tokio::time::sleep(ms(500)).await;
    shutdown.request_stop();

    assert_eq!(worker.await.unwrap(), 0);
    assert!(!shutdown.is_halted());
    assert_eq!(bus.writes(), vec![ActuatorWord::TURNTABLE_MOTOR]);
}
