//! Startup homing: park the drill head and clear the table.
//!
//! Uses the same command/reply protocol as the supervisor. On a cell that is
//! already empty with the drill up, homing issues no command and no write.

use crate::dispatch::Dispatcher;
use crate::error::CellError;
use crate::gateway::IoGateway;
use crate::message::{Completion, Station};
use crate::station::{Wait, poll_until};
use cell_common::config::TimingConfig;
use cell_common::io::{ActuatorWord, Sensor, SensorWord};
use serde::Serialize;
use std::time::Duration;
use tracing::info;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HomingReport {
    pub indexes: u64,
    pub ejections: u64,
}

#[derive(Debug, Clone)]
pub struct Homing {
    pub poll_interval: Duration,
    pub timeout: Option<Duration>,
}

impl Homing {
    pub fn from_timing(timing: &TimingConfig) -> Self {
        Self {
            poll_interval: timing.poll_interval(),
            timeout: timing.mechanical_timeout(),
        }
    }

    pub async fn run(
        &self,
        io: &IoGateway,
        dispatcher: &mut Dispatcher,
    ) -> Result<HomingReport, CellError> {
        info!("homing started");
        let mut report = HomingReport::default();

        if !io.read_inputs()?.contains(SensorWord::DRILL_UP) {
            io.set(ActuatorWord::DRILL_RAISE).await?;
            poll_until(
                io,
                Station::Drill,
                Wait::set(Sensor::DrillUp),
                self.poll_interval,
                self.timeout,
            )
            .await?;
            io.reset(ActuatorWord::DRILL_RAISE).await?;
            info!("homing: drill head up");
        }

        loop {
            let sensors = io.read_inputs()?;
            if !sensors.any_workpiece() {
                break;
            }
            let at_drill = sensors.contains(SensorWord::WORKPIECE_AT_DRILL);

            dispatcher.command(Station::Turntable).await?;
            dispatcher.expect(Completion::TurntableDone).await?;
            report.indexes += 1;

            if at_drill {
                dispatcher.command(Station::Ejector).await?;
                dispatcher.expect(Completion::EjectorDone).await?;
                report.ejections += 1;
            }
        }

        info!(
            indexes = report.indexes,
            ejections = report.ejections,
            "homing complete"
        );
        Ok(report)
    }
}
