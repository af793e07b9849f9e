//! Drill: one full drilling stroke over the part in the drill position.

use super::{StationSequence, Wait, poll_until};
use crate::error::CellError;
use crate::gateway::IoGateway;
use crate::message::{Completion, Station};
use cell_common::config::TimingConfig;
use cell_common::io::{ActuatorWord, Sensor};
use std::time::Duration;
use tokio::time::sleep;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct Drill {
    pub poll_interval: Duration,
    /// Hold time at the bottom of the stroke.
    pub dwell: Duration,
    pub timeout: Option<Duration>,
}

impl Drill {
    pub fn from_timing(timing: &TimingConfig) -> Self {
        Self {
            poll_interval: timing.poll_interval(),
            dwell: timing.drill_dwell(),
            timeout: timing.mechanical_timeout(),
        }
    }

    async fn wait(&self, io: &IoGateway, wait: Wait) -> Result<u32, CellError> {
        poll_until(io, Station::Drill, wait, self.poll_interval, self.timeout).await
    }
}

impl StationSequence for Drill {
    const STATION: Station = Station::Drill;

    async fn run(&self, io: &IoGateway) -> Result<Completion, CellError> {
        let cutting =
            ActuatorWord::DRILL_LOWER | ActuatorWord::CLAMP_WORKPIECE | ActuatorWord::DRILL_MOTOR;

        io.set(ActuatorWord::DRILL_RAISE).await?;
        self.wait(io, Wait::set(Sensor::DrillUp)).await?;
        io.reset(ActuatorWord::DRILL_RAISE).await?;

        io.set(cutting).await?;
        self.wait(io, Wait::set(Sensor::DrillDown)).await?;
        io.reset(ActuatorWord::DRILL_LOWER).await?;
        debug!("drill: at bottom, dwell {:?}", self.dwell);
        sleep(self.dwell).await;

        io.set(ActuatorWord::DRILL_RAISE).await?;
        self.wait(io, Wait::set(Sensor::DrillUp)).await?;
        io.reset(ActuatorWord::DRILL_RAISE | ActuatorWord::DRILL_MOTOR | ActuatorWord::CLAMP_WORKPIECE)
            .await?;

        Ok(Completion::DrillDone)
    }
}
