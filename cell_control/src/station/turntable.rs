//! Turntable: index the table by one position.

use super::{StationSequence, Wait, poll_until};
use crate::error::CellError;
use crate::gateway::IoGateway;
use crate::message::{Completion, Station};
use cell_common::config::TimingConfig;
use cell_common::io::{ActuatorWord, Sensor};
use std::time::Duration;
use tokio::time::sleep;

#[derive(Debug, Clone)]
pub struct Turntable {
    pub poll_interval: Duration,
    /// Seating delay after the table is back in position.
    pub settle: Duration,
    pub timeout: Option<Duration>,
}

impl Turntable {
    pub fn from_timing(timing: &TimingConfig) -> Self {
        Self {
            poll_interval: timing.poll_interval(),
            settle: timing.turntable_settle(),
            timeout: timing.mechanical_timeout(),
        }
    }
}

impl StationSequence for Turntable {
    const STATION: Station = Station::Turntable;

    async fn run(&self, io: &IoGateway) -> Result<Completion, CellError> {
        let in_position = Sensor::TurntableInPosition;

        io.set(ActuatorWord::TURNTABLE_MOTOR).await?;
        // Left home, then locked in the next position.
        poll_until(io, Self::STATION, Wait::clear(in_position), self.poll_interval, self.timeout).await?;
        poll_until(io, Self::STATION, Wait::set(in_position), self.poll_interval, self.timeout).await?;
        io.reset(ActuatorWord::TURNTABLE_MOTOR).await?;

        sleep(self.settle).await;
        Ok(Completion::TurntableDone)
    }
}
