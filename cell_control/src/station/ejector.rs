//! Ejector: push the finished part off the table.
//!
//! There is no ejector sensor. The stroke is a fixed hold long enough to
//! clear heavier parts.

use super::StationSequence;
use crate::error::CellError;
use crate::gateway::IoGateway;
use crate::message::{Completion, Station};
use cell_common::config::TimingConfig;
use cell_common::io::ActuatorWord;
use std::time::Duration;
use tokio::time::sleep;

#[derive(Debug, Clone)]
pub struct Ejector {
    pub hold: Duration,
}

impl Ejector {
    pub fn from_timing(timing: &TimingConfig) -> Self {
        Self {
            hold: timing.ejector_hold(),
        }
    }
}

impl StationSequence for Ejector {
    const STATION: Station = Station::Ejector;

    async fn run(&self, io: &IoGateway) -> Result<Completion, CellError> {
        io.set(ActuatorWord::EJECTOR_EXTEND).await?;
        sleep(self.hold).await;
        io.reset(ActuatorWord::EJECTOR_EXTEND).await?;
        Ok(Completion::EjectorDone)
    }
}
