//! Inspector: probe the part and report pass or reject.
//!
//! The reject bit is polled a fixed number of times. The first observation
//! ends the window with a reject. A window that expires without one is a
//! pass, so a part is never held on an ambiguous reading.

use super::StationSequence;
use crate::error::CellError;
use crate::gateway::IoGateway;
use crate::message::{Completion, Station};
use cell_common::config::TimingConfig;
use cell_common::io::{ActuatorWord, Sensor};
use std::time::Duration;
use tokio::time::sleep;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct Inspector {
    pub poll_interval: Duration,
    pub polls: u32,
    /// Retract delay after the probe is released.
    pub settle: Duration,
}

impl Inspector {
    pub fn from_timing(timing: &TimingConfig) -> Self {
        Self {
            poll_interval: timing.poll_interval(),
            polls: timing.inspector_polls,
            settle: timing.inspector_settle(),
        }
    }
}

impl StationSequence for Inspector {
    const STATION: Station = Station::Inspector;

    async fn run(&self, io: &IoGateway) -> Result<Completion, CellError> {
        io.set(ActuatorWord::INSPECTOR_EXTEND).await?;

        let mut reject = false;
        for poll in 1..=self.polls {
            sleep(self.poll_interval).await;
            if io.read_inputs()?.is_set(Sensor::InspectorRejectDetected) {
                debug!("inspector: reject detected on poll {poll}/{}", self.polls);
                reject = true;
                break;
            }
        }

        io.reset(ActuatorWord::INSPECTOR_EXTEND).await?;
        sleep(self.settle).await;

        Ok(if reject {
            Completion::InspectorReject
        } else {
            Completion::InspectorDone
        })
    }
}
