//! Sensor polling with an optional deadline.

use crate::error::CellError;
use crate::gateway::IoGateway;
use crate::message::Station;
use cell_common::io::Sensor;
use std::fmt;
use std::time::Duration;
use tokio::time::{Instant, sleep};
use tracing::trace;

/// Sensor level a station waits for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Wait {
    pub sensor: Sensor,
    pub active: bool,
}

impl Wait {
    pub const fn set(sensor: Sensor) -> Self {
        Self {
            sensor,
            active: true,
        }
    }

    pub const fn clear(sensor: Sensor) -> Self {
        Self {
            sensor,
            active: false,
        }
    }
}

impl fmt::Display for Wait {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = if self.active { "set" } else { "clear" };
        write!(f, "{} {}", self.sensor.name(), level)
    }
}

/// Poll the input word every `interval` until `wait` holds.
///
/// Each iteration sleeps first, then reads. Without a `timeout` this waits
/// forever; with one it fails with [`CellError::MechanicalFault`] once the
/// deadline passed. Returns the number of reads taken.
pub async fn poll_until(
    io: &IoGateway,
    station: Station,
    wait: Wait,
    interval: Duration,
    timeout: Option<Duration>,
) -> Result<u32, CellError> {
    let deadline = timeout.map(|t| Instant::now() + t);
    let mut polls = 0u32;

    loop {
        sleep(interval).await;
        polls += 1;

        let inputs = io.read_inputs()?;
        if inputs.is_set(wait.sensor) == wait.active {
            trace!("{station}: {wait} after {polls} polls");
            return Ok(polls);
        }

        if let (Some(deadline), Some(timeout)) = (deadline, timeout) {
            if Instant::now() >= deadline {
                return Err(CellError::MechanicalFault {
                    station,
                    waiting_for: wait,
                    timeout,
                });
            }
        }
    }
}
