//! Exclusive-access wrapper around the cell's digital I/O words.
//!
//! Output writes are a read-modify-write of the whole actuator register,
//! serialized by one async mutex. The lock stays held through the settle
//! delay, so no other writer can observe an unsettled readback. Input reads
//! are not synchronized against writes.

use crate::error::CellError;
use cell_common::fieldbus::{Channel, Fieldbus};
use cell_common::io::{ActuatorWord, SensorWord, WriteOp};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, warn};

pub struct IoGateway {
    bus: Arc<dyn Fieldbus>,
    write_lock: Mutex<()>,
    settle: Duration,
}

impl IoGateway {
    /// Wrap a connected fieldbus. `settle` is held under the lock after
    /// every output write.
    pub fn new(bus: Arc<dyn Fieldbus>, settle: Duration) -> Self {
        Self {
            bus,
            write_lock: Mutex::new(()),
            settle,
        }
    }

    pub fn bus(&self) -> &Arc<dyn Fieldbus> {
        &self.bus
    }

    pub fn settle(&self) -> Duration {
        self.settle
    }

    /// Snapshot of the input word.
    pub fn read_inputs(&self) -> Result<SensorWord, CellError> {
        let raw = self.bus.read(Channel::DigitalIn)?;
        Ok(SensorWord::from_raw(raw))
    }

    /// Output word as the bus reports it.
    pub fn read_outputs(&self) -> Result<ActuatorWord, CellError> {
        let raw = self.bus.read(Channel::DigitalOut)?;
        Ok(ActuatorWord::from_raw(raw))
    }

    /// Set or reset `mask` in the output word. Returns the word written.
    ///
    /// The guard is dropped on every exit path, including errors and
    /// cancellation of the calling future.
    pub async fn write_outputs(
        &self,
        mask: ActuatorWord,
        op: WriteOp,
    ) -> Result<ActuatorWord, CellError> {
        let _guard = self.write_lock.lock().await;

        let current = self.read_outputs()?;
        let next = current.apply(mask, op);
        self.bus.write(Channel::DigitalOut, next.bits())?;
        debug!("DO {:?} {} -> {}", op, mask, next);

        if !self.settle.is_zero() {
            tokio::time::sleep(self.settle).await;
        }
        Ok(next)
    }

    #[inline]
    pub async fn set(&self, mask: ActuatorWord) -> Result<ActuatorWord, CellError> {
        self.write_outputs(mask, WriteOp::Set).await
    }

    #[inline]
    pub async fn reset(&self, mask: ActuatorWord) -> Result<ActuatorWord, CellError> {
        self.write_outputs(mask, WriteOp::Reset).await
    }

    /// Clear every actuator bit. Used by teardown; a failure is only logged
    /// by the caller.
    pub async fn all_stop(&self) -> Result<(), CellError> {
        let _guard = self.write_lock.lock().await;
        if let Err(e) = self.bus.write(Channel::DigitalOut, ActuatorWord::empty().bits()) {
            warn!("all-stop write failed: {e}");
            return Err(e.into());
        }
        debug!("DO all-stop");
        Ok(())
    }
}
