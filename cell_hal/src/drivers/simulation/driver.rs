//! Simulation driver implementation.
//!
//! The `SimulationFieldbus` implements the `Fieldbus` trait on top of a
//! [`CellPlant`] model. A cloneable [`SimulationHandle`] gives tests and the
//! binary access to the model (statistics, part placement, fault injection)
//! while the controller owns the driver.

use super::plant::{CellPlant, Part, PlantStats, Slot};
use cell_common::config::SimulationConfig;
use cell_common::fieldbus::{Channel, Fieldbus, FieldbusDiagnostics, FieldbusError};
use cell_common::io::{ActuatorWord, SensorWord};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::time::Instant;
use tracing::{debug, info, warn};

struct Shared {
    plant: Mutex<CellPlant>,
    connected: AtomicBool,
    faulted: AtomicBool,
    reads: AtomicU64,
    writes: AtomicU64,
}

/// Simulation driver implementing the `Fieldbus` trait.
pub struct SimulationFieldbus {
    shared: Arc<Shared>,
}

impl SimulationFieldbus {
    /// Create a driver from the `[simulation]` config section.
    pub fn new(cfg: &SimulationConfig) -> Self {
        Self::with_plant(CellPlant::from_config(cfg, Instant::now()))
    }

    /// Create a driver around a prepared model.
    pub fn with_plant(plant: CellPlant) -> Self {
        Self {
            shared: Arc::new(Shared {
                plant: Mutex::new(plant),
                connected: AtomicBool::new(false),
                faulted: AtomicBool::new(false),
                reads: AtomicU64::new(0),
                writes: AtomicU64::new(0),
            }),
        }
    }

    /// Handle onto the model, usable after the driver was moved into the cell.
    pub fn handle(&self) -> SimulationHandle {
        SimulationHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    fn check_link(&self) -> Result<(), FieldbusError> {
        if self.shared.faulted.load(Ordering::SeqCst) {
            return Err(FieldbusError::Communication(
                "simulated transport fault".to_string(),
            ));
        }
        if !self.shared.connected.load(Ordering::SeqCst) {
            return Err(FieldbusError::NotConnected);
        }
        Ok(())
    }
}

impl Default for SimulationFieldbus {
    fn default() -> Self {
        Self::new(&SimulationConfig::default())
    }
}

impl Fieldbus for SimulationFieldbus {
    fn name(&self) -> &'static str {
        "simulation"
    }

    fn connect(&self, node_id: &str) -> Result<(), FieldbusError> {
        if node_id.is_empty() || self.shared.faulted.load(Ordering::SeqCst) {
            return Err(FieldbusError::ConnectFailed(node_id.to_string()));
        }
        self.shared.connected.store(true, Ordering::SeqCst);
        info!("Simulation fieldbus connected to node '{}'", node_id);
        Ok(())
    }

    fn read(&self, channel: Channel) -> Result<u16, FieldbusError> {
        self.check_link()?;
        self.shared.reads.fetch_add(1, Ordering::Relaxed);

        let now = Instant::now();
        let mut plant = self.shared.plant.lock();
        plant.advance(now);
        let word = match channel {
            Channel::DigitalIn => plant.sensors(now).bits(),
            Channel::DigitalOut => plant.readback().bits(),
        };
        Ok(word)
    }

    fn write(&self, channel: Channel, word: u16) -> Result<(), FieldbusError> {
        if channel == Channel::DigitalIn {
            return Err(FieldbusError::ReadOnlyChannel(channel));
        }
        self.check_link()?;
        self.shared.writes.fetch_add(1, Ordering::Relaxed);

        let outputs = ActuatorWord::from_raw(word);
        debug!("DO <- {:#06x} {}", word, outputs);
        self.shared
            .plant
            .lock()
            .write_outputs(outputs, Instant::now());
        Ok(())
    }

    fn disconnect(&self) {
        if self.shared.connected.swap(false, Ordering::SeqCst) {
            info!("Simulation fieldbus disconnected");
        }
    }

    fn diagnostics(&self) -> Option<FieldbusDiagnostics> {
        let stats = self.shared.plant.lock().stats();
        Some(FieldbusDiagnostics {
            reads: self.shared.reads.load(Ordering::Relaxed),
            writes: self.shared.writes.load(Ordering::Relaxed),
            custom: vec![
                ("indexes", stats.indexes),
                ("drilled", stats.drilled),
                ("drilled_defective", stats.drilled_defective),
                ("ejected", stats.ejected),
                ("ejected_defective", stats.ejected_defective),
                ("dropped", stats.dropped),
                ("empty_ejections", stats.empty_ejections),
            ],
        })
    }
}

/// Cloneable access to a running simulation.
#[derive(Clone)]
pub struct SimulationHandle {
    shared: Arc<Shared>,
}

impl SimulationHandle {
    /// Make every subsequent bus call fail with a communication error.
    pub fn inject_fault(&self) {
        warn!("Simulation: transport fault injected");
        self.shared.faulted.store(true, Ordering::SeqCst);
    }

    /// Clear a previously injected fault.
    pub fn clear_fault(&self) {
        self.shared.faulted.store(false, Ordering::SeqCst);
    }

    /// Whether the driver is currently connected.
    pub fn is_connected(&self) -> bool {
        self.shared.connected.load(Ordering::SeqCst)
    }

    /// Model counters.
    pub fn stats(&self) -> PlantStats {
        self.shared.plant.lock().stats()
    }

    /// Current sensor word, bypassing the bus.
    pub fn sensors(&self) -> SensorWord {
        let now = Instant::now();
        let mut plant = self.shared.plant.lock();
        plant.advance(now);
        plant.sensors(now)
    }

    /// Outputs as physically applied, bypassing the bus.
    pub fn outputs(&self) -> ActuatorWord {
        self.shared.plant.lock().outputs()
    }

    /// Part currently in a slot.
    pub fn part(&self, slot: Slot) -> Option<Part> {
        self.shared.plant.lock().part(slot)
    }

    /// Place (or remove) a part directly in a slot.
    pub fn place(&self, slot: Slot, part: Option<Part>) {
        self.shared.plant.lock().place(slot, part);
    }

    /// Whether every fed part has left the table.
    pub fn is_drained(&self) -> bool {
        self.shared.plant.lock().is_drained()
    }

    /// Number of successful bus reads.
    pub fn read_count(&self) -> u64 {
        self.shared.reads.load(Ordering::Relaxed)
    }
}
