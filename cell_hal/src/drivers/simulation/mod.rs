//! Simulation driver module.
//!
//! A software model of the rotary cell behind the `Fieldbus` trait, for
//! running the controller without hardware.

mod driver;
mod plant;

pub use driver::{SimulationFieldbus, SimulationHandle};
pub use plant::{CellPlant, Part, PlantStats, PlantTiming, Slot};

use cell_common::config::CellConfig;
use cell_common::fieldbus::Fieldbus;
use std::sync::Arc;

/// Factory function to create a simulation driver from the `[simulation]`
/// section.
pub fn create_driver(config: &CellConfig) -> Arc<dyn Fieldbus> {
    Arc::new(SimulationFieldbus::new(&config.simulation))
}
