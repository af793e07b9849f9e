//! Driver registry for fieldbus drivers.
//!
//! Maps the `fieldbus.driver` config value to a factory. Drivers are built
//! from the full `CellConfig` so each one can read its own section.

use cell_common::config::CellConfig;
use cell_common::fieldbus::{Fieldbus, FieldbusError, FieldbusFactory};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Registry of available fieldbus drivers.
#[derive(Default)]
pub struct DriverRegistry {
    factories: BTreeMap<&'static str, FieldbusFactory>,
}

impl DriverRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with all built-in drivers registered.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        crate::drivers::register_all_drivers(&mut registry);
        registry
    }

    /// Register a driver factory.
    ///
    /// # Panics
    /// Panics if a driver with the same name is already registered.
    pub fn register(&mut self, name: &'static str, factory: FieldbusFactory) {
        if self.factories.insert(name, factory).is_some() {
            panic!("Driver '{name}' is already registered");
        }
    }

    /// Build the driver named by `config.fieldbus.driver`.
    ///
    /// # Errors
    /// Returns `FieldbusError::DriverNotFound` if no such driver is registered.
    pub fn create_driver(&self, config: &CellConfig) -> Result<Arc<dyn Fieldbus>, FieldbusError> {
        let name = config.fieldbus.driver.as_str();
        let factory = self.factories.get(name).ok_or_else(|| {
            FieldbusError::DriverNotFound(format!("{name} (available: {:?})", self.list_drivers()))
        })?;
        debug!("Creating fieldbus driver '{name}'");
        Ok(factory(config))
    }

    /// Registered driver names, sorted.
    pub fn list_drivers(&self) -> Vec<&'static str> {
        self.factories.keys().copied().collect()
    }
}
