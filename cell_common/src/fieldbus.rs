//! Fieldbus driver contract and error types.
//!
//! This module defines:
//! - `Fieldbus` trait - Interface for pluggable fieldbus drivers
//! - `FieldbusError` enum - Error types for bus operations
//! - `Channel` enum - Register bank addressed by a read/write
//! - `FieldbusFactory` type alias - Factory function type
//! - `FieldbusDiagnostics` - Optional driver counters

use crate::config::CellConfig;
use core::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Register bank of a fieldbus node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Digital input word (sensors). Read-only.
    DigitalIn,
    /// Digital output word (actuators).
    DigitalOut,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DigitalIn => f.write_str("DIGITAL_IN"),
            Self::DigitalOut => f.write_str("DIGITAL_OUT"),
        }
    }
}

/// Error types for fieldbus operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldbusError {
    /// Node could not be reached at connect time.
    #[error("cannot connect to node {0}")]
    ConnectFailed(String),

    /// Bus call issued without an open connection.
    #[error("not connected")]
    NotConnected,

    /// Transport failure during a read or write.
    #[error("fieldbus communication error: {0}")]
    Communication(String),

    /// Write attempted on a read-only channel.
    #[error("channel {0} is read-only")]
    ReadOnlyChannel(Channel),

    /// Driver not found in the registry.
    #[error("fieldbus driver not found: {0}")]
    DriverNotFound(String),
}

/// Factory function type for creating driver instances from the loaded
/// configuration.
pub type FieldbusFactory = fn(&CellConfig) -> Arc<dyn Fieldbus>;

/// Optional driver diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldbusDiagnostics {
    /// Successful reads since creation.
    pub reads: u64,
    /// Successful writes since creation.
    pub writes: u64,
    /// Driver-specific counters, in a stable order.
    pub custom: Vec<(&'static str, u64)>,
}

impl FieldbusDiagnostics {
    /// Look up a driver-specific counter.
    pub fn counter(&self, name: &str) -> Option<u64> {
        self.custom
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| *value)
    }
}

/// Trait defining the interface for fieldbus drivers.
///
/// The cell shares one driver instance between all of its tasks, so every
/// operation takes `&self`; drivers synchronize internally. Reads are not
/// ordered against writes issued by other tasks.
///
/// # Lifecycle
///
/// 1. `connect()` - Called once before any read/write
/// 2. `read()` / `write()` - Called from any task
/// 3. `disconnect()` - Called once on teardown; must be idempotent
pub trait Fieldbus: Send + Sync {
    /// Returns the driver's unique identifier (e.g., "simulation").
    fn name(&self) -> &'static str;

    /// Open the connection to `node_id`.
    ///
    /// # Errors
    /// Return `FieldbusError::ConnectFailed` if the node is unreachable.
    fn connect(&self, node_id: &str) -> Result<(), FieldbusError>;

    /// Read one digital word. Non-blocking.
    fn read(&self, channel: Channel) -> Result<u16, FieldbusError>;

    /// Write one digital word.
    ///
    /// # Errors
    /// `FieldbusError::ReadOnlyChannel` for [`Channel::DigitalIn`].
    fn write(&self, channel: Channel, word: u16) -> Result<(), FieldbusError>;

    /// Close the connection. Safe to call more than once.
    fn disconnect(&self);

    /// Get driver-specific diagnostics.
    /// Default: None
    fn diagnostics(&self) -> Option<FieldbusDiagnostics> {
        None
    }
}
