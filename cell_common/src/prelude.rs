//! Prelude module for common re-exports.
//!
//! ```rust
//! use cell_common::prelude::*;
//! ```

// ─── Logging ────────────────────────────────────────────────────────
pub use crate::config::LogLevel;

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{
    CellConfig, ConfigError, ConfigLoader, FieldbusConfig, SharedConfig, SupervisorConfig,
    TimingConfig,
};

// ─── I/O ────────────────────────────────────────────────────────────
pub use crate::io::{Actuator, ActuatorWord, Sensor, SensorWord, WriteOp};

// ─── Fieldbus ───────────────────────────────────────────────────────
pub use crate::fieldbus::{
    Channel, Fieldbus, FieldbusDiagnostics, FieldbusError, FieldbusFactory,
};
