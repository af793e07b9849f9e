//! System-wide constants for the cell workspace.
//!
//! Single source of truth for word widths, default node names and timing
//! defaults. Imported by all crates.

/// Width of the digital input and output words exchanged with the node [bits].
pub const WORD_BITS: u32 = 16;

/// Number of sensor bits in use on the input word (bits 0..=6).
pub const SENSOR_COUNT: usize = 7;

/// Number of actuator bits in use on the output word (bits 0..=7).
pub const ACTUATOR_COUNT: usize = 8;

/// Default fieldbus node the cell connects to.
pub const DEFAULT_NODE_ID: &str = "MODBUS-NODE";

/// Default fieldbus driver name.
pub const DEFAULT_DRIVER: &str = "simulation";

/// Default configuration file path.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/cell/cell.toml";

/// Default sensor polling interval [ms].
pub const POLL_INTERVAL_MS: u64 = 50;

/// Default output settle delay after a register write [ms].
pub const WRITE_SETTLE_MS: u64 = 1;
