//! Configuration loading traits and types.
//!
//! This module provides the cell configuration (`CellConfig`) and a
//! standardized way to load TOML configuration files.
//!
//! # Usage
//!
//! ```rust,no_run
//! use cell_common::config::{CellConfig, ConfigError, ConfigLoader};
//! use std::path::Path;
//!
//! fn main() -> Result<(), ConfigError> {
//!     let config = CellConfig::load(Path::new("cell.toml"))?;
//!     config.validate()?;
//!     println!("Service: {}", config.shared.service_name);
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::consts::{DEFAULT_DRIVER, DEFAULT_NODE_ID, POLL_INTERVAL_MS, WRITE_SETTLE_MS};

/// Error type for configuration loading operations.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Configuration file not found at specified path.
    #[error("Configuration file not found")]
    FileNotFound,

    /// TOML parsing failed.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Semantic validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

/// Log level for application logging.
///
/// Uses lowercase serde values for TOML compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Most verbose, detailed tracing information.
    Trace,
    /// Debug information useful during development.
    Debug,
    /// General information about application operation.
    #[default]
    Info,
    /// Warning messages for potentially problematic situations.
    Warn,
    /// Error messages for serious problems.
    Error,
}

impl LogLevel {
    /// Directive string understood by `tracing_subscriber::EnvFilter`.
    pub const fn as_directive(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Common configuration fields.
///
/// # TOML Example
///
/// ```toml
/// [shared]
/// log_level = "debug"
/// service_name = "cell-01"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SharedConfig {
    /// Logging verbosity level.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Application instance identifier.
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

fn default_service_name() -> String {
    "cell".to_string()
}

impl Default for SharedConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::default(),
            service_name: default_service_name(),
        }
    }
}

impl SharedConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if `service_name` is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service_name.is_empty() {
            return Err(ConfigError::ValidationError(
                "service_name cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Fieldbus connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FieldbusConfig {
    /// Registered driver name.
    pub driver: String,
    /// Node identifier passed to `Fieldbus::connect`.
    pub node_id: String,
}

impl Default for FieldbusConfig {
    fn default() -> Self {
        Self {
            driver: DEFAULT_DRIVER.to_string(),
            node_id: DEFAULT_NODE_ID.to_string(),
        }
    }
}

/// Station timing. All values in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TimingConfig {
    /// Sensor polling interval of every wait loop.
    pub poll_interval_ms: u64,
    /// Settle delay held under the write lock after each output write.
    pub write_settle_ms: u64,
    /// Seating delay after the turntable reached its index position.
    pub turntable_settle_ms: u64,
    /// How long the ejector stays extended.
    pub ejector_hold_ms: u64,
    /// Number of reject-bit polls before the inspector resolves "pass".
    pub inspector_polls: u32,
    /// Retract delay after the inspector probe is released.
    pub inspector_settle_ms: u64,
    /// Dwell at the bottom of the drill stroke.
    pub drill_dwell_ms: u64,
    /// Bound on turntable/drill sensor waits. `None` waits forever.
    pub mechanical_timeout_ms: Option<u64>,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: POLL_INTERVAL_MS,
            write_settle_ms: WRITE_SETTLE_MS,
            turntable_settle_ms: 100,
            ejector_hold_ms: 400,
            inspector_polls: 4,
            inspector_settle_ms: 100,
            drill_dwell_ms: 300,
            mechanical_timeout_ms: None,
        }
    }
}

impl TimingConfig {
    #[inline]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    #[inline]
    pub fn write_settle(&self) -> Duration {
        Duration::from_millis(self.write_settle_ms)
    }

    #[inline]
    pub fn turntable_settle(&self) -> Duration {
        Duration::from_millis(self.turntable_settle_ms)
    }

    #[inline]
    pub fn ejector_hold(&self) -> Duration {
        Duration::from_millis(self.ejector_hold_ms)
    }

    #[inline]
    pub fn inspector_settle(&self) -> Duration {
        Duration::from_millis(self.inspector_settle_ms)
    }

    #[inline]
    pub fn drill_dwell(&self) -> Duration {
        Duration::from_millis(self.drill_dwell_ms)
    }

    #[inline]
    pub fn mechanical_timeout(&self) -> Option<Duration> {
        self.mechanical_timeout_ms.map(Duration::from_millis)
    }

    /// Validate the timing values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::ValidationError(
                "timing.poll_interval_ms must be > 0".to_string(),
            ));
        }
        if self.inspector_polls == 0 {
            return Err(ConfigError::ValidationError(
                "timing.inspector_polls must be > 0".to_string(),
            ));
        }
        if self.mechanical_timeout_ms == Some(0) {
            return Err(ConfigError::ValidationError(
                "timing.mechanical_timeout_ms must be > 0 when set".to_string(),
            ));
        }
        Ok(())
    }
}

/// Supervisor loop settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SupervisorConfig {
    /// Stop cleanly after this many cycles. `None` runs until halted.
    pub max_cycles: Option<u64>,
    /// Stop cleanly after this many consecutive idle cycles (empty cell).
    pub idle_limit: Option<u64>,
}

/// Settings of the `simulation` fieldbus driver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Feed pattern, one character per part: `g` good, `b` defective.
    pub parts: String,
    /// Delay before the next part arrives in an empty load position.
    pub feed_delay_ms: u64,
    /// Time from motor start until the table leaves its index position.
    pub leave_home_ms: u64,
    /// Time from motor start until the table locks in the next position.
    pub index_ms: u64,
    /// Full stroke time of the drill head.
    pub drill_travel_ms: u64,
    /// Time the inspector needs to detect a defective part.
    pub probe_ms: u64,
    /// Delay before a written output word reads back [µs].
    pub output_latency_us: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            parts: "gggbgg".to_string(),
            feed_delay_ms: 300,
            leave_home_ms: 100,
            index_ms: 600,
            drill_travel_ms: 250,
            probe_ms: 80,
            output_latency_us: 500,
        }
    }
}

impl SimulationConfig {
    /// Validate the simulation parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(c) = self.parts.chars().find(|c| !matches!(c, 'g' | 'b')) {
            return Err(ConfigError::ValidationError(format!(
                "simulation.parts: unexpected {c:?}, expected 'g' or 'b'"
            )));
        }
        if self.leave_home_ms >= self.index_ms {
            return Err(ConfigError::ValidationError(
                "simulation.leave_home_ms must be < simulation.index_ms".to_string(),
            ));
        }
        Ok(())
    }
}

/// Complete configuration of one cell process.
///
/// Every section has defaults, so an empty file is a valid configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CellConfig {
    pub shared: SharedConfig,
    pub fieldbus: FieldbusConfig,
    pub timing: TimingConfig,
    pub supervisor: SupervisorConfig,
    pub simulation: SimulationConfig,
}

impl CellConfig {
    /// Validate all sections.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;
        if self.fieldbus.node_id.is_empty() {
            return Err(ConfigError::ValidationError(
                "fieldbus.node_id cannot be empty".to_string(),
            ));
        }
        self.timing.validate()?;
        self.simulation.validate()
    }

    /// Pick the file to load: an explicit path always wins, otherwise
    /// `fallback` is used only if it exists. `None` means built-in defaults.
    pub fn resolve_path<'a>(explicit: Option<&'a Path>, fallback: &'a Path) -> Option<&'a Path> {
        explicit.or_else(|| fallback.is_file().then_some(fallback))
    }
}

/// Trait for loading configuration from TOML files.
///
/// # Contract
///
/// - Returns `ConfigError::FileNotFound` if the file does not exist
/// - Returns `ConfigError::ParseError` if TOML syntax is invalid
pub trait ConfigLoader: Sized + serde::de::DeserializeOwned {
    /// Load configuration from a TOML file.
    fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound
            } else {
                ConfigError::ParseError(e.to_string())
            }
        })?;

        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

// Blanket implementation for all types that implement DeserializeOwned.
impl<T: serde::de::DeserializeOwned> ConfigLoader for T {}
