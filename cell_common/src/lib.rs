//! Cell Common Library
//!
//! Shared types for all crates of the rotary drilling cell workspace.
//!
//! # Module Structure
//!
//! - [`io`] - Sensor/actuator bit tables and the digital word types
//! - [`fieldbus`] - Fieldbus driver contract and error type
//! - [`config`] - Configuration loading traits and the cell configuration
//! - [`consts`] - Workspace-wide constants
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use cell_common::prelude::*;
//!
//! let word = SensorWord::from_bits_truncate(0b0000_0010);
//! assert!(word.contains(SensorWord::WORKPIECE_AT_DRILL));
//! ```

pub mod config;
pub mod consts;
pub mod fieldbus;
pub mod io;
pub mod prelude;
