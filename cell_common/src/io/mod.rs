//! Digital I/O of the cell.
//!
//! - [`signal`] - Named sensor/actuator enums with the wire bit table
//! - [`word`] - `SensorWord` / `ActuatorWord` bitflag snapshots and `WriteOp`

pub mod signal;
pub mod word;

pub use signal::{Actuator, Sensor};
pub use word::{ActuatorWord, SensorWord, WriteOp};
