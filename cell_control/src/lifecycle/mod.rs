//! Startup homing and teardown.

pub mod homing;
pub mod shutdown;

pub use homing::{Homing, HomingReport};
pub use shutdown::Shutdown;
