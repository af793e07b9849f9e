//! # Cell HAL Library
//!
//! Fieldbus drivers for the rotary drilling cell. Drivers implement the
//! `Fieldbus` trait defined in `cell_common::fieldbus`.
//!
//! # Module Structure
//!
//! - [`driver_registry`] - Driver factory registration
//! - [`drivers`] - Fieldbus driver implementations
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      cell_hal                                │
//! │  ┌─────────────────┐         ┌────────────────────────────┐  │
//! │  │ DriverRegistry  │──name──►│ Arc<dyn Fieldbus>          │  │
//! │  └─────────────────┘         └─────────────┬──────────────┘  │
//! │                                            │                 │
//! │                                            ▼                 │
//! │                              ┌────────────────────────────┐  │
//! │                              │ SimulationFieldbus         │  │
//! │                              │   └─ CellPlant (model)     │  │
//! │                              └────────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```

#![deny(missing_docs)]

pub mod driver_registry;
pub mod drivers;

pub use crate::driver_registry::DriverRegistry;
pub use crate::drivers::register_all_drivers;
