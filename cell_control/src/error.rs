//! Error types of the coordination engine.
//!
//! Every variant is fatal for the whole cell: there is no per-station retry.
//! The first error raised anywhere is recorded as the [`HaltReason`] and
//! triggers teardown.

use crate::message::{Completion, Station};
use crate::station::Wait;
use cell_common::fieldbus::FieldbusError;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Errors raised by the gateway, the workers, the supervisor or homing.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CellError {
    /// Fieldbus unreachable, read or write failure.
    #[error("I/O error: {0}")]
    Io(#[from] FieldbusError),

    /// A bounded sensor wait expired.
    #[error("{station}: mechanical fault, {waiting_for} not reached within {timeout:?}")]
    MechanicalFault {
        station: Station,
        waiting_for: Wait,
        timeout: Duration,
    },

    /// A reply arrived that the current join did not ask for.
    #[error("unexpected reply '{got}' (expected {expected})")]
    UnexpectedReply {
        expected: &'static str,
        got: Completion,
    },

    /// A command queue or the inbox was closed while still in use.
    #[error("{0} channel closed")]
    ChannelClosed(&'static str),

    /// The cell was cancelled while waiting.
    #[error("cell halted")]
    Halted,
}

impl CellError {
    /// Short label for structured logging.
    pub const fn as_label(&self) -> &'static str {
        match self {
            CellError::Io(_) => "io",
            CellError::MechanicalFault { .. } => "mechanical_fault",
            CellError::UnexpectedReply { .. } => "unexpected_reply",
            CellError::ChannelClosed(_) => "channel_closed",
            CellError::Halted => "halted",
        }
    }
}

/// Component that raised a fatal error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Startup,
    Homing,
    Supervisor,
    Station(Station),
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Origin::Startup => f.write_str("startup"),
            Origin::Homing => f.write_str("homing"),
            Origin::Supervisor => f.write_str("supervisor"),
            Origin::Station(station) => write!(f, "{station} worker"),
        }
    }
}

/// First fatal error of a cell, with the component that raised it.
#[derive(Debug, Clone, PartialEq)]
pub struct HaltReason {
    pub origin: Origin,
    pub error: CellError,
}

impl HaltReason {
    pub fn new(origin: Origin, error: CellError) -> Self {
        Self { origin, error }
    }
}

impl fmt::Display for HaltReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.origin, self.error)
    }
}
