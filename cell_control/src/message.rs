//! Messages exchanged between the supervisor and the station workers.
//!
//! Commands travel on one bounded queue per station. Completions from all
//! stations share a single inbox and are identified by their tag, never by
//! the queue they arrived on.

use serde::Serialize;
use std::fmt;

/// One of the four physical subsystems with its own worker task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Station {
    Ejector = 0,
    Inspector = 1,
    Drill = 2,
    Turntable = 3,
}

impl Station {
    pub const ALL: [Station; 4] = [
        Station::Ejector,
        Station::Inspector,
        Station::Drill,
        Station::Turntable,
    ];

    /// Dense index, usable for per-station tables.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn name(self) -> &'static str {
        match self {
            Station::Ejector => "ejector",
            Station::Inspector => "inspector",
            Station::Drill => "drill",
            Station::Turntable => "turntable",
        }
    }
}

impl fmt::Display for Station {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Opaque start token sent to a station worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Run one operation cycle now.
    Start,
}

/// Tagged completion reply sent from a worker to the supervisor inbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Completion {
    EjectorDone,
    InspectorDone,
    InspectorReject,
    DrillDone,
    TurntableDone,
}

impl Completion {
    /// Station that produces this reply.
    pub const fn station(self) -> Station {
        match self {
            Completion::EjectorDone => Station::Ejector,
            Completion::InspectorDone | Completion::InspectorReject => Station::Inspector,
            Completion::DrillDone => Station::Drill,
            Completion::TurntableDone => Station::Turntable,
        }
    }

    /// Stable wire/log tag.
    pub const fn tag(self) -> &'static str {
        match self {
            Completion::EjectorDone => "ejector-done",
            Completion::InspectorDone => "inspector-done",
            Completion::InspectorReject => "inspector-reject",
            Completion::DrillDone => "drill-done",
            Completion::TurntableDone => "turntable-done",
        }
    }
}

impl fmt::Display for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}
