//! Named sensor and actuator signals.
//!
//! Each signal maps to one fixed bit of the node's digital word. The order
//! of the tables below *is* the wire layout: input bits 0..=6 and output
//! bits 0..=7, ascending. Do not reorder.

use core::fmt;
use core::str::FromStr;
use serde::{Deserialize, Serialize};
use static_assertions::const_assert;

use crate::consts::{ACTUATOR_COUNT, SENSOR_COUNT, WORD_BITS};

// ─── Sensor ─────────────────────────────────────────────────────────

/// Digital input of the cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Sensor {
    /// Part present in the load position of the turntable.
    WorkpieceAtTurntable = 0,
    /// Part present under the drill.
    WorkpieceAtDrill = 1,
    /// Part present under the inspector probe.
    WorkpieceAtInspector = 2,
    /// Drill head at upper end position.
    DrillUp = 3,
    /// Drill head at lower end position.
    DrillDown = 4,
    /// Turntable locked in an index position.
    TurntableInPosition = 5,
    /// Inspector probe reports a defective part.
    InspectorRejectDetected = 6,
}

impl Sensor {
    /// All sensors in wire order.
    pub const ALL: [Sensor; SENSOR_COUNT] = [
        Self::WorkpieceAtTurntable,
        Self::WorkpieceAtDrill,
        Self::WorkpieceAtInspector,
        Self::DrillUp,
        Self::DrillDown,
        Self::TurntableInPosition,
        Self::InspectorRejectDetected,
    ];

    /// Bit position on the input word.
    #[inline]
    pub const fn bit(self) -> u32 {
        self as u32
    }

    /// Single-bit mask on the input word.
    #[inline]
    pub const fn mask(self) -> u16 {
        1 << self.bit()
    }

    /// Stable snake_case name used in logs and configuration.
    pub const fn name(self) -> &'static str {
        match self {
            Self::WorkpieceAtTurntable => "workpiece_at_turntable",
            Self::WorkpieceAtDrill => "workpiece_at_drill",
            Self::WorkpieceAtInspector => "workpiece_at_inspector",
            Self::DrillUp => "drill_up",
            Self::DrillDown => "drill_down",
            Self::TurntableInPosition => "turntable_in_position",
            Self::InspectorRejectDetected => "inspector_reject_detected",
        }
    }
}

impl fmt::Display for Sensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Sensor {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|sensor| sensor.name() == s)
            .ok_or_else(|| format!("unknown sensor: {s:?}"))
    }
}

// ─── Actuator ───────────────────────────────────────────────────────

/// Digital output of the cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Actuator {
    /// Drill spindle motor.
    DrillMotor = 0,
    /// Turntable drive motor.
    TurntableMotor = 1,
    /// Move drill head down.
    DrillLower = 2,
    /// Move drill head up.
    DrillRaise = 3,
    /// Clamp the part under the drill.
    ClampWorkpiece = 4,
    /// Extend the inspector probe.
    InspectorExtend = 5,
    /// Extend the ejector.
    EjectorExtend = 6,
    /// Retract the ejector.
    EjectorRetract = 7,
}

impl Actuator {
    /// All actuators in wire order.
    pub const ALL: [Actuator; ACTUATOR_COUNT] = [
        Self::DrillMotor,
        Self::TurntableMotor,
        Self::DrillLower,
        Self::DrillRaise,
        Self::ClampWorkpiece,
        Self::InspectorExtend,
        Self::EjectorExtend,
        Self::EjectorRetract,
    ];

    /// Bit position on the output word.
    #[inline]
    pub const fn bit(self) -> u32 {
        self as u32
    }

    /// Single-bit mask on the output word.
    #[inline]
    pub const fn mask(self) -> u16 {
        1 << self.bit()
    }

    /// Stable snake_case name used in logs and configuration.
    pub const fn name(self) -> &'static str {
        match self {
            Self::DrillMotor => "drill_motor",
            Self::TurntableMotor => "turntable_motor",
            Self::DrillLower => "drill_lower",
            Self::DrillRaise => "drill_raise",
            Self::ClampWorkpiece => "clamp_workpiece",
            Self::InspectorExtend => "inspector_extend",
            Self::EjectorExtend => "ejector_extend",
            Self::EjectorRetract => "ejector_retract",
        }
    }
}

impl fmt::Display for Actuator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Actuator {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|actuator| actuator.name() == s)
            .ok_or_else(|| format!("unknown actuator: {s:?}"))
    }
}

const_assert!(SENSOR_COUNT as u32 <= WORD_BITS);
const_assert!(ACTUATOR_COUNT as u32 <= WORD_BITS);
