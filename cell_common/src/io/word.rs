//! Digital word snapshots.
//!
//! `SensorWord` and `ActuatorWord` are immutable bitflag snapshots of the
//! node's input and output registers. Reserved bits above the named
//! signals are dropped on decode.

use bitflags::bitflags;
use core::fmt;

use super::signal::{Actuator, Sensor};

bitflags! {
    /// Snapshot of the digital input word (bits 0..=6).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct SensorWord: u16 {
        const WORKPIECE_AT_TURNTABLE    = Sensor::WorkpieceAtTurntable.mask();
        const WORKPIECE_AT_DRILL        = Sensor::WorkpieceAtDrill.mask();
        const WORKPIECE_AT_INSPECTOR    = Sensor::WorkpieceAtInspector.mask();
        const DRILL_UP                  = Sensor::DrillUp.mask();
        const DRILL_DOWN                = Sensor::DrillDown.mask();
        const TURNTABLE_IN_POSITION     = Sensor::TurntableInPosition.mask();
        const INSPECTOR_REJECT_DETECTED = Sensor::InspectorRejectDetected.mask();
    }
}

impl SensorWord {
    /// Mask of all workpiece presence sensors.
    pub const ANY_WORKPIECE: Self = Self::from_bits_truncate(
        Self::WORKPIECE_AT_TURNTABLE.bits()
            | Self::WORKPIECE_AT_DRILL.bits()
            | Self::WORKPIECE_AT_INSPECTOR.bits(),
    );

    /// Decode a raw input word, ignoring reserved bits.
    #[inline]
    pub const fn from_raw(raw: u16) -> Self {
        Self::from_bits_truncate(raw)
    }

    /// Whether the given sensor is active.
    #[inline]
    pub const fn is_set(&self, sensor: Sensor) -> bool {
        self.bits() & sensor.mask() != 0
    }

    /// Whether a part is present anywhere on the table.
    #[inline]
    pub const fn any_workpiece(&self) -> bool {
        self.intersects(Self::ANY_WORKPIECE)
    }

    /// Active sensors in wire order.
    pub fn active(&self) -> impl Iterator<Item = Sensor> + '_ {
        Sensor::ALL.into_iter().filter(|s| self.is_set(*s))
    }
}

impl From<Sensor> for SensorWord {
    fn from(sensor: Sensor) -> Self {
        Self::from_bits_truncate(sensor.mask())
    }
}

impl fmt::Display for SensorWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_names(f, self.active().map(Sensor::name))
    }
}

bitflags! {
    /// Snapshot (or write mask) of the digital output word (bits 0..=7).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ActuatorWord: u16 {
        const DRILL_MOTOR      = Actuator::DrillMotor.mask();
        const TURNTABLE_MOTOR  = Actuator::TurntableMotor.mask();
        const DRILL_LOWER      = Actuator::DrillLower.mask();
        const DRILL_RAISE      = Actuator::DrillRaise.mask();
        const CLAMP_WORKPIECE  = Actuator::ClampWorkpiece.mask();
        const INSPECTOR_EXTEND = Actuator::InspectorExtend.mask();
        const EJECTOR_EXTEND   = Actuator::EjectorExtend.mask();
        const EJECTOR_RETRACT  = Actuator::EjectorRetract.mask();
    }
}

impl ActuatorWord {
    /// Decode a raw output word, ignoring reserved bits.
    #[inline]
    pub const fn from_raw(raw: u16) -> Self {
        Self::from_bits_truncate(raw)
    }

    /// Whether the given actuator is energized.
    #[inline]
    pub const fn is_set(&self, actuator: Actuator) -> bool {
        self.bits() & actuator.mask() != 0
    }

    /// Apply a write mask: `Set` ORs it in, `Reset` clears it.
    #[inline]
    #[must_use]
    pub const fn apply(self, mask: Self, op: WriteOp) -> Self {
        match op {
            WriteOp::Set => self.union(mask),
            WriteOp::Reset => self.difference(mask),
        }
    }

    /// Energized actuators in wire order.
    pub fn active(&self) -> impl Iterator<Item = Actuator> + '_ {
        Actuator::ALL.into_iter().filter(|a| self.is_set(*a))
    }
}

impl From<Actuator> for ActuatorWord {
    fn from(actuator: Actuator) -> Self {
        Self::from_bits_truncate(actuator.mask())
    }
}

impl fmt::Display for ActuatorWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_names(f, self.active().map(Actuator::name))
    }
}

/// Read-modify-write operation on the output word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WriteOp {
    /// `current |= mask`
    Set,
    /// `current &= !mask`
    Reset,
}

impl fmt::Display for WriteOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Set => f.write_str("set"),
            Self::Reset => f.write_str("reset"),
        }
    }
}

fn write_names<'a>(
    f: &mut fmt::Formatter<'_>,
    names: impl Iterator<Item = &'a str>,
) -> fmt::Result {
    f.write_str("{")?;
    for (idx, name) in names.enumerate() {
        if idx > 0 {
            f.write_str(", ")?;
        }
        f.write_str(name)?;
    }
    f.write_str("}")
}
