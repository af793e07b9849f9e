//! Time-driven model of the rotary cell.
//!
//! The `CellPlant` is evaluated lazily: every bus access calls
//! [`CellPlant::advance`] with the current instant, which applies all
//! mechanical progress since the previous access. Time is taken from
//! `tokio::time::Instant`, so tests with a paused clock are deterministic.
//!
//! ## Table slots
//!
//! | Slot      | Sensor                   | Next slot on index |
//! |-----------|--------------------------|--------------------|
//! | Load      | `workpiece_at_turntable` | Inspector          |
//! | Inspector | `workpiece_at_inspector` | Drill              |
//! | Drill     | `workpiece_at_drill`     | Eject              |
//! | Eject     | (none)                   | output bin/drop    |

use cell_common::config::SimulationConfig;
use cell_common::io::{ActuatorWord, SensorWord};
use std::collections::VecDeque;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, trace};

/// Number of table slots.
pub const SLOT_COUNT: usize = 4;

/// Table position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(usize)]
pub enum Slot {
    /// Load position, fed from the part queue.
    Load = 0,
    /// Under the inspector probe.
    Inspector = 1,
    /// Under the drill.
    Drill = 2,
    /// In front of the ejector (no sensor).
    Eject = 3,
}

/// One workpiece travelling through the cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Part {
    /// Inspector will flag this part.
    pub defective: bool,
    /// Drill reached the bottom of the stroke over this part.
    pub drilled: bool,
}

impl Part {
    /// A good, undrilled part.
    pub const fn good() -> Self {
        Self {
            defective: false,
            drilled: false,
        }
    }

    /// A defective, undrilled part.
    pub const fn defective() -> Self {
        Self {
            defective: true,
            drilled: false,
        }
    }
}

/// Mechanical timing of the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlantTiming {
    /// Motor start until the table leaves its index position.
    pub leave_home: Duration,
    /// Motor start until the table locks in the next position.
    pub index: Duration,
    /// Full drill stroke.
    pub drill_travel: Duration,
    /// Probe contact until the reject bit rises on a defective part.
    pub probe: Duration,
    /// Delay before a written output word reads back.
    pub output_latency: Duration,
    /// Delay before the next part arrives in an empty load slot.
    pub feed_delay: Duration,
}

impl From<&SimulationConfig> for PlantTiming {
    fn from(cfg: &SimulationConfig) -> Self {
        Self {
            leave_home: Duration::from_millis(cfg.leave_home_ms),
            index: Duration::from_millis(cfg.index_ms),
            drill_travel: Duration::from_millis(cfg.drill_travel_ms),
            probe: Duration::from_millis(cfg.probe_ms),
            output_latency: Duration::from_micros(cfg.output_latency_us),
            feed_delay: Duration::from_millis(cfg.feed_delay_ms),
        }
    }
}

impl Default for PlantTiming {
    fn default() -> Self {
        Self::from(&SimulationConfig::default())
    }
}

/// Counters collected by the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlantStats {
    /// Completed table indexes.
    pub indexes: u64,
    /// Parts drilled.
    pub drilled: u64,
    /// Defective parts that were drilled anyway.
    pub drilled_defective: u64,
    /// Parts pushed out by the ejector.
    pub ejected: u64,
    /// Ejected parts that were defective.
    pub ejected_defective: u64,
    /// Parts that left the eject slot without being ejected.
    pub dropped: u64,
    /// Ejector strokes on an empty slot.
    pub empty_ejections: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TableState {
    Locked,
    Indexing { started: Instant },
}

/// Software model of the cell mechanics.
#[derive(Debug)]
pub struct CellPlant {
    timing: PlantTiming,
    slots: [Option<Part>; SLOT_COUNT],
    feed: VecDeque<Part>,
    /// Outputs as physically applied.
    outputs: ActuatorWord,
    /// Outputs as reported by a register read.
    readback: ActuatorWord,
    pending_readback: VecDeque<(Instant, ActuatorWord)>,
    table: TableState,
    /// Drill head depth, `ZERO` = up, `drill_travel` = down.
    drill_depth: Duration,
    probe_since: Option<Instant>,
    next_feed_at: Option<Instant>,
    last_update: Instant,
    stats: PlantStats,
}

impl CellPlant {
    /// Create a model with an empty table and the given feed queue. The
    /// first part arrives `feed_delay` after `now`; the drill head starts
    /// mid-stroke.
    pub fn new(timing: PlantTiming, feed: impl IntoIterator<Item = Part>, now: Instant) -> Self {
        let feed: VecDeque<Part> = feed.into_iter().collect();
        debug!(
            "CellPlant initialized: {} parts queued, timing={:?}",
            feed.len(),
            timing
        );

        let mut plant = Self {
            timing,
            slots: [None; SLOT_COUNT],
            feed,
            outputs: ActuatorWord::empty(),
            readback: ActuatorWord::empty(),
            pending_readback: VecDeque::new(),
            table: TableState::Locked,
            drill_depth: timing.drill_travel / 2,
            probe_since: None,
            next_feed_at: None,
            last_update: now,
            stats: PlantStats::default(),
        };
        plant.schedule_feed(now);
        plant
    }

    /// Build from the simulation config section (`g`/`b` feed pattern).
    pub fn from_config(cfg: &SimulationConfig, now: Instant) -> Self {
        let feed = cfg.parts.chars().map(|c| match c {
            'b' => Part::defective(),
            _ => Part::good(),
        });
        Self::new(PlantTiming::from(cfg), feed, now)
    }

    /// Place (or remove) a part directly in a slot.
    pub fn place(&mut self, slot: Slot, part: Option<Part>) {
        self.slots[slot as usize] = part;
        if slot == Slot::Load && part.is_some() {
            self.next_feed_at = None;
        }
        self.schedule_feed(self.last_update);
    }

    /// Whether the table and the feed queue are both empty.
    pub fn is_drained(&self) -> bool {
        self.feed.is_empty() && self.slots.iter().all(Option::is_none)
    }

    /// Part currently in a slot.
    pub fn part(&self, slot: Slot) -> Option<Part> {
        self.slots[slot as usize]
    }

    /// Move the drill head to its upper end position.
    pub fn park_drill(&mut self) {
        self.drill_depth = Duration::ZERO;
    }

    /// Collected counters.
    pub fn stats(&self) -> PlantStats {
        self.stats
    }

    /// Outputs as physically applied.
    pub fn outputs(&self) -> ActuatorWord {
        self.outputs
    }

    /// Apply all mechanical progress up to `now`.
    pub fn advance(&mut self, now: Instant) {
        let dt = now.saturating_duration_since(self.last_update);
        self.last_update = now;

        self.advance_drill(dt);
        self.advance_table(now);
        self.advance_feed(now);

        while let Some(&(due, word)) = self.pending_readback.front() {
            if due > now {
                break;
            }
            self.readback = word;
            self.pending_readback.pop_front();
        }
    }

    fn advance_drill(&mut self, dt: Duration) {
        let lower = self.outputs.contains(ActuatorWord::DRILL_LOWER);
        let raise = self.outputs.contains(ActuatorWord::DRILL_RAISE);
        match (lower, raise) {
            (true, false) => {
                self.drill_depth = (self.drill_depth + dt).min(self.timing.drill_travel);
            }
            (false, true) => {
                self.drill_depth = self.drill_depth.saturating_sub(dt);
            }
            // Both or neither: head holds position.
            _ => {}
        }

        let cutting = self
            .outputs
            .contains(ActuatorWord::DRILL_MOTOR | ActuatorWord::CLAMP_WORKPIECE);
        if cutting && self.drill_depth == self.timing.drill_travel {
            if let Some(part) = self.slots[Slot::Drill as usize].as_mut() {
                if !part.drilled {
                    part.drilled = true;
                    self.stats.drilled += 1;
                    if part.defective {
                        self.stats.drilled_defective += 1;
                    }
                    trace!("part drilled (defective={})", part.defective);
                }
            }
        }
    }

    fn advance_table(&mut self, now: Instant) {
        if let TableState::Indexing { started } = self.table {
            let locked_at = started + self.timing.index;
            if now >= locked_at {
                self.table = TableState::Locked;
                self.shift_parts(locked_at);
            }
        }
    }

    fn advance_feed(&mut self, now: Instant) {
        let due = self.next_feed_at.is_some_and(|at| now >= at);
        if due && self.table == TableState::Locked && self.slots[Slot::Load as usize].is_none() {
            self.slots[Slot::Load as usize] = self.feed.pop_front();
            self.next_feed_at = None;
            trace!("part fed, {} left in queue", self.feed.len());
        }
    }

    fn schedule_feed(&mut self, from: Instant) {
        if self.next_feed_at.is_none()
            && !self.feed.is_empty()
            && self.slots[Slot::Load as usize].is_none()
        {
            self.next_feed_at = Some(from + self.timing.feed_delay);
        }
    }

    fn shift_parts(&mut self, at: Instant) {
        if self.slots[Slot::Eject as usize].take().is_some() {
            self.stats.dropped += 1;
        }
        self.slots.rotate_right(1);
        self.stats.indexes += 1;
        debug!("table indexed (#{}), slots={:?}", self.stats.indexes, self.slots);
        self.schedule_feed(at);
    }

    /// Parts still waiting in the feed queue.
    pub fn feed_remaining(&self) -> usize {
        self.feed.len()
    }

    /// Current sensor word.
    pub fn sensors(&self, now: Instant) -> SensorWord {
        let mut word = SensorWord::empty();
        word.set(
            SensorWord::WORKPIECE_AT_TURNTABLE,
            self.slots[Slot::Load as usize].is_some(),
        );
        word.set(
            SensorWord::WORKPIECE_AT_INSPECTOR,
            self.slots[Slot::Inspector as usize].is_some(),
        );
        word.set(
            SensorWord::WORKPIECE_AT_DRILL,
            self.slots[Slot::Drill as usize].is_some(),
        );
        word.set(SensorWord::DRILL_UP, self.drill_depth.is_zero());
        word.set(
            SensorWord::DRILL_DOWN,
            self.drill_depth == self.timing.drill_travel,
        );

        let in_position = match self.table {
            TableState::Locked => true,
            TableState::Indexing { started } => now < started + self.timing.leave_home,
        };
        word.set(SensorWord::TURNTABLE_IN_POSITION, in_position);

        let reject = self.probe_since.is_some_and(|since| {
            now >= since + self.timing.probe
                && self.slots[Slot::Inspector as usize].is_some_and(|p| p.defective)
        });
        word.set(SensorWord::INSPECTOR_REJECT_DETECTED, reject);
        word
    }

    /// Output word as a register read reports it.
    pub fn readback(&self) -> ActuatorWord {
        self.readback
    }

    /// Apply a new output word written at `now`.
    pub fn write_outputs(&mut self, word: ActuatorWord, now: Instant) {
        self.advance(now);

        let rising = word.difference(self.outputs);
        let falling = self.outputs.difference(word);

        if rising.contains(ActuatorWord::TURNTABLE_MOTOR) && self.table == TableState::Locked {
            self.table = TableState::Indexing { started: now };
        }
        if rising.contains(ActuatorWord::INSPECTOR_EXTEND) {
            self.probe_since = Some(now);
        }
        if falling.contains(ActuatorWord::INSPECTOR_EXTEND) {
            self.probe_since = None;
        }
        if rising.contains(ActuatorWord::EJECTOR_EXTEND) {
            match self.slots[Slot::Eject as usize].take() {
                Some(part) => {
                    self.stats.ejected += 1;
                    if part.defective {
                        self.stats.ejected_defective += 1;
                    }
                }
                None => self.stats.empty_ejections += 1,
            }
        }

        self.outputs = word;
        self.pending_readback
            .push_back((now + self.timing.output_latency, word));
    }
}
