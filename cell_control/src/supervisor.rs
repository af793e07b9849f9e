//! Per-cycle decision loop.
//!
//! ## Cycle
//!
//! 1. Clear `just_drilled`.
//! 2. Read inputs; a part at the drill means it was drilled last cycle.
//! 3. Any part present: index the table and wait for `turntable-done`.
//! 4. Part was at the drill: start the ejector.
//! 5. Re-read inputs after the index.
//! 6. Part at the inspector: start the inspector.
//! 7. Part at the drill: start the drill, unless the last inspection
//!    rejected it.
//! 8. Join: receive exactly as many replies as commands sent in 4-7, in any
//!    order. The inspection verdict gates drilling in the next cycle.

use crate::dispatch::Dispatcher;
use crate::error::CellError;
use crate::gateway::IoGateway;
use crate::message::{Completion, Station};
use cell_common::config::SupervisorConfig;
use cell_common::io::SensorWord;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// State carried across cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleState {
    /// False while the part that will reach the drill next was rejected.
    pub drill_enabled: bool,
    pub just_drilled: bool,
    /// Replies still owed by the current join.
    pub pending_replies: usize,
}

impl Default for CycleState {
    fn default() -> Self {
        Self {
            drill_enabled: true,
            just_drilled: false,
            pending_replies: 0,
        }
    }
}

impl CycleState {
    /// Apply a joined reply. Only inspection verdicts change state.
    pub fn apply(&mut self, reply: Completion) {
        match reply {
            Completion::InspectorDone => self.drill_enabled = true,
            Completion::InspectorReject => self.drill_enabled = false,
            Completion::EjectorDone | Completion::DrillDone | Completion::TurntableDone => {}
        }
    }
}

/// Stations commanded in the current join, one bit per station.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Dispatched(u8);

impl Dispatched {
    #[inline]
    pub fn mark(&mut self, station: Station) {
        self.0 |= 1 << station.index();
    }

    #[inline]
    pub fn contains(&self, station: Station) -> bool {
        self.0 & (1 << station.index()) != 0
    }

    /// Clear `station`; false if it was not outstanding.
    pub fn take(&mut self, station: Station) -> bool {
        let had = self.contains(station);
        self.0 &= !(1 << station.index());
        had
    }

    #[inline]
    pub fn count(&self) -> usize {
        self.0.count_ones() as usize
    }
}

/// What one cycle did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    pub cycle: u64,
    pub indexed: bool,
    /// Stations commanded after the index, in dispatch order.
    pub dispatched: Vec<Station>,
    /// Joined replies in arrival order.
    pub replies: Vec<Completion>,
    /// A part sat at the drill while drilling was disabled.
    pub skipped_drill: bool,
    pub drill_enabled: bool,
}

impl CycleReport {
    fn new(cycle: u64) -> Self {
        Self {
            cycle,
            indexed: false,
            dispatched: Vec::new(),
            replies: Vec::new(),
            skipped_drill: false,
            drill_enabled: true,
        }
    }

    /// Nothing was commanded.
    pub fn is_idle(&self) -> bool {
        !self.indexed && self.dispatched.is_empty()
    }
}

/// Totals over a supervisor run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SupervisorStats {
    pub cycles: u64,
    pub idle_cycles: u64,
    pub indexes: u64,
    pub ejections: u64,
    pub inspections: u64,
    pub rejects: u64,
    pub drills: u64,
    pub skipped_drills: u64,
}

impl SupervisorStats {
    fn record(&mut self, report: &CycleReport) {
        self.cycles += 1;
        if report.is_idle() {
            self.idle_cycles += 1;
        }
        if report.indexed {
            self.indexes += 1;
        }
        if report.skipped_drill {
            self.skipped_drills += 1;
        }
        for reply in &report.replies {
            match reply {
                Completion::EjectorDone => self.ejections += 1,
                Completion::InspectorDone => self.inspections += 1,
                Completion::InspectorReject => {
                    self.inspections += 1;
                    self.rejects += 1;
                }
                Completion::DrillDone => self.drills += 1,
                Completion::TurntableDone => {}
            }
        }
    }
}

pub struct Supervisor {
    io: Arc<IoGateway>,
    dispatcher: Dispatcher,
    state: CycleState,
    stats: SupervisorStats,
    idle_interval: Duration,
}

impl Supervisor {
    /// `idle_interval` is slept after a cycle that commanded nothing.
    pub fn new(io: Arc<IoGateway>, dispatcher: Dispatcher, idle_interval: Duration) -> Self {
        Self {
            io,
            dispatcher,
            state: CycleState::default(),
            stats: SupervisorStats::default(),
            idle_interval,
        }
    }

    pub fn state(&self) -> &CycleState {
        &self.state
    }

    pub fn stats(&self) -> SupervisorStats {
        self.stats
    }

    /// Give the queues back for teardown.
    pub fn into_dispatcher(self) -> Dispatcher {
        self.dispatcher
    }

    /// Run one cycle.
    pub async fn run_cycle(&mut self) -> Result<CycleReport, CellError> {
        let mut report = CycleReport::new(self.stats.cycles + 1);

        self.state.just_drilled = false;
        self.state.pending_replies = 0;

        let sensors = self.io.read_inputs()?;
        if sensors.contains(SensorWord::WORKPIECE_AT_DRILL) {
            self.state.just_drilled = true;
        }
        debug!(cycle = report.cycle, "inputs {sensors}");

        if sensors.any_workpiece() {
            self.dispatcher.command(Station::Turntable).await?;
            self.dispatcher.expect(Completion::TurntableDone).await?;
            report.indexed = true;
        }

        let mut outstanding = Dispatched::default();
        if self.state.just_drilled {
            self.dispatch(Station::Ejector, &mut outstanding, &mut report).await?;
        }

        let sensors = self.io.read_inputs()?;
        debug!(cycle = report.cycle, "inputs after index {sensors}");

        if sensors.contains(SensorWord::WORKPIECE_AT_INSPECTOR) {
            self.dispatch(Station::Inspector, &mut outstanding, &mut report).await?;
        }
        if sensors.contains(SensorWord::WORKPIECE_AT_DRILL) {
            if self.state.drill_enabled {
                self.dispatch(Station::Drill, &mut outstanding, &mut report).await?;
            } else {
                info!(cycle = report.cycle, "rejected part at drill, not drilling");
                report.skipped_drill = true;
            }
        }

        debug_assert_eq!(outstanding.count(), self.state.pending_replies);
        while self.state.pending_replies > 0 {
            let reply = self.dispatcher.recv().await?;
            if !outstanding.take(reply.station()) {
                warn!(cycle = report.cycle, "reply '{reply}' was not asked for");
                return Err(CellError::UnexpectedReply {
                    expected: "a reply from a dispatched station",
                    got: reply,
                });
            }
            self.state.pending_replies -= 1;
            self.state.apply(reply);
            report.replies.push(reply);
        }

        report.drill_enabled = self.state.drill_enabled;
        self.stats.record(&report);
        Ok(report)
    }

    async fn dispatch(
        &mut self,
        station: Station,
        outstanding: &mut Dispatched,
        report: &mut CycleReport,
    ) -> Result<(), CellError> {
        self.dispatcher.command(station).await?;
        outstanding.mark(station);
        self.state.pending_replies += 1;
        report.dispatched.push(station);
        Ok(())
    }

    /// Run cycles until a limit in `cfg` is reached or the cell is
    /// cancelled (`Err(CellError::Halted)`).
    pub async fn run(&mut self, cfg: &SupervisorConfig) -> Result<SupervisorStats, CellError> {
        info!(
            "supervisor running (max_cycles={:?}, idle_limit={:?})",
            cfg.max_cycles, cfg.idle_limit
        );
        let mut idle_streak = 0u64;

        loop {
            if cfg.max_cycles.is_some_and(|max| self.stats.cycles >= max) {
                info!("supervisor: cycle limit reached");
                break;
            }
            if self.dispatcher.shutdown().is_cancelled() {
                return Err(CellError::Halted);
            }

            let report = self.run_cycle().await?;
            if !report.is_idle() {
                idle_streak = 0;
                info!(
                    cycle = report.cycle,
                    replies = report.replies.len(),
                    drill_enabled = report.drill_enabled,
                    "cycle complete"
                );
                continue;
            }

            idle_streak += 1;
            if cfg.idle_limit.is_some_and(|limit| idle_streak >= limit) {
                info!("supervisor: cell idle for {idle_streak} cycles");
                break;
            }
            self.dispatcher.pause(self.idle_interval).await?;
        }

        Ok(self.stats)
    }
}
