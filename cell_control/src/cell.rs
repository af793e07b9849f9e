//! The cell context: owns the gateway, the queues, the workers and the
//! shutdown handle of one running cell.
//!
//! A cell runs once. Teardown (cancel, join workers, drain queues, all-stop,
//! disconnect) always runs at the end of [`Cell::run`]; a halted cell must
//! be replaced by a new one.

use crate::dispatch::{self, Dispatcher};
use crate::error::{CellError, HaltReason, Origin};
use crate::gateway::IoGateway;
use crate::lifecycle::{Homing, HomingReport, Shutdown};
use crate::station::{Drill, Ejector, Inspector, StationWorker, Turntable};
use crate::supervisor::{Supervisor, SupervisorStats};
use cell_common::config::{CellConfig, SupervisorConfig, TimingConfig};
use cell_common::fieldbus::Fieldbus;
use serde::Serialize;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

/// Counters of one cell run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// `None` if homing did not complete.
    pub homing: Option<HomingReport>,
    pub supervisor: SupervisorStats,
    /// Sequences completed by all workers.
    pub worker_sequences: u64,
    /// Replies still queued at teardown.
    pub drained_replies: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CellOutcome {
    /// A supervisor limit was reached.
    Completed(RunSummary),
    /// Stopped on request.
    Stopped(RunSummary),
    /// A fault halted the cell; restart required.
    Halted {
        reason: HaltReason,
        summary: RunSummary,
    },
}

impl CellOutcome {
    pub fn summary(&self) -> &RunSummary {
        match self {
            CellOutcome::Completed(summary) | CellOutcome::Stopped(summary) => summary,
            CellOutcome::Halted { summary, .. } => summary,
        }
    }

    pub fn halt_reason(&self) -> Option<&HaltReason> {
        match self {
            CellOutcome::Halted { reason, .. } => Some(reason),
            _ => None,
        }
    }

    pub fn is_halted(&self) -> bool {
        self.halt_reason().is_some()
    }

    pub const fn label(&self) -> &'static str {
        match self {
            CellOutcome::Completed(_) => "completed",
            CellOutcome::Stopped(_) => "stopped",
            CellOutcome::Halted { .. } => "halted",
        }
    }
}

pub struct Cell {
    io: Arc<IoGateway>,
    shutdown: Shutdown,
    dispatcher: Dispatcher,
    workers: JoinSet<u64>,
    timing: TimingConfig,
    limits: SupervisorConfig,
}

impl Cell {
    /// Connect the fieldbus and spawn the four station workers.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(bus: Arc<dyn Fieldbus>, config: &CellConfig) -> Result<Self, CellError> {
        let node_id = &config.fieldbus.node_id;
        if let Err(e) = bus.connect(node_id) {
            error!("fieldbus '{}' cannot reach node '{node_id}': {e}", bus.name());
            return Err(e.into());
        }
        info!("cell '{}' connected via '{}'", config.shared.service_name, bus.name());

        let timing = config.timing.clone();
        let io = Arc::new(IoGateway::new(bus, timing.write_settle()));
        let shutdown = Shutdown::new();
        let (dispatcher, ends) = dispatch::channels(shutdown.clone());

        let mut workers = JoinSet::new();
        workers.spawn(
            StationWorker::new(
                Turntable::from_timing(&timing),
                Arc::clone(&io),
                ends.turntable,
                ends.replies.clone(),
                shutdown.clone(),
            )
            .run(),
        );
        workers.spawn(
            StationWorker::new(
                Ejector::from_timing(&timing),
                Arc::clone(&io),
                ends.ejector,
                ends.replies.clone(),
                shutdown.clone(),
            )
            .run(),
        );
        workers.spawn(
            StationWorker::new(
                Inspector::from_timing(&timing),
                Arc::clone(&io),
                ends.inspector,
                ends.replies.clone(),
                shutdown.clone(),
            )
            .run(),
        );
        workers.spawn(
            StationWorker::new(
                Drill::from_timing(&timing),
                Arc::clone(&io),
                ends.drill,
                ends.replies,
                shutdown.clone(),
            )
            .run(),
        );

        Ok(Self {
            io,
            shutdown,
            dispatcher,
            workers,
            timing,
            limits: config.supervisor.clone(),
        })
    }

    /// Handle for requesting a stop from outside (signal handler, tests).
    pub fn shutdown_handle(&self) -> Shutdown {
        self.shutdown.clone()
    }

    pub fn gateway(&self) -> Arc<IoGateway> {
        Arc::clone(&self.io)
    }

    /// Home the cell, run the supervisor loop, then tear down.
    pub async fn run(self) -> CellOutcome {
        let Cell {
            io,
            shutdown,
            mut dispatcher,
            workers,
            timing,
            limits,
        } = self;
        let mut summary = RunSummary::default();

        let homed = Homing::from_timing(&timing)
            .run(&io, &mut dispatcher)
            .await;
        let (result, dispatcher) = match homed {
            Ok(report) => {
                summary.homing = Some(report);
                let mut supervisor =
                    Supervisor::new(Arc::clone(&io), dispatcher, timing.poll_interval());
                let result = supervisor.run(&limits).await.map(|_| ());
                summary.supervisor = supervisor.stats();
                (result.map_err(|e| (Origin::Supervisor, e)), supervisor.into_dispatcher())
            }
            Err(e) => (Err((Origin::Homing, e)), dispatcher),
        };

        let completed = result.is_ok();
        if let Err((origin, err)) = result {
            // `Halted` only reports a cancellation that was already recorded
            // (or requested).
            if err != CellError::Halted {
                shutdown.trigger(origin, err);
            }
        }

        teardown(&io, &shutdown, dispatcher, workers, &mut summary).await;

        match shutdown.reason() {
            Some(reason) => {
                error!("cell halted: {reason}; restart required");
                CellOutcome::Halted { reason, summary }
            }
            None if completed => CellOutcome::Completed(summary),
            None => CellOutcome::Stopped(summary),
        }
    }
}

async fn teardown(
    io: &IoGateway,
    shutdown: &Shutdown,
    dispatcher: Dispatcher,
    mut workers: JoinSet<u64>,
    summary: &mut RunSummary,
) {
    info!("teardown: stopping workers");
    shutdown.request_stop();

    while let Some(joined) = workers.join_next().await {
        match joined {
            Ok(completed) => summary.worker_sequences += completed,
            Err(e) => warn!("worker task ended abnormally: {e}"),
        }
    }

    summary.drained_replies = dispatcher.close();

    if let Err(e) = io.all_stop().await {
        warn!("teardown: all-stop not applied: {e}");
    }
    io.bus().disconnect();
    info!("teardown complete");
}
