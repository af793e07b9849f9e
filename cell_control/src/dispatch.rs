//! Command queues and the shared completion inbox.
//!
//! ```text
//!             ┌──── cmd (cap 1) ────► Ejector   ──┐
//!             ├──── cmd (cap 1) ────► Inspector ──┤
//! Dispatcher ─┤                                   ├─ replies ─► inbox
//!             ├──── cmd (cap 1) ────► Drill     ──┤   (mpsc)
//!             └──── cmd (cap 1) ────► Turntable ──┘
//! ```
//!
//! The supervisor and homing own the [`Dispatcher`]; the workers own the
//! matching [`StationEnds`].

use crate::error::CellError;
use crate::lifecycle::Shutdown;
use crate::message::{Command, Completion, Station};
use std::time::Duration;
use tokio::select;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Inbox capacity. At most one reply per station can be outstanding.
pub const INBOX_CAPACITY: usize = Station::ALL.len();

/// Worker-side queue ends.
pub struct StationEnds {
    pub ejector: mpsc::Receiver<Command>,
    pub inspector: mpsc::Receiver<Command>,
    pub drill: mpsc::Receiver<Command>,
    pub turntable: mpsc::Receiver<Command>,
    /// Shared sender of the supervisor inbox; clone one per worker.
    pub replies: mpsc::Sender<Completion>,
}

/// Supervisor-side queue ends.
pub struct Dispatcher {
    commands: [mpsc::Sender<Command>; 4],
    inbox: mpsc::Receiver<Completion>,
    shutdown: Shutdown,
}

/// Create all queues of one cell.
pub fn channels(shutdown: Shutdown) -> (Dispatcher, StationEnds) {
    let (ejector_tx, ejector) = mpsc::channel(1);
    let (inspector_tx, inspector) = mpsc::channel(1);
    let (drill_tx, drill) = mpsc::channel(1);
    let (turntable_tx, turntable) = mpsc::channel(1);
    let (replies, inbox) = mpsc::channel(INBOX_CAPACITY);

    let dispatcher = Dispatcher {
        // Indexed by `Station::index()`.
        commands: [ejector_tx, inspector_tx, drill_tx, turntable_tx],
        inbox,
        shutdown,
    };
    let ends = StationEnds {
        ejector,
        inspector,
        drill,
        turntable,
        replies,
    };
    (dispatcher, ends)
}

impl Dispatcher {
    pub fn shutdown(&self) -> &Shutdown {
        &self.shutdown
    }

    /// Send a start command to `station`.
    pub async fn command(&self, station: Station) -> Result<(), CellError> {
        info!("dispatch -> {station}");
        let tx = &self.commands[station.index()];
        select! {
            biased;
            _ = self.shutdown.cancelled() => Err(CellError::Halted),
            sent = tx.send(Command::Start) => sent.map_err(|_| CellError::ChannelClosed(station.name())),
        }
    }

    /// Receive the next completion from any station.
    pub async fn recv(&mut self) -> Result<Completion, CellError> {
        select! {
            biased;
            _ = self.shutdown.cancelled() => Err(CellError::Halted),
            reply = self.inbox.recv() => {
                let reply = reply.ok_or(CellError::ChannelClosed("inbox"))?;
                debug!("reply <- {reply}");
                Ok(reply)
            }
        }
    }

    /// Receive one completion and require it to be `expected`.
    pub async fn expect(&mut self, expected: Completion) -> Result<(), CellError> {
        let got = self.recv().await?;
        if got != expected {
            return Err(CellError::UnexpectedReply {
                expected: expected.tag(),
                got,
            });
        }
        Ok(())
    }

    /// Sleep for `period` unless the cell is cancelled first.
    pub async fn pause(&self, period: Duration) -> Result<(), CellError> {
        select! {
            biased;
            _ = self.shutdown.cancelled() => Err(CellError::Halted),
            _ = tokio::time::sleep(period) => Ok(()),
        }
    }

    /// Release every queue. Returns the number of replies that were still
    /// queued in the inbox.
    pub fn close(mut self) -> usize {
        self.inbox.close();
        let mut drained = 0;
        while let Ok(reply) = self.inbox.try_recv() {
            warn!("dropping unread reply '{reply}' during teardown");
            drained += 1;
        }
        drained
    }
}
