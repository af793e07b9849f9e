//! Station workers.
//!
//! Every station runs the same loop: wait for a command, run one bounded
//! hardware sequence, send the completion to the supervisor inbox. Only the
//! sequence differs, so each station is a [`StationSequence`] driven by a
//! generic [`StationWorker`].
//!
//! A sequence error never produces a reply. The worker records it through
//! [`Shutdown::trigger`] and exits; the supervisor observes the cancellation.

pub mod drill;
pub mod ejector;
pub mod inspector;
pub mod poll;
pub mod turntable;

pub use drill::Drill;
pub use ejector::Ejector;
pub use inspector::Inspector;
pub use poll::{Wait, poll_until};
pub use turntable::Turntable;

use crate::error::{CellError, Origin};
use crate::gateway::IoGateway;
use crate::lifecycle::Shutdown;
use crate::message::{Command, Completion, Station};
use std::future::Future;
use std::sync::Arc;
use tokio::select;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// One station's hardware sequence.
pub trait StationSequence: Send + Sync + 'static {
    const STATION: Station;

    /// Run one operation cycle and return the reply to send.
    fn run(&self, io: &IoGateway) -> impl Future<Output = Result<Completion, CellError>> + Send;
}

pub struct StationWorker<S> {
    sequence: S,
    io: Arc<IoGateway>,
    commands: mpsc::Receiver<Command>,
    replies: mpsc::Sender<Completion>,
    shutdown: Shutdown,
}

impl<S: StationSequence> StationWorker<S> {
    pub fn new(
        sequence: S,
        io: Arc<IoGateway>,
        commands: mpsc::Receiver<Command>,
        replies: mpsc::Sender<Completion>,
        shutdown: Shutdown,
    ) -> Self {
        Self {
            sequence,
            io,
            commands,
            replies,
            shutdown,
        }
    }

    /// Worker task body. Returns the number of completed sequences.
    pub async fn run(mut self) -> u64 {
        let station = S::STATION;
        let mut completed = 0u64;
        debug!("{station} worker started");

        loop {
            let command = select! {
                biased;
                _ = self.shutdown.cancelled() => break,
                command = self.commands.recv() => command,
            };
            if command.is_none() {
                debug!("{station} command queue closed");
                break;
            }

            info!("{station}: sequence started");
            let result = select! {
                biased;
                _ = self.shutdown.cancelled() => break,
                result = self.sequence.run(&self.io) => result,
            };

            match result {
                Ok(reply) => {
                    completed += 1;
                    info!("{station}: {reply}");
                    if self.replies.send(reply).await.is_err() {
                        debug!("{station}: inbox closed, dropping {reply}");
                        break;
                    }
                }
                Err(err) => {
                    self.shutdown.trigger(Origin::Station(station), err);
                    break;
                }
            }
        }

        debug!("{station} worker stopped after {completed} sequences");
        completed
    }
}
