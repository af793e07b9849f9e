//! Cell-wide cancellation broadcast with first-error memory.

use crate::error::{CellError, HaltReason, Origin};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};
use tracing::{debug, error, info};

/// Cloneable shutdown handle shared by the supervisor, the workers and the
/// cell context.
///
/// [`trigger`](Self::trigger) is idempotent: the first call records the
/// reason and cancels every task; later calls only log at debug level.
/// [`request_stop`](Self::request_stop) cancels without a reason (operator
/// stop, clean end of run).
#[derive(Clone, Default)]
pub struct Shutdown {
    token: CancellationToken,
    reason: Arc<Mutex<Option<HaltReason>>>,
}

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `error` as the halt reason and cancel the cell.
    ///
    /// Returns `true` if this call recorded the reason.
    pub fn trigger(&self, origin: Origin, error: CellError) -> bool {
        let mut slot = self.reason.lock();
        if let Some(first) = slot.as_ref() {
            debug!("halt already triggered ({first}); ignoring {origin}: {error}");
            return false;
        }

        error!(
            origin = %origin,
            kind = error.as_label(),
            "cell fault: {error}; tearing down"
        );
        *slot = Some(HaltReason::new(origin, error));
        drop(slot);

        self.token.cancel();
        true
    }

    /// Cancel every task without recording a fault.
    pub fn request_stop(&self) {
        if !self.token.is_cancelled() {
            info!("stop requested");
            self.token.cancel();
        }
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Whether a fault was recorded.
    pub fn is_halted(&self) -> bool {
        self.reason.lock().is_some()
    }

    pub fn reason(&self) -> Option<HaltReason> {
        self.reason.lock().clone()
    }

    /// Resolves once the cell is cancelled.
    pub fn cancelled(&self) -> WaitForCancellationFuture<'_> {
        self.token.cancelled()
    }
}
