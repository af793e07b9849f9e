//! # Cell Control Library
//!
//! Coordination engine of the rotary drilling cell: a supervisor loop that
//! reads the sensor word, dispatches start commands to four concurrent
//! station workers and joins on a variable number of tagged replies.
//!
//! ## Components
//!
//! 1. **IoGateway**: mutex-guarded read-modify-write of the actuator word
//!    with a settle delay held under the lock
//! 2. **Station workers**: Turntable, Ejector, Inspector, Drill; one task
//!    each, one sequence per command
//! 3. **Supervisor**: per-cycle sense/dispatch/join loop with reject memory
//! 4. **Lifecycle**: startup homing and idempotent teardown
//!
//! ## Failure Model
//!
//! Every error is fatal for the whole cell. The first one is recorded as the
//! halt reason, all tasks are cancelled, queues are drained, the outputs are
//! cleared and the fieldbus is disconnected. No automatic restart.

pub mod cell;
pub mod dispatch;
pub mod error;
pub mod gateway;
pub mod lifecycle;
pub mod message;
pub mod station;
pub mod supervisor;

pub use cell::{Cell, CellOutcome, RunSummary};
pub use error::{CellError, HaltReason, Origin};
pub use gateway::IoGateway;
pub use message::{Command, Completion, Station};
