//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → cancel process token
//!
//! Startup (startup.rs):
//!     Load config → Init logger → Build debug server → Run task group
//!
//! Task group (group.rs):
//!     First failure → cancel siblings → wait all → report first error
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then logger, then servers
//! - Cancellation is never reported as a failure
//! - Shutdown has a deadline: the debug server's grace period

pub mod group;
pub mod signals;
pub mod startup;

pub use group::{TaskError, TaskExit, TaskGroup};
pub use signals::cancel_on_signal;
pub use startup::run;
