//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! config log.level ──▶ level.rs (AtomicLevel, shared handle)
//!                          │                 │
//!                          ▼                 ▼
//!            logging.rs (per-event gate)   debug server (/log/level)
//!
//! debug server requests ──▶ metrics.rs ──▶ GET /metrics
//! ```
//!
//! # Design Decisions
//! - One explicitly injected level cell, no ambient global
//! - JSON format for production, colored console for development
//! - Metrics are cheap (atomic increments)

pub mod level;
pub mod logging;
pub mod metrics;

pub use level::{AtomicLevel, InvalidLevelError, Level};
pub use logging::{init, sync, Clock, FixedClock, FlushGuard, LoggerError, LoggerOptions, SystemClock};
