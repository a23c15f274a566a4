//! Debug HTTP server.
//!
//! # Routes
//! ```text
//! GET  /                      index of registered pages + level form
//! GET  /version               build info (JSON)
//! GET  /log/level             current severity
//! PUT  /log/level             change severity
//! GET  /debug/pprof/...       runtime introspection
//! GET  /metrics               Prometheus text (when a handle is attached)
//! ```
//!
//! # Design Decisions
//! - Routes are registered at construction, never afterwards
//! - The level handlers share the logger's `AtomicLevel`
//! - Handler panics are recovered into 500 responses

pub mod access_log;
pub mod handlers;
pub mod index;
pub mod options;
pub mod pprof;
pub mod server;

pub use index::{IndexPage, Page};
pub use options::{DebugServerOptions, DEFAULT_REQUEST_TIMEOUT, DEFAULT_SHUTDOWN_TIMEOUT};
pub use server::{DebugServer, DebugState, ServerError, COMPONENT};
