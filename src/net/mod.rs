//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! config string "host:port"
//!     → addr.rs (HostPort: split, validate host and port)
//!     → listener.rs (bind TcpListener)
//!     → Hand off to HTTP layer
//! ```
//!
//! # Design Decisions
//! - Addresses are validated once, at construction, never at bind time
//! - Bind failures carry the address for operator-facing messages

pub mod addr;
pub mod listener;

pub use addr::{AddrError, HostPort};
pub use listener::{bind, ListenError};
