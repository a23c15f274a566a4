//! Chat service bootstrap library.

pub mod buildinfo;
pub mod config;
pub mod debug;
pub mod lifecycle;
pub mod net;
pub mod observability;

pub use config::Config;
pub use debug::DebugServer;
pub use lifecycle::TaskGroup;
pub use observability::AtomicLevel;
