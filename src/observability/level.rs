//! Runtime-adjustable severity threshold.
//!
//! `AtomicLevel` is a cloneable handle to one shared cell. The logger's
//! filter and the debug server's `/log/level` handlers hold clones of the
//! same handle, so a `PUT` is observed by the very next log call.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use serde::{Serialize, Serializer};

/// Log severity, ordered `Debug < Info < Warn < Error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(u8)]
pub enum Level {
    Debug = 0,
    #[default]
    Info = 1,
    Warn = 2,
    Error = 3,
}

impl Level {
    pub const ALL: [Level; 4] = [Level::Debug, Level::Info, Level::Warn, Level::Error];

    /// Canonical upper-case name ("DEBUG", "INFO", ...).
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
        }
    }

    /// Lower-case token as accepted in config files and forms.
    pub fn token(&self) -> &'static str {
        match self {
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
        }
    }

    fn from_u8(v: u8) -> Level {
        match v {
            0 => Level::Debug,
            1 => Level::Info,
            2 => Level::Warn,
            _ => Level::Error,
        }
    }

    /// Map a `tracing` level onto this scale. `TRACE` has no counterpart.
    pub fn from_tracing(level: &tracing::Level) -> Option<Level> {
        match *level {
            tracing::Level::TRACE => None,
            tracing::Level::DEBUG => Some(Level::Debug),
            tracing::Level::INFO => Some(Level::Info),
            tracing::Level::WARN => Some(Level::Warn),
            tracing::Level::ERROR => Some(Level::Error),
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Level {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Returned when a token is not one of debug, info, warn, error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized level: {0:?} (expected one of debug, info, warn, error)")]
pub struct InvalidLevelError(pub String);

impl FromStr for Level {
    type Err = InvalidLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Level::ALL
            .into_iter()
            .find(|level| level.token().eq_ignore_ascii_case(s))
            .ok_or_else(|| InvalidLevelError(s.to_string()))
    }
}

/// Shared, lock-free severity cell.
///
/// Cloning yields another handle to the same cell. Two independently
/// constructed cells never observe each other.
#[derive(Debug, Clone)]
pub struct AtomicLevel {
    inner: Arc<AtomicU8>,
}

impl Default for AtomicLevel {
    fn default() -> Self {
        Self::new(Level::default())
    }
}

impl AtomicLevel {
    pub fn new(level: Level) -> Self {
        Self {
            inner: Arc::new(AtomicU8::new(level as u8)),
        }
    }

    /// Current threshold.
    pub fn get(&self) -> Level {
        Level::from_u8(self.inner.load(Ordering::Acquire))
    }

    /// Parse `text` and store it. On error the current value is kept.
    pub fn set(&self, text: &str) -> Result<Level, InvalidLevelError> {
        let level = text.trim().parse::<Level>()?;
        self.store(level);
        Ok(level)
    }

    /// Store an already-parsed level, returning the previous one.
    pub fn store(&self, level: Level) -> Level {
        Level::from_u8(self.inner.swap(level as u8, Ordering::AcqRel))
    }

    /// Whether a record at `level` passes the current threshold.
    pub fn enabled(&self, level: Level) -> bool {
        level >= self.get()
    }

    /// Same as [`enabled`](Self::enabled) for `tracing` levels.
    pub fn enabled_tracing(&self, level: &tracing::Level) -> bool {
        Level::from_tracing(level).is_some_and(|l| self.enabled(l))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn set_then_get_returns_canonical_form() {
        let level = AtomicLevel::default();
        for (token, expected) in [
            ("debug", "DEBUG"),
            ("INFO", "INFO"),
            ("Warn", "WARN"),
            ("eRRoR", "ERROR"),
        ] {
            level.set(token).unwrap();
            assert_eq!(level.get().to_string(), expected);
        }
    }

    #[test]
    fn invalid_token_keeps_previous_value() {
        let level = AtomicLevel::new(Level::Warn);
        for token in ["trace", "", "DEBUG1", "fatal", " "] {
            assert!(level.set(token).is_err(), "{token:?} should be rejected");
            assert_eq!(level.get(), Level::Warn);
        }
    }

    #[test]
    fn default_is_info() {
        let level = AtomicLevel::default();
        assert_eq!(level.get(), Level::Info);
        assert!(!level.enabled(Level::Debug));
    }

    #[test]
    fn ordering_and_filtering() {
        assert!(Level::Debug < Level::Info);
        assert!(Level::Warn < Level::Error);

        let level = AtomicLevel::new(Level::Warn);
        assert!(!level.enabled(Level::Info));
        assert!(level.enabled(Level::Warn));
        assert!(level.enabled(Level::Error));
        assert!(!level.enabled_tracing(&tracing::Level::TRACE));

        level.store(Level::Debug);
        assert!(level.enabled_tracing(&tracing::Level::DEBUG));
        assert!(!level.enabled_tracing(&tracing::Level::TRACE));
    }

    #[test]
    fn clones_share_and_instances_are_isolated() {
        let a = AtomicLevel::new(Level::Info);
        let a2 = a.clone();
        let b = AtomicLevel::new(Level::Info);

        a2.set("error").unwrap();
        assert_eq!(a.get(), Level::Error);
        assert_eq!(b.get(), Level::Info);
    }

    #[test]
    fn concurrent_writers_leave_a_submitted_value() {
        let level = AtomicLevel::new(Level::Info);
        let tokens = ["debug", "info", "warn", "error"];

        let handles: Vec<_> = (0..64)
            .map(|i| {
                let level = level.clone();
                let token = tokens[i % tokens.len()];
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        level.set(token).unwrap();
                        let _ = level.get();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let submitted: HashSet<Level> = tokens.iter().map(|t| t.parse().unwrap()).collect();
        assert!(submitted.contains(&level.get()));
    }

    #[test]
    fn serializes_as_canonical_name() {
        assert_eq!(serde_json::to_string(&Level::Warn).unwrap(), "\"WARN\"");
    }
}
