//! Debug server options.

use std::time::Duration;

use crate::config::DebugServerConfig;
use crate::debug::pprof::DEFAULT_PROFILE_WINDOW;
use crate::debug::ServerError;
use crate::net::HostPort;

/// Grace period for in-flight requests once shutdown starts.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(3);

/// Upper bound on a single request, profiles included.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Options for [`DebugServer::new`](crate::debug::DebugServer::new).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebugServerOptions {
    addr: String,
    shutdown_timeout: Duration,
    request_timeout: Duration,
}

impl DebugServerOptions {
    /// Options with a mandatory `host:port` listen address.
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn from_config(config: &DebugServerConfig) -> Self {
        Self::new(config.addr.clone())
            .with_shutdown_timeout(Duration::from_secs(config.shutdown_timeout_secs))
            .with_request_timeout(Duration::from_secs(config.request_timeout_secs))
    }

    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    pub fn shutdown_timeout(&self) -> Duration {
        self.shutdown_timeout
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Check every option, returning the parsed listen address.
    pub fn validate(&self) -> Result<HostPort, ServerError> {
        let addr = self.addr.parse::<HostPort>()?;
        if self.shutdown_timeout.is_zero() {
            return Err(ServerError::ZeroTimeout("shutdown_timeout"));
        }
        if self.request_timeout.is_zero() {
            return Err(ServerError::ZeroTimeout("request_timeout"));
        }
        if self.request_timeout <= DEFAULT_PROFILE_WINDOW {
            return Err(ServerError::RequestTimeoutTooShort(self.request_timeout));
        }
        Ok(addr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::AddrError;

    #[test]
    fn defaults() {
        let options = DebugServerOptions::new("localhost:8079");
        assert_eq!(options.shutdown_timeout(), Duration::from_secs(3));
        assert_eq!(options.validate().unwrap().port(), 8079);
    }

    #[test]
    fn from_config_copies_timeouts() {
        let config = DebugServerConfig {
            addr: "127.0.0.1:9000".into(),
            shutdown_timeout_secs: 7,
            request_timeout_secs: 11,
        };
        let options = DebugServerOptions::from_config(&config);
        assert_eq!(options.addr(), "127.0.0.1:9000");
        assert_eq!(options.shutdown_timeout(), Duration::from_secs(7));
        assert_eq!(options.request_timeout(), Duration::from_secs(11));
    }

    #[test]
    fn rejects_address_without_port() {
        let err = DebugServerOptions::new("localhost").validate().unwrap_err();
        assert!(matches!(err, ServerError::InvalidAddr(AddrError::MissingPort(_))));
    }

    #[test]
    fn rejects_zero_timeouts() {
        let err = DebugServerOptions::new("localhost:1")
            .with_shutdown_timeout(Duration::ZERO)
            .validate()
            .unwrap_err();
        assert!(matches!(err, ServerError::ZeroTimeout("shutdown_timeout")));
    }

    #[test]
    fn request_timeout_must_exceed_profile_window() {
        for timeout in [Duration::from_millis(500), Duration::from_secs(30)] {
            let err = DebugServerOptions::new("localhost:1")
                .with_request_timeout(timeout)
                .validate()
                .unwrap_err();
            assert!(matches!(err, ServerError::RequestTimeoutTooShort(t) if t == timeout));
        }

        let options = DebugServerOptions::new("localhost:1").with_request_timeout(Duration::from_secs(31));
        assert!(options.validate().is_ok());
    }
}
