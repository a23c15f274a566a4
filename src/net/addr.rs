//! `host:port` listen addresses.
//!
//! # Rules
//! - Port is mandatory, numeric, and within 1..=65535
//! - Host may be empty (all interfaces), an IP literal, or an RFC 1123 hostname
//! - IPv6 literals must be bracketed: `[::1]:8079`

use std::fmt;
use std::net::{IpAddr, Ipv6Addr};
use std::str::FromStr;

/// Error returned when an address is not a valid `host:port`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddrError {
    #[error("address {0:?}: missing port in address")]
    MissingPort(String),

    #[error("address {0:?}: invalid port")]
    InvalidPort(String),

    #[error("address {0:?}: invalid host")]
    InvalidHost(String),
}

/// A validated listen address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostPort {
    host: String,
    port: u16,
}

impl HostPort {
    /// Host part; empty means all interfaces.
    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Address suitable for `TcpListener::bind`.
    pub fn bind_addr(&self) -> String {
        if self.host.is_empty() {
            format!("0.0.0.0:{}", self.port)
        } else {
            self.to_string()
        }
    }
}

impl fmt::Display for HostPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

impl FromStr for HostPort {
    type Err = AddrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (host, port) = split_host_port(s)?;

        let port = match port.parse::<u16>() {
            Ok(p) if p > 0 && port.bytes().all(|b| b.is_ascii_digit()) => p,
            _ => return Err(AddrError::InvalidPort(s.to_string())),
        };

        if !host.is_empty() && !is_valid_host(host) {
            return Err(AddrError::InvalidHost(s.to_string()));
        }

        Ok(Self {
            host: host.to_string(),
            port,
        })
    }
}

fn split_host_port(s: &str) -> Result<(&str, &str), AddrError> {
    if let Some(rest) = s.strip_prefix('[') {
        let (host, tail) = rest
            .split_once(']')
            .ok_or_else(|| AddrError::InvalidHost(s.to_string()))?;
        if host.parse::<Ipv6Addr>().is_err() {
            return Err(AddrError::InvalidHost(s.to_string()));
        }
        let port = tail
            .strip_prefix(':')
            .ok_or_else(|| AddrError::MissingPort(s.to_string()))?;
        return Ok((host, port));
    }

    let (host, port) = s
        .rsplit_once(':')
        .ok_or_else(|| AddrError::MissingPort(s.to_string()))?;
    if host.contains(':') {
        // Unbracketed IPv6 literal.
        return Err(AddrError::InvalidHost(s.to_string()));
    }
    Ok((host, port))
}

fn is_valid_host(host: &str) -> bool {
    host.parse::<IpAddr>().is_ok() || is_rfc1123_hostname(host)
}

fn is_rfc1123_hostname(host: &str) -> bool {
    if host.len() > 253 {
        return false;
    }
    host.split('.').all(|label| {
        let bytes = label.as_bytes();
        !bytes.is_empty()
            && bytes.len() <= 63
            && bytes.iter().all(|b| b.is_ascii_alphanumeric() || *b == b'-')
            && bytes[0] != b'-'
            && bytes[bytes.len() - 1] != b'-'
    })
}
