//! TCP listener binding.
//!
//! # Responsibilities
//! - Bind to a validated `host:port`
//! - Report bind failures with the address that failed

use tokio::net::TcpListener;

use crate::net::HostPort;

/// Error type for listener operations.
#[derive(Debug, thiserror::Error)]
pub enum ListenError {
    /// Failed to bind to address.
    #[error("listen on {addr}: {source}")]
    Bind {
        addr: String,
        source: std::io::Error,
    },
}

/// Bind a TCP listener on the given address.
pub async fn bind(addr: &HostPort) -> Result<TcpListener, ListenError> {
    let bind_addr = addr.bind_addr();
    let listener = TcpListener::bind(&bind_addr)
        .await
        .map_err(|source| ListenError::Bind {
            addr: bind_addr.clone(),
            source,
        })?;

    if let Ok(local_addr) = listener.local_addr() {
        tracing::debug!(address = %local_addr, "Listener bound");
    }

    Ok(listener)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn bind_reports_address_in_use() {
        let first = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = first.local_addr().unwrap().port();
        let addr: HostPort = format!("127.0.0.1:{port}").parse().unwrap();

        let err = bind(&addr).await.unwrap_err();
        assert!(err.to_string().contains(&format!("127.0.0.1:{port}")));
    }
}
