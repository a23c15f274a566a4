//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;

use chat_service::debug::{DebugServer, DebugServerOptions, ServerError};
use chat_service::observability::AtomicLevel;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// A debug server running on an ephemeral loopback port.
pub struct RunningServer {
    pub addr: SocketAddr,
    pub cancel: CancellationToken,
    pub handle: JoinHandle<Result<(), ServerError>>,
}

impl RunningServer {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Cancel and wait for `serve` to return.
    pub async fn stop(self) -> Result<(), ServerError> {
        self.cancel.cancel();
        tokio::time::timeout(Duration::from_secs(10), self.handle)
            .await
            .expect("server did not stop in time")
            .expect("server task panicked")
    }
}

/// Start `server` on 127.0.0.1 with an OS-assigned port.
pub async fn start(server: DebugServer) -> RunningServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let cancel = CancellationToken::new();
    let handle = tokio::spawn(server.serve(listener, cancel.clone()));
    RunningServer { addr, cancel, handle }
}

/// Default debug server sharing `level`.
pub fn debug_server(level: &AtomicLevel) -> DebugServer {
    DebugServer::new(DebugServerOptions::new(format!("127.0.0.1:{}", free_port())), level.clone()).unwrap()
}

/// Reserve a free port by binding and immediately releasing it.
pub fn free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

/// Poll until a TCP connection to `addr` succeeds.
pub async fn wait_for_port(addr: SocketAddr, timeout: Duration) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if tokio::net::TcpStream::connect(addr).await.is_ok() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    false
}
