//! OS signal handling.
//!
//! SIGINT and SIGTERM cancel the process-wide token. Handlers are
//! registered before this returns, so a signal delivered during startup is
//! not lost.

use std::io;

use tokio_util::sync::CancellationToken;

const COMPONENT: &str = "app";

/// Cancel `token` on the first SIGINT or SIGTERM.
///
/// Must be called from within a Tokio runtime.
#[cfg(unix)]
pub fn cancel_on_signal(token: CancellationToken) -> io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;

    tokio::spawn(async move {
        tokio::select! {
            _ = sigint.recv() => tracing::info!(target: COMPONENT, "received SIGINT"),
            _ = sigterm.recv() => tracing::info!(target: COMPONENT, "received SIGTERM"),
            _ = token.cancelled() => return,
        }
        token.cancel();
    });

    Ok(())
}

#[cfg(not(unix))]
pub fn cancel_on_signal(token: CancellationToken) -> io::Result<()> {
    tokio::spawn(async move {
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                if let Err(e) = result {
                    tracing::error!(target: COMPONENT, error = %e, "cannot listen for ctrl-c");
                    return;
                }
                tracing::info!(target: COMPONENT, "received ctrl-c");
            }
            _ = token.cancelled() => return,
        }
        token.cancel();
    });

    Ok(())
}
