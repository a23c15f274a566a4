//! Startup orchestration.
//!
//! # Order
//! 1. Load and validate configuration (fatal)
//! 2. Initialize the logger (fatal)
//! 3. Install the metrics recorder (best effort)
//! 4. Construct the debug server (fatal)
//! 5. Run long-lived tasks in a group until shutdown or first failure
//!
//! Configuration load and logger init are one-shot and happen before any
//! task is spawned.

use std::path::Path;

use anyhow::Context;
use tokio_util::sync::CancellationToken;

use crate::config::load_config;
use crate::debug::{DebugServer, DebugServerOptions};
use crate::lifecycle::group::TaskGroup;
use crate::observability::{self, metrics, AtomicLevel, LoggerOptions};

const COMPONENT: &str = "app";

/// Run the service until `shutdown` is cancelled or a task fails.
///
/// Returns `Ok(())` after a shutdown triggered through `shutdown`.
pub async fn run(config_path: &Path, shutdown: CancellationToken) -> anyhow::Result<()> {
    let config = load_config(config_path)
        .with_context(|| format!("parse and validate config {config_path:?}"))?;

    let level = AtomicLevel::default();
    let logger_options = LoggerOptions::new(config.log.level.clone())
        .with_production_mode(config.is_production());
    let _flush = observability::init(&logger_options, &level).context("init logger")?;

    tracing::info!(
        target: COMPONENT,
        config = %config_path.display(),
        env = %config.global.env,
        level = %level.get(),
        "starting chat service"
    );

    let server = DebugServer::new(DebugServerOptions::from_config(&config.servers.debug), level)
        .context("init debug server")?;
    let server = match metrics::install_recorder() {
        Ok(handle) => server.with_metrics(handle),
        Err(e) => {
            tracing::warn!(target: COMPONENT, error = %e, "metrics disabled");
            server
        }
    };

    let mut group = TaskGroup::new(&shutdown);
    let token = group.token();
    group.spawn("server-debug", async move {
        server.run(token).await.context("run debug server")
    });

    group.wait().await.context("wait app stop")?;

    tracing::info!(target: COMPONENT, "chat service stopped");
    Ok(())
}
