//! Runtime profiling endpoints.
//!
//! Rust has no built-in sampling profiler, so these report what the Tokio
//! runtime exposes about itself: worker count, live tasks and the depth of
//! the global run queue.

use std::time::{Duration, Instant};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::debug::server::DebugState;

const DEFAULT_PROFILE_SECONDS: u64 = 30;

/// Window of `/debug/pprof/profile` without `?seconds=`. The request
/// timeout must be longer than this.
pub const DEFAULT_PROFILE_WINDOW: Duration = Duration::from_secs(DEFAULT_PROFILE_SECONDS);
const DEFAULT_TRACE_SECONDS: u64 = 1;
const TRACE_INTERVAL: Duration = Duration::from_millis(100);

/// Point-in-time view of the async runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RuntimeSnapshot {
    pub workers: usize,
    pub alive_tasks: usize,
    pub global_queue_depth: usize,
}

impl RuntimeSnapshot {
    pub fn capture() -> Self {
        let metrics = tokio::runtime::Handle::current().metrics();
        Self {
            workers: metrics.num_workers(),
            alive_tasks: metrics.num_alive_tasks(),
            global_queue_depth: metrics.global_queue_depth(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct DurationParams {
    seconds: Option<u64>,
}

#[derive(Debug, Serialize)]
struct Profile {
    seconds: u64,
    elapsed_ms: u128,
    start: RuntimeSnapshot,
    end: RuntimeSnapshot,
}

#[derive(Debug, Serialize)]
struct TraceSample {
    offset_ms: u128,
    #[serde(flatten)]
    snapshot: RuntimeSnapshot,
}

const PROFILES: [(&str, &str); 4] = [
    ("cmdline", "The command line invocation of the current program"),
    ("profile", "Runtime activity over ?seconds=N (default 30)"),
    ("runtime", "Current async runtime counters"),
    ("trace", "Runtime samples every 100ms over ?seconds=N (default 1)"),
];

/// GET /debug/pprof/
pub async fn index() -> Html<String> {
    let mut rows = String::new();
    for (name, description) in PROFILES {
        rows.push_str(&format!(
            "<tr><td><a href=\"/debug/pprof/{name}\">{name}</a></td><td>{description}</td></tr>\n"
        ));
    }
    Html(format!(
        "<html>\n<head><title>/debug/pprof/</title></head>\n<body>\n/debug/pprof/\n<br>\n<table>\n{rows}</table>\n</body>\n</html>\n"
    ))
}

/// GET /debug/pprof/cmdline - argv joined by NUL bytes.
pub async fn cmdline() -> String {
    std::env::args().collect::<Vec<_>>().join("\0")
}

/// GET /debug/pprof/profile?seconds=N
pub async fn profile(State(state): State<DebugState>, Query(params): Query<DurationParams>) -> Response {
    let seconds = match duration(&state, params.seconds, DEFAULT_PROFILE_SECONDS) {
        Ok(seconds) => seconds,
        Err(response) => return response,
    };

    let started = Instant::now();
    let start = RuntimeSnapshot::capture();
    tokio::time::sleep(Duration::from_secs(seconds)).await;
    let end = RuntimeSnapshot::capture();

    Json(Profile {
        seconds,
        elapsed_ms: started.elapsed().as_millis(),
        start,
        end,
    })
    .into_response()
}

/// GET /debug/pprof/trace?seconds=N
pub async fn trace(State(state): State<DebugState>, Query(params): Query<DurationParams>) -> Response {
    let seconds = match duration(&state, params.seconds, DEFAULT_TRACE_SECONDS) {
        Ok(seconds) => seconds,
        Err(response) => return response,
    };

    let window = Duration::from_secs(seconds);
    let started = Instant::now();
    let mut samples = Vec::new();
    let mut interval = tokio::time::interval(TRACE_INTERVAL);
    loop {
        interval.tick().await;
        let offset = started.elapsed();
        if offset > window {
            break;
        }
        samples.push(TraceSample {
            offset_ms: offset.as_millis(),
            snapshot: RuntimeSnapshot::capture(),
        });
    }

    Json(samples).into_response()
}

/// GET /debug/pprof/{name}
pub async fn named(Path(name): Path<String>) -> Response {
    match name.as_str() {
        "runtime" => Json(RuntimeSnapshot::capture()).into_response(),
        _ => (StatusCode::NOT_FOUND, "Unknown profile").into_response(),
    }
}

fn duration(state: &DebugState, requested: Option<u64>, default: u64) -> Result<u64, Response> {
    let seconds = requested.unwrap_or(default);
    if seconds == 0 {
        return Err((StatusCode::BAD_REQUEST, "seconds must be positive").into_response());
    }
    if Duration::from_secs(seconds) >= state.request_timeout {
        return Err((
            StatusCode::BAD_REQUEST,
            "profile duration exceeds server's request timeout",
        )
            .into_response());
    }
    Ok(seconds)
}
