//! Debug server construction and lifecycle.
//!
//! `DebugServer::new` validates options and registers every route up front.
//! `run` binds, serves until the cancellation token fires, then allows
//! in-flight requests the shutdown grace period before aborting whatever
//! connections are still open.

use std::any::Any;
use std::io;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Redirect, Response},
    routing::{get, MethodRouter},
    Router,
};
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder;
use hyper_util::server::graceful::GracefulShutdown;
use hyper_util::service::TowerToHyperService;
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::net::TcpListener;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tower_http::{catch_panic::CatchPanicLayer, timeout::TimeoutLayer};

use crate::debug::access_log::access_log;
use crate::debug::index::{IndexPage, Page};
use crate::debug::options::DebugServerOptions;
use crate::debug::pprof::DEFAULT_PROFILE_WINDOW;
use crate::debug::{handlers, pprof};
use crate::net::{self, AddrError, HostPort, ListenError};
use crate::observability::AtomicLevel;

/// Target attached to every record the debug server emits.
pub const COMPONENT: &str = "server-debug";

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("invalid debug server address: {0}")]
    InvalidAddr(#[from] AddrError),

    #[error("debug server {0} must be greater than zero")]
    ZeroTimeout(&'static str),

    #[error("debug server request_timeout {0:?} must exceed the {window:?} profile window", window = DEFAULT_PROFILE_WINDOW)]
    RequestTimeoutTooShort(Duration),

    #[error(transparent)]
    Listen(#[from] ListenError),

    #[error("serve debug http: {0}")]
    Serve(#[source] io::Error),
}

/// State shared by the debug handlers.
#[derive(Clone)]
pub struct DebugState {
    pub(crate) level: AtomicLevel,
    pub(crate) index: Arc<IndexPage>,
    pub(crate) request_timeout: Duration,
    pub(crate) metrics: Option<PrometheusHandle>,
}

/// Introspection HTTP server.
pub struct DebugServer {
    addr: HostPort,
    shutdown_timeout: Duration,
    request_timeout: Duration,
    level: AtomicLevel,
    index: IndexPage,
    metrics: Option<PrometheusHandle>,
    router: Router<DebugState>,
}

impl DebugServer {
    /// Validate `options` and register the built-in routes.
    ///
    /// `level` is the same cell the logger filters on, so writes through
    /// `PUT /log/level` apply to the whole process.
    pub fn new(options: DebugServerOptions, level: AtomicLevel) -> Result<Self, ServerError> {
        let addr = options.validate()?;

        let mut index = IndexPage::new();
        index.add_page("/version", "Get build information");
        index.add_page("/debug/pprof/", "Get std profiler");
        index.add_page("/debug/pprof/profile?seconds=30", "Take half-min profile");

        let router = Router::new()
            .route("/", get(handlers::index))
            .route("/version", get(handlers::version))
            .route("/log/level", get(handlers::get_level).put(handlers::put_level))
            .route("/debug/pprof", get(|| async { Redirect::permanent("/debug/pprof/") }))
            .route("/debug/pprof/", get(pprof::index))
            .route("/debug/pprof/cmdline", get(pprof::cmdline))
            .route("/debug/pprof/profile", get(pprof::profile))
            .route("/debug/pprof/trace", get(pprof::trace))
            .route("/debug/pprof/{name}", get(pprof::named));

        Ok(Self {
            addr,
            shutdown_timeout: options.shutdown_timeout(),
            request_timeout: options.request_timeout(),
            level,
            index,
            metrics: None,
            router,
        })
    }

    /// Serve the Prometheus rendering of `handle` at `/metrics`.
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self.register_page("/metrics", "Get Prometheus metrics", get(render_metrics))
    }

    /// Add a route and list it on the index page.
    pub fn register_page(
        mut self,
        path: &str,
        description: &str,
        route: MethodRouter<DebugState>,
    ) -> Self {
        self.index.add_page(path, description);
        self.router = self.router.route(path, route);
        self
    }

    pub fn addr(&self) -> &HostPort {
        &self.addr
    }

    pub fn pages(&self) -> &[Page] {
        self.index.pages()
    }

    /// Finish the router: routes, state and middleware.
    ///
    /// Layer order from the outside in: access log, request timeout, panic
    /// recovery. A panicking handler therefore still shows up in the access
    /// log as a 500.
    pub fn into_router(self) -> Router {
        self.build().1
    }

    fn build(self) -> (ServerParts, Router) {
        let state = DebugState {
            level: self.level,
            index: Arc::new(self.index),
            request_timeout: self.request_timeout,
            metrics: self.metrics,
        };

        #[allow(deprecated)]
        let timeout = TimeoutLayer::new(self.request_timeout);

        let router = self
            .router
            .layer(CatchPanicLayer::custom(handle_panic))
            .layer(timeout)
            .layer(middleware::from_fn(access_log))
            .with_state(state);

        let parts = ServerParts {
            addr: self.addr,
            shutdown_timeout: self.shutdown_timeout,
        };
        (parts, router)
    }

    /// Bind the configured address and serve until `cancel` fires.
    pub async fn run(self, cancel: CancellationToken) -> Result<(), ServerError> {
        let listener = net::bind(&self.addr).await?;
        self.serve(listener, cancel).await
    }

    /// Serve on an already bound listener until `cancel` fires.
    ///
    /// On cancellation the listener is closed and open connections are
    /// asked to finish. Connections still open after the shutdown timeout
    /// are aborted. Both paths return `Ok(())`.
    pub async fn serve(self, listener: TcpListener, cancel: CancellationToken) -> Result<(), ServerError> {
        let (parts, router) = self.build();
        let local = listener
            .local_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| parts.addr.to_string());

        tracing::info!(target: COMPONENT, addr = %local, "debug server listening");

        let builder = Builder::new(TokioExecutor::new());
        let graceful = GracefulShutdown::new();
        let mut connections = JoinSet::new();

        loop {
            let (stream, peer) = tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok(conn) => conn,
                    Err(e) if is_connection_error(&e) => continue,
                    Err(e) => return Err(ServerError::Serve(e)),
                },
                _ = cancel.cancelled() => break,
            };

            let service = TowerToHyperService::new(router.clone());
            let conn = builder.serve_connection_with_upgrades(TokioIo::new(stream), service);
            let conn = graceful.watch(conn.into_owned());
            connections.spawn(async move {
                if let Err(e) = conn.await {
                    tracing::debug!(target: COMPONENT, peer = %peer, error = %e, "connection closed with error");
                }
            });

            while connections.try_join_next().is_some() {}
        }
        drop(listener);

        tracing::info!(
            target: COMPONENT,
            grace_ms = parts.shutdown_timeout.as_millis() as u64,
            open = connections.len(),
            "debug server shutting down"
        );

        let drained = tokio::time::timeout(parts.shutdown_timeout, async {
            graceful.shutdown().await;
            while connections.join_next().await.is_some() {}
        })
        .await;

        if drained.is_err() {
            tracing::warn!(
                target: COMPONENT,
                open = connections.len(),
                "shutdown grace period elapsed, closing remaining connections"
            );
            connections.shutdown().await;
        }

        tracing::info!(target: COMPONENT, "debug server stopped");
        Ok(())
    }
}

fn is_connection_error(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::ConnectionRefused
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::ConnectionReset
    )
}

struct ServerParts {
    addr: HostPort,
    shutdown_timeout: Duration,
}

async fn render_metrics(State(state): State<DebugState>) -> Response {
    match state.metrics {
        Some(handle) => handle.render().into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        (*s).to_string()
    } else {
        "unknown panic".to_string()
    };

    tracing::error!(target: COMPONENT, panic = %detail, "handler panicked");
    (StatusCode::INTERNAL_SERVER_ERROR, "internal server error").into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::Level;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request};
    use tower::ServiceExt;

    fn server(level: &AtomicLevel) -> DebugServer {
        DebugServer::new(DebugServerOptions::new("127.0.0.1:8079"), level.clone()).unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    async fn boom() -> &'static str {
        panic!("handler failure")
    }

    #[test]
    fn rejects_address_without_port() {
        let result = DebugServer::new(DebugServerOptions::new("localhost"), AtomicLevel::default());
        assert!(matches!(result, Err(ServerError::InvalidAddr(AddrError::MissingPort(_)))));
    }

    #[test]
    fn registers_pages_in_order() {
        let level = AtomicLevel::default();
        let server = server(&level).register_page("/extra", "Extra page", get(|| async { "x" }));
        let paths: Vec<_> = server.pages().iter().map(|p| p.path.as_str()).collect();
        assert_eq!(
            paths,
            ["/version", "/debug/pprof/", "/debug/pprof/profile?seconds=30", "/extra"]
        );
    }

    #[tokio::test]
    async fn index_shows_current_level() {
        let level = AtomicLevel::new(Level::Warn);
        let response = server(&level)
            .into_router()
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.contains("Chat Service Debug"));
        assert!(html.contains(r#"<b id="log-level-current">WARN</b>"#));
        assert!(html.contains(r#"<a href="/version">/version</a>"#));
    }

    #[tokio::test]
    async fn version_is_json() {
        let response = server(&AtomicLevel::default())
            .into_router()
            .oneshot(Request::get("/version").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let value: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(value["name"], "chat-service");
    }

    #[tokio::test]
    async fn put_then_get_level() {
        let level = AtomicLevel::default();
        let router = server(&level).into_router();

        let response = router
            .clone()
            .oneshot(
                Request::put("/log/level")
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from("level=warn"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(level.get(), Level::Warn);

        let response = router
            .oneshot(Request::get("/log/level").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(body_text(response).await, "WARN");
    }

    #[tokio::test]
    async fn invalid_level_keeps_previous() {
        let level = AtomicLevel::new(Level::Error);
        let response = server(&level)
            .into_router()
            .oneshot(Request::put("/log/level").body(Body::from("trace")).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(level.get(), Level::Error);
    }

    #[tokio::test]
    async fn level_as_json() {
        let level = AtomicLevel::new(Level::Debug);
        let response = server(&level)
            .into_router()
            .oneshot(
                Request::get("/log/level")
                    .header(header::ACCEPT, "application/json")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(body_text(response).await, r#"{"level":"DEBUG"}"#);
    }

    #[tokio::test]
    async fn panic_becomes_500_and_server_continues() {
        let router = server(&AtomicLevel::default())
            .register_page("/boom", "Always fails", get(boom))
            .into_router();

        let response = router
            .clone()
            .oneshot(Request::get("/boom").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let response = router
            .oneshot(Request::get("/version").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn request_id_is_attached() {
        let response = server(&AtomicLevel::default())
            .into_router()
            .oneshot(Request::get("/version").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let id = response.headers().get("x-request-id").unwrap().to_str().unwrap();
        assert_eq!(id.len(), 36);

        let response = server(&AtomicLevel::default())
            .into_router()
            .oneshot(
                Request::get("/version")
                    .header("x-request-id", "abc")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.headers()["x-request-id"], "abc");
    }

    #[tokio::test]
    async fn pprof_endpoints() {
        let router = server(&AtomicLevel::default()).into_router();

        let response = router
            .clone()
            .oneshot(Request::get("/debug/pprof/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert!(body_text(response).await.contains("/debug/pprof/cmdline"));

        let response = router
            .clone()
            .oneshot(Request::get("/debug/pprof/runtime").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert!(value["workers"].as_u64().unwrap() >= 1);

        let response = router
            .clone()
            .oneshot(Request::get("/debug/pprof/heap").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = router
            .clone()
            .oneshot(Request::get("/debug/pprof/profile?seconds=600").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = router
            .oneshot(Request::get("/debug/pprof/cmdline").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn profile_window_bounded_by_request_timeout() {
        let options = DebugServerOptions::new("127.0.0.1:8079").with_request_timeout(Duration::from_secs(31));
        let router = DebugServer::new(options, AtomicLevel::default()).unwrap().into_router();

        let response = router
            .clone()
            .oneshot(Request::get("/debug/pprof/profile?seconds=31").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = router
            .oneshot(Request::get("/debug/pprof/trace?seconds=1").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn metrics_page_registered_with_handle() {
        let (_recorder, handle) = crate::observability::metrics::build_recorder();
        let server = server(&AtomicLevel::default()).with_metrics(handle);
        assert!(server.pages().iter().any(|p| p.path == "/metrics"));

        let response = server
            .into_router()
            .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn cancellation_stops_serving() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let cancel = CancellationToken::new();
        let task = tokio::spawn(server(&AtomicLevel::default()).serve(listener, cancel.clone()));

        cancel.cancel();
        let result = tokio::time::timeout(Duration::from_secs(5), task).await.unwrap().unwrap();
        assert!(result.is_ok());
    }
}
