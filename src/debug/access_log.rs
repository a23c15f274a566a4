//! Request access logging.
//!
//! Every request gets an `x-request-id` (generated unless the client sent
//! one), one completion record at info level and a sample in the request
//! metrics.

use std::time::Instant;

use axum::{
    body::Body,
    http::{HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::debug::server::COMPONENT;
use crate::observability::metrics;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

pub async fn access_log(mut req: Request<Body>, next: Next) -> Response {
    let started = Instant::now();

    let request_id = match req.headers().get(REQUEST_ID_HEADER) {
        Some(value) => value.clone(),
        None => {
            let generated = HeaderValue::from_str(&Uuid::new_v4().to_string())
                .unwrap_or_else(|_| HeaderValue::from_static("unknown"));
            req.headers_mut().insert(REQUEST_ID_HEADER, generated.clone());
            generated
        }
    };

    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let mut response = next.run(req).await;
    let status = response.status();

    tracing::info!(
        target: COMPONENT,
        request_id = request_id.to_str().unwrap_or_default(),
        method = %method,
        path = %path,
        status = status.as_u16(),
        latency_ms = started.elapsed().as_millis() as u64,
        "request served"
    );
    metrics::record_request(method.as_str(), status.as_u16(), started);

    response.headers_mut().insert(REQUEST_ID_HEADER, request_id);
    response
}
