//! Proxy dispatcher.
//!
//! # Responsibilities
//! - Match requests against the proxy routes of the serving host
//! - Forward matching requests to the upstream, body streamed through
//! - Stream the upstream response back unchanged
//!
//! # Design Decisions
//! - Runs before routing: proxied paths never reach the pipeline
//! - Longest prefix wins, as for content routes
//! - The inbound `Host` header is dropped; the client sets the upstream's
//! - Upstreams are spoken to over HTTP/1.1 whatever the inbound version

use std::time::Instant;

use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, StatusCode, Uri, Version},
    middleware::Next,
    response::{IntoResponse, Response},
};

use hyper::body::Incoming;

use crate::http::request::{host_header, request_id};
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::routing::target::serving_host;

/// Middleware: forward proxied prefixes, pass everything else to `next`.
pub async fn dispatch(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let host = serving_host(host_header(request.headers()), &state.presentation);
    let path = request.uri().path();

    let Some((prefix, upstream)) = state.pipeline.router().proxy_match(&host, path) else {
        return next.run(request).await;
    };

    let start = Instant::now();
    let request_id = request_id(request.headers()).to_string();
    let path_and_query = request
        .uri()
        .path_and_query()
        .map_or(path, |pq| pq.as_str());
    let suffix = path_and_query.strip_prefix(prefix.as_str()).unwrap_or(path_and_query);
    let target = format!("{}{}", upstream.trim_end_matches('/'), suffix);

    tracing::debug!(
        request_id = %request_id,
        site = %host,
        target = %target,
        "Proxy request"
    );

    let uri: Uri = match target.parse() {
        Ok(uri) => uri,
        Err(e) => {
            tracing::error!(request_id = %request_id, target = %target, error = %e, "Invalid proxy target");
            metrics::record_proxy(&host, StatusCode::BAD_GATEWAY.as_u16());
            return (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response();
        }
    };

    let (mut parts, body) = request.into_parts();
    parts.uri = uri;
    parts.version = Version::HTTP_11;
    parts.headers.remove(header::HOST);
    let upstream_request = Request::from_parts(parts, body);

    let forwarded: Result<hyper::Response<Incoming>, _> = state.proxy_client.request(upstream_request).await;
    match forwarded {
        Ok(response) => {
            let status = response.status();
            tracing::debug!(
                request_id = %request_id,
                status = %status,
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Proxy response"
            );
            metrics::record_proxy(&host, status.as_u16());

            let (parts, body) = response.into_parts();
            Response::from_parts(parts, Body::new(body))
        }
        Err(e) => {
            tracing::error!(request_id = %request_id, target = %target, error = %e, "Upstream error");
            metrics::record_proxy(&host, StatusCode::BAD_GATEWAY.as_u16());
            (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response()
        }
    }
}
