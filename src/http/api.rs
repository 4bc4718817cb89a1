//! JSON API and page handlers.

use std::time::Instant;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, Uri};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};

use crate::backend::{SearchQuery, SearchResults};
use crate::http::request::request_context;
use crate::http::response::ApiError;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::routing::Mapping;

/// Every other GET: run the presentation pipeline.
pub async fn present_page(State(state): State<AppState>, headers: HeaderMap, uri: Uri) -> Response {
    let start = Instant::now();
    let ctx = request_context(&headers, uri.path(), &state.presentation);

    let presented = state.pipeline.present(&ctx).await;
    metrics::record_request(presented.status.as_u16(), start);

    presented.into_response()
}

pub async fn version(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "staging": state.pipeline.router().is_staging(),
    }))
}

/// Every presented location of a content ID, across all domains.
pub async fn whereis(State(state): State<AppState>, Path(content_id): Path<String>) -> Json<Vec<Mapping>> {
    Json(state.pipeline.router().reverse_resolve(&content_id, None, false))
}

pub async fn search(
    State(state): State<AppState>,
    headers: HeaderMap,
    uri: Uri,
    Query(query): Query<SearchQuery>,
) -> Result<Json<SearchResults>, ApiError> {
    let ctx = request_context(&headers, uri.path(), &state.presentation);
    let results = state
        .pipeline
        .backend()
        .search(&ctx, state.pipeline.router(), &query)
        .await?;
    Ok(Json(results))
}

pub async fn assets(State(state): State<AppState>, headers: HeaderMap, uri: Uri) -> Result<Json<Value>, ApiError> {
    let ctx = request_context(&headers, uri.path(), &state.presentation);
    Ok(Json(state.pipeline.backend().assets(&ctx).await?))
}

pub async fn control(State(state): State<AppState>, headers: HeaderMap, uri: Uri) -> Result<Json<Value>, ApiError> {
    let ctx = request_context(&headers, uri.path(), &state.presentation);
    let sha = state.pipeline.backend().control_sha(&ctx).await?;
    Ok(Json(json!({ "sha": sha })))
}
