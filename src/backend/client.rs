//! Shared HTTP client for the backend services.
//!
//! # Responsibilities
//! - Hold the parsed base URLs of the mapping, content and layout services
//! - Join base URLs with percent-encoded path segments
//! - Issue GETs with connect and per-call timeouts
//! - Classify transport failures and non-2xx answers into `BackendError`
//! - Record each call's duration into the request context

use std::time::Instant;

use axum::http::StatusCode;
use serde::de::DeserializeOwned;
use url::Url;

use crate::backend::error::{BackendError, BackendResult, UpstreamBody};
use crate::config::{ServicesConfig, TimeoutConfig};
use crate::context::{BackendCall, RequestContext};
use crate::observability::metrics;

/// Stateless gateway to the backend services. Cheap to clone.
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    pub(crate) mapping: Option<Url>,
    pub(crate) content: Url,
    pub(crate) layout: Url,
}

/// A completed backend response with its body read.
#[derive(Debug)]
pub(crate) struct Fetched {
    pub status: StatusCode,
    pub body: String,
}

impl Fetched {
    pub fn is_not_found(&self) -> bool {
        self.status == StatusCode::NOT_FOUND
    }

    fn check(self) -> BackendResult<String> {
        if self.status.is_success() {
            Ok(self.body)
        } else {
            Err(BackendError::Upstream {
                status: self.status,
                body: UpstreamBody::parse(&self.body),
            })
        }
    }

    /// Decode a 2xx JSON body; anything else becomes `BackendError::Upstream`.
    pub fn into_json<T: DeserializeOwned>(self) -> BackendResult<T> {
        let body = self.check()?;
        serde_json::from_str(&body).map_err(|source| BackendError::InvalidResponse { source })
    }

    pub fn into_text(self) -> BackendResult<String> {
        self.check()
    }
}

impl BackendClient {
    pub fn new(services: &ServicesConfig, timeouts: &TimeoutConfig) -> BackendResult<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(timeouts.connect())
            .timeout(timeouts.backend())
            .build()
            .map_err(BackendError::from_transport)?;

        Ok(Self {
            http,
            mapping: services.mapping_url.as_deref().map(parse_base).transpose()?,
            content: parse_base(&services.content_url)?,
            layout: parse_base(&services.layout_url)?,
        })
    }

    pub fn has_mapping_service(&self) -> bool {
        self.mapping.is_some()
    }

    /// Append percent-encoded `segments` to `base`.
    pub(crate) fn endpoint(base: &Url, segments: &[&str]) -> BackendResult<Url> {
        let mut url = base.clone();
        url.path_segments_mut()
            .map_err(|_| BackendError::InvalidUrl(base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// GET `url`, reading the whole body, and record the call duration.
    pub(crate) async fn get(
        &self,
        ctx: &RequestContext,
        call: BackendCall,
        url: Url,
        query: &[(&str, String)],
    ) -> BackendResult<Fetched> {
        tracing::debug!(
            request_id = %ctx.request_id(),
            call = %call,
            url = %url,
            "Backend request"
        );

        let start = Instant::now();
        let result = self.send(url, query).await;
        let elapsed = start.elapsed();
        ctx.timings.record(call, elapsed);

        match &result {
            Ok(fetched) => {
                tracing::debug!(
                    request_id = %ctx.request_id(),
                    call = %call,
                    status = %fetched.status,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Backend response"
                );
                metrics::record_backend_call(call, fetched.status.as_str(), elapsed);
            }
            Err(e) => {
                tracing::warn!(
                    request_id = %ctx.request_id(),
                    call = %call,
                    error = %e,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Backend request failed"
                );
                metrics::record_backend_call(call, "error", elapsed);
            }
        }

        result
    }

    async fn send(&self, url: Url, query: &[(&str, String)]) -> BackendResult<Fetched> {
        let mut request = self.http.get(url);
        if !query.is_empty() {
            request = request.query(query);
        }

        let response = request.send().await.map_err(BackendError::from_transport)?;
        let status = response.status();
        let body = response.text().await.map_err(BackendError::from_transport)?;

        Ok(Fetched { status, body })
    }
}

fn parse_base(raw: &str) -> BackendResult<Url> {
    Url::parse(raw).map_err(|e| BackendError::InvalidUrl(format!("{raw}: {e}")))
}
