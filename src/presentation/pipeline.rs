//! Presentation pipeline.
//!
//! # Data Flow
//! ```text
//! Resolving       forward resolve, mapping service fallback
//!     → Fetching        content document
//!     → PostProcessing  related content ∥ layout ∥ asset manifest (fail-fast join)
//!     → Rendering       ContentDocument → layout
//!     → Responded
//!
//! any failure → ErrorFallback
//!     → error layout for the status, rendered with empty data
//!     → else the on-disk page for the status (or 404.html)
//!     → else the embedded fallback page
//! ```
//!
//! # Design Decisions
//! - The response status always comes from the original failure
//! - Every request ends in a rendered body
//! - A missing asset manifest renders as `{}` and never fails the page

use std::sync::Arc;
use std::time::Instant;

use axum::http::StatusCode;
use futures_util::future::try_join3;
use serde_json::Value;
use thiserror::Error;

use crate::backend::error::status_message;
use crate::backend::{BackendClient, BackendError, ContentDoc, ContentOptions};
use crate::context::{BackendCall, RequestContext};
use crate::presentation::document::ContentDocument;
use crate::presentation::related::RelatedContent;
use crate::presentation::render::{DeconstLocals, RenderError, RenderScope, Renderer, UrlHelper};
use crate::presentation::templates::TemplateLibrary;
use crate::routing::{ContentRouter, ResolutionResult};

/// Served when neither the page nor a custom error layout can be rendered.
pub const FALLBACK_PAGE: &str = concat!(
    "<!DOCTYPE html>",
    "<html>",
    "<head>",
    "<meta charset=\"utf-8\">",
    "<title>Rendered by Deconst</title>",
    "</head>",
    "<body>",
    "<h1>Whoops</h1>",
    "<p>It looks like you asked for a page that we don't have!</p>",
    "</body>",
    "</html>",
);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Resolving,
    Fetching,
    PostProcessing,
    Rendering,
}

impl Stage {
    fn as_str(self) -> &'static str {
        match self {
            Stage::Resolving => "resolving",
            Stage::Fetching => "fetching",
            Stage::PostProcessing => "post_processing",
            Stage::Rendering => "rendering",
        }
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error(transparent)]
    Render(#[from] RenderError),
}

impl PipelineError {
    pub fn status(&self) -> StatusCode {
        match self {
            PipelineError::Backend(e) => e.status(),
            PipelineError::Render(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message(&self) -> &'static str {
        status_message(self.status())
    }
}

/// Final outcome of one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Presented {
    pub status: StatusCode,
    pub body: String,
}

pub struct Pipeline {
    router: Arc<ContentRouter>,
    backend: BackendClient,
    renderer: Arc<dyn Renderer>,
    related: Arc<dyn RelatedContent>,
    templates: Option<Arc<TemplateLibrary>>,
}

impl Pipeline {
    pub fn new(
        router: Arc<ContentRouter>,
        backend: BackendClient,
        renderer: Arc<dyn Renderer>,
        related: Arc<dyn RelatedContent>,
    ) -> Self {
        Self {
            router,
            backend,
            renderer,
            related,
            templates: None,
        }
    }

    /// Serve on-disk error pages when the layout service has none.
    pub fn with_templates(mut self, templates: Arc<TemplateLibrary>) -> Self {
        self.templates = Some(templates);
        self
    }

    pub fn router(&self) -> &Arc<ContentRouter> {
        &self.router
    }

    pub fn backend(&self) -> &BackendClient {
        &self.backend
    }

    /// Run one request through the pipeline. Never fails.
    pub async fn present(&self, ctx: &RequestContext) -> Presented {
        let presented = match self.run(ctx).await {
            Ok(body) => Presented {
                status: StatusCode::OK,
                body,
            },
            Err((stage, err)) => self.fall_back(ctx, stage, err).await,
        };

        tracing::info!(
            request_id = %ctx.request_id(),
            presented_url = %ctx.presented_url(),
            status = presented.status.as_u16(),
            timings = ?ctx.timings.summary(),
            "Presented page"
        );

        presented
    }

    async fn run(&self, ctx: &RequestContext) -> Result<String, (Stage, PipelineError)> {
        let presented_url = ctx.presented_url();

        let resolved = self
            .resolve(ctx, &presented_url)
            .await
            .map_err(|e| (Stage::Resolving, PipelineError::from(e)))?;

        let content = self
            .backend
            .content(ctx, &resolved, ContentOptions::default())
            .await
            .map_err(|e| (Stage::Fetching, PipelineError::from(e)))?
            .unwrap_or_default();

        let (results, layout, assets) = try_join3(
            self.related.resolve(ctx, &content),
            self.backend.layout(ctx, &presented_url, content.layout_key()),
            async { Ok::<_, BackendError>(self.assets(ctx).await) },
        )
        .await
        .map_err(|e| (Stage::PostProcessing, PipelineError::from(e)))?;

        let document = ContentDocument::assemble(content, results, layout, &presented_url);
        self.render_page(ctx, document, assets)
            .map_err(|e| (Stage::Rendering, PipelineError::from(e)))
    }

    async fn assets(&self, ctx: &RequestContext) -> Value {
        match self.backend.assets(ctx).await {
            Ok(manifest @ Value::Object(_)) => manifest,
            Ok(_) => {
                tracing::debug!(request_id = %ctx.request_id(), "Asset manifest is not an object, ignoring");
                empty_object()
            }
            Err(e) => {
                tracing::debug!(request_id = %ctx.request_id(), error = %e, "No asset manifest available");
                empty_object()
            }
        }
    }

    async fn resolve(&self, ctx: &RequestContext, presented_url: &str) -> Result<ResolutionResult, BackendError> {
        let resolved = self.router.forward_resolve(ctx.target());
        if resolved != ResolutionResult::Unmapped || !self.backend.has_mapping_service() {
            return Ok(resolved);
        }

        Ok(match self.backend.mapping(ctx, presented_url).await? {
            Some(content_id) => ResolutionResult::ContentId(content_id),
            None => ResolutionResult::Unmapped,
        })
    }

    fn render_page(&self, ctx: &RequestContext, document: ContentDocument, assets: Value) -> Result<String, RenderError> {
        let source = document.layout.source.clone();
        let deconst = self.deconst_locals(ctx, &document.content, assets);
        let scope = RenderScope {
            document: Some(document),
            deconst: Some(deconst),
            domain: Some(ctx.target().host().to_string()),
        };

        let start = Instant::now();
        let rendered = self.renderer.render(&source, &scope);
        ctx.timings.record(BackendCall::Render, start.elapsed());
        rendered
    }

    fn deconst_locals(&self, ctx: &RequestContext, content: &ContentDoc, assets: Value) -> DeconstLocals {
        DeconstLocals {
            env: std::env::vars().collect(),
            content: content_with_assets(content, &assets),
            assets,
            addenda: empty_object(),
            context: serde_json::json!({
                "target": ctx.target(),
                "request_id": ctx.request_id(),
            }),
            is_staging: self.router.is_staging(),
            url: UrlHelper::new(self.router.clone(), ctx.target().clone()),
        }
    }

    async fn fall_back(&self, ctx: &RequestContext, stage: Stage, err: PipelineError) -> Presented {
        let status = err.status();
        tracing::warn!(
            request_id = %ctx.request_id(),
            presented_url = %ctx.presented_url(),
            stage = stage.as_str(),
            status = status.as_u16(),
            reason = err.message(),
            error = %err,
            "Unable to present page"
        );

        let scope = RenderScope {
            domain: Some(ctx.target().host().to_string()),
            ..RenderScope::default()
        };

        let body = match self.backend.error_layout(ctx, &ctx.presented_url(), status).await {
            Ok(layout) => match self.renderer.render(&layout.source, &scope) {
                Ok(body) => Some(body),
                Err(e) => {
                    tracing::error!(request_id = %ctx.request_id(), error = %e, "Unable to render error layout");
                    None
                }
            },
            Err(e) => {
                tracing::debug!(
                    request_id = %ctx.request_id(),
                    status = status.as_u16(),
                    error = %e,
                    "No custom error layout"
                );
                self.error_page(ctx, status, &scope)
            }
        };

        Presented {
            status,
            body: body.unwrap_or_else(|| FALLBACK_PAGE.to_string()),
        }
    }

    fn error_page(&self, ctx: &RequestContext, status: StatusCode, scope: &RenderScope) -> Option<String> {
        let templates = self.templates.as_ref()?;
        match templates.render(ctx.target().host(), status.as_str(), scope) {
            Ok(body) => Some(body),
            Err(e) => {
                tracing::debug!(request_id = %ctx.request_id(), error = %e, "No on-disk error page, using fallback page");
                None
            }
        }
    }
}

fn empty_object() -> Value {
    Value::Object(Default::default())
}

/// Serialized content with the manifest mirrored into `assets`.
fn content_with_assets(content: &ContentDoc, assets: &Value) -> Value {
    let mut value = serde_json::to_value(content).unwrap_or_else(|_| empty_object());
    if let Value::Object(map) = &mut value {
        map.insert("assets".to_string(), assets.clone());
    }
    value
}
