//! Layout service: page and error templates.

use axum::http::StatusCode;

use crate::backend::client::BackendClient;
use crate::backend::error::BackendResult;
use crate::context::{BackendCall, RequestContext};

/// Template source returned by the layout service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub key: String,
    pub source: String,
}

impl BackendClient {
    /// Fetch the layout named `layout_key` for a presented URL.
    pub async fn layout(&self, ctx: &RequestContext, presented_url: &str, layout_key: &str) -> BackendResult<Layout> {
        let url = Self::endpoint(&self.layout, &[presented_url, layout_key])?;
        let source = self.get(ctx, BackendCall::Layout, url, &[]).await?.into_text()?;
        Ok(Layout {
            key: layout_key.to_string(),
            source,
        })
    }

    /// Fetch the custom error page for `status` at a presented URL.
    pub async fn error_layout(&self, ctx: &RequestContext, presented_url: &str, status: StatusCode) -> BackendResult<Layout> {
        let code = status.as_u16().to_string();
        let url = Self::endpoint(&self.layout, &["error", presented_url, &code])?;
        let source = self.get(ctx, BackendCall::ErrorLayout, url, &[]).await?.into_text()?;
        Ok(Layout { key: code, source })
    }
}
