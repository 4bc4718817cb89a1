//! Mapping service: presented URL → content ID.

use serde::Deserialize;

use crate::backend::client::BackendClient;
use crate::backend::error::BackendResult;
use crate::context::{BackendCall, RequestContext};

#[derive(Debug, Deserialize)]
struct MappingDoc {
    #[serde(rename = "content-id")]
    content_id: String,
}

impl BackendClient {
    /// Ask the mapping service which content ID is mapped at `presented_url`.
    ///
    /// `Ok(None)` when no mapping service is configured or it answers 404.
    pub async fn mapping(&self, ctx: &RequestContext, presented_url: &str) -> BackendResult<Option<String>> {
        let Some(base) = &self.mapping else {
            return Ok(None);
        };

        let url = Self::endpoint(base, &["at", presented_url])?;
        let fetched = self.get(ctx, BackendCall::Mapping, url, &[]).await?;
        if fetched.is_not_found() {
            tracing::debug!(presented_url = %presented_url, "No mapping found for presented URL");
            return Ok(None);
        }

        let doc: MappingDoc = fetched.into_json()?;
        tracing::debug!(content_id = %doc.content_id, "Mapping service response: success");
        Ok(Some(doc.content_id))
    }
}
