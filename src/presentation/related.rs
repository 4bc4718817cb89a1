//! Related-content resolution for fetched documents.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::backend::{BackendResult, ContentDoc};
use crate::context::RequestContext;

/// Resolves the related content a document refers to (query results,
/// cross links) into data for the layout.
#[async_trait]
pub trait RelatedContent: Send + Sync {
    async fn resolve(&self, ctx: &RequestContext, doc: &ContentDoc) -> BackendResult<Value>;
}

/// Documents currently declare no related content; resolves to `{}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRelatedContent;

#[async_trait]
impl RelatedContent for NoRelatedContent {
    async fn resolve(&self, _ctx: &RequestContext, _doc: &ContentDoc) -> BackendResult<Value> {
        Ok(Value::Object(Map::new()))
    }
}
