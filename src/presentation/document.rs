//! The document handed to a layout.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::backend::{ContentDoc, Layout};

/// Envelope, related results and layout of one page, plus derived fields.
#[derive(Debug, Clone, Serialize)]
pub struct ContentDocument {
    pub envelope: Map<String, Value>,
    pub results: Value,
    pub presented_url: String,
    pub has_next_or_previous: bool,

    #[serde(skip)]
    pub layout: Layout,

    #[serde(skip)]
    pub content: ContentDoc,
}

impl ContentDocument {
    pub fn assemble(content: ContentDoc, results: Value, layout: Layout, presented_url: &str) -> Self {
        Self {
            envelope: content.envelope.clone(),
            has_next_or_previous: content.has_next_or_previous(),
            results,
            presented_url: presented_url.to_string(),
            layout,
            content,
        }
    }
}
