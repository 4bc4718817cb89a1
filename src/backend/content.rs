//! Content service: documents, assets, search and control SHA.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::backend::client::BackendClient;
use crate::backend::error::{BackendError, BackendResult};
use crate::context::{BackendCall, RequestContext};
use crate::routing::{ContentRouter, ResolutionResult};

const DEFAULT_PER_PAGE: u64 = 10;

/// A document as returned by the content service.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ContentDoc {
    #[serde(default)]
    pub envelope: Map<String, Value>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ContentDoc {
    /// The document served for `EmptyEnvelope` routes.
    pub fn empty() -> Self {
        let mut envelope = Map::new();
        envelope.insert("title".into(), Value::String(String::new()));
        envelope.insert("body".into(), Value::String(String::new()));
        Self {
            envelope,
            extra: Map::new(),
        }
    }

    pub fn layout_key(&self) -> &str {
        self.envelope
            .get("layout_key")
            .and_then(Value::as_str)
            .filter(|key| !key.is_empty())
            .unwrap_or("default")
    }

    pub fn has_next_or_previous(&self) -> bool {
        ["next", "previous"]
            .iter()
            .any(|key| self.envelope.get(*key).is_some_and(truthy))
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Options for a content fetch.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentOptions {
    /// Resolve transport failures to "no data" instead of an error.
    pub ignore_errors: bool,
}

/// Search parameters, named as the content service expects them.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
    #[serde(rename = "pageNumber", default, skip_serializing_if = "Option::is_none")]
    pub page_number: Option<u64>,
    #[serde(rename = "perPage", default, skip_serializing_if = "Option::is_none")]
    pub per_page: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<String>,
}

impl SearchQuery {
    fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("q", self.q.clone())];
        if let Some(page) = self.page_number {
            pairs.push(("pageNumber", page.to_string()));
        }
        if let Some(per_page) = self.per_page {
            pairs.push(("perPage", per_page.to_string()));
        }
        if let Some(categories) = &self.categories {
            pairs.push(("categories", categories.clone()));
        }
        pairs
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SearchHit {
    #[serde(rename = "contentID")]
    pub content_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct SearchResults {
    pub total: u64,
    pub results: Vec<SearchHit>,
    #[serde(default)]
    pub pages: u64,
}

#[derive(Debug, Deserialize)]
struct ControlDoc {
    sha: Option<String>,
}

impl BackendClient {
    /// Fetch the document for a resolved route.
    ///
    /// `Unmapped` fails with `BackendError::Unmapped`; `EmptyEnvelope` answers
    /// without touching the network.
    pub async fn content(
        &self,
        ctx: &RequestContext,
        resolved: &ResolutionResult,
        options: ContentOptions,
    ) -> BackendResult<Option<ContentDoc>> {
        let content_id = match resolved {
            ResolutionResult::Unmapped => return Err(BackendError::Unmapped),
            ResolutionResult::EmptyEnvelope => return Ok(Some(ContentDoc::empty())),
            ResolutionResult::ContentId(id) => id,
        };

        let url = Self::endpoint(&self.content, &["content", content_id])?;
        let fetched = match self.get(ctx, BackendCall::Content, url, &[]).await {
            Ok(fetched) => fetched,
            Err(BackendError::ServiceUnavailable { .. } | BackendError::Transport { .. })
                if options.ignore_errors =>
            {
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        fetched.into_json().map(Some)
    }

    /// Fetch the asset manifest.
    pub async fn assets(&self, ctx: &RequestContext) -> BackendResult<Value> {
        let url = Self::endpoint(&self.content, &["assets"])?;
        self.get(ctx, BackendCall::Assets, url, &[]).await?.into_json()
    }

    /// Run a search, keeping only hits that have a presented URL on this domain.
    pub async fn search(
        &self,
        ctx: &RequestContext,
        router: &ContentRouter,
        query: &SearchQuery,
    ) -> BackendResult<SearchResults> {
        let url = Self::endpoint(&self.content, &["search"])?;
        let fetched = self.get(ctx, BackendCall::Search, url, &query.pairs()).await?;

        // Older content services have no search endpoint.
        if fetched.is_not_found() {
            return Ok(SearchResults::default());
        }

        let mut doc: SearchResults = fetched.into_json()?;
        tracing::debug!(result_count = doc.results.len(), "Content service search successful");

        doc.results.retain_mut(|hit| {
            hit.url = router.presented_url(ctx.target(), &hit.content_id, false);
            hit.url.is_some()
        });

        let per_page = query.per_page.filter(|n| *n > 0).unwrap_or(DEFAULT_PER_PAGE);
        doc.pages = doc.total.div_ceil(per_page);

        Ok(doc)
    }

    /// SHA of the control repository, `None` when the service does not track one.
    pub async fn control_sha(&self, ctx: &RequestContext) -> BackendResult<Option<String>> {
        let url = Self::endpoint(&self.content, &["control"])?;
        let fetched = self.get(ctx, BackendCall::ControlSha, url, &[]).await?;

        if fetched.is_not_found() {
            return Ok(None);
        }

        let doc: ControlDoc = fetched.into_json()?;
        Ok(doc.sha)
    }
}
