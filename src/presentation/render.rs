//! Template rendering.
//!
//! # Responsibilities
//! - Apply a layout's template source to a content document
//! - Expose the `deconst.*` namespace to templates
//!
//! # Template namespace
//! ```text
//! envelope, results, presented_url, has_next_or_previous   (page layouts)
//! deconst.env          process environment
//! deconst.content      content document
//! deconst.assets       asset manifest
//! deconst.addenda      auxiliary documents
//! deconst.url          .presented(content_id, cross_domain=false) / .site(path, domain=none)
//! deconst.context      request target and request id
//! deconst.is_staging   staging mode flag
//! ```
//!
//! Booleans print as `true`/`false` and `none` prints as nothing.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use minijinja::value::{from_args, Object, Value, ValueKind};
use minijinja::{escape_formatter, AutoEscape, Environment, ErrorKind, Output, State};
use thiserror::Error;

use crate::presentation::document::ContentDocument;
use crate::presentation::templates::{TemplateLibrary, DEFAULT_DIR};
use crate::routing::url::site_url;
use crate::routing::{ContentRouter, RequestTarget};

#[derive(Debug, Error)]
#[error("Template rendering failed: {0}")]
pub struct RenderError(#[from] minijinja::Error);

/// Turns template source plus data into output text.
pub trait Renderer: Send + Sync {
    fn render(&self, source: &str, scope: &RenderScope) -> Result<String, RenderError>;
}

/// Data visible to one render. The default scope is empty.
#[derive(Debug, Default)]
pub struct RenderScope {
    pub document: Option<ContentDocument>,
    pub deconst: Option<DeconstLocals>,
    /// Domain whose template directory `include` and `extends` resolve against.
    pub domain: Option<String>,
}

/// Values behind `deconst.*`.
#[derive(Debug)]
pub struct DeconstLocals {
    pub env: BTreeMap<String, String>,
    pub content: serde_json::Value,
    pub assets: serde_json::Value,
    pub addenda: serde_json::Value,
    pub context: serde_json::Value,
    pub is_staging: bool,
    pub url: UrlHelper,
}

/// URL construction helper bound to one request.
#[derive(Clone)]
pub struct UrlHelper {
    router: Arc<ContentRouter>,
    target: RequestTarget,
}

impl UrlHelper {
    pub fn new(router: Arc<ContentRouter>, target: RequestTarget) -> Self {
        Self { router, target }
    }

    pub fn presented(&self, content_id: &str, cross_domain: bool) -> Option<String> {
        self.router.presented_url(&self.target, content_id, cross_domain)
    }

    pub fn site(&self, path: &str, domain: Option<&str>) -> String {
        site_url(&self.target, path, domain.unwrap_or(self.target.host()))
    }
}

impl fmt::Debug for UrlHelper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UrlHelper").field("target", &self.target).finish_non_exhaustive()
    }
}

impl Object for UrlHelper {
    fn call_method(
        self: &Arc<Self>,
        _state: &State<'_, '_>,
        method: &str,
        args: &[Value],
    ) -> Result<Value, minijinja::Error> {
        match method {
            "presented" => {
                let (content_id, cross_domain): (&str, Option<bool>) = from_args(args)?;
                Ok(Value::from(self.presented(content_id, cross_domain.unwrap_or(false))))
            }
            "site" => {
                let (path, domain): (&str, Option<&str>) = from_args(args)?;
                Ok(Value::from(self.site(path, domain)))
            }
            _ => Err(minijinja::Error::new(
                ErrorKind::UnknownMethod,
                format!("deconst.url has no method named {method}"),
            )),
        }
    }
}

/// Renders with a fresh `minijinja` environment per call. No auto-escaping.
///
/// With a template library, layouts may include on-disk templates.
#[derive(Debug, Default)]
pub struct MiniJinjaRenderer {
    templates: Option<Arc<TemplateLibrary>>,
}

impl MiniJinjaRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_templates(templates: Arc<TemplateLibrary>) -> Self {
        Self {
            templates: Some(templates),
        }
    }
}

impl Renderer for MiniJinjaRenderer {
    fn render(&self, source: &str, scope: &RenderScope) -> Result<String, RenderError> {
        let env = match &self.templates {
            Some(templates) => templates.environment(scope.domain.as_deref().unwrap_or(DEFAULT_DIR)),
            None => environment(),
        };
        Ok(env.render_str(source, scope_value(scope))?)
    }
}

/// A bare environment with the presenter's output formatting.
pub(crate) fn environment() -> Environment<'static> {
    let mut env = Environment::new();
    env.set_auto_escape_callback(|_| AutoEscape::None);
    env.set_formatter(format_value);
    env
}

fn format_value(out: &mut Output<'_>, state: &State<'_, '_>, value: &Value) -> Result<(), minijinja::Error> {
    let text = match value.kind() {
        ValueKind::Bool if value.is_true() => "true",
        ValueKind::Bool => "false",
        ValueKind::None => "",
        _ => return escape_formatter(out, state, value),
    };
    fmt::Write::write_str(out, text)
        .map_err(|e| minijinja::Error::new(ErrorKind::WriteFailure, "unable to write template output").with_source(e))
}

/// The template context for a scope.
pub(crate) fn scope_value(scope: &RenderScope) -> Value {
    let mut root: BTreeMap<String, Value> = BTreeMap::new();

    if let Some(doc) = &scope.document {
        root.insert("envelope".into(), Value::from_serialize(&doc.envelope));
        root.insert("results".into(), Value::from_serialize(&doc.results));
        root.insert("presented_url".into(), Value::from(doc.presented_url.as_str()));
        root.insert("has_next_or_previous".into(), Value::from(doc.has_next_or_previous));
    }

    if let Some(locals) = &scope.deconst {
        root.insert("deconst".into(), deconst_value(locals));
    }

    Value::from_object(root)
}

fn deconst_value(locals: &DeconstLocals) -> Value {
    let mut deconst: BTreeMap<String, Value> = BTreeMap::new();
    deconst.insert("env".into(), Value::from_serialize(&locals.env));
    deconst.insert("content".into(), Value::from_serialize(&locals.content));
    deconst.insert("assets".into(), Value::from_serialize(&locals.assets));
    deconst.insert("addenda".into(), Value::from_serialize(&locals.addenda));
    deconst.insert("context".into(), Value::from_serialize(&locals.context));
    deconst.insert("is_staging".into(), Value::from(locals.is_staging));
    deconst.insert("url".into(), Value::from_object(locals.url.clone()));
    Value::from_object(deconst)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{ContentDoc, Layout};
    use crate::config::PresentationConfig;
    use crate::routing::RoutingTable;
    use serde_json::json;

    fn locals() -> DeconstLocals {
        let table: RoutingTable =
            serde_json::from_value(json!({"example.com": {"content": {"/guide": "proj/guide"}}})).unwrap();
        let router = Arc::new(ContentRouter::new(table, false));
        let target = RequestTarget::from_request(Some("example.com"), "/guide/intro", &PresentationConfig::default());

        DeconstLocals {
            env: BTreeMap::from([("SITE_NAME".to_string(), "Docs".to_string())]),
            content: json!({"envelope": {"title": "Intro"}}),
            assets: json!({"app.css": "/assets/app-1.css"}),
            addenda: json!({}),
            context: json!({"host": "example.com"}),
            is_staging: false,
            url: UrlHelper::new(router, target),
        }
    }

    fn document() -> ContentDocument {
        let content: ContentDoc = serde_json::from_value(json!({"envelope": {"title": "Intro"}})).unwrap();
        let layout = Layout {
            key: "default".into(),
            source: String::new(),
        };
        ContentDocument::assemble(content, json!({"count": 2}), layout, "https://example.com/guide/intro")
    }

    #[test]
    fn test_renders_document_fields() {
        let scope = RenderScope {
            document: Some(document()),
            deconst: None,
            domain: None,
        };
        let out = MiniJinjaRenderer::new()
            .render("{{ envelope.title }}|{{ presented_url }}|{{ results.count }}|{{ has_next_or_previous }}", &scope)
            .unwrap();
        assert_eq!(out, "Intro|https://example.com/guide/intro|2|false");
    }

    #[test]
    fn test_renders_deconst_namespace() {
        let scope = RenderScope {
            document: Some(document()),
            deconst: Some(locals()),
            domain: None,
        };
        let out = MiniJinjaRenderer::new()
            .render(
                "{{ deconst.env.SITE_NAME }} {{ deconst.assets['app.css'] }} {{ deconst.content.envelope.title }} {{ deconst.is_staging }}",
                &scope,
            )
            .unwrap();
        assert_eq!(out, "Docs /assets/app-1.css Intro false");
    }

    #[test]
    fn test_url_helper_methods() {
        let scope = RenderScope {
            document: None,
            deconst: Some(locals()),
            domain: None,
        };
        let out = MiniJinjaRenderer::new()
            .render(
                "{{ deconst.url.presented('proj/guide/next') }} {{ deconst.url.site('/about/') }}",
                &scope,
            )
            .unwrap();
        assert_eq!(out, "https://example.com/guide/next/ https://example.com/about/");
    }

    #[test]
    fn test_no_autoescape() {
        let scope = RenderScope {
            document: Some(document()),
            deconst: None,
            domain: None,
        };
        let out = MiniJinjaRenderer::new().render("<p>{{ presented_url }}</p>", &scope).unwrap();
        assert_eq!(out, "<p>https://example.com/guide/intro</p>");
    }

    #[test]
    fn test_none_and_bools_print_lowercase() {
        let out = MiniJinjaRenderer::new()
            .render("[{{ none }}|{{ true }}|{{ 1 == 2 }}]", &RenderScope::default())
            .unwrap();
        assert_eq!(out, "[|true|false]");
    }

    #[test]
    fn test_syntax_error_is_render_error() {
        let err = MiniJinjaRenderer::new()
            .render("{% if %}", &RenderScope::default())
            .unwrap_err();
        assert!(err.to_string().starts_with("Template rendering failed"));
    }
}
