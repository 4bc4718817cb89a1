//! On-disk template library.
//!
//! # Layout
//! ```text
//! {root}/_default/...    shared by every domain
//! {root}/{domain}/...    per-domain templates, searched first
//! ```
//!
//! # Page lookup
//! - A leading path segment naming a domain directory selects that domain
//! - An empty path means `index`
//! - Each name is tried as is, then `.html`, `.htm`, `/index.html`, `/index.htm`
//! - Nothing found means `404.html`, looked up the same way

use std::io;
use std::path::{Path, PathBuf};

use minijinja::{Environment, ErrorKind};
use thiserror::Error;

use crate::presentation::render::{environment, scope_value, RenderError, RenderScope};

/// Directory holding templates shared by every domain.
pub const DEFAULT_DIR: &str = "_default";

/// Page served when no template matches.
pub const NOT_FOUND_TEMPLATE: &str = "404.html";

const VARIANTS: [&str; 5] = ["", ".html", ".htm", "/index.html", "/index.htm"];

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("No template for {path:?} on {domain} and no 404.html fallback")]
    NotFound { domain: String, path: String },

    #[error(transparent)]
    Render(#[from] RenderError),
}

/// A template chosen for a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateMatch {
    /// Directory the template's own includes resolve against.
    pub domain: String,
    /// Name relative to the domain or default directory.
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct TemplateLibrary {
    root: PathBuf,
}

impl TemplateLibrary {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether `domain` has its own template directory.
    pub fn has_domain(&self, domain: &str) -> bool {
        is_segment(domain) && domain != DEFAULT_DIR && self.root.join(domain).is_dir()
    }

    /// Pick the template for `template_path` requested on `host`.
    pub fn find(&self, host: &str, template_path: &str) -> Result<TemplateMatch, TemplateError> {
        let segments: Vec<&str> = template_path.split('/').filter(|s| !s.is_empty()).collect();
        let (domain, rest) = match segments.split_first() {
            Some((first, rest)) if self.has_domain(first) => (*first, rest),
            _ => (host, segments.as_slice()),
        };
        let path = if rest.is_empty() { "index".to_string() } else { rest.join("/") };

        let found = self
            .locate(domain, &path)
            .or_else(|| (path != NOT_FOUND_TEMPLATE).then(|| self.locate(domain, NOT_FOUND_TEMPLATE)).flatten());

        found.ok_or_else(|| TemplateError::NotFound {
            domain: domain.to_string(),
            path,
        })
    }

    /// Render a page template. Falls back to `404.html` like [`find`](Self::find).
    pub fn render(&self, host: &str, template_path: &str, scope: &RenderScope) -> Result<String, TemplateError> {
        let found = self.find(host, template_path)?;
        tracing::debug!(domain = %found.domain, template = %found.name, "Rendering on-disk template");

        let env = self.environment(&found.domain);
        let rendered = env
            .get_template(&found.name)
            .and_then(|template| template.render(scope_value(scope)))
            .map_err(RenderError::from)?;
        Ok(rendered)
    }

    /// An environment whose loader reads from `domain`'s directory, then the default one.
    pub fn environment(&self, domain: &str) -> Environment<'static> {
        let mut env = environment();
        let library = self.clone();
        let domain = domain.to_string();
        env.set_loader(move |name| {
            library.load(&domain, name).map_err(|e| {
                minijinja::Error::new(ErrorKind::InvalidOperation, format!("unable to read template {name:?}"))
                    .with_source(e)
            })
        });
        env
    }

    /// Source of `name`, searching `domain` then the default directory.
    pub fn load(&self, domain: &str, name: &str) -> io::Result<Option<String>> {
        match self.source_path(domain, name) {
            Some(path) => std::fs::read_to_string(path).map(Some),
            None => Ok(None),
        }
    }

    fn locate(&self, domain: &str, path: &str) -> Option<TemplateMatch> {
        self.search_dirs(domain).into_iter().find_map(|dir| {
            VARIANTS
                .iter()
                .map(|variant| format!("{path}{variant}"))
                .find(|name| is_relative_name(name) && dir.join(name).is_file())
                .map(|name| TemplateMatch {
                    domain: domain.to_string(),
                    name,
                })
        })
    }

    fn source_path(&self, domain: &str, name: &str) -> Option<PathBuf> {
        if !is_relative_name(name) {
            tracing::warn!(root = ?self.root, template = name, "Attempt to load template outside of base path");
            return None;
        }
        self.search_dirs(domain)
            .into_iter()
            .map(|dir| dir.join(name))
            .find(|path| path.is_file())
    }

    fn search_dirs(&self, domain: &str) -> Vec<PathBuf> {
        let mut dirs = Vec::with_capacity(2);
        if is_segment(domain) && domain != DEFAULT_DIR {
            dirs.push(self.root.join(domain));
        }
        dirs.push(self.root.join(DEFAULT_DIR));
        dirs
    }
}

fn is_segment(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains(['/', '\\'])
}

fn is_relative_name(name: &str) -> bool {
    !name.starts_with('/') && !name.contains('\\') && name.split('/').all(|s| s != ".." && s != ".")
}
