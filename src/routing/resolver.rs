//! Content routing resolver.
//!
//! # Responsibilities
//! - Own the current routing table behind an atomic pointer
//! - Forward resolution with staging revisions applied
//! - Reverse resolution and presented URL construction
//! - Proxy table projections for the dispatcher
//!
//! # Design Decisions
//! - Every operation loads one table snapshot and works on it to completion
//! - Reload is `ArcSwap::store`: readers never see a half-built table

use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::routing::revision;
use crate::routing::table::{Mapping, ProxyRoutes, ResolutionResult, RoutingTable, SiteProxies};
use crate::routing::target::RequestTarget;
use crate::routing::url::site_url;

pub struct ContentRouter {
    table: ArcSwap<RoutingTable>,
    staging: bool,
}

impl ContentRouter {
    pub fn new(table: RoutingTable, staging: bool) -> Self {
        Self {
            table: ArcSwap::from_pointee(table),
            staging,
        }
    }

    /// Replace the routing table atomically.
    pub fn reload(&self, table: RoutingTable) {
        self.table.store(Arc::new(table));
        tracing::info!("Routing table replaced");
    }

    pub fn snapshot(&self) -> Arc<RoutingTable> {
        self.table.load_full()
    }

    pub fn is_staging(&self) -> bool {
        self.staging
    }

    pub fn is_known_domain(&self, domain: &str) -> bool {
        self.table.load().is_known_domain(domain)
    }

    /// Resolve the request's presented path to a content ID.
    pub fn forward_resolve(&self, target: &RequestTarget) -> ResolutionResult {
        let resolved = self
            .table
            .load()
            .forward_resolve(target.host(), target.presented_path());

        match (resolved, target.revision()) {
            (ResolutionResult::ContentId(id), Some(rev)) if self.staging => {
                ResolutionResult::ContentId(revision::apply_to_content_id(rev, &id))
            }
            (resolved, _) => resolved,
        }
    }

    /// The content root prefix occurring in the request path.
    pub fn content_prefix(&self, target: &RequestTarget) -> Option<String> {
        self.table
            .load()
            .content_prefix(target.host(), target.presented_path())
            .map(String::from)
    }

    /// Every presented location of `content_id`, restricted to `domain` when given.
    pub fn reverse_resolve(&self, content_id: &str, domain: Option<&str>, only_first: bool) -> Vec<Mapping> {
        let table = self.table.load();

        if self.staging {
            let split = revision::from_content_id(content_id);
            tracing::debug!(
                revision = ?split.revision,
                content_id = %split.content_id,
                "Using content ID without revision to locate presented path"
            );
            return table
                .mappings(&split.content_id, domain, only_first, split.revision.as_ref())
                .collect();
        }

        table.mappings(content_id, domain, only_first, None).collect()
    }

    /// A presented URL for `content_id`, on the request's own domain unless `cross_domain`.
    pub fn presented_url(&self, target: &RequestTarget, content_id: &str, cross_domain: bool) -> Option<String> {
        let mappings = if cross_domain {
            self.reverse_resolve(content_id, None, false)
        } else {
            self.reverse_resolve(content_id, Some(target.host()), true)
        };

        mappings
            .first()
            .map(|mapping| site_url(target, &mapping.path, &mapping.domain))
    }

    /// Proxy routes of the request's content domain.
    ///
    /// In staging this is the domain named in the path, not the staging host.
    pub fn proxies(&self, target: &RequestTarget) -> ProxyRoutes {
        self.table
            .load()
            .proxy_routes(target.host())
            .cloned()
            .unwrap_or_default()
    }

    /// The longest proxy prefix of the serving host matching the request path,
    /// with its upstream.
    pub fn proxy_match(&self, serving_host: &str, path: &str) -> Option<(String, String)> {
        let table = self.table.load();
        table
            .proxy_routes(serving_host)?
            .iter()
            .filter(|(prefix, _)| path.starts_with(prefix.as_str()))
            .max_by(|(a, _), (b, _)| a.len().cmp(&b.len()).then_with(|| b.cmp(a)))
            .map(|(prefix, upstream)| (prefix.clone(), upstream.clone()))
    }

    pub fn all_proxies(&self) -> Vec<SiteProxies> {
        self.table.load().all_proxies()
    }
}
