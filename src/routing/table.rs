//! Per-domain routing table.
//!
//! # Responsibilities
//! - Hold the `domain -> { content, proxy }` prefix maps in file order
//! - Forward lookup: presented path → content ID (longest prefix wins)
//! - Reverse lookup: content ID → presented paths, lazily, per domain
//!
//! # Design Decisions
//! - Immutable after load; reloads swap the whole table (see `resolver.rs`)
//! - Prefix matching is plain string prefix, not segment aware
//! - Ties on prefix length go to the lexicographically smaller prefix
//! - Unknown domains are an empty view, never an error

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::routing::revision::{self, RevisionId};

/// Content routes of one domain: prefix → content ID base (`None` = empty envelope).
pub type ContentRoutes = IndexMap<String, Option<String>>;

/// Proxy routes of one domain: prefix → upstream base URL.
pub type ProxyRoutes = IndexMap<String, String>;

/// Routes configured for one domain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct DomainConfig {
    #[serde(default)]
    pub content: ContentRoutes,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub proxy: ProxyRoutes,
}

/// The whole routing table, keyed by domain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct RoutingTable {
    domains: IndexMap<String, DomainConfig>,
}

/// Outcome of a forward lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionResult {
    /// No prefix matched.
    Unmapped,
    /// A `null` prefix matched at its exact root.
    EmptyEnvelope,
    /// A content ID to fetch.
    ContentId(String),
}

/// One way a content ID is presented on a site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mapping {
    pub domain: String,
    #[serde(rename = "basePath")]
    pub base_path: String,
    #[serde(rename = "baseContentID")]
    pub base_content_id: String,
    pub path: String,
}

/// The proxy routes of one site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SiteProxies {
    pub site: String,
    pub proxy: ProxyRoutes,
}

impl RoutingTable {
    pub fn new(domains: IndexMap<String, DomainConfig>) -> Self {
        Self { domains }
    }

    pub fn domains(&self) -> impl Iterator<Item = (&str, &DomainConfig)> {
        self.domains.iter().map(|(d, c)| (d.as_str(), c))
    }

    pub fn is_known_domain(&self, domain: &str) -> bool {
        self.domains.contains_key(domain)
    }

    /// Content routes for a domain, warning when the domain has none.
    fn content_routes(&self, domain: &str) -> Option<&ContentRoutes> {
        match self.domains.get(domain) {
            Some(config) => Some(&config.content),
            None => {
                tracing::warn!(domain = %domain, "Content map has no content routes defined for this domain");
                None
            }
        }
    }

    pub fn proxy_routes(&self, domain: &str) -> Option<&ProxyRoutes> {
        self.domains.get(domain).map(|c| &c.proxy)
    }

    /// Every site that declares at least one proxy route.
    pub fn all_proxies(&self) -> Vec<SiteProxies> {
        self.domains
            .iter()
            .filter(|(_, c)| !c.proxy.is_empty())
            .map(|(site, c)| SiteProxies {
                site: site.clone(),
                proxy: c.proxy.clone(),
            })
            .collect()
    }

    /// Translate a presented path into a content ID. Revisions are not applied here.
    pub fn forward_resolve(&self, domain: &str, path: &str) -> ResolutionResult {
        let Some(routes) = self.content_routes(domain) else {
            return ResolutionResult::Unmapped;
        };

        let best = routes
            .iter()
            .filter(|(prefix, _)| path.starts_with(prefix.as_str()))
            .max_by(|(a, _), (b, _)| a.len().cmp(&b.len()).then_with(|| b.cmp(a)));

        let Some((prefix, base)) = best else {
            return ResolutionResult::Unmapped;
        };

        let rest = &path[prefix.len()..];
        match base {
            None if rest.is_empty() || rest == "/" => ResolutionResult::EmptyEnvelope,
            None => ResolutionResult::Unmapped,
            Some(base) => ResolutionResult::ContentId(slash_join(&[base, rest])),
        }
    }

    /// The last prefix, in file order, that occurs anywhere in `path`.
    pub fn content_prefix(&self, domain: &str, path: &str) -> Option<&str> {
        self.content_routes(domain)?
            .keys()
            .filter(|prefix| path.contains(prefix.as_str()))
            .last()
            .map(String::as_str)
    }

    /// Lazily list the presented paths of `content_id`.
    ///
    /// `content_id` must already have its revision stripped; `revision`, when
    /// given, is re-applied to every emitted base and path.
    pub fn mappings<'a>(
        &'a self,
        content_id: &str,
        domain: Option<&str>,
        only_first: bool,
        revision: Option<&'a RevisionId>,
    ) -> Mappings<'a> {
        let domains: Box<dyn Iterator<Item = (&'a String, &'a DomainConfig)> + Send + 'a> =
            match domain {
                Some(domain) => {
                    let found = self.domains.get_key_value(domain);
                    if found.is_none() {
                        tracing::warn!(domain = %domain, "Content map has no content routes defined for this domain");
                    }
                    Box::new(found.into_iter())
                }
                None => Box::new(self.domains.iter()),
            };

        Mappings {
            domains,
            current: None,
            content_id: with_trailing_slash(content_id),
            only_first,
            revision,
        }
    }
}

/// Iterator returned by [`RoutingTable::mappings`].
///
/// Order follows domain order then prefix order; duplicates across domains
/// are kept.
pub struct Mappings<'a> {
    domains: Box<dyn Iterator<Item = (&'a String, &'a DomainConfig)> + Send + 'a>,
    current: Option<(&'a str, indexmap::map::Iter<'a, String, Option<String>>)>,
    content_id: String,
    only_first: bool,
    revision: Option<&'a RevisionId>,
}

impl<'a> Iterator for Mappings<'a> {
    type Item = Mapping;

    fn next(&mut self) -> Option<Mapping> {
        let Self {
            domains,
            current,
            content_id,
            only_first,
            revision,
        } = self;
        let content_id = content_id.as_str();
        let revision = *revision;

        loop {
            if let Some((domain, routes)) = current.as_mut() {
                let domain = *domain;
                let found = routes.by_ref().find_map(|(prefix, base)| {
                    map_route(domain, prefix, base.as_deref()?, content_id, revision)
                });
                match found {
                    Some(mapping) => {
                        if *only_first {
                            *current = None;
                        }
                        return Some(mapping);
                    }
                    None => *current = None,
                }
            }

            let (domain, config) = domains.next()?;
            *current = Some((domain.as_str(), config.content.iter()));
        }
    }
}

fn map_route(
    domain: &str,
    prefix: &str,
    base: &str,
    content_id: &str,
    revision: Option<&RevisionId>,
) -> Option<Mapping> {
    let base = with_trailing_slash(base);
    let at = content_id.find(&base)?;
    let sub_path = format!("/{}", &content_id[at + base.len()..]);

    let (base_content_id, base_path) = match revision {
        Some(revision) => (
            revision::apply_to_content_id(revision, &base),
            revision::apply_to_path(revision, domain, prefix),
        ),
        None => (base, prefix.to_string()),
    };

    let mut path = format!("/{}", slash_join(&[&base_path, &sub_path]));
    if !path.ends_with('/') {
        path.push('/');
    }

    Some(Mapping {
        domain: domain.to_string(),
        base_path,
        base_content_id,
        path,
    })
}

/// Join parts with single slashes, trimming slashes at each part's ends and
/// dropping parts that end up empty. Interior slashes (`https://`) are kept.
pub fn slash_join(parts: &[&str]) -> String {
    parts
        .iter()
        .map(|part| part.trim_matches('/'))
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

fn with_trailing_slash(s: &str) -> String {
    if s.ends_with('/') {
        s.to_string()
    } else {
        format!("{s}/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn table(json: &str) -> RoutingTable {
        serde_json::from_str(json).unwrap()
    }

    fn docs_table() -> RoutingTable {
        table(
            r#"{
                "example.com": {
                    "content": {
                        "/docs": "projA",
                        "/docs/v2": "projB",
                        "/empty": null,
                        "/": "https://github.com/org/site/"
                    },
                    "proxy": { "/api": "http://127.0.0.1:7000" }
                },
                "other.com": {
                    "content": { "/mirror": "projB" }
                }
            }"#,
        )
    }

    #[test]
    fn test_longest_prefix_wins() {
        let t = docs_table();
        assert_eq!(
            t.forward_resolve("example.com", "/docs/v2/page"),
            ResolutionResult::ContentId("projB/page".into())
        );
        assert_eq!(
            t.forward_resolve("example.com", "/docs/page"),
            ResolutionResult::ContentId("projA/page".into())
        );
    }

    #[test]
    fn test_forward_is_deterministic() {
        let t = docs_table();
        let first = t.forward_resolve("example.com", "/docs/v2/a/b");
        for _ in 0..10 {
            assert_eq!(t.forward_resolve("example.com", "/docs/v2/a/b"), first);
        }
    }

    #[test]
    fn test_null_base_exactness() {
        let t = docs_table();
        assert_eq!(t.forward_resolve("example.com", "/empty"), ResolutionResult::EmptyEnvelope);
        assert_eq!(t.forward_resolve("example.com", "/empty/"), ResolutionResult::EmptyEnvelope);
        assert_eq!(t.forward_resolve("example.com", "/empty/x"), ResolutionResult::Unmapped);
    }

    #[test]
    fn test_unknown_domain_is_unmapped() {
        let t = docs_table();
        assert_eq!(t.forward_resolve("nowhere.net", "/docs"), ResolutionResult::Unmapped);
        assert_eq!(t.forward_resolve("nowhere.net", "/"), ResolutionResult::Unmapped);
        assert!(t.content_prefix("nowhere.net", "/docs").is_none());
        assert_eq!(t.mappings("projA/x", Some("nowhere.net"), true, None).count(), 0);
    }

    #[test]
    fn test_no_prefix_matches() {
        let t = table(r#"{"a.com": {"content": {"/guide": "proj/guide"}}}"#);
        assert_eq!(t.forward_resolve("a.com", "/other"), ResolutionResult::Unmapped);
    }

    #[test]
    fn test_root_base_keeps_scheme() {
        let t = docs_table();
        assert_eq!(
            t.forward_resolve("example.com", "/about/team/"),
            ResolutionResult::ContentId("https://github.com/org/site/about/team".into())
        );
        assert_eq!(
            t.forward_resolve("example.com", "/"),
            ResolutionResult::ContentId("https://github.com/org/site".into())
        );
    }

    #[test]
    fn test_reverse_round_trip() {
        let t = docs_table();
        for (prefix, suffix) in [("/docs", "/intro"), ("/docs/v2", "/a/b/"), ("/", "x"), ("/docs", "")] {
            let path = format!("{prefix}{suffix}");
            let ResolutionResult::ContentId(id) = t.forward_resolve("example.com", &path) else {
                panic!("expected content id for {path}");
            };
            let mapping = t
                .mappings(&id, Some("example.com"), true, None)
                .next()
                .expect("mapping");
            assert_eq!(mapping.path.trim_end_matches('/'), path.trim_end_matches('/'));
        }
    }

    #[test]
    fn test_reverse_across_domains_keeps_duplicates() {
        let t = docs_table();
        let all: Vec<_> = t.mappings("projB/page", None, false, None).collect();
        let domains: Vec<_> = all.iter().map(|m| m.domain.as_str()).collect();
        assert_eq!(domains, vec!["example.com", "other.com"]);
        assert_eq!(all[0].path, "/docs/v2/page/");
        assert_eq!(all[0].base_content_id, "projB/");
        assert_eq!(all[1].path, "/mirror/page/");
    }

    #[test]
    fn test_reverse_only_first_per_domain() {
        let t = table(
            r#"{"a.com": {"content": {"/one": "proj", "/two": "proj"}},
                "b.com": {"content": {"/three": "proj"}}}"#,
        );
        let firsts: Vec<_> = t.mappings("proj/x", None, true, None).map(|m| m.path).collect();
        assert_eq!(firsts, vec!["/one/x/", "/three/x/"]);
        let every: Vec<_> = t.mappings("proj/x", None, false, None).map(|m| m.path).collect();
        assert_eq!(every, vec!["/one/x/", "/two/x/", "/three/x/"]);
    }

    #[test]
    fn test_reverse_skips_null_bases() {
        let t = table(r#"{"a.com": {"content": {"/empty": null}}}"#);
        assert_eq!(t.mappings("anything", None, false, None).count(), 0);
    }

    #[test]
    fn test_reverse_reapplies_revision() {
        let t = table(r#"{"a.com": {"content": {"/guide": "proj/guide"}}}"#);
        let rev = RevisionId::new("build-7").unwrap();
        let m = t
            .mappings("proj/guide/intro", Some("a.com"), true, Some(&rev))
            .next()
            .unwrap();
        assert_eq!(m.base_content_id, "@build-7/proj/guide/");
        assert_eq!(m.base_path, "/build-7/a.com/guide");
        assert_eq!(m.path, "/build-7/a.com/guide/intro/");
    }

    #[test]
    fn test_content_prefix_is_substring_match() {
        let t = table(r#"{"a.com": {"content": {"/docs": "p", "/v2": "q"}}}"#);
        // "/v2" is not a prefix of the path, but it occurs in it.
        assert_eq!(t.content_prefix("a.com", "/docs/v2/page"), Some("/v2"));
        assert_eq!(t.content_prefix("a.com", "/docs/page"), Some("/docs"));
        assert_eq!(t.content_prefix("a.com", "/blog"), None);
    }

    #[test]
    fn test_all_proxies() {
        let t = docs_table();
        let proxies = t.all_proxies();
        assert_eq!(proxies.len(), 1);
        assert_eq!(proxies[0].site, "example.com");
        assert_eq!(proxies[0].proxy["/api"], "http://127.0.0.1:7000");
        assert!(t.proxy_routes("other.com").unwrap().is_empty());
    }

    struct WarnCounter(Arc<AtomicUsize>);

    impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for WarnCounter {
        fn on_event(&self, event: &tracing::Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
            if *event.metadata().level() == tracing::Level::WARN {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    fn warnings(f: impl FnOnce()) -> usize {
        use tracing_subscriber::layer::SubscriberExt;

        let count = Arc::new(AtomicUsize::new(0));
        let subscriber = tracing_subscriber::registry().with(WarnCounter(count.clone()));
        tracing::subscriber::with_default(subscriber, f);
        count.load(Ordering::SeqCst)
    }

    #[test]
    fn test_unknown_domain_warns_once_per_lookup() {
        let t = docs_table();

        assert_eq!(warnings(|| assert_eq!(t.forward_resolve("a.com", "/docs"), ResolutionResult::Unmapped)), 1);
        assert_eq!(warnings(|| assert_eq!(t.content_prefix("a.com", "/docs"), None)), 1);
        assert_eq!(warnings(|| assert_eq!(t.mappings("projA/x", Some("a.com"), false, None).count(), 0)), 1);

        assert_eq!(warnings(|| assert_eq!(t.forward_resolve("other.com", "/nowhere"), ResolutionResult::Unmapped)), 0);
        assert_eq!(warnings(|| assert_eq!(t.mappings("projB/x", None, false, None).count(), 2)), 0);
    }

    #[test]
    fn test_slash_join() {
        assert_eq!(slash_join(&["/a/", "//b", ""]), "a/b");
        assert_eq!(slash_join(&["https://x.io/r/", "/p"]), "https://x.io/r/p");
        assert_eq!(slash_join(&["/", "/"]), "");
    }
}
