//! Routing-relevant view of an inbound request.

use serde::Serialize;

use crate::config::PresentationConfig;
use crate::routing::revision::{self, RevisionId};

/// Where a request is addressed, after host override and staging decoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestTarget {
    /// Scheme of presented URLs.
    pub proto: String,
    /// Domain used for routing table lookups.
    pub host: String,
    /// Host the request was actually served on.
    pub serving_host: String,
    /// Request path within `host`, always starting with `/`.
    pub presented_path: String,
    /// Revision decoded from a staging path.
    pub revision: Option<RevisionId>,
    pub staging: bool,
}

impl RequestTarget {
    /// Build the target from the Host header and request path.
    pub fn from_request(host_header: Option<&str>, path: &str, config: &PresentationConfig) -> Self {
        let serving_host = serving_host(host_header, config);

        let path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{path}")
        };

        let (host, presented_path, revision) = match config.staging_mode {
            true => match revision::from_path(&path) {
                Some((revision, domain, rest)) => (domain, rest, Some(revision)),
                None => (serving_host.clone(), path, None),
            },
            false => (serving_host.clone(), path, None),
        };

        Self {
            proto: config.presented_url_proto.clone(),
            host,
            serving_host,
            presented_path,
            revision,
            staging: config.staging_mode,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn presented_path(&self) -> &str {
        &self.presented_path
    }

    pub fn revision(&self) -> Option<&RevisionId> {
        self.revision.as_ref()
    }

    /// The user-facing URL of this request on its routing domain.
    pub fn presented_url(&self) -> String {
        format!("{}://{}{}", self.proto, self.host, self.presented_path)
    }
}

/// The configured presented domain, else the Host header without its port.
pub fn serving_host(host_header: Option<&str>, config: &PresentationConfig) -> String {
    config
        .presented_url_domain
        .clone()
        .or_else(|| host_header.map(|h| hostname(h).to_string()))
        .unwrap_or_default()
}

/// Strip any port from a Host header value.
fn hostname(host: &str) -> &str {
    if host.starts_with('[') {
        return match host.find(']') {
            Some(end) => &host[..=end],
            None => host,
        };
    }
    host.split_once(':').map_or(host, |(name, _)| name)
}
