//! Site URL construction.

use crate::routing::target::RequestTarget;

/// Absolute URL of `path` on `domain`, as seen from `target`.
///
/// Staging paths already carry `/{revision}/{domain}`, so staging links stay
/// on the host that served the request.
pub fn site_url(target: &RequestTarget, path: &str, domain: &str) -> String {
    let host = if target.staging {
        target.serving_host.as_str()
    } else {
        domain
    };
    let slash = if path.starts_with('/') { "" } else { "/" };
    format!("{}://{}{}{}", target.proto, host, slash, path)
}
