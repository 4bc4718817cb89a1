//! Revision codec for staging mode.
//!
//! Staging serves alternate content trees side by side. A revision is
//! carried in two places:
//!
//! ```text
//! content ID:  https://github.com/org/repo/page  →  https://github.com/@rev/org/repo/page
//!              proj/guide/intro                  →  @rev/proj/guide/intro
//! presented:   /guide/intro (on example.com)     →  /rev/example.com/guide/intro
//! ```
//!
//! Content IDs carry the revision as a marked segment directly after the
//! `scheme://authority/` root. IDs without that segment pass through
//! [`from_content_id`] untouched with no revision.

use std::fmt;

use serde::Serialize;

/// Leading character of the revision segment inside a content ID.
pub const REVISION_MARKER: char = '@';

/// A validated revision identifier: non-empty, no `/`, no leading marker.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct RevisionId(String);

impl RevisionId {
    pub fn new(id: impl Into<String>) -> Option<Self> {
        let id = id.into();
        if id.is_empty() || id.contains('/') || id.starts_with(REVISION_MARKER) {
            return None;
        }
        Some(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RevisionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A content ID split from its revision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Revisioned {
    pub revision: Option<RevisionId>,
    pub content_id: String,
}

/// Split `scheme://authority/` (or nothing) from the rest of a content ID.
fn split_root(content_id: &str) -> (&str, &str) {
    let Some(scheme_end) = content_id.find("://") else {
        return ("", content_id);
    };
    let authority_start = scheme_end + 3;
    match content_id[authority_start..].find('/') {
        Some(slash) => content_id.split_at(authority_start + slash + 1),
        None => (content_id, ""),
    }
}

/// Insert the revision segment into a content ID.
pub fn apply_to_content_id(revision: &RevisionId, content_id: &str) -> String {
    let (root, rest) = split_root(content_id);
    if root.is_empty() || root.ends_with('/') {
        format!("{root}{REVISION_MARKER}{revision}/{rest}")
    } else {
        // Authority with no path at all.
        format!("{root}/{REVISION_MARKER}{revision}")
    }
}

/// Extract and strip the revision segment from a content ID.
pub fn from_content_id(content_id: &str) -> Revisioned {
    let (root, rest) = split_root(content_id);
    let (segment, remainder) = match rest.split_once('/') {
        Some((segment, remainder)) => (segment, Some(remainder)),
        None => (rest, None),
    };

    let revision = segment
        .strip_prefix(REVISION_MARKER)
        .and_then(RevisionId::new);

    match (revision, remainder) {
        (Some(revision), Some(remainder)) => Revisioned {
            revision: Some(revision),
            content_id: format!("{root}{remainder}"),
        },
        (Some(revision), None) => Revisioned {
            revision: Some(revision),
            content_id: root.strip_suffix('/').unwrap_or(root).to_string(),
        },
        (None, _) => Revisioned {
            revision: None,
            content_id: content_id.to_string(),
        },
    }
}

/// Prefix a presented path with its revision and domain.
pub fn apply_to_path(revision: &RevisionId, domain: &str, path: &str) -> String {
    format!("/{revision}/{domain}/{}", path.trim_start_matches('/'))
}

/// Split a staging path `/{revision}/{domain}/{rest}` into its parts.
///
/// The returned path always starts with `/`.
pub fn from_path(path: &str) -> Option<(RevisionId, String, String)> {
    let mut parts = path.trim_start_matches('/').splitn(3, '/');
    let revision = RevisionId::new(parts.next()?)?;
    let domain = parts.next().filter(|d| !d.is_empty())?;
    let rest = format!("/{}", parts.next().unwrap_or(""));
    Some((revision, domain.to_string(), rest))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rev(id: &str) -> RevisionId {
        RevisionId::new(id).unwrap()
    }

    #[test]
    fn test_content_id_round_trip() {
        let r = rev("build-42");
        for id in [
            "proj/guide/intro",
            "proj/guide/",
            "",
            "https://github.com/org/repo/page",
            "https://github.com/",
            "https://github.com",
        ] {
            let applied = apply_to_content_id(&r, id);
            assert_ne!(applied, id);
            let back = from_content_id(&applied);
            assert_eq!(back.revision.as_ref(), Some(&r), "revision for {id}");
            assert_eq!(back.content_id, id);
        }
    }

    #[test]
    fn test_segment_position() {
        let r = rev("abc");
        assert_eq!(
            apply_to_content_id(&r, "https://github.com/org/repo/"),
            "https://github.com/@abc/org/repo/"
        );
        assert_eq!(apply_to_content_id(&r, "proj/x"), "@abc/proj/x");
    }

    #[test]
    fn test_unrevisioned_ids_pass_through() {
        for id in ["proj/guide", "https://github.com/org/repo/", "@", ""] {
            let out = from_content_id(id);
            assert_eq!(out.revision, None);
            assert_eq!(out.content_id, id);
        }
    }

    #[test]
    fn test_revision_id_validation() {
        assert!(RevisionId::new("").is_none());
        assert!(RevisionId::new("a/b").is_none());
        assert!(RevisionId::new("@a").is_none());
        assert_eq!(rev("pr-12").as_str(), "pr-12");
    }

    #[test]
    fn test_path_round_trip() {
        let r = rev("pr-12");
        let staged = apply_to_path(&r, "example.com", "/guide/intro/");
        assert_eq!(staged, "/pr-12/example.com/guide/intro/");

        let (revision, domain, rest) = from_path(&staged).unwrap();
        assert_eq!(revision, r);
        assert_eq!(domain, "example.com");
        assert_eq!(rest, "/guide/intro/");
    }

    #[test]
    fn test_from_path_requires_domain() {
        assert!(from_path("/pr-12").is_none());
        assert!(from_path("/pr-12/").is_none());
        assert!(from_path("/").is_none());
        let (_, domain, rest) = from_path("/pr-12/example.com").unwrap();
        assert_eq!(domain, "example.com");
        assert_eq!(rest, "/");
    }
}
