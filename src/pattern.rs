//! URL pattern normalization and matching.
//!
//! A pattern is a host, optionally preceded by a single `*.` wildcard label
//! and optionally followed by a path prefix:
//!
//! - `example.com` matches exactly that host
//! - `*.example.com` matches `example.com` and any subdomain of it
//! - `example.com/docs` matches `/docs` and everything below it
//!
//! Everything here is pure and safe to call from any thread.

use url::Url;

/// A URL reduced to the parts patterns are matched against
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct NormalizedUrl {
    /// Lower-cased host without a leading `www.` or trailing dot
    pub host: String,
    /// Lower-cased path without a trailing `/` (empty for the root)
    pub path: String,
}

impl NormalizedUrl {
    /// True when the input could not be interpreted as a web URL
    pub fn is_empty(&self) -> bool {
        self.host.is_empty()
    }
}

/// Ordering used to pick the best of several matching patterns.
///
/// Field order is significant: a path-qualified pattern always beats a bare
/// domain, then an exact host beats a wildcard, then the longer literal wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Specificity {
    pub has_path: bool,
    pub exact_host: bool,
    pub literal_len: usize,
}

const WILDCARD_PREFIX: &str = "*.";
const WWW_PREFIX: &str = "www.";

/// Canonical form of a user-entered pattern.
///
/// Trims, lower-cases, strips `scheme://` prefixes and leading `www.` labels,
/// and drops a trailing `/`. Applying it twice yields the same string.
pub fn normalize_pattern(raw: &str) -> String {
    let mut pattern = normalize_pass(raw);
    // A strip can expose something an earlier step would have removed,
    // e.g. the space in `https:// example.com` or `www.http://x.com`.
    loop {
        let next = normalize_pass(&pattern);
        if next == pattern {
            return pattern;
        }
        pattern = next;
    }
}

fn normalize_pass(raw: &str) -> String {
    let mut pattern = raw.trim().to_lowercase();

    while let Some(rest) = strip_scheme(&pattern) {
        pattern = rest.trim_start().to_string();
    }

    let (wildcard, rest) = match pattern.strip_prefix(WILDCARD_PREFIX) {
        Some(rest) => (true, rest.trim_start()),
        None => (false, pattern.as_str()),
    };
    let rest = strip_www(rest).trim_start();
    let rest = rest.trim_end_matches(|c: char| c == '/' || c.is_whitespace());

    if wildcard {
        format!("{WILDCARD_PREFIX}{rest}")
    } else {
        rest.to_string()
    }
}

/// Reduce a URL to its matchable host and path.
///
/// Never fails: anything that is not a hierarchical URL with a host becomes
/// an empty `NormalizedUrl`, which matches nothing.
pub fn normalize_url(raw: &str) -> NormalizedUrl {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return NormalizedUrl::default();
    }

    let candidate = if trimmed.contains("://") {
        trimmed.to_string()
    } else if is_opaque_uri(trimmed) {
        return NormalizedUrl::default();
    } else {
        format!("http://{trimmed}")
    };

    let parsed = match Url::parse(&candidate) {
        Ok(url) => url,
        Err(e) => {
            crate::debug_trace!("MATCH", "Unparsable URL {:?}: {}", raw, e);
            return NormalizedUrl::default();
        }
    };
    if parsed.cannot_be_a_base() {
        return NormalizedUrl::default();
    }

    let Some(host) = parsed.host_str() else {
        return NormalizedUrl::default();
    };
    let host = host.to_lowercase();
    let host = strip_www(host.trim_end_matches('.')).to_string();

    let path = parsed.path().to_lowercase();
    let path = path.trim_end_matches('/').to_string();

    NormalizedUrl { host, path }
}

/// Does `pattern` match `url`? Both are normalized first.
pub fn matches(pattern: &str, url: &str) -> bool {
    matches_normalized(pattern, &normalize_url(url))
}

/// Match against an already-normalized URL (the resolver's hot path)
pub fn matches_normalized(pattern: &str, url: &NormalizedUrl) -> bool {
    if url.is_empty() {
        return false;
    }
    let pattern = normalize_pattern(pattern);
    let (host, path) = split_pattern(&pattern);
    if host.is_empty() {
        return false;
    }

    let host_matches = match host.strip_prefix(WILDCARD_PREFIX) {
        Some(base) => {
            !base.is_empty()
                && (url.host == base
                    || (url.host.len() > base.len()
                        && url.host.ends_with(base)
                        && url.host.as_bytes()[url.host.len() - base.len() - 1] == b'.'))
        }
        None => url.host == host,
    };
    if !host_matches {
        return false;
    }

    path.is_empty() || path_has_prefix(&url.path, path)
}

/// Rank a pattern for tie-breaking between several matches
pub fn specificity(pattern: &str) -> Specificity {
    let pattern = normalize_pattern(pattern);
    let (host, path) = split_pattern(&pattern);
    let exact_host = !host.starts_with(WILDCARD_PREFIX);
    let literal_len = pattern.len() - if exact_host { 0 } else { WILDCARD_PREFIX.len() };
    Specificity {
        has_path: !path.is_empty(),
        exact_host,
        literal_len,
    }
}

/// True when every URL matched by `narrow` is also matched by `broad`, and
/// the two patterns differ.
pub fn refines(narrow: &str, broad: &str) -> bool {
    let narrow = normalize_pattern(narrow);
    let broad = normalize_pattern(broad);
    if narrow.is_empty() || broad.is_empty() || narrow == broad {
        return false;
    }

    let (host, path) = split_pattern(&narrow);
    let base = match host.strip_prefix(WILDCARD_PREFIX) {
        Some(base) => {
            if !split_pattern(&broad).0.starts_with(WILDCARD_PREFIX) {
                return false;
            }
            base
        }
        None => host,
    };
    matches_normalized(
        &broad,
        &NormalizedUrl {
            host: base.to_string(),
            path: path.to_string(),
        },
    )
}

/// Split a normalized pattern into its host part and `/`-prefixed path part
pub fn split_pattern(pattern: &str) -> (&str, &str) {
    match pattern.find('/') {
        Some(idx) => pattern.split_at(idx),
        None => (pattern, ""),
    }
}

/// True when `path` equals `prefix` or continues it at a segment boundary
fn path_has_prefix(path: &str, prefix: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

/// `mailto:`, `tel:` and friends; `host:port` without a scheme is not opaque
fn is_opaque_uri(input: &str) -> bool {
    match Url::parse(input) {
        Ok(url) if url.cannot_be_a_base() => {
            let after_colon = input.split_once(':').map(|(_, rest)| rest).unwrap_or("");
            let port = after_colon.split('/').next().unwrap_or("");
            port.is_empty() || !port.chars().all(|c| c.is_ascii_digit())
        }
        _ => false,
    }
}

fn strip_scheme(pattern: &str) -> Option<&str> {
    let idx = pattern.find("://")?;
    let scheme = &pattern[..idx];
    let is_scheme = !scheme.is_empty()
        && scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    is_scheme.then(|| &pattern[idx + 3..])
}

/// Strip leading `www.` labels while a registrable name remains
fn strip_www(mut host: &str) -> &str {
    while let Some(rest) = host.strip_prefix(WWW_PREFIX) {
        let rest_host = split_pattern(rest).0;
        if !rest_host.contains('.') {
            break;
        }
        host = rest;
    }
    host
}
