//! URL canonicalization for mirror feeds.
//!
//! The mirror serves the same posts from its canonical domain and from a
//! syndication-only alias host. Items must collapse onto one URI or the host
//! shows every post twice. All rewriting here is lexical so that everything
//! outside the host component survives byte-for-byte (the `url` crate would
//! re-serialize paths and add trailing slashes).

use std::borrow::Cow;

/// Canonical domain of the mirror.
pub const MIRROR_DOMAIN: &str = "xcancel.com";

/// Syndication-only alias of [`MIRROR_DOMAIN`].
pub const ALIAS_HOST: &str = "rss.xcancel.com";

/// Query keys that mark a URL as carrying campaign tracking.
const TRACKING_KEYS: [&str; 4] = ["utm_id", "utm_source", "utm_medium", "utm_campaign"];

/// Rewrites the alias host to the canonical mirror domain.
///
/// Only the host is touched; scheme, userinfo, port, path, query and fragment
/// are preserved verbatim. An alias appearing anywhere else (for instance in a
/// redirect target inside the query) is left alone. URLs without an authority
/// component are returned unchanged.
///
/// # Examples
///
/// ```
/// use xfeed::normalize::url::canonicalize_host;
///
/// assert_eq!(
///     canonicalize_host("https://rss.xcancel.com/user/status/1#m"),
///     "https://xcancel.com/user/status/1#m"
/// );
/// assert_eq!(
///     canonicalize_host("https://example.com/r?u=https://rss.xcancel.com/x"),
///     "https://example.com/r?u=https://rss.xcancel.com/x"
/// );
/// ```
pub fn canonicalize_host(url: &str) -> Cow<'_, str> {
    let Some(scheme_end) = url.find("://") else {
        return Cow::Borrowed(url);
    };
    // A `://` inside a path or query of a relative URL is not an authority.
    if !is_scheme(&url[..scheme_end]) {
        return Cow::Borrowed(url);
    }
    let authority_start = scheme_end + 3;
    let authority_end = url[authority_start..]
        .find(['/', '?', '#'])
        .map_or(url.len(), |i| authority_start + i);
    let authority = &url[authority_start..authority_end];

    // userinfo@host:port
    let host_start = authority.rfind('@').map_or(0, |i| i + 1);
    let host_end = authority[host_start..]
        .find(':')
        .map_or(authority.len(), |i| host_start + i);
    let host = &authority[host_start..host_end];

    if !host.eq_ignore_ascii_case(ALIAS_HOST) {
        return Cow::Borrowed(url);
    }

    let abs_host_start = authority_start + host_start;
    let abs_host_end = authority_start + host_end;
    Cow::Owned(format!(
        "{}{}{}",
        &url[..abs_host_start],
        MIRROR_DOMAIN,
        &url[abs_host_end..]
    ))
}

/// `ALPHA *( ALPHA / DIGIT / "+" / "-" / "." )`
fn is_scheme(candidate: &str) -> bool {
    let mut chars = candidate.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// Drops the whole query string when it contains a known tracking key.
///
/// Removal is all-or-nothing: everything from the first `?` onward goes,
/// including any fragment. URLs without a query are untouched.
pub fn strip_tracking(url: &str) -> Cow<'_, str> {
    let Some(query_start) = url.find('?') else {
        return Cow::Borrowed(url);
    };
    let parameters = &url[query_start + 1..];
    if TRACKING_KEYS.iter().any(|key| parameters.contains(key)) {
        tracing::debug!(parameters = %parameters, "Removed tracking parameters");
        Cow::Owned(url[..query_start].to_owned())
    } else {
        Cow::Borrowed(url)
    }
}

/// Tracking removal followed by host canonicalization.
pub fn canonical_url(url: &str) -> String {
    canonicalize_host(&strip_tracking(url)).into_owned()
}

/// The first `count` `/`-separated segments of `url`, or `None` when it has
/// fewer segments.
///
/// Three segments give the origin (`https://host`), four give the first path
/// component (`https://host/user`).
pub fn leading_segments(url: &str, count: usize) -> Option<&str> {
    let mut segments = 1;
    for (idx, _) in url.match_indices('/') {
        if segments == count {
            return Some(&url[..idx]);
        }
        segments += 1;
    }
    (segments >= count).then_some(url)
}

/// `scheme://host[:port]` prefix used for same-site comparisons.
pub fn origin_prefix(url: &str) -> &str {
    leading_segments(url, 3).unwrap_or(url)
}

/// True when the URL's host is the mirror domain or one of its subdomains.
pub fn is_mirror_url(url: &str) -> bool {
    ::url::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_ascii_lowercase))
        .is_some_and(|host| {
            host == MIRROR_DOMAIN
                || host
                    .strip_suffix(MIRROR_DOMAIN)
                    .is_some_and(|rest| rest.ends_with('.'))
        })
}

/// The account a profile-style URL belongs to: its last non-empty path
/// segment (`https://xcancel.com/user` gives `user`).
pub fn owner_handle(url: &str) -> Option<&str> {
    url.trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty())
}
