//! URL splitting for plain `http://host/path` URLs.
//!
//! Only plain `http://` URLs are understood. The path (query included) is
//! sent verbatim in the request line.

use super::constants::{HTTP_PORT, HTTP_SCHEME};

/// Host and resource path derived from a remote URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceLocation {
    /// Authority as it appears in the URL (may include `:port`).
    pub host: String,
    /// Request target, always starting with `/`.
    pub path: String,
}

/// Splits a URL into host and resource path.
///
/// A leading `http://` is stripped if present; anything else is treated as
/// already stripped. The host runs up to the first `/`, the path starts at
/// that `/`. A URL with no path resolves to `/`.
///
/// # Examples
///
/// ```
/// use rangeget::download::parse_url;
///
/// let location = parse_url("http://a.b/c/d");
/// assert_eq!(location.host, "a.b");
/// assert_eq!(location.path, "/c/d");
///
/// assert_eq!(parse_url("http://a.b").path, "/");
/// ```
#[must_use]
pub fn parse_url(url: &str) -> ResourceLocation {
    let rest = strip_http_scheme(url);
    match rest.find('/') {
        Some(slash) => ResourceLocation {
            host: rest[..slash].to_string(),
            path: rest[slash..].to_string(),
        },
        None => ResourceLocation {
            host: rest.to_string(),
            path: "/".to_string(),
        },
    }
}

/// Returns the scheme of `url` when it names one other than `http`.
///
/// `https://` and `ftp://` URLs are rejected with this before any network activity.
#[must_use]
pub fn foreign_scheme(url: &str) -> Option<&str> {
    let (scheme, _) = url.split_once("://")?;
    let looks_like_scheme = !scheme.is_empty()
        && scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    (looks_like_scheme && !scheme.eq_ignore_ascii_case("http")).then_some(scheme)
}

/// Splits a URL authority into the name to resolve and the port to connect to.
///
/// Accepts `name`, `name:port`, `[v6]` and `[v6]:port`. Returns `None` for an
/// empty name or an unparseable port.
#[must_use]
pub fn split_host_port(host: &str) -> Option<(&str, u16)> {
    let (name, port) = if let Some(bracketed) = host.strip_prefix('[') {
        let end = bracketed.find(']')?;
        let name = &bracketed[..end];
        let after = &bracketed[end + 1..];
        let port = if after.is_empty() {
            HTTP_PORT
        } else {
            after.strip_prefix(':')?.parse().ok()?
        };
        (name, port)
    } else {
        match host.rsplit_once(':') {
            Some((name, port)) => (name, port.parse().ok()?),
            None => (host, HTTP_PORT),
        }
    };

    (!name.is_empty()).then_some((name, port))
}

fn strip_http_scheme(url: &str) -> &str {
    match url.get(..HTTP_SCHEME.len()) {
        Some(prefix) if prefix.eq_ignore_ascii_case(HTTP_SCHEME) => &url[HTTP_SCHEME.len()..],
        _ => url,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_url_splits_host_and_path() {
        let location = parse_url("http://a.b/c/d");
        assert_eq!(location.host, "a.b");
        assert_eq!(location.path, "/c/d");
    }

    #[test]
    fn test_parse_url_without_scheme_is_treated_as_stripped() {
        let location = parse_url("example.com/files/data.bin");
        assert_eq!(location.host, "example.com");
        assert_eq!(location.path, "/files/data.bin");
    }

    #[test]
    fn test_parse_url_without_path_defaults_to_root() {
        let location = parse_url("http://example.com");
        assert_eq!(location.host, "example.com");
        assert_eq!(location.path, "/");
    }

    #[test]
    fn test_parse_url_keeps_port_and_query() {
        let location = parse_url("http://127.0.0.1:8080/get?file=a.bin&x=1");
        assert_eq!(location.host, "127.0.0.1:8080");
        assert_eq!(location.path, "/get?file=a.bin&x=1");
    }

    #[test]
    fn test_parse_url_scheme_is_case_insensitive() {
        let location = parse_url("HTTP://Example.com/A");
        assert_eq!(location.host, "Example.com");
        assert_eq!(location.path, "/A");
    }

    #[test]
    fn test_foreign_scheme_detection() {
        assert_eq!(foreign_scheme("https://example.com/a"), Some("https"));
        assert_eq!(foreign_scheme("ftp://example.com/a"), Some("ftp"));
        assert_eq!(foreign_scheme("http://example.com/a"), None);
        assert_eq!(foreign_scheme("example.com/a"), None);
        // "://" inside the path is not a scheme
        assert_eq!(foreign_scheme("example.com/redirect?to=http://x"), None);
    }

    #[test]
    fn test_split_host_port_defaults_to_http_port() {
        assert_eq!(split_host_port("example.com"), Some(("example.com", 80)));
        assert_eq!(split_host_port("example.com:8080"), Some(("example.com", 8080)));
    }

    #[test]
    fn test_split_host_port_ipv6_literals() {
        assert_eq!(split_host_port("[::1]"), Some(("::1", 80)));
        assert_eq!(split_host_port("[::1]:9000"), Some(("::1", 9000)));
        assert_eq!(split_host_port("[::1"), None);
    }

    #[test]
    fn test_split_host_port_rejects_bad_input() {
        assert_eq!(split_host_port(""), None);
        assert_eq!(split_host_port(":80"), None);
        assert_eq!(split_host_port("example.com:http"), None);
        assert_eq!(split_host_port("example.com:99999"), None);
    }
}
