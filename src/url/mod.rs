//! URL handling helpers
//!
//! The crawler addresses pages as `(host, route)` pairs rather than full
//! URLs. This module converts between the two and interprets redirect
//! locations.

use crate::CrawlError;

/// A URL split into the host (authority) and route parts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitUrl {
    pub link_host: String,
    pub route: String,
}

/// Splits an absolute URL into host and route
///
/// The URL is split on `/`: the third segment is the host and everything
/// after it becomes the route. This assumes a scheme-and-authority prefix
/// such as `http://host/...`; the scheme itself is ignored.
///
/// # Examples
///
/// ```
/// use riweb_crawler::url::split_url;
///
/// let split = split_url("http://example.com/a/b.html");
/// assert_eq!(split.link_host, "example.com");
/// assert_eq!(split.route, "/a/b.html");
/// ```
pub fn split_url(url: &str) -> SplitUrl {
    let segments: Vec<&str> = url.split('/').collect();

    let link_host = segments.get(2).copied().unwrap_or_default().to_string();
    let route = match segments.get(3..) {
        Some(rest) => format!("/{}", rest.join("/")),
        None => "/".to_string(),
    };

    SplitUrl { link_host, route }
}

/// Splits a host that may carry an explicit port
///
/// Handles `host`, `host:port` and bracketed IPv6 literals (`[::1]:8080`).
/// A bare IPv6 literal without brackets is returned whole.
pub fn parse_authority(authority: &str, default_port: u16) -> (&str, u16) {
    if let Some(rest) = authority.strip_prefix('[') {
        if let Some((host, tail)) = rest.split_once(']') {
            let port = tail
                .strip_prefix(':')
                .and_then(|port| port.parse().ok())
                .unwrap_or(default_port);
            return (host, port);
        }
    }

    match authority.rsplit_once(':') {
        Some((host, port)) if !host.contains(':') => match port.parse() {
            Ok(port) => (host, port),
            Err(_) => (authority, default_port),
        },
        _ => (authority, default_port),
    }
}

/// Computes where a redirect sends us
///
/// # Rules
///
/// | Location | Target |
/// |----------|--------|
/// | `https:...` or any non-HTTP scheme | error, unsupported |
/// | the literal `http` | current host, current route + `/` |
/// | `http://host/path` | `host`, `/path` |
/// | `//host/path` | `host`, `/path` |
/// | anything else | current host, location as route |
pub fn resolve_location(
    current_host: &str,
    current_route: &str,
    location: &str,
) -> Result<SplitUrl, CrawlError> {
    let location = location.trim();

    if location.to_ascii_lowercase().starts_with("https:") {
        return Err(CrawlError::UnsupportedScheme {
            location: location.to_string(),
        });
    }

    // Some servers answer with a bare "http" location; treat it as the
    // directory form of the current route.
    if location == "http" {
        return Ok(SplitUrl {
            link_host: current_host.to_string(),
            route: format!("{}/", current_route),
        });
    }

    if let Some((scheme, _)) = location.split_once("://") {
        if scheme.eq_ignore_ascii_case("http") {
            let split = split_url(location);
            if !split.link_host.is_empty() {
                return Ok(split);
            }
        }
        if scheme.chars().all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '-' || c == '.') {
            return Err(CrawlError::UnsupportedScheme {
                location: location.to_string(),
            });
        }
    }

    if location.starts_with("//") {
        return Ok(split_url(&format!("http:{}", location)));
    }

    let route = if location.starts_with('/') {
        location.to_string()
    } else {
        format!("/{}", location)
    };

    Ok(SplitUrl {
        link_host: current_host.to_string(),
        route,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_url() {
        let split = split_url("http://example.com/a/b.html");
        assert_eq!(split.link_host, "example.com");
        assert_eq!(split.route, "/a/b.html");
    }

    #[test]
    fn test_split_url_root() {
        let split = split_url("http://example.com/");
        assert_eq!(split.link_host, "example.com");
        assert_eq!(split.route, "/");

        let split = split_url("http://example.com");
        assert_eq!(split.link_host, "example.com");
        assert_eq!(split.route, "/");
    }

    #[test]
    fn test_split_url_keeps_query_and_port() {
        let split = split_url("http://127.0.0.1:8080/search?q=a/b");
        assert_eq!(split.link_host, "127.0.0.1:8080");
        assert_eq!(split.route, "/search?q=a/b");
    }

    #[test]
    fn test_split_url_ignores_scheme() {
        let split = split_url("https://secure.example.com/login");
        assert_eq!(split.link_host, "secure.example.com");
        assert_eq!(split.route, "/login");
    }

    #[test]
    fn test_parse_authority() {
        assert_eq!(parse_authority("example.com", 80), ("example.com", 80));
        assert_eq!(parse_authority("example.com:8080", 80), ("example.com", 8080));
        assert_eq!(parse_authority("127.0.0.1:3000", 80), ("127.0.0.1", 3000));
        assert_eq!(parse_authority("[::1]:8080", 80), ("::1", 8080));
        assert_eq!(parse_authority("[::1]", 80), ("::1", 80));
        assert_eq!(parse_authority("::1", 80), ("::1", 80));
        assert_eq!(parse_authority("example.com:http", 80), ("example.com:http", 80));
    }

    #[test]
    fn test_resolve_absolute_location() {
        let target = resolve_location("old.example.com", "/", "http://new.example.com/x/y").unwrap();
        assert_eq!(target.link_host, "new.example.com");
        assert_eq!(target.route, "/x/y");
    }

    #[test]
    fn test_resolve_relative_location() {
        let target = resolve_location("example.com", "/a", "/b/c.html").unwrap();
        assert_eq!(target.link_host, "example.com");
        assert_eq!(target.route, "/b/c.html");

        let target = resolve_location("example.com", "/a", "b.html").unwrap();
        assert_eq!(target.route, "/b.html");
    }

    #[test]
    fn test_resolve_protocol_relative_location() {
        let target = resolve_location("example.com", "/", "//cdn.example.com/page").unwrap();
        assert_eq!(target.link_host, "cdn.example.com");
        assert_eq!(target.route, "/page");
    }

    #[test]
    fn test_resolve_bare_http_location() {
        let target = resolve_location("example.com", "/docs", "http").unwrap();
        assert_eq!(target.link_host, "example.com");
        assert_eq!(target.route, "/docs/");
    }

    #[test]
    fn test_https_location_unsupported() {
        let result = resolve_location("example.com", "/", "https://example.com/");
        assert!(matches!(result, Err(CrawlError::UnsupportedScheme { .. })));

        let result = resolve_location("example.com", "/", "HTTPS://example.com/");
        assert!(matches!(result, Err(CrawlError::UnsupportedScheme { .. })));
    }

    #[test]
    fn test_relative_location_starting_with_https() {
        let target = resolve_location("example.com", "/", "https-guide.html").unwrap();
        assert_eq!(target.link_host, "example.com");
        assert_eq!(target.route, "/https-guide.html");
    }

    #[test]
    fn test_other_scheme_unsupported() {
        let result = resolve_location("example.com", "/", "ftp://files.example.com/");
        assert!(matches!(result, Err(CrawlError::UnsupportedScheme { .. })));
    }
}
