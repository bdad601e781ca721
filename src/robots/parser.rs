//! Robots.txt rulesets
//!
//! Rules are matched with the robotstxt crate on demand; only the raw
//! body is kept.

use robotstxt::DefaultMatcher;

/// What is known about a host's robots.txt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RobotsRecord {
    /// A robots.txt body that was served with status 200
    Rules(String),
    /// robots.txt was unreachable, not 200 or empty; everything is allowed
    Permissive,
}

impl RobotsRecord {
    /// Creates a record from a robots.txt body
    ///
    /// An empty or whitespace-only body is permissive.
    pub fn from_content(content: &str) -> Self {
        if content.trim().is_empty() {
            Self::Permissive
        } else {
            Self::Rules(content.to_string())
        }
    }

    pub fn is_permissive(&self) -> bool {
        matches!(self, Self::Permissive)
    }

    /// Checks if a URL is allowed for the given user agent
    ///
    /// # Arguments
    ///
    /// * `url` - The full URL to check (e.g., "http://example.com/page.html")
    /// * `user_agent` - The product token, e.g. `RIWEB_CRAWLER` rather than `RIWEB_CRAWLER/1.0`
    pub fn is_allowed(&self, url: &str, user_agent: &str) -> bool {
        match self {
            Self::Permissive => true,
            Self::Rules(content) => {
                let mut matcher = DefaultMatcher::default();
                matcher.one_agent_allowed_by_robots(content, user_agent, url)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "http://example.com";

    fn url(route: &str) -> String {
        format!("{}{}", BASE, route)
    }

    #[test]
    fn test_permissive() {
        let robots = RobotsRecord::Permissive;
        assert!(robots.is_allowed(&url("/any/path"), "TestBot"));
        assert!(robots.is_allowed(&url("/admin"), "TestBot"));
    }

    #[test]
    fn test_parse_disallow_all() {
        let robots = RobotsRecord::from_content("User-agent: *\nDisallow: /");
        assert!(!robots.is_allowed(&url("/"), "TestBot"));
        assert!(!robots.is_allowed(&url("/page"), "TestBot"));
    }

    #[test]
    fn test_parse_disallow_specific() {
        let robots = RobotsRecord::from_content("User-agent: *\nDisallow: /admin");
        assert!(robots.is_allowed(&url("/"), "TestBot"));
        assert!(robots.is_allowed(&url("/page"), "TestBot"));
        assert!(!robots.is_allowed(&url("/admin"), "TestBot"));
        assert!(!robots.is_allowed(&url("/admin/users"), "TestBot"));
    }

    #[test]
    fn test_parse_allow_and_disallow() {
        let robots =
            RobotsRecord::from_content("User-agent: *\nDisallow: /private\nAllow: /private/public");
        assert!(!robots.is_allowed(&url("/private"), "TestBot"));
        assert!(robots.is_allowed(&url("/private/public"), "TestBot"));
    }

    #[test]
    fn test_parse_specific_user_agent() {
        let robots =
            RobotsRecord::from_content("User-agent: BadBot\nDisallow: /\n\nUser-agent: *\nAllow: /");
        assert!(robots.is_allowed(&url("/page"), "GoodBot"));
        assert!(!robots.is_allowed(&url("/page"), "BadBot"));
    }

    #[test]
    fn test_garbage_allows_everything() {
        let robots = RobotsRecord::from_content("This is not valid robots.txt {{{");
        assert!(!robots.is_permissive());
        assert!(robots.is_allowed(&url("/any/path"), "TestBot"));
    }

    #[test]
    fn test_empty_body_is_permissive() {
        assert!(RobotsRecord::from_content("").is_permissive());
        assert!(RobotsRecord::from_content(" \n").is_permissive());
    }
}
