//! Utility functions and helpers.

pub mod http;
pub mod log;

use url::Url;

/// Resolve a potentially relative URL against a base URL.
pub fn resolve_url(base: &Url, href: &str) -> String {
    base.join(href)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| href.to_string())
}

/// Collapse runs of whitespace and trim.
pub fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Upper-case the first character of a source identifier for display.
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_url() {
        let base = Url::parse("https://stripe.com/jobs/search").unwrap();
        assert_eq!(
            resolve_url(&base, "/jobs/listing/1"),
            "https://stripe.com/jobs/listing/1"
        );
        assert_eq!(
            resolve_url(&base, "https://other.com/x"),
            "https://other.com/x"
        );
        let careers = Url::parse("https://plaid.com/careers/").unwrap();
        assert_eq!(
            resolve_url(&careers, "openings/eng"),
            "https://plaid.com/careers/openings/eng"
        );
    }

    #[test]
    fn test_normalize_whitespace() {
        assert_eq!(normalize_whitespace("  Software \n  Engineer "), "Software Engineer");
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("digitalocean"), "Digitalocean");
        assert_eq!(capitalize(""), "");
    }
}
