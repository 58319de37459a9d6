//! Domain to category lookup.
//!
//! The table is injected configuration: rules are supplied by the caller and
//! nothing here knows about particular sites.

use serde::{Deserialize, Serialize};

use crate::types::CategoryMatch;

/// Category assigned when no rule matches.
pub const UNCATEGORIZED: &str = "uncategorized";

/// One category and the patterns that select it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRule {
    pub name: String,
    pub patterns: Vec<String>,
}

impl CategoryRule {
    pub fn new<I, S>(name: impl Into<String>, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            patterns: patterns.into_iter().map(Into::into).collect(),
        }
    }
}

/// Ordered set of category rules plus the matching policy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryTable {
    rules: Vec<CategoryRule>,
    mode: CategoryMatch,
}

impl CategoryTable {
    /// Builds a table. Patterns are lower-cased and blank ones dropped.
    pub fn new(rules: Vec<CategoryRule>, mode: CategoryMatch) -> Self {
        let rules = rules
            .into_iter()
            .map(|rule| CategoryRule {
                name: rule.name,
                patterns: rule
                    .patterns
                    .iter()
                    .map(|p| p.trim().to_lowercase())
                    .filter(|p| !p.is_empty())
                    .collect(),
            })
            .collect();
        Self { rules, mode }
    }

    pub fn rules(&self) -> &[CategoryRule] {
        &self.rules
    }

    pub const fn mode(&self) -> CategoryMatch {
        self.mode
    }

    /// Returns the category for an event's domain and URL.
    pub fn categorize(&self, domain: &str, url: &str) -> &str {
        let matched = match self.mode {
            CategoryMatch::Domain => self.by_domain(domain, url),
            CategoryMatch::Url => self.by_url(url),
        };
        matched.unwrap_or(UNCATEGORIZED)
    }

    /// Longest matching pattern wins; earlier rules win ties.
    fn by_domain(&self, domain: &str, url: &str) -> Option<&str> {
        let path = url_path(url).to_lowercase();
        let mut best: Option<(&str, usize)> = None;

        for rule in &self.rules {
            for pattern in &rule.patterns {
                let hit = match pattern.split_once('/') {
                    Some((host, prefix)) => {
                        domain_matches(domain, host)
                            && path
                                .strip_prefix('/')
                                .is_some_and(|p| p.starts_with(prefix))
                    }
                    None => domain_matches(domain, pattern),
                };
                if hit && best.is_none_or(|(_, len)| pattern.len() > len) {
                    best = Some((rule.name.as_str(), pattern.len()));
                }
            }
        }

        best.map(|(name, _)| name)
    }

    /// First rule with any substring hit wins.
    fn by_url(&self, url: &str) -> Option<&str> {
        let url = url.to_lowercase();
        self.rules
            .iter()
            .find(|rule| rule.patterns.iter().any(|p| url.contains(p.as_str())))
            .map(|rule| rule.name.as_str())
    }
}

/// `domain` equals `pattern` or is a subdomain of it.
fn domain_matches(domain: &str, pattern: &str) -> bool {
    domain
        .strip_suffix(pattern)
        .is_some_and(|rest| rest.is_empty() || rest.ends_with('.'))
}

/// Path component of a URL, without query or fragment. Empty when absent.
fn url_path(url: &str) -> &str {
    let after_scheme = url.split_once("://").map_or(url, |(_, rest)| rest);
    let path = after_scheme.find('/').map_or("", |i| &after_scheme[i..]);
    path.split(['?', '#']).next().unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(mode: CategoryMatch) -> CategoryTable {
        CategoryTable::new(
            vec![
                CategoryRule::new("Search", ["google.com", "bing.com"]),
                CategoryRule::new("Email", ["mail.google.com"]),
                CategoryRule::new("Freelancing/Jobs", ["linkedin.com/jobs"]),
                CategoryRule::new("Social Media", ["LinkedIn.com"]),
                CategoryRule::new("News", ["news"]),
            ],
            mode,
        )
    }

    #[test]
    fn test_exact_domain_match() {
        let t = table(CategoryMatch::Domain);
        assert_eq!(t.categorize("google.com", "https://google.com/"), "Search");
    }

    #[test]
    fn test_subdomain_prefers_most_specific_pattern() {
        let t = table(CategoryMatch::Domain);
        assert_eq!(
            t.categorize("mail.google.com", "https://mail.google.com/u/0"),
            "Email"
        );
        assert_eq!(
            t.categorize("maps.google.com", "https://maps.google.com/"),
            "Search"
        );
    }

    #[test]
    fn test_domain_match_respects_label_boundary() {
        let t = table(CategoryMatch::Domain);
        assert_eq!(
            t.categorize("notgoogle.com", "https://notgoogle.com/"),
            UNCATEGORIZED
        );
    }

    #[test]
    fn test_path_pattern() {
        let t = table(CategoryMatch::Domain);
        assert_eq!(
            t.categorize("linkedin.com", "https://www.linkedin.com/jobs/view/1?x=y"),
            "Freelancing/Jobs"
        );
        assert_eq!(
            t.categorize("linkedin.com", "https://www.linkedin.com/feed/"),
            "Social Media"
        );
    }

    #[test]
    fn test_url_mode_first_rule_wins() {
        let t = table(CategoryMatch::Url);
        // Search is listed before Email, so the substring hit on google.com wins.
        assert_eq!(
            t.categorize("mail.google.com", "https://mail.google.com/"),
            "Search"
        );
        assert_eq!(
            t.categorize("example.org", "https://example.org/news/today"),
            "News"
        );
    }

    #[test]
    fn test_unmatched_is_uncategorized() {
        let t = table(CategoryMatch::Domain);
        assert_eq!(t.categorize("unknown", "garbage"), UNCATEGORIZED);
        assert_eq!(
            CategoryTable::default().categorize("google.com", "https://google.com"),
            UNCATEGORIZED
        );
    }

    #[test]
    fn test_url_path_extraction() {
        assert_eq!(url_path("https://a.com/b/c?q=1#x"), "/b/c");
        assert_eq!(url_path("https://a.com"), "");
        assert_eq!(url_path("a.com/x"), "/x");
    }
}
